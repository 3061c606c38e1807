// File: src/frontend.rs
use crate::core::types::{SyntaxNode, Token};
use crate::error::{EncodeError, Result};
use serde::Deserialize;
use serde_json::Value;

/// Deepest `{`/`[` nesting a JSON unit may have. A syntax tree level costs two
/// (the node object and its `children` array).
pub const DEFAULT_MAX_NESTING: usize = 4096;

/// One source file after lexing and parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUnit {
    pub tokens: Vec<Token>,
    pub tree: SyntaxNode,
}

/// The lexer/parser boundary. Implementations turn source text into a token
/// stream and a syntax tree; a failure here means the file is skipped.
pub trait SyntaxFrontend: Send + Sync {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>>;

    fn parse(&self, tokens: &[Token], text: &str) -> Result<SyntaxNode>;

    /// Nesting bound of the input, if parsing recurses on it. Callers size
    /// worker stacks from this.
    fn nesting_limit(&self) -> Option<usize> {
        None
    }

    fn load(&self, text: &str) -> Result<ParsedUnit> {
        let tokens = self.tokenize(text)?;
        let tree = self.parse(&tokens, text)?;
        Ok(ParsedUnit { tokens, tree })
    }
}

#[derive(Deserialize)]
struct UnitDocument {
    tokens: Vec<Token>,
    tree: Value,
}

/// Reads units that an external parser already serialized as JSON:
/// `{"tokens": [{"value": .., "category": ..}], "tree": <node>}`.
///
/// A node is a string (literal), `{"modifiers": [..]}` (modifier group) or
/// `{"type": name, "children": [..]}`. Nested arrays of children are
/// flattened; `null`, `false`, `0`, `""` and `[]` placeholders are dropped,
/// while `true` and other numbers become unnamed literals.
///
/// Units nested deeper than `max_nesting` are rejected before parsing.
#[derive(Debug, Clone, Copy)]
pub struct JsonFrontend {
    max_nesting: usize,
}

impl Default for JsonFrontend {
    fn default() -> Self {
        Self { max_nesting: DEFAULT_MAX_NESTING }
    }
}

impl JsonFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting.max(1);
        self
    }

    fn document(&self, text: &str) -> Result<UnitDocument> {
        check_nesting(text, self.max_nesting)?;
        let mut de = serde_json::Deserializer::from_str(text);
        // Syntax trees of long expression chains nest far beyond serde_json's
        // default limit; `check_nesting` bounds the recursion instead.
        de.disable_recursion_limit();
        let doc = UnitDocument::deserialize(&mut de)?;
        de.end()?;
        Ok(doc)
    }
}

impl SyntaxFrontend for JsonFrontend {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        Ok(self.document(text)?.tokens)
    }

    fn parse(&self, _tokens: &[Token], text: &str) -> Result<SyntaxNode> {
        ingest_tree(&self.document(text)?.tree)
    }

    fn nesting_limit(&self) -> Option<usize> {
        Some(self.max_nesting)
    }

    fn load(&self, text: &str) -> Result<ParsedUnit> {
        let doc = self.document(text)?;
        let tree = ingest_tree(&doc.tree)?;
        Ok(ParsedUnit { tokens: doc.tokens, tree })
    }
}

/// Fails when `text` opens more than `limit` nested objects or arrays.
/// Brackets inside strings do not count.
fn check_nesting(text: &str, limit: usize) -> Result<()> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for byte in text.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                if depth > limit {
                    return Err(EncodeError::Ingest(format!("unit nests deeper than {limit} levels")));
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// Converts a JSON tree into a `SyntaxNode`. The root must be a real node.
pub fn ingest_tree(value: &Value) -> Result<SyntaxNode> {
    let mut nodes = Vec::with_capacity(1);
    ingest_into(value, &mut nodes)?;
    match nodes.len() {
        1 => Ok(nodes.remove(0)),
        0 => Err(EncodeError::Ingest("syntax tree is empty".into())),
        n => Err(EncodeError::Ingest(format!("syntax tree has {n} roots"))),
    }
}

fn ingest_into(value: &Value, out: &mut Vec<SyntaxNode>) -> Result<()> {
    match value {
        Value::Null | Value::Bool(false) => {}
        Value::String(text) if text.is_empty() => {}
        Value::String(text) => out.push(SyntaxNode::Literal(text.clone())),
        Value::Number(n) if n.as_f64() == Some(0.0) => {}
        // Flags such as `varargs: true` are kept as unnamed leaves.
        Value::Bool(true) | Value::Number(_) => out.push(SyntaxNode::Literal(String::new())),
        Value::Array(items) => {
            for item in items {
                ingest_into(item, out)?;
            }
        }
        Value::Object(fields) => {
            if let Some(members) = fields.get("modifiers") {
                out.push(SyntaxNode::ModifierGroup(ingest_children(members)?));
                return Ok(());
            }
            let name = fields
                .get("type")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| EncodeError::Ingest("node object without a `type` name".into()))?;
            let children = match fields.get("children") {
                Some(children) => ingest_children(children)?,
                None => Vec::new(),
            };
            out.push(SyntaxNode::typed(name, children));
        }
    }
    Ok(())
}

fn ingest_children(value: &Value) -> Result<Vec<SyntaxNode>> {
    let mut children = Vec::new();
    ingest_into(value, &mut children)?;
    Ok(children)
}
