// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of structural context rows in a transition matrix.
pub const ROWS: usize = 493;
/// Number of outcome columns: 57 node types followed by 15 lexical categories.
pub const COLS: usize = 72;
/// Columns `0..NODE_TYPE_COLUMNS` belong to non-terminal node types.
pub const NODE_TYPE_COLUMNS: usize = 57;
/// Column used when a token resolves to neither a node type nor a category.
/// It is the slot of the `"Null"` category.
pub const NULL_COLUMN: usize = 62;

/// Label given to a modifier group.
pub const MODIFIER_LABEL: &str = "Modifier";
/// Label given to a leaf that the type dictionary cannot resolve.
pub const NULL_LABEL: &str = "Null";
/// Leaf label that survives resolution even when the dictionary misses it.
pub const RETURN_STATEMENT: &str = "ReturnStatement";

/// A unique identifier for a node of a canonical tree.
pub type NodeId = usize;

/// Maps literal token text to the lexical category the lexer gave it.
pub type TypeDictionary = HashMap<String, String>;

/// One lexical token of a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub value: String,
    pub category: String,
}

impl Token {
    pub fn new(value: impl Into<String>, category: impl Into<String>) -> Self {
        Self { value: value.into(), category: category.into() }
    }
}

/// A syntax tree node as handed over by the external parser.
/// The shape is decided once, at ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxNode {
    /// A bare string attribute (identifier, operator, literal text).
    Literal(String),
    /// A set of terminal modifiers such as `public static`.
    ModifierGroup(Vec<SyntaxNode>),
    /// A named non-terminal with its already flattened children.
    Typed { name: String, children: Vec<SyntaxNode> },
}

impl SyntaxNode {
    pub fn literal(text: impl Into<String>) -> Self {
        SyntaxNode::Literal(text.into())
    }

    pub fn typed(name: impl Into<String>, children: Vec<SyntaxNode>) -> Self {
        SyntaxNode::Typed { name: name.into(), children }
    }

    /// The label this node contributes to a path.
    pub fn label(&self) -> &str {
        match self {
            SyntaxNode::Literal(text) => text,
            SyntaxNode::ModifierGroup(_) => MODIFIER_LABEL,
            SyntaxNode::Typed { name, .. } => name,
        }
    }

    /// Children in traversal order. Modifier members count as children.
    pub fn children(&self) -> &[SyntaxNode] {
        match self {
            SyntaxNode::Literal(_) => &[],
            SyntaxNode::ModifierGroup(members) => members,
            SyntaxNode::Typed { children, .. } => children,
        }
    }
}

/// Three consecutive labels on a root-to-node path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triad {
    pub grandparent: String,
    pub parent: String,
    pub node: String,
}

impl Triad {
    pub fn new(grandparent: impl Into<String>, parent: impl Into<String>, node: impl Into<String>) -> Self {
        Self { grandparent: grandparent.into(), parent: parent.into(), node: node.into() }
    }
}

/// Non-fatal conditions observed while encoding one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeStats {
    pub nodes: usize,
    pub triads: usize,
    /// Literals seen with two different categories.
    pub conflicts: usize,
    /// Leaves defaulted to `"Null"`.
    pub null_leaves: usize,
    /// Triads whose outcome fell back to `NULL_COLUMN`.
    pub fallback_columns: usize,
}
