// File: src/core/tables.rs
use crate::core::types::{COLS, NODE_TYPE_COLUMNS, ROWS};
use crate::error::{EncodeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Separator between the two labels of a context key, e.g. `"ClassDeclaration→MethodDeclaration"`.
pub const DEFAULT_CONTEXT_SEPARATOR: &str = "→";

/// On-disk layout of the index tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TablesDocument {
    nodetypedict: HashMap<String, usize>,
    tokendict: HashMap<String, usize>,
    node2groups: HashMap<String, usize>,
    #[serde(default)]
    context_separator: Option<String>,
}

/// The three read-only lookup tables that project triads onto matrix cells.
/// Grammar specific; loaded once and shared between workers.
#[derive(Debug, Clone, Default)]
pub struct IndexTables {
    node_types: HashMap<String, usize>,
    categories: HashMap<String, usize>,
    /// grandparent label -> parent label -> row
    contexts: HashMap<String, HashMap<String, usize>>,
    context_count: usize,
}

impl IndexTables {
    /// Builds and validates tables from in-memory mappings.
    pub fn new<N, C, X>(node_types: N, categories: C, contexts: X) -> Result<Self>
    where
        N: IntoIterator<Item = (String, usize)>,
        C: IntoIterator<Item = (String, usize)>,
        X: IntoIterator<Item = ((String, String), usize)>,
    {
        let mut tables = Self::default();

        for (name, col) in node_types {
            if col >= NODE_TYPE_COLUMNS {
                return Err(EncodeError::Config(format!(
                    "node type `{name}` maps to column {col}, expected < {NODE_TYPE_COLUMNS}"
                )));
            }
            tables.node_types.insert(name, col);
        }

        for (category, col) in categories {
            if !(NODE_TYPE_COLUMNS..COLS).contains(&col) {
                return Err(EncodeError::Config(format!(
                    "category `{category}` maps to column {col}, expected {NODE_TYPE_COLUMNS}..{COLS}"
                )));
            }
            tables.categories.insert(category, col);
        }

        for ((grandparent, parent), row) in contexts {
            if row >= ROWS {
                return Err(EncodeError::Config(format!(
                    "context `{grandparent}{DEFAULT_CONTEXT_SEPARATOR}{parent}` maps to row {row}, expected < {ROWS}"
                )));
            }
            let previous = tables.contexts.entry(grandparent).or_default().insert(parent, row);
            if previous.is_none() {
                tables.context_count += 1;
            }
        }

        Ok(tables)
    }

    /// Loads tables from a JSON document with `nodetypedict`, `tokendict` and
    /// `node2groups` keys. Context keys are split on `context_separator`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let doc: TablesDocument = serde_json::from_str(json)?;
        Self::from_document(doc)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let doc: TablesDocument = serde_json::from_reader(reader)?;
        let tables = Self::from_document(doc)?;
        tracing::info!(
            path = %path.display(),
            node_types = tables.node_types.len(),
            categories = tables.categories.len(),
            contexts = tables.context_count,
            "loaded index tables"
        );
        Ok(tables)
    }

    fn from_document(doc: TablesDocument) -> Result<Self> {
        let separator = doc.context_separator.as_deref().unwrap_or(DEFAULT_CONTEXT_SEPARATOR);
        if separator.is_empty() {
            return Err(EncodeError::Config("context separator is empty".into()));
        }

        let mut contexts = Vec::with_capacity(doc.node2groups.len());
        for (key, row) in doc.node2groups {
            let (grandparent, parent) = key.split_once(separator).ok_or_else(|| {
                EncodeError::Config(format!("context key `{key}` has no `{separator}` separator"))
            })?;
            contexts.push(((grandparent.to_string(), parent.to_string()), row));
        }

        Self::new(doc.nodetypedict, doc.tokendict, contexts)
    }

    /// Column of a non-terminal type name.
    pub fn node_type_column(&self, name: &str) -> Option<usize> {
        self.node_types.get(name).copied()
    }

    /// Column of a lexical category.
    pub fn category_column(&self, category: &str) -> Option<usize> {
        self.categories.get(category).copied()
    }

    /// Row of the (grandparent, parent) structural context.
    pub fn context_row(&self, grandparent: &str, parent: &str) -> Option<usize> {
        self.contexts.get(grandparent).and_then(|parents| parents.get(parent)).copied()
    }

    pub fn context_count(&self) -> usize {
        self.context_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "nodetypedict": {"MethodDeclaration": 0, "ReturnStatement": 7},
        "tokendict": {"Identifier": 57, "Null": 62},
        "node2groups": {"MethodDeclaration→ReturnStatement": 3}
    }"#;

    #[test]
    fn loads_default_separator() {
        let tables = IndexTables::from_json_str(DOC).unwrap();
        assert_eq!(tables.node_type_column("ReturnStatement"), Some(7));
        assert_eq!(tables.category_column("Null"), Some(62));
        assert_eq!(tables.context_row("MethodDeclaration", "ReturnStatement"), Some(3));
        assert_eq!(tables.context_row("ReturnStatement", "MethodDeclaration"), None);
        assert_eq!(tables.context_count(), 1);
    }

    #[test]
    fn loads_legacy_separator() {
        let doc = r#"{
            "nodetypedict": {},
            "tokendict": {},
            "node2groups": {"ClassDeclaration2FieldDeclaration": 12},
            "context_separator": "2"
        }"#;
        let tables = IndexTables::from_json_str(doc).unwrap();
        assert_eq!(tables.context_row("ClassDeclaration", "FieldDeclaration"), Some(12));
    }

    #[test]
    fn rejects_key_without_separator() {
        let doc = r#"{"nodetypedict": {}, "tokendict": {}, "node2groups": {"Orphan": 1}}"#;
        assert!(matches!(IndexTables::from_json_str(doc), Err(EncodeError::Config(_))));
    }

    #[test]
    fn rejects_out_of_range_entries() {
        let no_entries: Vec<(String, usize)> = Vec::new();
        let no_contexts: Vec<((String, String), usize)> = Vec::new();

        let bad_node = IndexTables::new([("A".to_string(), 57)], no_entries.clone(), no_contexts.clone());
        assert!(matches!(bad_node, Err(EncodeError::Config(_))));

        let bad_category = IndexTables::new(no_entries.clone(), [("Identifier".to_string(), 56)], no_contexts);
        assert!(matches!(bad_category, Err(EncodeError::Config(_))));

        let bad_row = IndexTables::new(no_entries.clone(), no_entries, [(("A".to_string(), "B".to_string()), ROWS)]);
        assert!(matches!(bad_row, Err(EncodeError::Config(_))));
    }
}
