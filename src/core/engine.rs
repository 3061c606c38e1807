use crate::core::classifier::classify_tokens;
use crate::core::matrix::{MatrixBuilder, TransitionMatrix};
use crate::core::tables::IndexTables;
use crate::core::tree::build_tree;
use crate::core::triads::walk_triads;
use crate::core::types::{EncodeStats, SyntaxNode, Token};
use crate::error::Result;
use crate::frontend::ParsedUnit;
use std::sync::Arc;

/// The matrix of one file together with what was observed while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    pub matrix: TransitionMatrix,
    pub stats: EncodeStats,
}

/// Second-order Markov encoder over syntax trees.
///
/// Holds only the shared, read-only index tables, so one encoder can be used
/// from any number of worker threads. Every call builds its own tree,
/// dictionary and matrix.
#[derive(Debug, Clone)]
pub struct MarkovEncoder {
    tables: Arc<IndexTables>,
}

impl MarkovEncoder {
    pub fn new(tables: Arc<IndexTables>) -> Self {
        Self { tables }
    }

    pub fn encode(&self, unit: &ParsedUnit) -> Result<Encoding> {
        self.encode_tree(&unit.tree, &unit.tokens)
    }

    /// classify tokens -> canonical tree -> triads -> counts -> probabilities
    pub fn encode_tree(&self, syntax: &SyntaxNode, tokens: &[Token]) -> Result<Encoding> {
        let (dictionary, conflicts) = classify_tokens(tokens);
        let tree = build_tree(syntax);

        let mut triads = Vec::new();
        let null_leaves = walk_triads(&tree, &dictionary, &mut triads, |_| {});

        let mut builder = MatrixBuilder::new(&self.tables);
        for triad in &triads {
            builder.add(triad, &dictionary)?;
        }

        let stats = EncodeStats {
            nodes: tree.len(),
            triads: triads.len(),
            conflicts,
            null_leaves,
            fallback_columns: builder.fallback_columns(),
        };
        tracing::debug!(?stats, "encoded syntax tree");

        Ok(Encoding { matrix: builder.finish(), stats })
    }
}
