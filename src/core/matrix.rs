// File: src/core/matrix.rs
use crate::core::tables::{IndexTables, DEFAULT_CONTEXT_SEPARATOR};
use crate::core::types::{Triad, TypeDictionary, COLS, NULL_COLUMN, ROWS};
use crate::error::{EncodeError, Result};
use serde::{Deserialize, Serialize};

/// A dense, row-major `ROWS x COLS` grid of transition probabilities.
/// Each row sums to 1.0, or is all zeros when its context was never observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl TransitionMatrix {
    pub fn zeros() -> Self {
        Self { rows: ROWS, cols: COLS, values: vec![0.0; ROWS * COLS] }
    }

    /// Row-normalizes raw counts. Rows without observations stay at zero.
    fn from_counts(counts: &[u32]) -> Self {
        let mut matrix = Self::zeros();
        for (row, chunk) in counts.chunks_exact(COLS).enumerate() {
            let total: u64 = chunk.iter().map(|&c| u64::from(c)).sum();
            if total == 0 {
                continue;
            }
            let out = &mut matrix.values[row * COLS..(row + 1) * COLS];
            for (slot, &count) in out.iter_mut().zip(chunk) {
                *slot = f64::from(count) / total as f64;
            }
        }
        matrix
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }

    pub fn row_sum(&self, row: usize) -> f64 {
        self.row(row).iter().sum()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn nonzero_count(&self) -> usize {
        self.values.iter().filter(|&&v| v != 0.0).count()
    }

    /// Whether the shape matches the fixed encoder dimensions.
    pub fn has_expected_shape(&self) -> bool {
        self.rows == ROWS && self.cols == COLS && self.values.len() == ROWS * COLS
    }
}

/// Accumulates triad counts for one file and normalizes them at the end.
pub struct MatrixBuilder<'t> {
    tables: &'t IndexTables,
    counts: Vec<u32>,
    fallback_columns: usize,
}

impl<'t> MatrixBuilder<'t> {
    pub fn new(tables: &'t IndexTables) -> Self {
        Self { tables, counts: vec![0; ROWS * COLS], fallback_columns: 0 }
    }

    /// Counts one triad. Fails when its context has no row; the tables are
    /// expected to cover every context of the target grammar.
    pub fn add(&mut self, triad: &Triad, dictionary: &TypeDictionary) -> Result<()> {
        let row = self
            .tables
            .context_row(&triad.grandparent, &triad.parent)
            .ok_or_else(|| EncodeError::MissingContext {
                context: format!("{}{}{}", triad.grandparent, DEFAULT_CONTEXT_SEPARATOR, triad.parent),
            })?;
        let col = self.column(&triad.node, dictionary);
        self.counts[row * COLS + col] += 1;
        Ok(())
    }

    /// Node type first, then the category of the token's literal, then the
    /// `"Null"` slot.
    fn column(&mut self, token: &str, dictionary: &TypeDictionary) -> usize {
        if let Some(col) = self.tables.node_type_column(token) {
            return col;
        }
        if let Some(col) = dictionary.get(token).and_then(|category| self.tables.category_column(category)) {
            return col;
        }
        self.fallback_columns += 1;
        tracing::debug!(token, "no column for token; using the Null slot");
        NULL_COLUMN
    }

    pub fn fallback_columns(&self) -> usize {
        self.fallback_columns
    }

    pub fn finish(self) -> TransitionMatrix {
        TransitionMatrix::from_counts(&self.counts)
    }
}

/// Builds the normalized transition matrix of a triad list.
pub fn build_matrix<'a, I>(triads: I, dictionary: &TypeDictionary, tables: &IndexTables) -> Result<TransitionMatrix>
where
    I: IntoIterator<Item = &'a Triad>,
{
    let mut builder = MatrixBuilder::new(tables);
    for triad in triads {
        builder.add(triad, dictionary)?;
    }
    Ok(builder.finish())
}
