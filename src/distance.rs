// File: src/distance.rs
use crate::core::matrix::TransitionMatrix;
use crate::error::{EncodeError, Result};
use crate::persistence::{source_key, MatrixStore};
use std::fs;
use std::path::Path;

/// Per-row distances between two matrices of the same shape.
/// Row `i` of one matrix is only ever compared with row `i` of the other.
#[derive(Debug, Clone, PartialEq)]
pub struct RowDistances {
    /// `1 - cosine similarity`; a zero row has similarity 0 with anything.
    pub cosine: Vec<f64>,
    pub euclidean: Vec<f64>,
    pub manhattan: Vec<f64>,
    pub chebyshev: Vec<f64>,
}

impl RowDistances {
    /// All four metrics back to back: cosine, euclidean, manhattan, chebyshev.
    pub fn to_features(&self) -> Vec<f64> {
        let mut features = Vec::with_capacity(self.cosine.len() * 4);
        features.extend_from_slice(&self.cosine);
        features.extend_from_slice(&self.euclidean);
        features.extend_from_slice(&self.manhattan);
        features.extend_from_slice(&self.chebyshev);
        features
    }
}

pub fn row_distances(a: &TransitionMatrix, b: &TransitionMatrix) -> RowDistances {
    let rows = a.rows().min(b.rows());
    let mut out = RowDistances {
        cosine: Vec::with_capacity(rows),
        euclidean: Vec::with_capacity(rows),
        manhattan: Vec::with_capacity(rows),
        chebyshev: Vec::with_capacity(rows),
    };

    for row in 0..rows {
        let (x, y) = (a.row(row), b.row(row));
        let (mut dot, mut norm_x, mut norm_y) = (0.0, 0.0, 0.0);
        let (mut squared, mut absolute, mut max) = (0.0, 0.0, 0.0f64);
        for (&p, &q) in x.iter().zip(y) {
            dot += p * q;
            norm_x += p * p;
            norm_y += q * q;
            let diff = (p - q).abs();
            squared += diff * diff;
            absolute += diff;
            max = max.max(diff);
        }
        let similarity = if norm_x == 0.0 || norm_y == 0.0 { 0.0 } else { dot / (norm_x.sqrt() * norm_y.sqrt()) };
        out.cosine.push(1.0 - similarity);
        out.euclidean.push(squared.sqrt());
        out.manhattan.push(absolute);
        out.chebyshev.push(max);
    }
    out
}

/// Reorders features by a ranking; indices past the end are skipped.
pub fn select_features(features: &[f64], order: &[usize]) -> Vec<f64> {
    order.iter().filter_map(|&i| features.get(i).copied()).collect()
}

/// Reads a feature ranking: one entry per line, the feature index in the
/// second whitespace-separated field. Only the first `limit` lines are used.
pub fn load_weight_order(path: &Path, limit: usize) -> Result<Vec<usize>> {
    let text = fs::read_to_string(path)?;
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .take(limit)
        .enumerate()
        .map(|(n, line)| {
            line.split_whitespace()
                .nth(1)
                .and_then(|field| field.parse().ok())
                .ok_or_else(|| EncodeError::Config(format!("weight line {} has no feature index: `{line}`", n + 1)))
        })
        .collect()
}

/// Outcome of a pair-list run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairReport {
    pub written: usize,
    /// Pairs where at least one matrix is not in the store.
    pub skipped: usize,
}

/// Computes distance features for every pair of source names in `pairs_csv`
/// (first two columns, no header) and writes one CSV row per pair whose
/// matrices both exist.
pub fn write_pair_features(
    pairs_csv: &Path,
    store: &MatrixStore,
    order: Option<&[usize]>,
    out_csv: &Path,
) -> Result<PairReport> {
    let mut reader = csv::ReaderBuilder::new().has_headers(false).flexible(true).from_path(pairs_csv)?;
    let mut writer = csv::Writer::from_path(out_csv)?;
    let mut report = PairReport::default();

    for record in reader.records() {
        let record = record?;
        let keys = (
            record.get(0).and_then(|name| source_key(Path::new(name.trim()))),
            record.get(1).and_then(|name| source_key(Path::new(name.trim()))),
        );
        let (Some(left), Some(right)) = keys else {
            report.skipped += 1;
            continue;
        };
        if !store.contains(&left) || !store.contains(&right) {
            tracing::debug!(%left, %right, "pair skipped; matrix not stored");
            report.skipped += 1;
            continue;
        }

        let features = row_distances(&store.load(&left)?, &store.load(&right)?).to_features();
        let row = match order {
            Some(order) => select_features(&features, order),
            None => features,
        };
        writer.serialize(&row)?;
        report.written += 1;
    }

    writer.flush()?;
    tracing::info!(written = report.written, skipped = report.skipped, "wrote distance features");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matrix::build_matrix;
    use crate::core::tables::IndexTables;
    use crate::core::types::{Triad, TypeDictionary, ROWS};

    fn sample_matrix(node: &str) -> TransitionMatrix {
        let tables = IndexTables::new(
            [("A".to_string(), 0), ("B".to_string(), 1)],
            Vec::<(String, usize)>::new(),
            [(("R".to_string(), "A".to_string()), 4)],
        )
        .unwrap();
        build_matrix(&[Triad::new("R", "A", node)], &TypeDictionary::new(), &tables).unwrap()
    }

    #[test]
    fn identical_matrices_are_at_distance_zero() {
        let m = sample_matrix("A");
        let d = row_distances(&m, &m);
        assert_eq!(d.cosine.len(), ROWS);
        assert!(d.cosine[4].abs() < 1e-12);
        // Unobserved rows are zero vectors, so their cosine similarity is 0.
        assert_eq!(d.cosine[0], 1.0);
        assert!(d.euclidean.iter().chain(&d.manhattan).chain(&d.chebyshev).all(|&v| v == 0.0));
    }

    #[test]
    fn disjoint_rows_are_far_apart() {
        let d = row_distances(&sample_matrix("A"), &sample_matrix("B"));
        assert_eq!(d.cosine[4], 1.0);
        assert!((d.euclidean[4] - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(d.manhattan[4], 2.0);
        assert_eq!(d.chebyshev[4], 1.0);
        assert_eq!(d.to_features().len(), ROWS * 4);
    }

    #[test]
    fn selection_skips_out_of_range_indices() {
        let features = [0.5, 1.5, 2.5];
        assert_eq!(select_features(&features, &[2, 9, 0]), vec![2.5, 0.5]);
    }

    #[test]
    fn weight_order_reads_second_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weight.txt");
        fs::write(&path, "f12 12 0.9\nf3 3 0.5\n\nf7 7 0.1\n").unwrap();
        assert_eq!(load_weight_order(&path, 2).unwrap(), vec![12, 3]);
        assert_eq!(load_weight_order(&path, 10).unwrap(), vec![12, 3, 7]);

        fs::write(&path, "broken\n").unwrap();
        assert!(matches!(load_weight_order(&path, 1), Err(EncodeError::Config(_))));
    }

    #[test]
    fn pair_features_skip_missing_matrices() {
        let dir = tempfile::tempdir().unwrap();
        let store = MatrixStore::new(dir.path().join("store"));
        store.save("Foo", &sample_matrix("A")).unwrap();
        store.save("Bar", &sample_matrix("B")).unwrap();

        let pairs = dir.path().join("pairs.csv");
        fs::write(&pairs, "Foo.java,Bar.java\nFoo.java,Missing.java\n").unwrap();
        let out = dir.path().join("features.csv");

        let report = write_pair_features(&pairs, &store, Some(&[4, ROWS + 4][..]), &out).unwrap();
        assert_eq!(report, PairReport { written: 1, skipped: 1 });
        let written = fs::read_to_string(&out).unwrap();
        let values: Vec<f64> = written.trim().split(',').map(|v| v.parse().unwrap()).collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], 1.0);
        assert!((values[1] - 2f64.sqrt()).abs() < 1e-12);
    }
}
