// File: src/corpus.rs
use crate::core::engine::MarkovEncoder;
use crate::core::types::EncodeStats;
use crate::error::{EncodeError, Result};
use crate::frontend::SyntaxFrontend;
use crate::persistence::{unit_key, MatrixStore};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extension of pre-parsed unit files.
pub const DEFAULT_UNIT_EXTENSION: &str = "json";

/// Worker stack reserved per level of input nesting the frontend admits.
const STACK_BYTES_PER_LEVEL: usize = 16 * 1024;
const MIN_WORKER_STACK: usize = 8 * 1024 * 1024;

/// Recursively lists the files under `root` whose extension is `extension`,
/// sorted by path. Unreadable entries are logged and skipped.
pub fn discover(root: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable corpus entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();
    files.sort();
    files
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    pub path: PathBuf,
    pub key: String,
    pub stored: PathBuf,
    pub stats: EncodeStats,
}

#[derive(Debug)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: EncodeError,
}

/// Per-file results of a batch, each list sorted by path.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub encoded: Vec<EncodedFile>,
    pub failed: Vec<FailedFile>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.encoded.len() + self.failed.len()
    }

    /// Files that failed because the index tables lack a context.
    pub fn coverage_gaps(&self) -> usize {
        self.failed.iter().filter(|f| f.error.is_coverage_gap()).count()
    }
}

/// Reads, encodes and stores every file of a corpus.
pub struct CorpusEncoder<F> {
    encoder: MarkovEncoder,
    frontend: F,
    store: MatrixStore,
    unit_extension: String,
}

impl<F: SyntaxFrontend> CorpusEncoder<F> {
    pub fn new(encoder: MarkovEncoder, frontend: F, store: MatrixStore) -> Self {
        Self { encoder, frontend, store, unit_extension: DEFAULT_UNIT_EXTENSION.to_string() }
    }

    /// Extension stripped from unit file names before the source name is keyed.
    pub fn with_unit_extension(mut self, extension: impl Into<String>) -> Self {
        self.unit_extension = extension.into();
        self
    }

    pub fn store(&self) -> &MatrixStore {
        &self.store
    }

    /// Encodes one file and stores its matrix under the file's key. Runs on the
    /// calling thread's stack; [`run`](Self::run) sizes worker stacks for deep units.
    pub fn encode_file(&self, path: &Path) -> Result<EncodedFile> {
        let key = unit_key(path, &self.unit_extension)
            .ok_or_else(|| EncodeError::Ingest(format!("no output key for {}", path.display())))?;
        let text = fs::read_to_string(path)?;
        let unit = self.frontend.load(&text)?;
        let encoding = self.encoder.encode(&unit)?;
        let stored = self.store.save(&key, &encoding.matrix)?;
        Ok(EncodedFile { path: path.to_path_buf(), key, stored, stats: encoding.stats })
    }

    /// Stack for pool workers, large enough for the deepest input the
    /// frontend accepts.
    fn worker_stack_size(&self) -> Option<usize> {
        self.frontend
            .nesting_limit()
            .map(|levels| levels.saturating_mul(STACK_BYTES_PER_LEVEL).max(MIN_WORKER_STACK))
    }

    /// Splits off files whose key another file of the batch also maps to.
    /// Every claimant of a shared key fails; none of them is stored.
    fn split_duplicate_keys<'p>(&self, paths: &'p [PathBuf]) -> (Vec<&'p PathBuf>, Vec<FailedFile>) {
        let mut claims: HashMap<String, Vec<&PathBuf>> = HashMap::new();
        let mut pending = Vec::with_capacity(paths.len());
        for path in paths {
            match unit_key(path, &self.unit_extension) {
                Some(key) => claims.entry(key).or_default().push(path),
                // encode_file reports these
                None => pending.push(path),
            }
        }

        let mut clashes = Vec::new();
        for (key, claimants) in claims {
            if let [only] = claimants.as_slice() {
                pending.push(*only);
                continue;
            }
            for (i, path) in claimants.iter().enumerate() {
                let other = claimants[(i + 1) % claimants.len()].to_path_buf();
                clashes.push(FailedFile {
                    path: path.to_path_buf(),
                    error: EncodeError::DuplicateKey { key: key.clone(), other },
                });
            }
        }
        (pending, clashes)
    }

    /// Encodes `paths` on a dedicated pool of `threads` workers (one per core
    /// when `None`). A failing file is reported and never stops the others.
    pub fn run(&self, paths: &[PathBuf], threads: Option<usize>) -> Result<BatchReport> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = threads {
            builder = builder.num_threads(threads.max(1));
        }
        if let Some(stack) = self.worker_stack_size() {
            builder = builder.stack_size(stack);
        }
        let pool = builder
            .build()
            .map_err(|e| EncodeError::Config(format!("cannot start worker pool: {e}")))?;
        tracing::info!(files = paths.len(), threads = pool.current_num_threads(), "encoding corpus");

        let (pending, clashes) = self.split_duplicate_keys(paths);
        let outcomes: Vec<(PathBuf, Result<EncodedFile>)> = pool.install(|| {
            pending
                .par_iter()
                .map(|path| (path.to_path_buf(), self.encode_file(path)))
                .collect()
        });

        let mut report = BatchReport::default();
        let clashes = clashes.into_iter().map(|failed| (failed.path, Err(failed.error)));
        for (path, outcome) in outcomes.into_iter().chain(clashes) {
            match outcome {
                Ok(encoded) => report.encoded.push(encoded),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "file not encoded");
                    report.failed.push(FailedFile { path, error });
                }
            }
        }
        report.encoded.sort_by(|a, b| a.path.cmp(&b.path));
        report.failed.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::info!(
            encoded = report.encoded.len(),
            failed = report.failed.len(),
            coverage_gaps = report.coverage_gaps(),
            "corpus encoded"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_matching_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/b/Two.java.json"), "{}").unwrap();
        fs::write(dir.path().join("One.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = discover(dir.path(), "json");
        let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, ["One.json", "Two.java.json"]);
    }
}
