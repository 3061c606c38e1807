// File: src/persistence.rs
use crate::core::matrix::TransitionMatrix;
use crate::error::{EncodeError, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Extension of stored matrix files.
pub const MATRIX_EXTENSION: &str = "bin";

/// Derives the storage key of a source file: its base name with the last
/// extension stripped. `src/Foo.java` maps to `Foo`, `Foo.Bar.java` to `Foo.Bar`.
pub fn source_key(path: &Path) -> Option<String> {
    let key = path.file_stem()?.to_str()?;
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

/// Storage key of a pre-parsed unit: the unit extension is stripped when
/// present, then the source name goes through [`source_key`].
/// `units/Foo.java.json` maps to `Foo`, as does a bare `Foo.json`.
pub fn unit_key(path: &Path, unit_extension: &str) -> Option<String> {
    if path.extension().is_some_and(|ext| ext == unit_extension) {
        source_key(Path::new(path.file_stem()?))
    } else {
        source_key(path)
    }
}

/// A directory of matrices keyed by source base name.
#[derive(Debug, Clone)]
pub struct MatrixStore {
    root: PathBuf,
}

impl MatrixStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{MATRIX_EXTENSION}"))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.path_for(key).is_file()
    }

    /// Writes the matrix through a temp file in the same directory and renames
    /// it into place, so readers never see a partial matrix. Overwrites.
    pub fn save(&self, key: &str, matrix: &TransitionMatrix) -> Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(key);

        let temp_file = NamedTempFile::new_in(&self.root)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file());
            bincode::serialize_into(&mut writer, matrix)?;
            writer.flush()?;
        }

        temp_file.persist(&path).map_err(|e| EncodeError::Io(e.error))?;
        tracing::debug!(key, path = %path.display(), "stored matrix");
        Ok(path)
    }

    pub fn load(&self, key: &str) -> Result<TransitionMatrix> {
        let path = self.path_for(key);
        let reader = BufReader::new(File::open(&path)?);
        let matrix: TransitionMatrix = bincode::deserialize_from(reader)?;
        if !matrix.has_expected_shape() {
            return Err(EncodeError::Shape { path, rows: matrix.rows(), cols: matrix.cols() });
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_keys_strip_one_extension() {
        assert_eq!(source_key(Path::new("src/Foo.java")).as_deref(), Some("Foo"));
        assert_eq!(source_key(Path::new("Foo.Bar.java")).as_deref(), Some("Foo.Bar"));
        assert_eq!(source_key(Path::new("Foo.Baz.java")).as_deref(), Some("Foo.Baz"));
        assert_eq!(source_key(Path::new("Bar")).as_deref(), Some("Bar"));
        assert_eq!(source_key(Path::new("/")), None);
    }

    #[test]
    fn unit_keys_strip_the_unit_extension_first() {
        assert_eq!(unit_key(Path::new("units/Foo.java.json"), "json").as_deref(), Some("Foo"));
        assert_eq!(unit_key(Path::new("Foo.Bar.java.json"), "json").as_deref(), Some("Foo.Bar"));
        assert_eq!(unit_key(Path::new("Foo.json"), "json").as_deref(), Some("Foo"));
        assert_eq!(unit_key(Path::new("Foo.java.ast"), "ast").as_deref(), Some("Foo"));
        // Another extension is the source extension.
        assert_eq!(unit_key(Path::new("Foo.java"), "json").as_deref(), Some("Foo"));
        assert_eq!(unit_key(Path::new("/"), "json"), None);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = MatrixStore::new(dir.path().join("npy"));
        assert!(!store.contains("Foo"));

        let matrix = TransitionMatrix::zeros();
        let path = store.save("Foo", &matrix).unwrap();
        assert!(path.ends_with("Foo.bin"));
        assert!(store.contains("Foo"));
        assert_eq!(store.load("Foo").unwrap(), matrix);
    }

    #[test]
    fn missing_matrix_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = MatrixStore::new(dir.path());
        assert!(matches!(store.load("Nope"), Err(EncodeError::Io(_))));
    }
}
