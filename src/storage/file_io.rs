//! JSON documents on disk
//!
//! Writes go to a `.json.tmp` sibling that is synced and then renamed over
//! the target, so readers only ever see a complete document.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::LedgerError;

fn storage_error(action: &str, path: &Path, e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Storage(format!("{} {}: {}", action, path.display(), e))
}

/// Load `path`; a file that is not there yet loads as `T::default()`
pub fn read_json<T, P>(path: P) -> Result<T, LedgerError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(storage_error("Cannot open", path, e)),
    };

    serde_json::from_reader(BufReader::new(file)).map_err(|e| storage_error("Cannot parse", path, e))
}

/// Replace `path` with `data`, creating parent directories as needed
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), LedgerError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| storage_error("Cannot create", parent, e))?;
    }

    let staged = staging_path(path);
    let result = write_staged(&staged, data)
        .and_then(|()| fs::rename(&staged, path).map_err(|e| storage_error("Cannot replace", path, e)));
    if result.is_err() {
        let _ = fs::remove_file(&staged);
    }
    result
}

// Sibling of the target so the rename stays on one filesystem
fn staging_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

fn write_staged<T: Serialize>(staged: &Path, data: &T) -> Result<(), LedgerError> {
    let mut writer = BufWriter::new(
        File::create(staged).map_err(|e| storage_error("Cannot create", staged, e))?,
    );
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| storage_error("Cannot serialize", staged, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| storage_error("Cannot flush", staged, e.into_error()))?;
    file.sync_all()
        .map_err(|e| storage_error("Cannot sync", staged, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Document {
        rows: Vec<String>,
        version: u32,
    }

    #[test]
    fn test_read_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let doc: Document = read_json(temp_dir.path().join("missing.json")).unwrap();
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("ledger.json");
        let doc = Document {
            rows: vec!["a".into(), "b".into()],
            version: 1,
        };

        write_json_atomic(&path, &doc).unwrap();
        assert!(!staging_path(&path).exists());

        let loaded: Document = read_json(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_corrupt_file_is_a_storage_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.json");
        fs::write(&path, "{ not json").unwrap();

        let err = read_json::<Document, _>(&path).unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
    }

    #[test]
    fn test_failed_replace_leaves_no_staging_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), "x").unwrap();

        let err = write_json_atomic(&path, &Document::default()).unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
        assert!(!staging_path(&path).exists());
        assert!(path.is_dir());
    }
}
