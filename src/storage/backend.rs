//! Persistence backends
//!
//! A backend stores the whole [`LedgerDocument`] in one operation. The
//! store calls `persist` exactly once per commit, so a backend that writes
//! atomically makes every commit all-or-nothing.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::file_io::{read_json, write_json_atomic};
use super::tables::LedgerDocument;
use crate::error::{LedgerError, LedgerResult};

pub trait Backend: Send + Sync {
    /// Load the current document, or an empty one if nothing is stored yet
    fn load(&self) -> LedgerResult<LedgerDocument>;

    /// Replace the stored document
    fn persist(&self, document: &LedgerDocument) -> LedgerResult<()>;

    /// Human-readable location, for logs and `config` output
    fn describe(&self) -> String;
}

/// `ledger.json` on disk, replaced atomically on every commit
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for JsonFileBackend {
    fn load(&self) -> LedgerResult<LedgerDocument> {
        let document: LedgerDocument = read_json(&self.path)?;
        debug!(
            path = %self.path.display(),
            rows = document.row_count(),
            "Loaded ledger document"
        );
        Ok(document)
    }

    fn persist(&self, document: &LedgerDocument) -> LedgerResult<()> {
        write_json_atomic(&self.path, document)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Process-local backend for tests and throwaway ledgers
#[derive(Default)]
pub struct MemoryBackend {
    document: Mutex<LedgerDocument>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: LedgerDocument) -> Self {
        Self {
            document: Mutex::new(document),
        }
    }

    /// Copy of what was last persisted
    pub fn snapshot(&self) -> LedgerResult<LedgerDocument> {
        let document = self
            .document
            .lock()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire lock: {}", e)))?;
        Ok(document.clone())
    }
}

impl Backend for MemoryBackend {
    fn load(&self) -> LedgerResult<LedgerDocument> {
        self.snapshot()
    }

    fn persist(&self, document: &LedgerDocument) -> LedgerResult<()> {
        let mut stored = self
            .document
            .lock()
            .map_err(|e| LedgerError::Storage(format!("Failed to acquire lock: {}", e)))?;
        *stored = document.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Account;
    use tempfile::TempDir;

    #[test]
    fn test_json_backend_missing_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::new(temp_dir.path().join("ledger.json"));
        assert_eq!(backend.load().unwrap(), LedgerDocument::default());
    }

    #[test]
    fn test_json_backend_persists() {
        let temp_dir = TempDir::new().unwrap();
        let backend = JsonFileBackend::new(temp_dir.path().join("data").join("ledger.json"));

        let mut document = LedgerDocument::default();
        document.accounts.push(Account::new("ACC001", "Checking"));
        backend.persist(&document).unwrap();

        assert_eq!(backend.load().unwrap(), document);
        assert!(backend.describe().ends_with("ledger.json"));
    }

    #[test]
    fn test_memory_backend() {
        let backend = MemoryBackend::new();
        let mut document = LedgerDocument::default();
        document.accounts.push(Account::new("ACC001", "Checking"));

        backend.persist(&document).unwrap();
        assert_eq!(backend.load().unwrap().accounts.len(), 1);
    }
}
