//! The ledger store
//!
//! Holds every table in memory behind one `RwLock` and persists them through
//! a [`Backend`]. All writes go through a [`UnitOfWork`]; the write lock is
//! the store's transaction.

use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::backend::{Backend, JsonFileBackend, MemoryBackend};
use super::tables::{Entity, Tables};
use super::unit_of_work::UnitOfWork;
use crate::audit::{AuditLogEntity, AuditQuery};
use crate::config::paths::LedgerPaths;
use crate::error::{LedgerError, LedgerResult};

pub struct Ledger {
    backend: Box<dyn Backend>,
    tables: RwLock<Tables>,
}

impl Ledger {
    /// Open the ledger document under the configured data directory
    pub fn open(paths: &LedgerPaths) -> LedgerResult<Self> {
        paths.ensure_directories()?;
        Self::open_path(paths.ledger_file())
    }

    /// Open (or start) a ledger document at an explicit path
    pub fn open_path(path: impl Into<PathBuf>) -> LedgerResult<Self> {
        Self::with_backend(Box::new(JsonFileBackend::new(path)))
    }

    /// Empty ledger that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            backend: Box::new(MemoryBackend::new()),
            tables: RwLock::new(Tables::default()),
        }
    }

    pub fn with_backend(backend: Box<dyn Backend>) -> LedgerResult<Self> {
        let document = backend.load()?;
        info!(
            location = %backend.describe(),
            rows = document.row_count(),
            "Opened ledger"
        );
        Ok(Self {
            backend,
            tables: RwLock::new(Tables::from_document(document)),
        })
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    /// Start a unit of work against this ledger
    pub fn begin(&self) -> UnitOfWork<'_> {
        UnitOfWork::new(self)
    }

    pub fn get<T: Entity>(&self, id: T::Id) -> LedgerResult<Option<T>> {
        let tables = self.read_tables()?;
        Ok(T::table(&tables).get(&id).cloned())
    }

    /// All rows of `T` in insertion order
    pub fn list<T: Entity>(&self) -> LedgerResult<Vec<T>> {
        let tables = self.read_tables()?;
        Ok(T::table(&tables).values().cloned().collect())
    }

    /// Rows of `T` matching `predicate`, in insertion order
    pub fn find<T, P>(&self, predicate: P) -> LedgerResult<Vec<T>>
    where
        T: Entity,
        P: Fn(&T) -> bool,
    {
        let tables = self.read_tables()?;
        Ok(T::table(&tables)
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect())
    }

    pub fn count<T: Entity>(&self) -> LedgerResult<usize> {
        let tables = self.read_tables()?;
        Ok(T::table(&tables).len())
    }

    /// Every stored audit record, oldest first
    pub fn audit_logs(&self) -> LedgerResult<Vec<AuditLogEntity>> {
        self.list::<AuditLogEntity>()
    }

    /// Read-only audit lookups
    pub fn audit(&self) -> AuditQuery<'_> {
        AuditQuery::new(self)
    }

    /// Delete audit records older than `cutoff`
    ///
    /// This is the retention boundary: it writes directly, outside any unit
    /// of work, so purging is never itself audited.
    pub fn purge_audit_older_than(&self, cutoff: DateTime<Utc>) -> LedgerResult<usize> {
        let mut live = self.write_tables()?;
        let mut working = live.clone();

        let before = working.audit_logs.len();
        working.audit_logs.retain(|_, record| record.changed_at >= cutoff);
        let purged = before - working.audit_logs.len();

        if purged == 0 {
            return Ok(0);
        }

        self.backend.persist(&working.to_document())?;
        *live = working;

        info!(purged, cutoff = %cutoff, "Purged aged audit records");
        Ok(purged)
    }

    pub(crate) fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub(crate) fn read_tables(&self) -> LedgerResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|e| {
            warn!("Ledger lock poisoned");
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })
    }

    pub(crate) fn write_tables(&self) -> LedgerResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|e| {
            warn!("Ledger lock poisoned");
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::ActorContext;
    use crate::models::Account;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_data_directory() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let ledger = Ledger::open(&paths).unwrap();

        assert!(temp_dir.path().join("data").exists());
        assert!(ledger.describe().ends_with("ledger.json"));
        assert_eq!(ledger.count::<Account>().unwrap(), 0);
    }

    #[test]
    fn test_commit_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.json");

        {
            let ledger = Ledger::open_path(&path).unwrap();
            let mut uow = ledger.begin();
            uow.add(Account::new("ACC001", "Checking"));
            uow.commit(&ActorContext::user("u1")).unwrap();
        }

        let reopened = Ledger::open_path(&path).unwrap();
        assert_eq!(reopened.list::<Account>().unwrap().len(), 1);
        assert_eq!(reopened.audit_logs().unwrap().len(), 1);
    }

    #[test]
    fn test_find_filters_rows() {
        let ledger = Ledger::in_memory();
        let mut uow = ledger.begin();
        uow.add(Account::new("ACC001", "Checking"));
        uow.add(Account::new("ACC002", "Savings"));
        uow.commit(&ActorContext::anonymous()).unwrap();

        let found = ledger
            .find::<Account, _>(|a| a.account_code == "ACC002")
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Savings");
    }

    #[test]
    fn test_purge_keeps_recent_records() {
        let ledger = Ledger::in_memory();
        let mut uow = ledger.begin();
        uow.add(Account::new("ACC001", "Checking"));
        uow.commit(&ActorContext::anonymous()).unwrap();

        let purged = ledger
            .purge_audit_older_than(Utc::now() - Duration::days(1))
            .unwrap();
        assert_eq!(purged, 0);
        assert_eq!(ledger.audit_logs().unwrap().len(), 1);

        let purged = ledger
            .purge_audit_older_than(Utc::now() + Duration::seconds(1))
            .unwrap();
        assert_eq!(purged, 1);
        assert!(ledger.audit_logs().unwrap().is_empty());
    }
}
