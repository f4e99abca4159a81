//! Storage layer for the receipts ledger
//!
//! A single transactional store: in-memory tables behind a lock, persisted
//! as one JSON document with atomic writes. Writes go through a
//! [`UnitOfWork`], whose commit also records the audit trail.

pub mod backend;
pub mod file_io;
pub mod ledger;
pub mod tables;
pub mod unit_of_work;

pub use backend::{Backend, JsonFileBackend, MemoryBackend};
pub use file_io::{read_json, write_json_atomic};
pub use ledger::Ledger;
pub use tables::{Entity, LedgerDocument, Tables, CURRENT_SCHEMA_VERSION};
pub use unit_of_work::{Added, CommitSummary, Tracked, TrackedEntry, UnitOfWork};
