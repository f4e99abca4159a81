//! Receipts Ledger - receipts, accounts and transactions with an audit trail
//!
//! Every data-mutating commit is diffed field by field, classified as a
//! create, update, soft delete or restore, and recorded as an immutable,
//! actor-attributed audit record in the same atomic write as the change.
//!
//! # Architecture
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (accounts, receipts, items, transactions)
//! - `audit`: Field descriptors, diff engine, record builder, queries
//! - `storage`: The ledger store and its unit of work
//! - `services`: Business logic layer
//! - `cli`, `display`: Command handlers and terminal formatting
//! - `logging`: `tracing` subscriber setup for the binary
//!
//! # Example
//!
//! ```rust,ignore
//! use receipts_ledger::audit::ActorContext;
//! use receipts_ledger::services::AccountService;
//! use receipts_ledger::storage::Ledger;
//!
//! let ledger = Ledger::in_memory();
//! let accounts = AccountService::new(&ledger, ActorContext::user("u1"));
//! let account = accounts.create("ACC001", "Checking")?;
//!
//! let history = ledger.audit().get_by_entity("Account", &account.id.key());
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{LedgerError, LedgerResult};
