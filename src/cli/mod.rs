//! CLI command handlers
//!
//! Bridges clap argument parsing with the service layer and audit queries.

pub mod account;
pub mod audit;
pub mod receipt;

pub use account::{handle_account_command, AccountCommands};
pub use audit::{handle_audit_command, AuditCommands};
pub use receipt::{handle_receipt_command, ReceiptCommands};
