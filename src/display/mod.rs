//! Display formatting for terminal output
//!
//! Plain-text tables and detail views for the CLI.

pub mod account;
pub mod audit;
pub mod receipt;

pub use account::{format_account_details, format_account_list};
pub use audit::{format_audit_details, format_audit_list};
pub use receipt::{format_receipt_details, format_receipt_list};
