//! Core data models
//!
//! Accounts, receipts, receipt items and transactions, plus the `Money`
//! value object and strongly-typed identifiers.

pub mod account;
pub mod ids;
pub mod money;
pub mod receipt;
pub mod receipt_item;
pub mod transaction;

pub use account::{Account, AccountValidationError};
pub use ids::{AccountId, ApiKeyId, AuditLogId, ReceiptId, ReceiptItemId, RecordId, TransactionId};
pub use money::{Money, MoneyParseError};
pub use receipt::{Receipt, ReceiptValidationError};
pub use receipt_item::ReceiptItem;
pub use transaction::Transaction;
