//! In-memory tables and the persisted ledger document
//!
//! `Tables` is what the store holds behind its lock: one insertion-ordered
//! map per entity type. `LedgerDocument` is the on-disk shape of the same
//! data, one array per table.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::unit_of_work::{Tracked, TrackedEntry};
use crate::audit::{Auditable, AuditLogEntity};
use crate::models::{
    Account, AccountId, AuditLogId, Receipt, ReceiptId, ReceiptItem, ReceiptItemId, RecordId,
    Transaction, TransactionId,
};

/// Version written into new ledger documents
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

fn current_schema_version() -> u32 {
    CURRENT_SCHEMA_VERSION
}

/// Serialized form of the whole ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerDocument {
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub receipts: Vec<Receipt>,
    #[serde(default)]
    pub receipt_items: Vec<ReceiptItem>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub audit_logs: Vec<AuditLogEntity>,
}

impl Default for LedgerDocument {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            accounts: Vec::new(),
            receipts: Vec::new(),
            receipt_items: Vec::new(),
            transactions: Vec::new(),
            audit_logs: Vec::new(),
        }
    }
}

impl LedgerDocument {
    /// Total number of rows across all tables
    pub fn row_count(&self) -> usize {
        self.accounts.len()
            + self.receipts.len()
            + self.receipt_items.len()
            + self.transactions.len()
            + self.audit_logs.len()
    }
}

/// Live tables, keyed by primary key in insertion order
#[derive(Debug, Clone)]
pub struct Tables {
    pub schema_version: u32,
    pub accounts: IndexMap<AccountId, Account>,
    pub receipts: IndexMap<ReceiptId, Receipt>,
    pub receipt_items: IndexMap<ReceiptItemId, ReceiptItem>,
    pub transactions: IndexMap<TransactionId, Transaction>,
    pub audit_logs: IndexMap<AuditLogId, AuditLogEntity>,
}

impl Default for Tables {
    fn default() -> Self {
        Self::from_document(LedgerDocument::default())
    }
}

impl Tables {
    pub fn from_document(document: LedgerDocument) -> Self {
        Self {
            schema_version: document.schema_version,
            accounts: document.accounts.into_iter().map(|a| (a.id, a)).collect(),
            receipts: document.receipts.into_iter().map(|r| (r.id, r)).collect(),
            receipt_items: document
                .receipt_items
                .into_iter()
                .map(|i| (i.id, i))
                .collect(),
            transactions: document
                .transactions
                .into_iter()
                .map(|t| (t.id, t))
                .collect(),
            audit_logs: document.audit_logs.into_iter().map(|l| (l.id, l)).collect(),
        }
    }

    pub fn to_document(&self) -> LedgerDocument {
        LedgerDocument {
            schema_version: self.schema_version,
            accounts: self.accounts.values().cloned().collect(),
            receipts: self.receipts.values().cloned().collect(),
            receipt_items: self.receipt_items.values().cloned().collect(),
            transactions: self.transactions.values().cloned().collect(),
            audit_logs: self.audit_logs.values().cloned().collect(),
        }
    }
}

/// A stored, audited row type
pub trait Entity: Auditable + Clone + PartialEq + Send + Sync {
    type Id: RecordId;

    /// `false` for append-only rows
    const MUTABLE: bool = true;

    fn id(&self) -> Self::Id;
    fn set_id(&mut self, id: Self::Id);

    fn table(tables: &Tables) -> &IndexMap<Self::Id, Self>;
    fn table_mut(tables: &mut Tables) -> &mut IndexMap<Self::Id, Self>;

    fn into_entry(tracked: Tracked<Self>) -> TrackedEntry;
    fn as_tracked(entry: &TrackedEntry) -> Option<&Tracked<Self>>;
    fn as_tracked_mut(entry: &mut TrackedEntry) -> Option<&mut Tracked<Self>>;
}

macro_rules! impl_entity {
    ($entity:ty, $id:ty, $table:ident, $variant:ident $(, mutable = $mutable:expr)?) => {
        impl Entity for $entity {
            type Id = $id;
            $(const MUTABLE: bool = $mutable;)?

            fn id(&self) -> Self::Id {
                self.id
            }

            fn set_id(&mut self, id: Self::Id) {
                self.id = id;
            }

            fn table(tables: &Tables) -> &IndexMap<Self::Id, Self> {
                &tables.$table
            }

            fn table_mut(tables: &mut Tables) -> &mut IndexMap<Self::Id, Self> {
                &mut tables.$table
            }

            fn into_entry(tracked: Tracked<Self>) -> TrackedEntry {
                TrackedEntry::$variant(tracked)
            }

            fn as_tracked(entry: &TrackedEntry) -> Option<&Tracked<Self>> {
                match entry {
                    TrackedEntry::$variant(tracked) => Some(tracked),
                    _ => None,
                }
            }

            fn as_tracked_mut(entry: &mut TrackedEntry) -> Option<&mut Tracked<Self>> {
                match entry {
                    TrackedEntry::$variant(tracked) => Some(tracked),
                    _ => None,
                }
            }
        }
    };
}

impl_entity!(Account, AccountId, accounts, Account);
impl_entity!(Receipt, ReceiptId, receipts, Receipt);
impl_entity!(ReceiptItem, ReceiptItemId, receipt_items, ReceiptItem);
impl_entity!(Transaction, TransactionId, transactions, Transaction);
impl_entity!(AuditLogEntity, AuditLogId, audit_logs, AuditLog, mutable = false);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_round_trip_keeps_order() {
        let mut tables = Tables::default();
        for code in ["B", "A", "C"] {
            let mut account = Account::new(code, format!("Account {}", code));
            account.id = AccountId::new();
            tables.accounts.insert(account.id, account);
        }

        let document = tables.to_document();
        let codes: Vec<_> = document
            .accounts
            .iter()
            .map(|a| a.account_code.as_str())
            .collect();
        assert_eq!(codes, vec!["B", "A", "C"]);

        let restored = Tables::from_document(document.clone());
        assert_eq!(restored.to_document(), document);
    }

    #[test]
    fn test_missing_arrays_default_to_empty() {
        let document: LedgerDocument = serde_json::from_str("{}").unwrap();
        assert_eq!(document.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(document.row_count(), 0);
    }

    #[test]
    fn test_audit_log_is_not_mutable() {
        assert!(Account::MUTABLE);
        assert!(!AuditLogEntity::MUTABLE);
    }
}
