//! Service layer for the receipts ledger
//!
//! Business operations per aggregate. Every write runs through one unit of
//! work committed with the service's actor, so each operation is recorded in
//! the audit trail atomically with its change.

pub mod account;
pub mod receipt;
pub mod transaction;

pub use account::{AccountService, AccountSummary, AccountUpdate};
pub use receipt::{ReceiptService, ReceiptUpdate, ReceiptWithItems};
pub use transaction::TransactionService;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{AccountId, ReceiptId};
use crate::storage::{Added, CommitSummary, Entity, Ledger, Tables};

/// Read back an entity added by a just-committed unit of work
pub(crate) fn stored<T: Entity>(
    ledger: &Ledger,
    summary: &CommitSummary,
    added: &Added<T>,
) -> LedgerResult<T> {
    let id = summary.id_of(added).ok_or_else(|| {
        LedgerError::Storage(format!("{} key was not generated", T::ENTITY_TYPE))
    })?;

    ledger.get::<T>(id)?.ok_or_else(|| LedgerError::NotFound {
        entity_type: T::ENTITY_TYPE,
        identifier: id.to_string(),
    })
}

// Commit guards. Each runs against the tables a commit is about to persist,
// under the write lock.

/// No two live accounts share `account_code` (case-insensitive)
pub(crate) fn unique_live_code(account_code: String) -> impl Fn(&Tables) -> LedgerResult<()> {
    move |tables| {
        let holders = tables
            .accounts
            .values()
            .filter(|a| !a.is_deleted() && a.account_code.eq_ignore_ascii_case(&account_code))
            .count();
        if holders > 1 {
            return Err(LedgerError::Duplicate {
                entity_type: "Account",
                identifier: account_code.clone(),
            });
        }
        Ok(())
    }
}

/// The receipt exists and is not deleted
pub(crate) fn receipt_is_live(receipt_id: ReceiptId) -> impl Fn(&Tables) -> LedgerResult<()> {
    move |tables| match tables.receipts.get(&receipt_id) {
        Some(receipt) if receipt.is_deleted() => Err(LedgerError::Validation(format!(
            "Receipt '{}' is deleted",
            receipt
        ))),
        Some(_) => Ok(()),
        None => Err(LedgerError::receipt_not_found(receipt_id.to_string())),
    }
}

/// The account exists, is not deleted and is active
pub(crate) fn account_is_usable(account_id: AccountId) -> impl Fn(&Tables) -> LedgerResult<()> {
    move |tables| match tables.accounts.get(&account_id) {
        Some(account) if account.is_deleted() => Err(LedgerError::Validation(format!(
            "Account '{}' is deleted",
            account.name
        ))),
        Some(account) if !account.is_active => Err(LedgerError::Validation(format!(
            "Account '{}' is inactive",
            account.name
        ))),
        Some(_) => Ok(()),
        None => Err(LedgerError::account_not_found(account_id.to_string())),
    }
}

/// No transaction, live or deleted, references the account
pub(crate) fn account_unreferenced(account_id: AccountId) -> impl Fn(&Tables) -> LedgerResult<()> {
    move |tables| {
        let referenced = tables
            .transactions
            .values()
            .filter(|t| t.account_id == account_id)
            .count();
        if referenced > 0 {
            return Err(LedgerError::Validation(format!(
                "Account has {} transaction(s) and cannot be purged",
                referenced
            )));
        }
        Ok(())
    }
}

/// A deleted receipt has no live items or transactions left
pub(crate) fn receipt_fully_deleted(receipt_id: ReceiptId) -> impl Fn(&Tables) -> LedgerResult<()> {
    move |tables| {
        let live_items = tables
            .receipt_items
            .values()
            .any(|i| i.receipt_id == receipt_id && !i.is_deleted());
        let live_transactions = tables
            .transactions
            .values()
            .any(|t| t.receipt_id == receipt_id && !t.is_deleted());
        if live_items || live_transactions {
            return Err(LedgerError::Conflict {
                entity_type: "Receipt",
                identifier: receipt_id.key(),
            });
        }
        Ok(())
    }
}
