//! Transaction service
//!
//! Posts receipts against accounts.

use chrono::{NaiveDate, Utc};

use super::{account_is_usable, receipt_is_live, stored};
use crate::audit::ActorContext;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{AccountId, Money, ReceiptId, Transaction, TransactionId};
use crate::storage::Ledger;

pub struct TransactionService<'a> {
    ledger: &'a Ledger,
    actor: ActorContext,
}

impl<'a> TransactionService<'a> {
    pub fn new(ledger: &'a Ledger, actor: ActorContext) -> Self {
        Self { ledger, actor }
    }

    /// Charge `amount` for a receipt to an account
    pub fn create(
        &self,
        receipt_id: ReceiptId,
        account_id: AccountId,
        amount: Money,
        date: NaiveDate,
    ) -> LedgerResult<Transaction> {
        let mut uow = self.ledger.begin();
        uow.guard(receipt_is_live(receipt_id));
        uow.guard(account_is_usable(account_id));
        let added = uow.add(Transaction::new(receipt_id, account_id, amount, date));
        let summary = uow.commit(&self.actor)?;

        stored(self.ledger, &summary, &added)
    }

    pub fn get(&self, id: TransactionId) -> LedgerResult<Option<Transaction>> {
        self.ledger.get::<Transaction>(id)
    }

    pub fn list_by_account(&self, account_id: AccountId) -> LedgerResult<Vec<Transaction>> {
        let mut transactions = self
            .ledger
            .find::<Transaction, _>(|t| t.account_id == account_id && !t.is_deleted())?;
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(transactions)
    }

    pub fn list_by_receipt(&self, receipt_id: ReceiptId) -> LedgerResult<Vec<Transaction>> {
        self.ledger
            .find::<Transaction, _>(|t| t.receipt_id == receipt_id && !t.is_deleted())
    }

    pub fn update_amount(&self, id: TransactionId, amount: Money) -> LedgerResult<Transaction> {
        let mut uow = self.ledger.begin();
        uow.modify::<Transaction, _>(id, |t| t.amount = amount)?;
        uow.commit(&self.actor)?;

        self.get(id)?
            .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))
    }

    /// Move a transaction to another account
    pub fn reassign(&self, id: TransactionId, account_id: AccountId) -> LedgerResult<Transaction> {
        let mut uow = self.ledger.begin();
        uow.guard(account_is_usable(account_id));
        uow.modify::<Transaction, _>(id, |t| t.account_id = account_id)?;
        uow.commit(&self.actor)?;

        self.get(id)?
            .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))
    }

    /// Soft delete
    pub fn delete(&self, id: TransactionId) -> LedgerResult<()> {
        let now = Utc::now();
        let mut uow = self.ledger.begin();
        uow.modify::<Transaction, _>(id, |t| {
            if t.deleted_at.is_none() {
                t.deleted_at = Some(now);
            }
        })?;
        uow.commit(&self.actor)?;
        Ok(())
    }

    pub fn restore(&self, id: TransactionId) -> LedgerResult<()> {
        let mut uow = self.ledger.begin();
        uow.modify::<Transaction, _>(id, |t| t.deleted_at = None)?;
        uow.commit(&self.actor)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditAction;
    use crate::models::{Account, Receipt};
    use crate::services::{AccountService, AccountUpdate, ReceiptService};

    struct Fixture {
        ledger: Ledger,
        account: Account,
        receipt: Receipt,
    }

    fn fixture() -> Fixture {
        let ledger = Ledger::in_memory();
        let actor = ActorContext::user("u1");
        let account = AccountService::new(&ledger, actor.clone())
            .create("ACC001", "Checking")
            .unwrap();
        let receipt = ReceiptService::new(&ledger, actor)
            .create(
                Receipt::new("Shop", NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), Money::zero()),
                Vec::new(),
            )
            .unwrap()
            .receipt;
        Fixture {
            ledger,
            account,
            receipt,
        }
    }

    #[test]
    fn test_create_and_balance() {
        let f = fixture();
        let service = TransactionService::new(&f.ledger, ActorContext::user("u1"));

        let txn = service
            .create(f.receipt.id, f.account.id, Money::from_cents(1250), f.receipt.date)
            .unwrap();
        assert!(!txn.id.is_pending());

        let summary = AccountService::new(&f.ledger, ActorContext::anonymous())
            .get_summary(f.account.clone())
            .unwrap();
        assert_eq!(summary.balance, Money::from_cents(1250));
        assert_eq!(summary.transaction_count, 1);
    }

    #[test]
    fn test_update_amount_records_money_change() {
        let f = fixture();
        let service = TransactionService::new(&f.ledger, ActorContext::user("u1"));
        let txn = service
            .create(f.receipt.id, f.account.id, Money::from_cents(1000), f.receipt.date)
            .unwrap();

        service.update_amount(txn.id, Money::from_cents(1050)).unwrap();

        let history = f.ledger.audit().get_by_entity("Transaction", &txn.id.key());
        assert_eq!(history[0].action, AuditAction::Update);
        let changes = history[0].changes().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field_name, "Amount");
        assert_eq!(changes[0].old_value.as_deref(), Some("10.00"));
        assert_eq!(changes[0].new_value.as_deref(), Some("10.50"));
    }

    #[test]
    fn test_inactive_account_rejected() {
        let f = fixture();
        AccountService::new(&f.ledger, ActorContext::anonymous())
            .update(
                f.account.id,
                AccountUpdate {
                    is_active: Some(false),
                    ..AccountUpdate::default()
                },
            )
            .unwrap();

        let err = TransactionService::new(&f.ledger, ActorContext::anonymous())
            .create(f.receipt.id, f.account.id, Money::from_cents(1), f.receipt.date)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_unknown_receipt_rejected() {
        let f = fixture();
        let err = TransactionService::new(&f.ledger, ActorContext::anonymous())
            .create(ReceiptId::new(), f.account.id, Money::from_cents(1), f.receipt.date)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_and_restore() {
        let f = fixture();
        let service = TransactionService::new(&f.ledger, ActorContext::anonymous());
        let txn = service
            .create(f.receipt.id, f.account.id, Money::from_cents(500), f.receipt.date)
            .unwrap();

        service.delete(txn.id).unwrap();
        assert!(service.list_by_account(f.account.id).unwrap().is_empty());

        service.restore(txn.id).unwrap();
        assert_eq!(service.list_by_receipt(f.receipt.id).unwrap().len(), 1);
    }

    #[test]
    fn test_posting_rejected_when_receipt_deleted_meanwhile() {
        let f = fixture();

        let mut posting = f.ledger.begin();
        posting.guard(receipt_is_live(f.receipt.id));
        posting.guard(account_is_usable(f.account.id));
        posting.add(Transaction::new(
            f.receipt.id,
            f.account.id,
            Money::from_cents(700),
            f.receipt.date,
        ));

        ReceiptService::new(&f.ledger, ActorContext::anonymous())
            .delete(f.receipt.id)
            .unwrap();

        let err = posting.commit(&ActorContext::anonymous()).unwrap_err();
        assert!(err.is_validation());
        assert!(f.ledger.list::<Transaction>().unwrap().is_empty());
    }
}
