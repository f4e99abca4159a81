//! Receipt service
//!
//! Receipts and their line items. A receipt and its items are created in one
//! commit; soft-deleting a receipt cascades to its live items and
//! transactions with the same timestamp, and restoring undoes exactly that
//! cascade.

use chrono::{DateTime, NaiveDate, Utc};

use super::{receipt_fully_deleted, receipt_is_live, stored};
use crate::audit::ActorContext;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Money, Receipt, ReceiptId, ReceiptItem, ReceiptItemId, Transaction};
use crate::storage::Ledger;

pub struct ReceiptService<'a> {
    ledger: &'a Ledger,
    actor: ActorContext,
}

/// A receipt together with its live items
#[derive(Debug, Clone)]
pub struct ReceiptWithItems {
    pub receipt: Receipt,
    pub items: Vec<ReceiptItem>,
}

impl ReceiptWithItems {
    pub fn items_total(&self) -> Money {
        self.items.iter().map(ReceiptItem::total).sum()
    }

    /// Items plus tax
    pub fn total(&self) -> Money {
        self.items_total() + self.receipt.tax_amount
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReceiptUpdate {
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    pub tax_amount: Option<Money>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
}

impl<'a> ReceiptService<'a> {
    pub fn new(ledger: &'a Ledger, actor: ActorContext) -> Self {
        Self { ledger, actor }
    }

    /// Create a receipt with its items in one commit
    ///
    /// The receipt key is assigned up front so items can reference it; item
    /// keys are generated by the store.
    pub fn create(
        &self,
        mut receipt: Receipt,
        items: Vec<ReceiptItem>,
    ) -> LedgerResult<ReceiptWithItems> {
        receipt
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;
        for item in &items {
            item.validate().map_err(LedgerError::Validation)?;
        }

        if receipt.id.is_pending() {
            receipt.id = ReceiptId::new();
        }
        let receipt_id = receipt.id;

        let mut uow = self.ledger.begin();
        uow.add(receipt);
        let added_items: Vec<_> = items
            .into_iter()
            .map(|mut item| {
                item.receipt_id = receipt_id;
                uow.add(item)
            })
            .collect();
        let summary = uow.commit(&self.actor)?;

        let items = added_items
            .iter()
            .map(|added| stored(self.ledger, &summary, added))
            .collect::<LedgerResult<Vec<_>>>()?;
        let receipt = self
            .get(receipt_id)?
            .ok_or_else(|| LedgerError::receipt_not_found(receipt_id.to_string()))?;

        Ok(ReceiptWithItems { receipt, items })
    }

    /// Add one item to a live receipt
    pub fn add_item(&self, receipt_id: ReceiptId, mut item: ReceiptItem) -> LedgerResult<ReceiptItem> {
        item.receipt_id = receipt_id;
        item.validate().map_err(LedgerError::Validation)?;

        let mut uow = self.ledger.begin();
        uow.guard(receipt_is_live(receipt_id));
        let added = uow.add(item);
        let summary = uow.commit(&self.actor)?;

        stored(self.ledger, &summary, &added)
    }

    /// Soft-delete one item
    pub fn remove_item(&self, item_id: ReceiptItemId) -> LedgerResult<()> {
        let now = Utc::now();
        let mut uow = self.ledger.begin();
        uow.modify::<ReceiptItem, _>(item_id, |item| {
            if item.deleted_at.is_none() {
                item.deleted_at = Some(now);
            }
        })?;
        uow.commit(&self.actor)?;
        Ok(())
    }

    pub fn get(&self, id: ReceiptId) -> LedgerResult<Option<Receipt>> {
        self.ledger.get::<Receipt>(id)
    }

    /// Receipt plus its live items
    pub fn get_with_items(&self, id: ReceiptId) -> LedgerResult<Option<ReceiptWithItems>> {
        let Some(receipt) = self.get(id)? else {
            return Ok(None);
        };
        let items = self.items(id)?;
        Ok(Some(ReceiptWithItems { receipt, items }))
    }

    /// Find a receipt by full UUID or an unambiguous key prefix (`rcp-` form)
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Receipt>> {
        if let Ok(id) = ReceiptId::parse(identifier) {
            return self.get(id);
        }

        let prefix = identifier.strip_prefix("rcp-").unwrap_or(identifier);
        if prefix.len() < 8 {
            return Ok(None);
        }

        let matches = self
            .ledger
            .find::<Receipt, _>(|r| r.id.key().starts_with(prefix))?;
        Ok(if matches.len() == 1 {
            matches.into_iter().next()
        } else {
            None
        })
    }

    pub fn resolve(&self, identifier: &str) -> LedgerResult<Receipt> {
        self.find(identifier)?
            .ok_or_else(|| LedgerError::receipt_not_found(identifier))
    }

    /// Receipts newest first
    pub fn list(&self, include_deleted: bool) -> LedgerResult<Vec<Receipt>> {
        let mut receipts = self
            .ledger
            .find::<Receipt, _>(|r| include_deleted || !r.is_deleted())?;
        receipts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(receipts)
    }

    /// Live items of a receipt, in insertion order
    pub fn items(&self, receipt_id: ReceiptId) -> LedgerResult<Vec<ReceiptItem>> {
        self.ledger
            .find::<ReceiptItem, _>(|i| i.receipt_id == receipt_id && !i.is_deleted())
    }

    pub fn update(&self, id: ReceiptId, changes: ReceiptUpdate) -> LedgerResult<Receipt> {
        let mut receipt = self.live_receipt(id)?;

        if let Some(location) = changes.location {
            receipt.location = location.trim().to_string();
        }
        if let Some(date) = changes.date {
            receipt.date = date;
        }
        if let Some(tax_amount) = changes.tax_amount {
            receipt.tax_amount = tax_amount;
        }
        if let Some(description) = changes.description {
            receipt.description = description;
        }

        receipt
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        let mut uow = self.ledger.begin();
        uow.update(receipt)?;
        uow.commit(&self.actor)?;

        self.get(id)?
            .ok_or_else(|| LedgerError::receipt_not_found(id.to_string()))
    }

    /// Soft-delete a receipt, its live items and its live transactions
    pub fn delete(&self, id: ReceiptId) -> LedgerResult<Receipt> {
        self.live_receipt(id)?;
        let now = Utc::now();

        let mut uow = self.ledger.begin();
        uow.guard(receipt_fully_deleted(id));
        uow.modify::<Receipt, _>(id, |r| r.deleted_at = Some(now))?;
        for item in self.items(id)? {
            uow.modify::<ReceiptItem, _>(item.id, |i| i.deleted_at = Some(now))?;
        }
        for txn in self.live_transactions(id)? {
            uow.modify::<Transaction, _>(txn.id, |t| t.deleted_at = Some(now))?;
        }
        uow.commit(&self.actor)?;

        self.get(id)?
            .ok_or_else(|| LedgerError::receipt_not_found(id.to_string()))
    }

    /// Undo a soft delete, including the rows deleted with it
    pub fn restore(&self, id: ReceiptId) -> LedgerResult<Receipt> {
        let receipt = self
            .get(id)?
            .ok_or_else(|| LedgerError::receipt_not_found(id.to_string()))?;
        let Some(deleted_at) = receipt.deleted_at else {
            return Err(LedgerError::Validation(format!(
                "Receipt '{}' is not deleted",
                receipt
            )));
        };

        let cascaded = |at: Option<DateTime<Utc>>| at == Some(deleted_at);

        let mut uow = self.ledger.begin();
        uow.modify::<Receipt, _>(id, |r| r.deleted_at = None)?;
        for item in self
            .ledger
            .find::<ReceiptItem, _>(|i| i.receipt_id == id && cascaded(i.deleted_at))?
        {
            uow.modify::<ReceiptItem, _>(item.id, |i| i.deleted_at = None)?;
        }
        for txn in self
            .ledger
            .find::<Transaction, _>(|t| t.receipt_id == id && cascaded(t.deleted_at))?
        {
            uow.modify::<Transaction, _>(txn.id, |t| t.deleted_at = None)?;
        }
        uow.commit(&self.actor)?;

        self.get(id)?
            .ok_or_else(|| LedgerError::receipt_not_found(id.to_string()))
    }

    /// Hard-delete a receipt with all of its items and transactions
    pub fn purge(&self, id: ReceiptId) -> LedgerResult<()> {
        let mut uow = self.ledger.begin();
        for item in self.ledger.find::<ReceiptItem, _>(|i| i.receipt_id == id)? {
            uow.remove::<ReceiptItem>(item.id)?;
        }
        for txn in self.ledger.find::<Transaction, _>(|t| t.receipt_id == id)? {
            uow.remove::<Transaction>(txn.id)?;
        }
        uow.remove::<Receipt>(id)?;
        uow.commit(&self.actor)?;
        Ok(())
    }

    fn live_receipt(&self, id: ReceiptId) -> LedgerResult<Receipt> {
        match self.get(id)? {
            Some(receipt) if !receipt.is_deleted() => Ok(receipt),
            Some(receipt) => Err(LedgerError::Validation(format!(
                "Receipt '{}' is deleted",
                receipt
            ))),
            None => Err(LedgerError::receipt_not_found(id.to_string())),
        }
    }

    fn live_transactions(&self, receipt_id: ReceiptId) -> LedgerResult<Vec<Transaction>> {
        self.ledger
            .find::<Transaction, _>(|t| t.receipt_id == receipt_id && !t.is_deleted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditAction;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn item(code: &str, quantity: i64, cents: i64) -> ReceiptItem {
        ReceiptItem::new(
            ReceiptId::pending(),
            code,
            code.to_lowercase(),
            quantity,
            Money::from_cents(cents),
            "Groceries",
        )
    }

    fn create(ledger: &Ledger) -> ReceiptWithItems {
        ReceiptService::new(ledger, ActorContext::user("u1"))
            .create(
                Receipt::new("Corner Market", date(), Money::from_cents(80)),
                vec![item("MILK", 2, 150), item("BREAD", 1, 299)],
            )
            .unwrap()
    }

    #[test]
    fn test_create_with_items_is_one_commit() {
        let ledger = Ledger::in_memory();
        let created = create(&ledger);

        assert_eq!(created.items.len(), 2);
        assert!(created.items.iter().all(|i| i.receipt_id == created.receipt.id));
        assert_eq!(created.items_total(), Money::from_cents(599));
        assert_eq!(created.total(), Money::from_cents(679));

        let records = ledger.audit_logs().unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.action == AuditAction::Create));
        assert!(records
            .windows(2)
            .all(|pair| pair[0].changed_at == pair[1].changed_at));
    }

    #[test]
    fn test_invalid_item_rejects_whole_receipt() {
        let ledger = Ledger::in_memory();
        let service = ReceiptService::new(&ledger, ActorContext::anonymous());

        let err = service
            .create(
                Receipt::new("Shop", date(), Money::zero()),
                vec![item("OK", 1, 100), item("BAD", 0, 100)],
            )
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(ledger.count::<Receipt>().unwrap(), 0);
        assert!(ledger.audit_logs().unwrap().is_empty());
    }

    #[test]
    fn test_delete_cascades_and_restore_undoes_it() {
        let ledger = Ledger::in_memory();
        let created = create(&ledger);
        let service = ReceiptService::new(&ledger, ActorContext::user("u1"));

        service.remove_item(created.items[1].id).unwrap();
        service.delete(created.receipt.id).unwrap();
        assert!(service.items(created.receipt.id).unwrap().is_empty());

        service.restore(created.receipt.id).unwrap();
        let items = service.items(created.receipt.id).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, created.items[0].id);

        let history = ledger
            .audit()
            .get_by_entity("ReceiptItem", &created.items[0].id.key());
        let actions: Vec<_> = history.iter().map(|r| r.action).collect();
        assert_eq!(
            actions,
            vec![AuditAction::Restore, AuditAction::Delete, AuditAction::Create]
        );
    }

    #[test]
    fn test_update_clears_description() {
        let ledger = Ledger::in_memory();
        let service = ReceiptService::new(&ledger, ActorContext::anonymous());
        let created = service
            .create(
                Receipt::new("Shop", date(), Money::zero()).with_description("weekly"),
                Vec::new(),
            )
            .unwrap();

        let updated = service
            .update(
                created.receipt.id,
                ReceiptUpdate {
                    description: Some(None),
                    ..ReceiptUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.description, None);

        let latest = ledger.audit().get_recent(1).remove(0);
        let changes = latest.changes().unwrap();
        assert_eq!(latest.action, AuditAction::Update);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field_name, "Description");
        assert_eq!(changes[0].old_value.as_deref(), Some("weekly"));
        assert_eq!(changes[0].new_value, None);
    }

    #[test]
    fn test_purge_hard_deletes_everything() {
        let ledger = Ledger::in_memory();
        let created = create(&ledger);
        let service = ReceiptService::new(&ledger, ActorContext::anonymous());

        service.purge(created.receipt.id).unwrap();
        assert_eq!(ledger.count::<Receipt>().unwrap(), 0);
        assert_eq!(ledger.count::<ReceiptItem>().unwrap(), 0);

        let deletes = ledger
            .audit_logs()
            .unwrap()
            .into_iter()
            .filter(|r| r.action == AuditAction::Delete)
            .count();
        assert_eq!(deletes, 3);
    }

    #[test]
    fn test_item_rejected_when_receipt_deleted_meanwhile() {
        let ledger = Ledger::in_memory();
        let created = create(&ledger);
        let service = ReceiptService::new(&ledger, ActorContext::user("u1"));

        let mut adding = ledger.begin();
        adding.guard(receipt_is_live(created.receipt.id));
        adding.add(item("EGGS", 1, 350));

        service.delete(created.receipt.id).unwrap();

        let err = adding.commit(&ActorContext::user("u1")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(ledger.list::<ReceiptItem>().unwrap().len(), 2);
    }

    #[test]
    fn test_delete_conflicts_with_item_added_meanwhile() {
        let ledger = Ledger::in_memory();
        let created = create(&ledger);
        let receipt_id = created.receipt.id;

        let mut deleting = ledger.begin();
        deleting.guard(receipt_fully_deleted(receipt_id));
        deleting
            .modify::<Receipt, _>(receipt_id, |r| r.deleted_at = Some(Utc::now()))
            .unwrap();
        for existing in &created.items {
            deleting
                .modify::<ReceiptItem, _>(existing.id, |i| i.deleted_at = Some(Utc::now()))
                .unwrap();
        }

        let mut late = item("EGGS", 1, 350);
        late.receipt_id = receipt_id;
        let mut adding = ledger.begin();
        adding.add(late);
        adding.commit(&ActorContext::user("u1")).unwrap();

        let err = deleting.commit(&ActorContext::user("u1")).unwrap_err();
        assert!(err.is_conflict());
        assert!(!ledger.get::<Receipt>(receipt_id).unwrap().unwrap().is_deleted());
    }
}
