//! Transaction model
//!
//! Posts a receipt's amount against an account.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, ReceiptId, TransactionId};
use super::money::Money;
use crate::audit::{Auditable, FieldDescriptor, SoftDelete};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub receipt_id: ReceiptId,
    pub account_id: AccountId,

    /// Amount charged to the account (negative for refunds)
    pub amount: Money,

    pub date: NaiveDate,

    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(receipt_id: ReceiptId, account_id: AccountId, amount: Money, date: NaiveDate) -> Self {
        Self {
            id: TransactionId::pending(),
            receipt_id,
            account_id,
            amount,
            date,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Auditable for Transaction {
    const ENTITY_TYPE: &'static str = "Transaction";
    const FIELDS: &'static [FieldDescriptor<Self>] = &[
        FieldDescriptor {
            name: "ReceiptId",
            read: |t: &Transaction| (*t.receipt_id.as_uuid()).into(),
        },
        FieldDescriptor {
            name: "AccountId",
            read: |t: &Transaction| (*t.account_id.as_uuid()).into(),
        },
        FieldDescriptor {
            name: "Amount",
            read: |t: &Transaction| t.amount.into(),
        },
        FieldDescriptor {
            name: "Date",
            read: |t: &Transaction| t.date.into(),
        },
        FieldDescriptor {
            name: "DeletedAt",
            read: |t: &Transaction| t.deleted_at.into(),
        },
    ];
    const SOFT_DELETE: SoftDelete = SoftDelete::NullableMarker("DeletedAt");
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.date.format("%Y-%m-%d"), self.account_id, self.amount)
    }
}
