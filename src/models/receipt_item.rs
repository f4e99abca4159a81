//! Receipt line items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{ReceiptId, ReceiptItemId};
use super::money::Money;
use crate::audit::{Auditable, FieldDescriptor, SoftDelete};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptItem {
    pub id: ReceiptItemId,
    pub receipt_id: ReceiptId,

    /// Merchant's product code
    pub receipt_item_code: String,

    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub category: String,

    #[serde(default)]
    pub sub_category: String,

    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ReceiptItem {
    pub fn new(
        receipt_id: ReceiptId,
        receipt_item_code: impl Into<String>,
        description: impl Into<String>,
        quantity: i64,
        unit_price: Money,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: ReceiptItemId::pending(),
            receipt_id,
            receipt_item_code: receipt_item_code.into(),
            description: description.into(),
            quantity,
            unit_price,
            category: category.into(),
            sub_category: String::new(),
            deleted_at: None,
        }
    }

    pub fn total(&self) -> Money {
        self.unit_price * self.quantity
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.receipt_item_code.trim().is_empty() {
            return Err("Receipt item code cannot be empty".into());
        }
        if self.quantity <= 0 {
            return Err(format!("Quantity must be positive, got {}", self.quantity));
        }
        if self.unit_price.is_negative() {
            return Err("Unit price cannot be negative".into());
        }
        Ok(())
    }
}

impl Auditable for ReceiptItem {
    const ENTITY_TYPE: &'static str = "ReceiptItem";
    const FIELDS: &'static [FieldDescriptor<Self>] = &[
        FieldDescriptor {
            name: "ReceiptId",
            read: |i: &ReceiptItem| (*i.receipt_id.as_uuid()).into(),
        },
        FieldDescriptor {
            name: "ReceiptItemCode",
            read: |i: &ReceiptItem| (&i.receipt_item_code).into(),
        },
        FieldDescriptor {
            name: "Description",
            read: |i: &ReceiptItem| (&i.description).into(),
        },
        FieldDescriptor {
            name: "Quantity",
            read: |i: &ReceiptItem| i.quantity.into(),
        },
        FieldDescriptor {
            name: "UnitPrice",
            read: |i: &ReceiptItem| i.unit_price.into(),
        },
        FieldDescriptor {
            name: "Category",
            read: |i: &ReceiptItem| (&i.category).into(),
        },
        FieldDescriptor {
            name: "SubCategory",
            read: |i: &ReceiptItem| (&i.sub_category).into(),
        },
        FieldDescriptor {
            name: "DeletedAt",
            read: |i: &ReceiptItem| i.deleted_at.into(),
        },
    ];
    const SOFT_DELETE: SoftDelete = SoftDelete::NullableMarker("DeletedAt");
}

impl fmt::Display for ReceiptItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} x{} @ {}",
            self.receipt_item_code, self.description, self.quantity, self.unit_price
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> ReceiptItem {
        ReceiptItem::new(
            ReceiptId::new(),
            "MILK-1L",
            "Milk",
            2,
            Money::from_cents(149),
            "Groceries",
        )
    }

    #[test]
    fn test_total() {
        assert_eq!(item().total(), Money::from_cents(298));
    }

    #[test]
    fn test_validation() {
        assert!(item().validate().is_ok());

        let mut bad = item();
        bad.quantity = 0;
        assert!(bad.validate().is_err());

        let mut bad = item();
        bad.receipt_item_code = String::new();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_receipt_link_is_audited_as_uuid() {
        let item = item();
        let values = item.field_values();
        assert_eq!(values[0].0, "ReceiptId");
        assert_eq!(
            values[0].1.to_change_string(),
            Some(item.receipt_id.key())
        );
    }
}
