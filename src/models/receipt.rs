//! Receipt model
//!
//! A purchase receipt: where and when it happened plus the tax paid. Line
//! items are separate `ReceiptItem` rows linked by `receipt_id`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ReceiptId;
use super::money::Money;
use crate::audit::{Auditable, FieldDescriptor, SoftDelete};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,

    /// Store or place of purchase
    pub location: String,

    pub date: NaiveDate,

    pub tax_amount: Money,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Receipt {
    pub fn new(location: impl Into<String>, date: NaiveDate, tax_amount: Money) -> Self {
        Self {
            id: ReceiptId::pending(),
            location: location.into(),
            date,
            tax_amount,
            description: None,
            deleted_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn validate(&self) -> Result<(), ReceiptValidationError> {
        if self.location.trim().is_empty() {
            return Err(ReceiptValidationError::EmptyLocation);
        }

        if self.tax_amount.is_negative() {
            return Err(ReceiptValidationError::NegativeTax);
        }

        Ok(())
    }
}

impl Auditable for Receipt {
    const ENTITY_TYPE: &'static str = "Receipt";
    const FIELDS: &'static [FieldDescriptor<Self>] = &[
        FieldDescriptor {
            name: "Location",
            read: |r: &Receipt| (&r.location).into(),
        },
        FieldDescriptor {
            name: "Date",
            read: |r: &Receipt| r.date.into(),
        },
        FieldDescriptor {
            name: "TaxAmount",
            read: |r: &Receipt| r.tax_amount.into(),
        },
        FieldDescriptor {
            name: "Description",
            read: |r: &Receipt| r.description.as_deref().into(),
        },
        FieldDescriptor {
            name: "DeletedAt",
            read: |r: &Receipt| r.deleted_at.into(),
        },
    ];
    const SOFT_DELETE: SoftDelete = SoftDelete::NullableMarker("DeletedAt");
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptValidationError {
    EmptyLocation,
    NegativeTax,
}

impl fmt::Display for ReceiptValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLocation => write!(f, "Receipt location cannot be empty"),
            Self::NegativeTax => write!(f, "Receipt tax amount cannot be negative"),
        }
    }
}

impl std::error::Error for ReceiptValidationError {}
