//! Account model
//!
//! A ledger account that transactions post against. Accounts are
//! soft-deleted through `deleted_at` and can be restored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AccountId;
use crate::audit::{Auditable, FieldDescriptor, SoftDelete};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,

    /// Short business code (e.g. "ACC001"), unique among live accounts
    pub account_code: String,

    pub name: String,

    pub is_active: bool,

    /// Set when the account is soft-deleted
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create a new, active account; the key is generated when it is written
    pub fn new(account_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: AccountId::pending(),
            account_code: account_code.into(),
            name: name.into(),
            is_active: true,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn soft_delete(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }

    pub fn restore(&mut self) {
        self.deleted_at = None;
    }

    pub fn validate(&self) -> Result<(), AccountValidationError> {
        if self.account_code.trim().is_empty() {
            return Err(AccountValidationError::EmptyCode);
        }

        if self.account_code.len() > 20 {
            return Err(AccountValidationError::CodeTooLong(self.account_code.len()));
        }

        if self.name.trim().is_empty() {
            return Err(AccountValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(AccountValidationError::NameTooLong(self.name.len()));
        }

        Ok(())
    }
}

impl Auditable for Account {
    const ENTITY_TYPE: &'static str = "Account";
    const FIELDS: &'static [FieldDescriptor<Self>] = &[
        FieldDescriptor {
            name: "AccountCode",
            read: |a: &Account| (&a.account_code).into(),
        },
        FieldDescriptor {
            name: "Name",
            read: |a: &Account| (&a.name).into(),
        },
        FieldDescriptor {
            name: "IsActive",
            read: |a: &Account| a.is_active.into(),
        },
        FieldDescriptor {
            name: "DeletedAt",
            read: |a: &Account| a.deleted_at.into(),
        },
    ];
    const SOFT_DELETE: SoftDelete = SoftDelete::NullableMarker("DeletedAt");
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.account_code)
    }
}

/// Validation errors for accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyCode,
    CodeTooLong(usize),
    EmptyName,
    NameTooLong(usize),
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCode => write!(f, "Account code cannot be empty"),
            Self::CodeTooLong(len) => {
                write!(f, "Account code too long ({} chars, max 20)", len)
            }
            Self::EmptyName => write!(f, "Account name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Account name too long ({} chars, max 100)", len)
            }
        }
    }
}

impl std::error::Error for AccountValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::FieldValue;

    #[test]
    fn test_new_account() {
        let account = Account::new("ACC001", "Checking");
        assert!(account.id.is_pending());
        assert!(account.is_active);
        assert!(!account.is_deleted());
    }

    #[test]
    fn test_soft_delete_and_restore() {
        let mut account = Account::new("ACC001", "Checking");
        account.soft_delete(Utc::now());
        assert!(account.is_deleted());

        account.restore();
        assert!(!account.is_deleted());
    }

    #[test]
    fn test_validation() {
        let mut account = Account::new("ACC001", "Valid Name");
        assert!(account.validate().is_ok());

        account.name = String::new();
        assert_eq!(account.validate(), Err(AccountValidationError::EmptyName));

        account.name = "a".repeat(101);
        assert!(matches!(
            account.validate(),
            Err(AccountValidationError::NameTooLong(_))
        ));

        account.name = "ok".into();
        account.account_code = " ".into();
        assert_eq!(account.validate(), Err(AccountValidationError::EmptyCode));
    }

    #[test]
    fn test_audited_fields() {
        let account = Account::new("ACC001", "Test Account");
        let values = account.field_values();
        assert_eq!(
            values,
            vec![
                ("AccountCode", FieldValue::Text("ACC001".into())),
                ("Name", FieldValue::Text("Test Account".into())),
                ("IsActive", FieldValue::Bool(true)),
                ("DeletedAt", FieldValue::Null),
            ]
        );
    }

    #[test]
    fn test_display() {
        let account = Account::new("ACC001", "My Checking");
        assert_eq!(format!("{}", account), "My Checking (ACC001)");
    }
}
