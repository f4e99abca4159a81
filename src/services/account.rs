//! Account service
//!
//! Account management: create, edit, soft delete and restore, hard delete,
//! and balances computed from live transactions.

use chrono::Utc;
use tracing::debug;

use super::{account_unreferenced, stored, unique_live_code};
use crate::audit::ActorContext;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Account, AccountId, Money, Transaction};
use crate::storage::Ledger;

/// Service for account management
pub struct AccountService<'a> {
    ledger: &'a Ledger,
    actor: ActorContext,
}

/// An account with its computed balance
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub account: Account,
    /// Sum of live transactions posted to the account
    pub balance: Money,
    pub transaction_count: usize,
}

/// Field changes for [`AccountService::update`]; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub account_code: Option<String>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

impl<'a> AccountService<'a> {
    pub fn new(ledger: &'a Ledger, actor: ActorContext) -> Self {
        Self { ledger, actor }
    }

    /// Create a new account
    pub fn create(&self, account_code: &str, name: &str) -> LedgerResult<Account> {
        let account = Account::new(account_code.trim(), name.trim());
        account
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        self.ensure_code_free(&account.account_code, None)?;

        let mut uow = self.ledger.begin();
        uow.guard(unique_live_code(account.account_code.clone()));
        let added = uow.add(account);
        let summary = uow.commit(&self.actor)?;

        stored(self.ledger, &summary, &added)
    }

    pub fn get(&self, id: AccountId) -> LedgerResult<Option<Account>> {
        self.ledger.get::<Account>(id)
    }

    /// Live account with this code
    pub fn get_by_code(&self, account_code: &str) -> LedgerResult<Option<Account>> {
        Ok(self
            .ledger
            .find::<Account, _>(|a| {
                !a.is_deleted() && a.account_code.eq_ignore_ascii_case(account_code)
            })?
            .into_iter()
            .next())
    }

    /// Find an account by code or ID string (full UUID or `acc-` prefix form)
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Account>> {
        if let Some(account) = self.get_by_code(identifier)? {
            return Ok(Some(account));
        }

        if let Ok(id) = identifier.parse::<AccountId>() {
            return self.get(id);
        }

        let prefix = identifier.strip_prefix("acc-").unwrap_or(identifier);
        if prefix.len() >= 8 {
            let matches = self
                .ledger
                .find::<Account, _>(|a| a.id.key().starts_with(prefix))?;
            if matches.len() == 1 {
                return Ok(matches.into_iter().next());
            }
        }

        // Deleted accounts release their code; the newest holder wins
        Ok(self
            .ledger
            .find::<Account, _>(|a| a.account_code.eq_ignore_ascii_case(identifier))?
            .pop())
    }

    /// Resolve an identifier or fail with `NotFound`
    pub fn resolve(&self, identifier: &str) -> LedgerResult<Account> {
        self.find(identifier)?
            .ok_or_else(|| LedgerError::account_not_found(identifier))
    }

    pub fn list(&self, include_deleted: bool) -> LedgerResult<Vec<Account>> {
        let mut accounts = self
            .ledger
            .find::<Account, _>(|a| include_deleted || !a.is_deleted())?;
        accounts.sort_by(|a, b| a.account_code.cmp(&b.account_code));
        Ok(accounts)
    }

    pub fn list_with_balances(&self, include_deleted: bool) -> LedgerResult<Vec<AccountSummary>> {
        self.list(include_deleted)?
            .into_iter()
            .map(|account| self.get_summary(account))
            .collect()
    }

    pub fn get_summary(&self, account: Account) -> LedgerResult<AccountSummary> {
        let transactions = self
            .ledger
            .find::<Transaction, _>(|t| t.account_id == account.id && !t.is_deleted())?;

        Ok(AccountSummary {
            balance: transactions.iter().map(|t| t.amount).sum(),
            transaction_count: transactions.len(),
            account,
        })
    }

    /// Apply `changes`; unchanged values produce no audit record
    pub fn update(&self, id: AccountId, changes: AccountUpdate) -> LedgerResult<Account> {
        let mut account = self
            .get(id)?
            .ok_or_else(|| LedgerError::account_not_found(id.to_string()))?;

        if let Some(code) = changes.account_code {
            let code = code.trim().to_string();
            if !code.eq_ignore_ascii_case(&account.account_code) {
                self.ensure_code_free(&code, Some(id))?;
            }
            account.account_code = code;
        }
        if let Some(name) = changes.name {
            account.name = name.trim().to_string();
        }
        if let Some(is_active) = changes.is_active {
            account.is_active = is_active;
        }

        account
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        let mut uow = self.ledger.begin();
        uow.guard(unique_live_code(account.account_code.clone()));
        uow.update(account)?;
        let summary = uow.commit(&self.actor)?;
        debug!(account = %id, audit_records = summary.audit_records, "Account updated");

        self.get(id)?
            .ok_or_else(|| LedgerError::account_not_found(id.to_string()))
    }

    /// Soft delete: sets `deleted_at`
    pub fn delete(&self, id: AccountId) -> LedgerResult<Account> {
        let account = self
            .get(id)?
            .ok_or_else(|| LedgerError::account_not_found(id.to_string()))?;
        if account.is_deleted() {
            return Err(LedgerError::Validation(format!(
                "Account '{}' is already deleted",
                account.name
            )));
        }

        let now = Utc::now();
        let mut uow = self.ledger.begin();
        uow.modify::<Account, _>(id, |a| a.soft_delete(now))?;
        uow.commit(&self.actor)?;

        self.get(id)?
            .ok_or_else(|| LedgerError::account_not_found(id.to_string()))
    }

    /// Undo a soft delete
    pub fn restore(&self, id: AccountId) -> LedgerResult<Account> {
        let account = self
            .get(id)?
            .ok_or_else(|| LedgerError::account_not_found(id.to_string()))?;
        if !account.is_deleted() {
            return Err(LedgerError::Validation(format!(
                "Account '{}' is not deleted",
                account.name
            )));
        }
        self.ensure_code_free(&account.account_code, Some(id))?;

        let mut uow = self.ledger.begin();
        uow.guard(unique_live_code(account.account_code.clone()));
        uow.modify::<Account, _>(id, Account::restore)?;
        uow.commit(&self.actor)?;

        self.get(id)?
            .ok_or_else(|| LedgerError::account_not_found(id.to_string()))
    }

    /// Hard delete; refused while any transaction references the account
    pub fn purge(&self, id: AccountId) -> LedgerResult<()> {
        let mut uow = self.ledger.begin();
        uow.guard(account_unreferenced(id));
        uow.remove::<Account>(id)?;
        uow.commit(&self.actor)?;
        Ok(())
    }

    /// Fast-path check; `unique_live_code` enforces the same rule at commit
    fn ensure_code_free(&self, account_code: &str, except: Option<AccountId>) -> LedgerResult<()> {
        match self.get_by_code(account_code)? {
            Some(existing) if Some(existing.id) != except => Err(LedgerError::Duplicate {
                entity_type: "Account",
                identifier: account_code.to_string(),
            }),
            _ => Ok(()),
        }
    }
}
