//! Audit CLI commands
//!
//! Read-only views over the audit trail, plus the retention prune.

use chrono::{Duration, Utc};
use clap::Subcommand;

use crate::audit::{ActorContext, AuditLogEntity};
use crate::config::Settings;
use crate::display::audit::{format_audit_details, format_audit_list};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{AccountId, ApiKeyId, ReceiptId};
use crate::services::{AccountService, ReceiptService};
use crate::storage::Ledger;

/// Audit subcommands
#[derive(Subcommand)]
pub enum AuditCommands {
    /// History of one entity
    Entity {
        /// Entity type (Account, Receipt, ReceiptItem, Transaction)
        entity_type: String,
        /// Entity ID (accounts also accept their code)
        entity_id: String,
        /// Show before/after values
        #[arg(short, long)]
        details: bool,
    },
    /// Most recent records
    Recent {
        /// Number of records (default from settings)
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        count: Option<i64>,
        #[arg(short, long)]
        details: bool,
    },
    /// Records written by a user
    User {
        user_id: String,
        #[arg(short, long)]
        details: bool,
    },
    /// Records written with an API key
    ApiKey {
        api_key_id: String,
        #[arg(short, long)]
        details: bool,
    },
    /// Delete records older than the retention period
    Prune {
        /// Retention in days (default from settings)
        #[arg(long)]
        days: Option<u32>,
    },
}

/// Handle an audit command
pub fn handle_audit_command(
    ledger: &Ledger,
    settings: &Settings,
    cmd: AuditCommands,
) -> LedgerResult<()> {
    let query = ledger.audit();

    match cmd {
        AuditCommands::Entity {
            entity_type,
            entity_id,
            details,
        } => {
            let (entity_type, key) = resolve_entity(ledger, &entity_type, &entity_id)?;
            print_records(&query.get_by_entity(&entity_type, &key), details);
        }

        AuditCommands::Recent { count, details } => {
            let count = count.unwrap_or(i64::from(settings.recent_audit_limit));
            print_records(&query.get_recent(count), details);
        }

        AuditCommands::User { user_id, details } => {
            print_records(&query.get_by_user(&user_id), details);
        }

        AuditCommands::ApiKey {
            api_key_id,
            details,
        } => {
            let key: ApiKeyId = api_key_id.parse().map_err(|e| {
                LedgerError::Validation(format!("Invalid API key id '{}': {}", api_key_id, e))
            })?;
            print_records(&query.get_by_api_key(key), details);
        }

        AuditCommands::Prune { days } => {
            let days = days.unwrap_or(settings.audit_retention_days);
            let cutoff = Utc::now() - Duration::days(i64::from(days));
            let purged = ledger.purge_audit_older_than(cutoff)?;
            println!(
                "Pruned {} audit record(s) older than {} days",
                purged, days
            );
        }
    }

    Ok(())
}

fn print_records(records: &[AuditLogEntity], details: bool) {
    if details {
        println!("{}", format_audit_details(records));
    } else {
        print!("{}", format_audit_list(records));
    }
}

/// Normalize the entity type and turn a friendly identifier into the stored key
fn resolve_entity(
    ledger: &Ledger,
    entity_type: &str,
    identifier: &str,
) -> LedgerResult<(String, String)> {
    let lookup = ActorContext::anonymous();

    match entity_type.to_ascii_lowercase().as_str() {
        "account" => {
            let key = match AccountService::new(ledger, lookup).find(identifier)? {
                Some(account) => account.id.key(),
                None => identifier
                    .parse::<AccountId>()
                    .map(|id| id.key())
                    .unwrap_or_else(|_| identifier.to_string()),
            };
            Ok(("Account".into(), key))
        }
        "receipt" => {
            let key = match ReceiptService::new(ledger, lookup).find(identifier)? {
                Some(receipt) => receipt.id.key(),
                None => identifier
                    .parse::<ReceiptId>()
                    .map(|id| id.key())
                    .unwrap_or_else(|_| identifier.to_string()),
            };
            Ok(("Receipt".into(), key))
        }
        "receiptitem" | "receipt-item" | "item" => Ok(("ReceiptItem".into(), identifier.into())),
        "transaction" | "txn" => Ok(("Transaction".into(), identifier.into())),
        _ => Ok((entity_type.to_string(), identifier.to_string())),
    }
}
