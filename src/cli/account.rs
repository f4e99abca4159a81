//! Account CLI commands

use clap::Subcommand;

use crate::audit::ActorContext;
use crate::display::account::{format_account_details, format_account_list};
use crate::error::LedgerResult;
use crate::services::{AccountService, AccountUpdate};
use crate::storage::Ledger;

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account code (e.g. ACC001)
        code: String,
        /// Account name
        name: String,
    },
    /// List accounts with balances
    List {
        /// Include deleted accounts
        #[arg(short, long)]
        all: bool,
    },
    /// Show account details
    Show {
        /// Account code or ID
        account: String,
    },
    /// Edit an account
    Edit {
        /// Account code or ID
        account: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New account code
        #[arg(short, long)]
        code: Option<String>,
        /// Mark the account active
        #[arg(long, conflicts_with = "inactive")]
        active: bool,
        /// Mark the account inactive
        #[arg(long)]
        inactive: bool,
    },
    /// Delete an account (soft delete unless --purge)
    Delete {
        /// Account code or ID
        account: String,
        /// Remove the row permanently
        #[arg(long)]
        purge: bool,
    },
    /// Restore a deleted account
    Restore {
        /// Account code or ID
        account: String,
    },
}

/// Handle an account command
pub fn handle_account_command(
    ledger: &Ledger,
    actor: ActorContext,
    cmd: AccountCommands,
) -> LedgerResult<()> {
    let service = AccountService::new(ledger, actor);

    match cmd {
        AccountCommands::Create { code, name } => {
            let account = service.create(&code, &name)?;
            println!("Created account: {}", account);
            println!("  ID: {}", account.id.key());
        }

        AccountCommands::List { all } => {
            let summaries = service.list_with_balances(all)?;
            print!("{}", format_account_list(&summaries));
        }

        AccountCommands::Show { account } => {
            let found = service.resolve(&account)?;
            let summary = service.get_summary(found)?;
            print!("{}", format_account_details(&summary));
        }

        AccountCommands::Edit {
            account,
            name,
            code,
            active,
            inactive,
        } => {
            let found = service.resolve(&account)?;

            let is_active = match (active, inactive) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };

            if name.is_none() && code.is_none() && is_active.is_none() {
                println!("No changes specified. Use --name, --code, --active or --inactive.");
                return Ok(());
            }

            let updated = service.update(
                found.id,
                AccountUpdate {
                    account_code: code,
                    name,
                    is_active,
                },
            )?;
            println!("Updated account: {}", updated);
        }

        AccountCommands::Delete { account, purge } => {
            let found = service.resolve(&account)?;
            if purge {
                service.purge(found.id)?;
                println!("Purged account: {}", found);
            } else {
                let deleted = service.delete(found.id)?;
                println!("Deleted account: {}", deleted);
            }
        }

        AccountCommands::Restore { account } => {
            let found = service.resolve(&account)?;
            let restored = service.restore(found.id)?;
            println!("Restored account: {}", restored);
        }
    }

    Ok(())
}
