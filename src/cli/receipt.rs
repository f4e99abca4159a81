//! Receipt CLI commands

use chrono::{Local, NaiveDate};
use clap::Subcommand;

use crate::audit::ActorContext;
use crate::display::receipt::{format_receipt_details, format_receipt_list};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Money, Receipt, ReceiptId, ReceiptItem};
use crate::services::receipt::ReceiptWithItems;
use crate::services::{AccountService, ReceiptService, TransactionService};
use crate::storage::Ledger;

/// Receipt subcommands
#[derive(Subcommand)]
pub enum ReceiptCommands {
    /// Record a receipt with its items
    Create {
        /// Store or place of purchase
        location: String,
        /// Purchase date (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<String>,
        /// Tax paid (e.g. "1.20")
        #[arg(short, long, default_value = "0")]
        tax: String,
        /// Free-form description
        #[arg(long)]
        description: Option<String>,
        /// Line item as CODE:DESCRIPTION:QTY:PRICE:CATEGORY[:SUBCATEGORY]
        #[arg(short, long = "item")]
        items: Vec<String>,
    },
    /// List receipts
    List {
        /// Include deleted receipts
        #[arg(short, long)]
        all: bool,
    },
    /// Show a receipt and its items
    Show {
        /// Receipt ID
        receipt: String,
    },
    /// Charge a receipt to an account
    Charge {
        /// Receipt ID
        receipt: String,
        /// Account code or ID
        account: String,
        /// Amount to charge (default: receipt total)
        #[arg(short, long)]
        amount: Option<String>,
    },
    /// Delete a receipt with its items (soft delete unless --purge)
    Delete {
        /// Receipt ID
        receipt: String,
        /// Remove the rows permanently
        #[arg(long)]
        purge: bool,
    },
    /// Restore a deleted receipt
    Restore {
        /// Receipt ID
        receipt: String,
    },
}

/// Handle a receipt command
pub fn handle_receipt_command(
    ledger: &Ledger,
    actor: ActorContext,
    cmd: ReceiptCommands,
) -> LedgerResult<()> {
    let service = ReceiptService::new(ledger, actor.clone());

    match cmd {
        ReceiptCommands::Create {
            location,
            date,
            tax,
            description,
            items,
        } => {
            let date = match date {
                Some(raw) => parse_date(&raw)?,
                None => Local::now().date_naive(),
            };
            let mut receipt = Receipt::new(location.trim(), date, parse_money(&tax)?);
            if let Some(description) = description {
                receipt = receipt.with_description(description);
            }

            let items = items
                .iter()
                .map(|spec| parse_item(spec))
                .collect::<LedgerResult<Vec<_>>>()?;

            let created = service.create(receipt, items)?;
            println!("Created receipt: {}", created.receipt);
            println!("  ID:    {}", created.receipt.id.key());
            println!("  Items: {}", created.items.len());
            println!("  Total: {}", created.total());
        }

        ReceiptCommands::List { all } => {
            let receipts = service
                .list(all)?
                .into_iter()
                .map(|receipt| {
                    let items = service.items(receipt.id)?;
                    Ok(ReceiptWithItems { receipt, items })
                })
                .collect::<LedgerResult<Vec<_>>>()?;
            print!("{}", format_receipt_list(&receipts));
        }

        ReceiptCommands::Show { receipt } => {
            let found = service.resolve(&receipt)?;
            let entry = service
                .get_with_items(found.id)?
                .ok_or_else(|| LedgerError::receipt_not_found(&receipt))?;
            print!("{}", format_receipt_details(&entry));
        }

        ReceiptCommands::Charge {
            receipt,
            account,
            amount,
        } => {
            let found = service.resolve(&receipt)?;
            let account = AccountService::new(ledger, actor.clone()).resolve(&account)?;
            let amount = match amount {
                Some(raw) => parse_money(&raw)?,
                None => service
                    .get_with_items(found.id)?
                    .map(|entry| entry.total())
                    .unwrap_or_default(),
            };

            let txn = TransactionService::new(ledger, actor)
                .create(found.id, account.id, amount, found.date)?;
            println!("Charged {} to {}", txn.amount, account);
            println!("  Transaction: {}", txn.id.key());
        }

        ReceiptCommands::Delete { receipt, purge } => {
            let found = service.resolve(&receipt)?;
            if purge {
                service.purge(found.id)?;
                println!("Purged receipt: {}", found);
            } else {
                let deleted = service.delete(found.id)?;
                println!("Deleted receipt: {}", deleted);
            }
        }

        ReceiptCommands::Restore { receipt } => {
            let found = service.resolve(&receipt)?;
            let restored = service.restore(found.id)?;
            println!("Restored receipt: {}", restored);
        }
    }

    Ok(())
}

pub(crate) fn parse_date(raw: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        LedgerError::Validation(format!("Invalid date '{}': {}. Use YYYY-MM-DD", raw, e))
    })
}

pub(crate) fn parse_money(raw: &str) -> LedgerResult<Money> {
    Money::parse(raw).map_err(|e| {
        LedgerError::Validation(format!(
            "Invalid amount '{}'. Use a format like '12.50'. Error: {}",
            raw, e
        ))
    })
}

/// Parse `CODE:DESCRIPTION:QTY:PRICE:CATEGORY[:SUBCATEGORY]`
pub(crate) fn parse_item(spec: &str) -> LedgerResult<ReceiptItem> {
    let parts: Vec<&str> = spec.split(':').map(str::trim).collect();
    if !(5..=6).contains(&parts.len()) {
        return Err(LedgerError::Validation(format!(
            "Invalid item '{}'. Expected CODE:DESCRIPTION:QTY:PRICE:CATEGORY[:SUBCATEGORY]",
            spec
        )));
    }

    let quantity: i64 = parts[2].parse().map_err(|_| {
        LedgerError::Validation(format!("Invalid quantity '{}' in item '{}'", parts[2], spec))
    })?;

    let mut item = ReceiptItem::new(
        ReceiptId::pending(),
        parts[0],
        parts[1],
        quantity,
        parse_money(parts[3])?,
        parts[4],
    );
    if let Some(sub_category) = parts.get(5) {
        item.sub_category = sub_category.to_string();
    }

    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item() {
        let item = parse_item("MILK:Whole milk:2:1.49:Groceries:Dairy").unwrap();
        assert_eq!(item.receipt_item_code, "MILK");
        assert_eq!(item.description, "Whole milk");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.unit_price, Money::from_cents(149));
        assert_eq!(item.category, "Groceries");
        assert_eq!(item.sub_category, "Dairy");

        let without_sub = parse_item("EGG:Eggs:1:3:Groceries").unwrap();
        assert_eq!(without_sub.sub_category, "");
        assert_eq!(without_sub.unit_price, Money::from_cents(300));
    }

    #[test]
    fn test_parse_item_errors() {
        assert!(parse_item("MILK:2:1.49").unwrap_err().is_validation());
        assert!(parse_item("MILK:Milk:two:1.49:Food").unwrap_err().is_validation());
        assert!(parse_item("MILK:Milk:2:abc:Food").unwrap_err().is_validation());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("29/02/2024").is_err());
    }
}
