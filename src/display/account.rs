//! Account display formatting
//!
//! Formats accounts for terminal output in table and detail views.

use crate::models::{Account, Money};
use crate::services::account::AccountSummary;

/// Format a list of accounts with balances as a table
pub fn format_account_list(summaries: &[AccountSummary]) -> String {
    if summaries.is_empty() {
        return "No accounts found.".to_string();
    }

    let code_width = summaries
        .iter()
        .map(|s| s.account.account_code.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let name_width = summaries
        .iter()
        .map(|s| s.account.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<code_width$}  {:<name_width$}  {:>12}  {}\n",
        "ID",
        "Code",
        "Name",
        "Balance",
        "Status",
        code_width = code_width,
        name_width = name_width,
    ));

    output.push_str(&format!(
        "{:-<12}  {:-<code_width$}  {:-<name_width$}  {:->12}  {:-<8}\n",
        "",
        "",
        "",
        "",
        "",
        code_width = code_width,
        name_width = name_width,
    ));

    for summary in summaries {
        output.push_str(&format!(
            "{:<12}  {:<code_width$}  {:<name_width$}  {:>12}  {}\n",
            summary.account.id.to_string(),
            summary.account.account_code,
            summary.account.name,
            summary.balance.to_string(),
            status(&summary.account),
            code_width = code_width,
            name_width = name_width,
        ));
    }

    let total: Money = summaries.iter().map(|s| s.balance).sum();
    output.push_str(&format!(
        "{:<12}  {:<code_width$}  {:<name_width$}  {:>12}\n",
        "",
        "",
        "Total",
        total.to_string(),
        code_width = code_width,
        name_width = name_width,
    ));

    output
}

/// Format a single account's details
pub fn format_account_details(summary: &AccountSummary) -> String {
    let account = &summary.account;
    let mut output = String::new();

    output.push_str(&format!("Account: {}\n", account.name));
    output.push_str(&format!("  ID:           {}\n", account.id.key()));
    output.push_str(&format!("  Code:         {}\n", account.account_code));
    output.push_str(&format!("  Balance:      {}\n", summary.balance));
    output.push_str(&format!("  Transactions: {}\n", summary.transaction_count));
    output.push_str(&format!("  Status:       {}\n", status(account)));

    if let Some(deleted_at) = account.deleted_at {
        output.push_str(&format!(
            "  Deleted:      {}\n",
            deleted_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    output
}

fn status(account: &Account) -> &'static str {
    if account.is_deleted() {
        "Deleted"
    } else if !account.is_active {
        "Inactive"
    } else {
        "Active"
    }
}
