//! Receipt display formatting

use crate::models::Receipt;
use crate::services::receipt::ReceiptWithItems;

/// Format receipts as a table, one row per receipt
pub fn format_receipt_list(receipts: &[ReceiptWithItems]) -> String {
    if receipts.is_empty() {
        return "No receipts found.".to_string();
    }

    let location_width = receipts
        .iter()
        .map(|r| r.receipt.location.len())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12}  {:<10}  {:<location_width$}  {:>5}  {:>12}  {}\n",
        "ID",
        "Date",
        "Location",
        "Items",
        "Total",
        "Status",
        location_width = location_width,
    ));
    output.push_str(&format!(
        "{:-<12}  {:-<10}  {:-<location_width$}  {:->5}  {:->12}  {:-<7}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        location_width = location_width,
    ));

    for entry in receipts {
        output.push_str(&format!(
            "{:<12}  {:<10}  {:<location_width$}  {:>5}  {:>12}  {}\n",
            entry.receipt.id.to_string(),
            entry.receipt.date.format("%Y-%m-%d").to_string(),
            entry.receipt.location,
            entry.items.len(),
            entry.total().to_string(),
            status(&entry.receipt),
            location_width = location_width,
        ));
    }

    output
}

/// Format one receipt with its line items
pub fn format_receipt_details(entry: &ReceiptWithItems) -> String {
    let receipt = &entry.receipt;
    let mut output = String::new();

    output.push_str(&format!("Receipt: {}\n", receipt));
    output.push_str(&format!("  ID:          {}\n", receipt.id.key()));
    if let Some(description) = &receipt.description {
        output.push_str(&format!("  Description: {}\n", description));
    }
    output.push_str(&format!("  Status:      {}\n", status(receipt)));

    if entry.items.is_empty() {
        output.push_str("  (no items)\n");
    } else {
        output.push('\n');
        for item in &entry.items {
            output.push_str(&format!(
                "  {:<12} {:<24} {:>4} x {:>10} = {:>10}\n",
                item.receipt_item_code,
                item.description,
                item.quantity,
                item.unit_price.to_string(),
                item.total().to_string(),
            ));
        }
    }

    output.push('\n');
    output.push_str(&format!("  Subtotal: {:>12}\n", entry.items_total().to_string()));
    output.push_str(&format!("  Tax:      {:>12}\n", receipt.tax_amount.to_string()));
    output.push_str(&format!("  Total:    {:>12}\n", entry.total().to_string()));

    output
}

fn status(receipt: &Receipt) -> &'static str {
    if receipt.is_deleted() {
        "Deleted"
    } else {
        "Active"
    }
}
