//! Chat message text for every reply the bot posts.

use crate::automation::result::CartReport;

/// Items listed by name in the "starting" message before summarising.
const PREVIEW_ITEMS: usize = 5;

/// Reply to a mention that contained no grocery items.
#[must_use]
pub fn help(bot_name: &str) -> String {
    format!(
        "\u{1f44b} Hi! Please mention me with a grocery list.\n\nExample: `@{bot_name} milk, bread, bananas`"
    )
}

/// Acknowledgement posted when a job starts.
#[must_use]
pub fn started(retailer: &str, items: &[String]) -> String {
    let mut preview = items
        .iter()
        .take(PREVIEW_ITEMS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > PREVIEW_ITEMS {
        preview.push_str(&format!(" and {} more...", items.len() - PREVIEW_ITEMS));
    }
    format!(
        "\u{1f6d2} Starting your {retailer} order for: {preview}\n\u{23f3} This will take a few minutes..."
    )
}

/// Completion message for a finished agent run.
///
/// A report with a cart URL is a success; anything else is reported as a
/// failed order quoting the agent's raw output.
#[must_use]
pub fn completed(retailer: &str, report: &CartReport) -> String {
    let Some(cart_url) = &report.cart_url else {
        return format!("\u{274c} Order failed. Result:\n{}", report.raw.trim());
    };

    let mut text =
        format!("\u{2705} Your {retailer} order is ready!\n\n\u{1f6d2} Cart URL: {cart_url}");
    if !report.unavailable_items.is_empty() {
        text.push_str("\n\n\u{26a0}\u{fe0f} Some items couldn't be added:\n");
        let bullets = report
            .unavailable_items
            .iter()
            .map(|item| format!("\u{2022} {item}"))
            .collect::<Vec<_>>()
            .join("\n");
        text.push_str(&bullets);
    }
    text
}

/// Message posted when the agent run itself errored.
#[must_use]
pub fn errored(error: &str) -> String {
    format!("\u{274c} Error running automation: {error}")
}
