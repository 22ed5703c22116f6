//! Task prompt handed to the browser-automation agent.

use crate::config::RetailerConfig;

/// Secret name the agent substitutes with the retailer account e-mail.
pub const EMAIL_SECRET: &str = "retailer_email";

/// Secret name the agent substitutes with the retailer account password.
pub const PASSWORD_SECRET: &str = "retailer_password";

/// Render `items` as a numbered list, one per line.
#[must_use]
pub fn numbered_list(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| format!("{}. {item}", index + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the full instructions for one grocery run.
#[must_use]
pub fn task_prompt(retailer: &RetailerConfig, items: &[String]) -> String {
    let name = &retailer.name;
    let start_url = &retailer.start_url;
    let list = numbered_list(items);

    format!(
        "GOAL: Log into {name}, add groceries to the cart, and provide the cart URL.

IMPORTANT SECURITY NOTE:
- The account e-mail and password are available only as the secrets {EMAIL_SECRET} and {PASSWORD_SECRET}
- NEVER print, display, or output these credentials in any form
- Use them only for logging in

EXECUTION STEPS:

1. NAVIGATE & LOGIN:
   - Navigate to {start_url}
   - Accept cookies if prompted
   - Click \"Sign in\" or \"Login\"
   - Enter the e-mail from the {EMAIL_SECRET} secret
   - Enter the password from the {PASSWORD_SECRET} secret
   - Submit the login form and wait for the signed-in page

2. SEARCH AND ADD ITEMS:
   For each item in the list below:
   - Search for the item and wait for results to load
   - If found, open the best matching product (usually the first result),
     add it to the trolley/basket and wait for confirmation
   - Use a quantity of 1 unless the item names a quantity
   - If not found or out of stock, remember it and continue with the next item

GROCERY LIST:
{list}

3. NAVIGATE TO CART:
   - After all items are processed, open the cart/trolley page and wait for it to load

4. FINAL OUTPUT:
   - Provide the cart page URL in exactly this format on its own line:
     CART_URL: <the full URL of the cart page>
   - List every item that could not be added, one per line, saying it could not be added
   - DO NOT proceed to checkout
   - DO NOT place the order

STOP CONDITIONS:
- Stop at the cart page after all items are processed
- Do not go beyond viewing the cart
- Do not enter payment or delivery details
"
    )
}
