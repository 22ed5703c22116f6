//! Extraction of the cart link and missing items from agent output.

/// Label the agent is instructed to put in front of the cart link.
pub const CART_URL_LABEL: &str = "CART_URL:";

const MISSING_MARKERS: [&str; 2] = ["could not be added", "unavailable"];

/// What a finished run produced, as far as the user is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartReport {
    /// Link to the in-progress cart, if the agent reported one.
    pub cart_url: Option<String>,
    /// Lines in which the agent reported items it could not add.
    pub unavailable_items: Vec<String>,
    /// Full agent output.
    pub raw: String,
}

impl CartReport {
    /// Parse the agent's free-text result.
    #[must_use]
    pub fn from_output(raw: &str) -> Self {
        let mut cart_url = None;
        let mut unavailable_items = Vec::new();

        for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
            if has_label(line) {
                if cart_url.is_none() {
                    cart_url = labelled_url(line).map(str::to_owned);
                }
                continue;
            }
            let lowered = line.to_lowercase();
            if MISSING_MARKERS.iter().any(|marker| lowered.contains(marker)) {
                unavailable_items.push(line.to_owned());
            }
        }

        Self {
            cart_url,
            unavailable_items,
            raw: raw.to_owned(),
        }
    }

    /// Whether the run produced a usable cart.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.cart_url.is_some()
    }
}

fn has_label(line: &str) -> bool {
    line.get(..CART_URL_LABEL.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(CART_URL_LABEL))
}

/// URL following the `CART_URL:` label on `line`, if it is an http(s) link.
fn labelled_url(line: &str) -> Option<&str> {
    if !has_label(line) {
        return None;
    }
    let url = line[CART_URL_LABEL.len()..].split_whitespace().next()?;
    let url = url.trim_matches(|c| matches!(c, '<' | '>' | '[' | ']' | '(' | ')'));
    (url.starts_with("https://") || url.starts_with("http://")).then_some(url)
}
