//! Mention stripping and grocery list extraction.

use regex::{Regex, RegexBuilder};

use crate::{AppError, Result};

/// Removes bot mentions from message text and splits the rest into items.
#[derive(Debug, Clone)]
pub struct MentionParser {
    user_mention: Regex,
    name_mention: Regex,
}

impl MentionParser {
    /// Build a parser that also strips `@<bot_name>` typed as plain text.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the mention patterns fail to compile.
    pub fn new(bot_name: &str) -> Result<Self> {
        let user_mention = Regex::new(r"<@[A-Z0-9]+(?:\|[^>]*)?>")
            .map_err(|err| AppError::Config(format!("invalid mention pattern: {err}")))?;
        let name_mention = RegexBuilder::new(&format!("@{}", regex::escape(bot_name.trim())))
            .case_insensitive(true)
            .build()
            .map_err(|err| AppError::Config(format!("invalid bot name pattern: {err}")))?;
        Ok(Self {
            user_mention,
            name_mention,
        })
    }

    /// Text left after removing every mention, trimmed.
    #[must_use]
    pub fn strip(&self, text: &str) -> String {
        let without_ids = self.user_mention.replace_all(text, "");
        let without_name = self.name_mention.replace_all(&without_ids, "");
        without_name.trim().to_owned()
    }

    /// Grocery items in a mention.
    ///
    /// Comma-separated when the text contains a comma, otherwise one item
    /// per line. Empty items are dropped.
    #[must_use]
    pub fn grocery_list(&self, text: &str) -> Vec<String> {
        let stripped = self.strip(text);
        let separator = if stripped.contains(',') { ',' } else { '\n' };
        stripped
            .split(separator)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_owned)
            .collect()
    }
}
