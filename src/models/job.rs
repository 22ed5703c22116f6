//! Background grocery job description.

use uuid::Uuid;

/// One fire-and-forget automation run requested by a mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchJob {
    /// Identifier used only to correlate log lines.
    pub job_id: Uuid,
    /// Grocery items extracted from the mention.
    pub items: Vec<String>,
    /// Channel the mention came from; all replies go here.
    pub channel: String,
    /// Slack user who mentioned the bot.
    pub user: Option<String>,
    /// Thread the replies are posted under.
    pub thread_ts: Option<String>,
}

impl DispatchJob {
    /// Create a job with a fresh identifier.
    #[must_use]
    pub fn new(
        items: Vec<String>,
        channel: impl Into<String>,
        user: Option<String>,
        thread_ts: Option<String>,
    ) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            items,
            channel: channel.into(),
            user,
            thread_ts,
        }
    }
}
