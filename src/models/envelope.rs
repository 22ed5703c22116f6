//! Inbound Slack Events API payloads.
//!
//! Only the fields the gateway acts on are modelled; everything else in the
//! payload is ignored during deserialization.

use serde::Deserialize;

use crate::Result;

/// Event kind that triggers a grocery run.
pub const APP_MENTION: &str = "app_mention";

/// Top-level Events API envelope, discriminated by its `type` field.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    /// One-time handshake sent when the request URL is registered.
    UrlVerification {
        /// Value that must be echoed back verbatim.
        challenge: String,
    },
    /// Delivery of a subscribed workspace event.
    EventCallback {
        /// Delivery identifier; stable across Slack's retries.
        event_id: String,
        /// The wrapped event.
        event: CallbackEvent,
    },
    /// Any envelope type this service does not handle.
    #[serde(other)]
    Unsupported,
}

impl EventEnvelope {
    /// Parse an already-verified request body.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Payload` if the body is not a valid envelope.
    pub fn parse(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }
}

/// Inner event object of an `event_callback` envelope.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CallbackEvent {
    /// Event kind, e.g. `app_mention` or `message`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Slack user ID of the author.
    pub user: Option<String>,
    /// Channel the event happened in.
    pub channel: Option<String>,
    /// Raw message text, including mention tokens.
    pub text: Option<String>,
    /// Message timestamp.
    pub ts: Option<String>,
    /// Parent thread timestamp when the mention was posted inside a thread.
    pub thread_ts: Option<String>,
}

impl CallbackEvent {
    /// Whether this event is a mention of the bot.
    #[must_use]
    pub fn is_mention(&self) -> bool {
        self.kind == APP_MENTION
    }

    /// Timestamp replies should be threaded under.
    #[must_use]
    pub fn reply_thread(&self) -> Option<&str> {
        self.thread_ts.as_deref().or(self.ts.as_deref())
    }
}
