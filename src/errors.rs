//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Reason a Slack request failed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    /// `X-Slack-Request-Timestamp` header absent or empty.
    MissingTimestamp,
    /// Timestamp header is not an integer number of seconds.
    InvalidTimestamp,
    /// Timestamp lies outside the accepted tolerance window.
    StaleTimestamp,
    /// `X-Slack-Signature` header absent or empty.
    MissingSignature,
    /// Recomputed HMAC does not match the provided signature.
    Mismatch,
}

impl Display for SignatureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::MissingTimestamp => "missing request timestamp",
            Self::InvalidTimestamp => "invalid request timestamp",
            Self::StaleTimestamp => "request timestamp outside tolerance",
            Self::MissingSignature => "missing request signature",
            Self::Mismatch => "signature mismatch",
        };
        f.write_str(reason)
    }
}

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing, validation, or credential loading failure.
    Config(String),
    /// Slack Web API failure.
    Slack(String),
    /// Browser-automation agent failure.
    Agent(String),
    /// Inbound webhook failed authentication.
    Signature(SignatureError),
    /// Inbound webhook body could not be parsed.
    Payload(String),
    /// File-system, socket, or other I/O failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Slack(msg) => write!(f, "slack: {msg}"),
            Self::Agent(msg) => write!(f, "agent: {msg}"),
            Self::Signature(reason) => write!(f, "signature: {reason}"),
            Self::Payload(msg) => write!(f, "payload: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<SignatureError> for AppError {
    fn from(err: SignatureError) -> Self {
        Self::Signature(err)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Agent(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
