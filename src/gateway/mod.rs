//! Inbound HTTP surface: Slack webhook gateway plus health endpoints.

pub mod dedup;
pub mod handler;
pub mod server;
