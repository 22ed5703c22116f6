//! Slack bridge layer modules.

pub mod client;
pub mod mention;
pub mod messages;
pub mod signature;
