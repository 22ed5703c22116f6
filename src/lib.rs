#![forbid(unsafe_code)]

//! Slack grocery-list bot.
//!
//! Verifies and deduplicates Slack `app_mention` webhooks, then runs each
//! grocery list through a browser-automation agent on a background task and
//! reports the cart back to the channel.

pub mod automation;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod slack;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
