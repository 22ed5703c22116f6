//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Keychain service name used for credential lookup.
pub const KEYRING_SERVICE: &str = "grocer-bot";

/// Target retailer settings handed to the automation agent.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct RetailerConfig {
    /// Human-readable retailer name used in chat replies and the task prompt.
    pub name: String,
    /// Page the agent starts from.
    pub start_url: String,
    /// Domains the agent's browser may visit.
    pub allowed_domains: Vec<String>,
}

impl Default for RetailerConfig {
    fn default() -> Self {
        Self {
            name: "Tesco".into(),
            start_url: "https://www.tesco.ie/groceries/".into(),
            allowed_domains: vec!["tesco.ie".into()],
        }
    }
}

/// Cloud browser-automation API settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct AutomationConfig {
    /// Base URL of the automation REST API.
    pub base_url: String,
    /// Step budget for one agent run.
    pub max_steps: u32,
    /// Delay between task status polls.
    pub poll_interval_seconds: u64,
    /// Consecutive polling errors tolerated before the run is abandoned.
    pub max_poll_failures: u32,
    /// Whether the agent may use screenshots to read the page.
    pub use_vision: bool,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.browser-use.com".into(),
            max_steps: 150,
            poll_interval_seconds: 5,
            max_poll_failures: 5,
            use_vision: true,
        }
    }
}

impl AutomationConfig {
    /// Poll interval as a [`Duration`].
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

/// Secrets populated at runtime from the keychain or environment.
///
/// Never read from the TOML file and never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Slack app signing secret used to verify inbound webhooks.
    pub signing_secret: String,
    /// Slack bot token used for `chat.postMessage`.
    pub bot_token: String,
    /// API key for the browser-automation service.
    pub automation_api_key: String,
    /// Optional stored browser profile (keeps retailer cookies between runs).
    pub automation_profile_id: Option<String>,
    /// Retailer account e-mail.
    pub retailer_email: String,
    /// Retailer account password.
    pub retailer_password: String,
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn mask(value: &str) -> &'static str {
            if value.is_empty() {
                "<unset>"
            } else {
                "<redacted>"
            }
        }
        f.debug_struct("Credentials")
            .field("signing_secret", &mask(&self.signing_secret))
            .field("bot_token", &mask(&self.bot_token))
            .field("automation_api_key", &mask(&self.automation_api_key))
            .field("automation_profile_id", &self.automation_profile_id)
            .field("retailer_email", &mask(&self.retailer_email))
            .field("retailer_password", &mask(&self.retailer_password))
            .finish()
    }
}

impl Credentials {
    /// Whether both retailer login fields are present.
    #[must_use]
    pub fn has_retailer_login(&self) -> bool {
        !self.retailer_email.is_empty() && !self.retailer_password.is_empty()
    }
}

fn default_http_host() -> String {
    "0.0.0.0".into()
}

fn default_http_port() -> u16 {
    8000
}

fn default_bot_name() -> String {
    "tesco-bot".into()
}

fn default_signature_tolerance() -> u64 {
    300
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Interface the HTTP server binds to.
    #[serde(default = "default_http_host")]
    pub http_host: String,
    /// HTTP port for the webhook server.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Display name users type after `@` to mention the bot.
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    /// Maximum allowed clock skew for inbound request timestamps.
    #[serde(default = "default_signature_tolerance")]
    pub signature_tolerance_seconds: u64,
    /// Target retailer.
    #[serde(default)]
    pub retailer: RetailerConfig,
    /// Automation service settings.
    #[serde(default)]
    pub automation: AutomationConfig,
    /// Runtime secrets (populated by [`GlobalConfig::load_credentials`]).
    #[serde(skip)]
    pub credentials: Credentials,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            http_host: default_http_host(),
            http_port: default_http_port(),
            bot_name: default_bot_name(),
            signature_tolerance_seconds: default_signature_tolerance(),
            retailer: RetailerConfig::default(),
            automation: AutomationConfig::default(),
            credentials: Credentials::default(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// An empty string yields the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply the `PORT` environment override used by hosting platforms.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `PORT` is set but not a valid port.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(raw) = env::var("PORT") {
            let port = raw
                .trim()
                .parse::<u16>()
                .map_err(|err| AppError::Config(format!("PORT is not a valid port: {err}")))?;
            self.http_port = port;
        }
        Ok(())
    }

    /// Load secrets from OS keychain with env-var fallback.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first required credential that
    /// neither the keychain nor the environment provides.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.credentials.signing_secret =
            load_credential("slack_signing_secret", "SLACK_SIGNING_SECRET").await?;
        self.credentials.bot_token = load_credential("slack_bot_token", "SLACK_BOT_TOKEN").await?;
        self.credentials.automation_api_key =
            load_credential("automation_api_key", "AUTOMATION_API_KEY").await?;
        self.credentials.retailer_email =
            load_credential("retailer_email", "RETAILER_EMAIL").await?;
        self.credentials.retailer_password =
            load_credential("retailer_password", "RETAILER_PASSWORD").await?;
        self.credentials.automation_profile_id = env::var("AUTOMATION_PROFILE_ID")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        Ok(())
    }

    /// Socket address the HTTP server binds to.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `http_host` is not an IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.http_host, self.http_port)
            .parse()
            .map_err(|err| AppError::Config(format!("invalid bind address: {err}")))
    }

    fn validate(&self) -> Result<()> {
        if self.signature_tolerance_seconds == 0 {
            return Err(AppError::Config(
                "signature_tolerance_seconds must be greater than zero".into(),
            ));
        }

        if self.bot_name.trim().is_empty() {
            return Err(AppError::Config("bot_name must not be empty".into()));
        }

        if self.retailer.allowed_domains.is_empty() {
            return Err(AppError::Config(
                "retailer.allowed_domains must not be empty".into(),
            ));
        }

        if !self.retailer.start_url.starts_with("http") {
            return Err(AppError::Config(
                "retailer.start_url must be an http(s) URL".into(),
            ));
        }

        if !self.automation.base_url.starts_with("http") {
            return Err(AppError::Config(
                "automation.base_url must be an http(s) URL".into(),
            ));
        }

        if self.automation.max_steps == 0 {
            return Err(AppError::Config(
                "automation.max_steps must be greater than zero".into(),
            ));
        }

        if self.automation.poll_interval_seconds == 0 {
            return Err(AppError::Config(
                "automation.poll_interval_seconds must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(keyring::Error::NoEntry) => {}
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    match env::var(env_key) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_owned()),
        _ => Err(AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))),
    }
}
