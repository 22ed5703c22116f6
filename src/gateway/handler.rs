//! HTTP handlers and the shared state they read.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use super::dedup::SeenEvents;
use crate::automation::AutomationAgent;
use crate::config::GlobalConfig;
use crate::dispatch::JobDispatcher;
use crate::models::envelope::{CallbackEvent, EventEnvelope};
use crate::models::job::DispatchJob;
use crate::slack::client::ChatNotifier;
use crate::slack::mention::MentionParser;
use crate::slack::signature::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::{AppError, Result};

/// Routes served by this process, as listed by `GET /`.
pub const ENDPOINTS: [&str; 3] = ["POST /slack/events", "GET /health", "GET /"];

/// Shared application state accessible by all HTTP handlers.
pub struct AppState {
    /// Immutable configuration, including secrets.
    pub config: Arc<GlobalConfig>,
    /// Deliveries already accepted.
    pub seen_events: SeenEvents,
    /// Mention stripping for the configured bot name.
    pub mentions: MentionParser,
    /// Background job runner.
    pub dispatcher: Arc<JobDispatcher>,
}

impl AppState {
    /// Assemble state from configuration and the two external collaborators.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the bot name yields an invalid mention
    /// pattern.
    pub fn new(
        config: Arc<GlobalConfig>,
        agent: Arc<dyn AutomationAgent>,
        notifier: Arc<dyn ChatNotifier>,
    ) -> Result<Self> {
        let mentions = MentionParser::new(&config.bot_name)?;
        let dispatcher = Arc::new(JobDispatcher::new(&config, agent, notifier));
        Ok(Self {
            config,
            seen_events: SeenEvents::new(),
            mentions,
            dispatcher,
        })
    }
}

/// What the gateway did with a verified `event_callback`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// `event_id` was already accepted; nothing done.
    Duplicate,
    /// Not a mention we act on.
    Ignored,
    /// Mention without grocery items; a usage hint was posted.
    Help,
    /// A grocery job was spawned.
    Dispatched(Uuid),
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthReport {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
    /// Slack signing secret loaded.
    pub signing_secret_configured: bool,
    /// Slack bot token loaded.
    pub bot_token_configured: bool,
    /// Automation service API key loaded.
    pub automation_api_key_configured: bool,
    /// Both retailer login fields loaded.
    pub retailer_credentials_configured: bool,
}

impl HealthReport {
    /// Snapshot of which secrets the running process holds.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        let credentials = &config.credentials;
        Self {
            status: "ok",
            signing_secret_configured: !credentials.signing_secret.is_empty(),
            bot_token_configured: !credentials.bot_token.is_empty(),
            automation_api_key_configured: !credentials.automation_api_key.is_empty(),
            retailer_credentials_configured: credentials.has_retailer_login(),
        }
    }
}

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Package name.
    pub service: &'static str,
    /// Package version.
    pub version: &'static str,
    /// One-line package description.
    pub description: &'static str,
    /// Routes served by this process.
    pub endpoints: [&'static str; 3],
}

impl ServiceInfo {
    /// Description of this build.
    #[must_use]
    pub fn current() -> Self {
        Self {
            service: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            description: env!("CARGO_PKG_DESCRIPTION"),
            endpoints: ENDPOINTS,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChallengeResponse {
    challenge: String,
}

/// Handler for `GET /health`.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(HealthReport::from_config(&state.config))
}

/// Handler for `GET /`.
pub async fn index() -> Json<ServiceInfo> {
    Json(ServiceInfo::current())
}

/// Handler for `POST /slack/events`.
///
/// Verifies the signature over the raw body before parsing anything, answers
/// the URL-verification handshake, and acknowledges every callback with
/// `200` before any background work completes.
pub async fn slack_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let now = chrono::Utc::now().timestamp();
    if let Err(reason) = signature::verify(
        state.config.credentials.signing_secret.as_bytes(),
        header_str(&headers, TIMESTAMP_HEADER),
        header_str(&headers, SIGNATURE_HEADER),
        &body,
        now,
        state.config.signature_tolerance_seconds,
    ) {
        let err = AppError::from(reason);
        warn!(%err, "rejected slack request");
        return (StatusCode::UNAUTHORIZED, "invalid signature").into_response();
    }

    let envelope = match EventEnvelope::parse(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!(%err, "failed to parse slack payload");
            return (StatusCode::BAD_REQUEST, "invalid payload").into_response();
        }
    };

    match envelope {
        EventEnvelope::UrlVerification { challenge } => {
            info!("answering url verification challenge");
            Json(ChallengeResponse { challenge }).into_response()
        }
        EventEnvelope::EventCallback { event_id, event } => {
            let span = info_span!("slack_event", event_id = %event_id, kind = %event.kind);
            span.in_scope(|| {
                let outcome = handle_callback(&state, &event_id, event);
                info!(?outcome, "slack event acknowledged");
            });
            StatusCode::OK.into_response()
        }
        EventEnvelope::Unsupported => {
            debug!("ignoring unsupported envelope type");
            StatusCode::OK.into_response()
        }
    }
}

/// Deduplicate, filter, and dispatch one verified callback.
///
/// Never waits on the spawned work.
pub fn handle_callback(state: &AppState, event_id: &str, event: CallbackEvent) -> CallbackOutcome {
    if !state.seen_events.first_delivery(event_id) {
        return CallbackOutcome::Duplicate;
    }

    if !event.is_mention() {
        return CallbackOutcome::Ignored;
    }

    let thread_ts = event.reply_thread().map(str::to_owned);
    let Some(channel) = event.channel else {
        warn!("mention without a channel");
        return CallbackOutcome::Ignored;
    };

    let items = state
        .mentions
        .grocery_list(event.text.as_deref().unwrap_or_default());
    if items.is_empty() {
        state.dispatcher.send_help(channel, thread_ts);
        return CallbackOutcome::Help;
    }

    let job = DispatchJob::new(items, channel, event.user, thread_ts);
    let job_id = job.job_id;
    state.dispatcher.dispatch(job);
    CallbackOutcome::Dispatched(job_id)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
