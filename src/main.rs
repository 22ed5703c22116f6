#![forbid(unsafe_code)]

//! `grocer-bot`: Slack grocery-list bot server binary.
//!
//! Bootstraps configuration and credentials, starts the Slack sender queue,
//! and serves the Events API webhook until SIGINT/SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use grocer_bot::automation::cloud::CloudAgent;
use grocer_bot::config::GlobalConfig;
use grocer_bot::gateway::handler::AppState;
use grocer_bot::gateway::server;
use grocer_bot::slack::client::SlackService;
use grocer_bot::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "grocer-bot", about = "Slack grocery-list bot server", version, long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the HTTP port (takes precedence over `PORT`).
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("grocer-bot server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = match &args.config {
        Some(path) => GlobalConfig::load_from_path(path)?,
        None => GlobalConfig::default(),
    };
    config.apply_env_overrides()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }

    // Missing secrets are fatal here, before anything listens.
    config.load_credentials().await.map_err(|err| {
        error!(%err, "required credentials missing");
        err
    })?;

    let config = Arc::new(config);
    info!(
        port = config.http_port,
        retailer = %config.retailer.name,
        max_steps = config.automation.max_steps,
        "configuration loaded"
    );

    // ── Start collaborators ─────────────────────────────
    let (slack, slack_task) = SlackService::start(&config.credentials.bot_token)?;
    let agent = CloudAgent::new(&config);

    let state = Arc::new(AppState::new(
        Arc::clone(&config),
        Arc::new(agent),
        Arc::new(slack),
    )?);

    // ── Serve until shutdown ────────────────────────────
    let ct = CancellationToken::new();
    let server_ct = ct.clone();
    let server_state = Arc::clone(&state);
    let mut server_handle = tokio::spawn(async move {
        if let Err(err) = server::serve(server_state, server_ct).await {
            error!(%err, "http server failed");
        }
    });

    let server_exited = tokio::select! {
        () = shutdown_signal() => false,
        _ = &mut server_handle => true,
    };
    slack_task.abort();
    if server_exited {
        return Err(AppError::Io("http server exited unexpectedly".into()));
    }

    info!("shutdown signal received");
    ct.cancel();
    let _ = server_handle.await;
    info!(
        events_seen = state.seen_events.len(),
        "grocer-bot shut down"
    );

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
