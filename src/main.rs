#![forbid(unsafe_code)]

//! `agenda-citas`: appointment booking server binary.
//!
//! Bootstraps configuration, opens the record store, starts the
//! confirmation email worker, and serves the booking site over HTTP.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use agenda_citas::config::GlobalConfig;
use agenda_citas::notify::dispatcher::{DispatchPolicy, NotificationService, Notifier};
use agenda_citas::notify::smtp::SmtpMailer;
use agenda_citas::persistence::open_store;
use agenda_citas::web::{server, AppState};
use agenda_citas::workflow::ConfirmationWorkflow;
use agenda_citas::{AppError, Result};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "agenda-citas.toml";

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "agenda-citas", about = "Appointment booking server", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the HTTP port from the configuration file.
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let mut config = load_config(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.http.port = port;
    }

    init_tracing(args.log_format, &config.log_level)?;
    info!("agenda-citas server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(config))
}

async fn run(mut config: GlobalConfig) -> Result<()> {
    // ── Credentials ─────────────────────────────────────
    config.load_credentials().await?;
    let config = Arc::new(config);
    info!("configuration loaded");

    // ── Record store ────────────────────────────────────
    let store = open_store(&config.storage).await?;
    info!(backend = ?config.storage.backend, path = %config.storage.path.display(), "record store ready");

    // ── Notification worker ─────────────────────────────
    let ct = CancellationToken::new();
    let (notifier, notify_handle) = start_notifier(&config, ct.clone())?;

    // ── HTTP ────────────────────────────────────────────
    let workflow = ConfirmationWorkflow::new(store, notifier, &config);
    let state = Arc::new(AppState {
        config: Arc::clone(&config),
        workflow,
    });

    let http_ct = ct.clone();
    let http_handle = tokio::spawn(async move {
        if let Err(err) = server::serve(state, http_ct.clone()).await {
            error!(%err, "http server failed");
            http_ct.cancel();
        }
    });

    info!("agenda-citas ready");

    // ── Wait for shutdown ───────────────────────────────
    tokio::select! {
        () = shutdown_signal() => info!("shutdown signal received"),
        () = ct.cancelled() => warn!("server stopped unexpectedly"),
    }
    ct.cancel();

    if let Err(err) = http_handle.await {
        error!(%err, "http server task failed");
    }
    if let Some(handle) = notify_handle {
        if let Err(err) = handle.await {
            error!(%err, "notification worker task failed");
        }
    }
    info!("agenda-citas shut down");

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<GlobalConfig> {
    match path {
        Some(path) => GlobalConfig::load_from_path(path),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            GlobalConfig::load_from_path(DEFAULT_CONFIG_FILE)
        }
        None => Ok(GlobalConfig::default()),
    }
}

/// Start the delivery worker when SMTP credentials are complete.
fn start_notifier(
    config: &GlobalConfig,
    ct: CancellationToken,
) -> Result<(Notifier, Option<tokio::task::JoinHandle<()>>)> {
    let Some(credentials) = config.smtp.credentials() else {
        info!("smtp not configured; appointments are stored without confirmation emails");
        return Ok((Notifier::disabled(), None));
    };

    let mailer = SmtpMailer::new(
        &credentials,
        &config.company.name,
        config.smtp.attempt_timeout(),
    )?;
    let (notifier, handle) = NotificationService::start(
        Arc::new(mailer),
        DispatchPolicy::from_config(&config.smtp),
        ct,
    );
    Ok((notifier, Some(handle)))
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
                warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat, default_level: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
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
