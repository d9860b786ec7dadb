#![forbid(unsafe_code)]

//! `task-tracker` binary: HTTP server and batch entry points.
//!
//! `serve` runs the job endpoints and chat API, optionally with the
//! in-process rollover scheduler and notification listeners for named
//! users. `run-job` runs a single rollover job for an external scheduler
//! such as cron. `unread` prints a user's unread count.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use task_tracker::config::GlobalConfig;
use task_tracker::feed::{ChangeFeed, LocalFeed};
use task_tracker::http::{self, AppState};
use task_tracker::jobs::{run_job, scheduler, JobKind};
use task_tracker::listener::NotificationListener;
use task_tracker::notify::{Notifier, TracingNotifier};
use task_tracker::persistence::db::{self, Database};
use task_tracker::unread::{spawn_unread_poller, UnreadAggregator, UnreadBadge};
use task_tracker::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "task-tracker", about = "Task tracker core service", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API until interrupted.
    Serve {
        /// Run a notification listener for this user (repeatable).
        #[arg(long = "watch-user")]
        watch_users: Vec<String>,
    },
    /// Run one rollover job and exit.
    RunJob {
        /// Job to run.
        #[arg(value_enum)]
        job: JobKind,
    },
    /// Print the unread message count for a user.
    Unread {
        /// User identifier.
        #[arg(long)]
        user: String,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    let db = Arc::new(db::connect(&config.db_path).await?);
    info!(db_path = %config.db_path.display(), "database connected");

    match args.command {
        Command::Serve { watch_users } => {
            config.load_credentials().await?;
            serve(config, db, watch_users).await
        }
        Command::RunJob { job } => {
            let outcome = run_job(db, job, Utc::now().date_naive()).await?;
            println!(
                "{}",
                serde_json::json!({
                    "success": true,
                    "message": outcome.message,
                    (job.count_key()): outcome.count(),
                })
            );
            Ok(())
        }
        Command::Unread { user } => {
            let total = UnreadAggregator::new(db).count(Some(&user)).await?;
            println!("{}", total.unwrap_or(0));
            Ok(())
        }
    }
}

async fn serve(config: GlobalConfig, db: Arc<Database>, watch_users: Vec<String>) -> Result<()> {
    let ct = CancellationToken::new();
    let feed = LocalFeed::default();
    let mut background = Vec::new();
    let notifier: Arc<dyn Notifier> =
        Arc::new(TracingNotifier::new(config.notifications.sample_rate));

    // ── Rollover scheduler ──────────────────────────────
    if config.schedule.enabled {
        background.push(scheduler::spawn_daily_job(
            Arc::clone(&db),
            JobKind::Reset,
            config.schedule.reset_time()?,
            Arc::clone(&notifier),
            ct.clone(),
        ));
        background.push(scheduler::spawn_daily_job(
            Arc::clone(&db),
            JobKind::Duplicate,
            config.schedule.duplicate_time()?,
            Arc::clone(&notifier),
            ct.clone(),
        ));
        info!(
            reset_at = %config.schedule.reset_at,
            duplicate_at = %config.schedule.duplicate_at,
            "rollover scheduler started"
        );
    }

    // ── Notification listeners ──────────────────────────
    let shared_feed: Arc<dyn ChangeFeed> = Arc::new(feed.clone());
    let aggregator = Arc::new(UnreadAggregator::new(Arc::clone(&db)));
    let mut listeners = Vec::with_capacity(watch_users.len());

    for user in &watch_users {
        let badge = Arc::new(UnreadBadge::new(aggregator.clone()));
        let _ = badge.refresh(Some(user)).await;

        if config.notifications.unread_poll_seconds > 0 {
            background.push(spawn_unread_poller(
                Arc::clone(&badge),
                user.clone(),
                Duration::from_secs(config.notifications.unread_poll_seconds),
                ct.clone(),
            ));
        }

        let mut listener = NotificationListener::new(
            Arc::clone(&db),
            Arc::clone(&shared_feed),
            Arc::clone(&notifier),
            badge,
            config.notifications.notice_duration_ms,
        );
        listener.start(user).await?;
        listeners.push(listener);
    }

    // ── HTTP server ─────────────────────────────────────
    let state = AppState::new(Arc::clone(&db), feed, config.job_token.clone());
    let bind = config.bind_addr();
    let http_ct = ct.clone();
    let http_handle = tokio::spawn(async move {
        if let Err(err) = http::serve(&bind, state, http_ct).await {
            error!(%err, "http server failed");
        }
    });

    info!(listeners = listeners.len(), "task-tracker ready");

    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    for listener in &mut listeners {
        listener.stop().await;
    }
    let _ = http_handle.await;
    for handle in background {
        let _ = handle.await;
    }
    info!("task-tracker shut down");

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
