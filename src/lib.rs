pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod error;
pub mod models;
pub mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use cli::{Cli, Mode};
pub use config::Config;
pub use error::HarvestError;
use models::artifact::RunStamp;
use services::Pipeline;
use services::pipeline::FetchRequest;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<ExitCode> {
    let stamp = RunStamp::now();

    dotenvy::dotenv().ok();

    let (mut config, source) = Config::load()?;
    config.apply_env();
    config.validate()?;

    let _log_guard = init_tracing(&config)?;

    info!("start main");
    info!("Config loaded from: {source}");

    let code = dispatch(&config, Cli::parse_args().mode(), stamp).await?;

    info!("end main");
    Ok(code)
}

/// Runs one CLI mode. Only a missing argument yields a failing exit code.
async fn dispatch(config: &Config, mode: Mode, stamp: RunStamp) -> anyhow::Result<ExitCode> {
    let code = match mode {
        Mode::Archive => {
            archive_logs(config, false).await?;
            ExitCode::SUCCESS
        }
        Mode::Rotate => {
            archive_logs(config, true).await?;
            ExitCode::SUCCESS
        }
        Mode::Fetch(request) => run_fetch(config, &request, stamp).await?,
        Mode::MissingArgument => {
            error!("missing argument");
            error!("Example: $ hashtag-harvest -query bluebottle -limit 50");
            ExitCode::FAILURE
        }
    };

    Ok(code)
}

fn init_tracing(config: &Config) -> anyhow::Result<WorkerGuard> {
    use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = PathBuf::from(&config.general.log_dir);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix(constants::logs::FILE_PREFIX)
        .build(&log_dir)
        .context("Failed to create log file appender")?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = || {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level))
    };

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_filter(env_filter());
    let stdout_layer = tracing_subscriber::fmt::layer().with_filter(env_filter());

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .context("Failed to initialize tracing")?;

    Ok(guard)
}

async fn archive_logs(config: &Config, prune: bool) -> anyhow::Result<()> {
    let log_dir = PathBuf::from(&config.general.log_dir);
    let max_files = config.general.max_log_files;
    // The daily appender names the live file after the current UTC date.
    let active_date = chrono::Utc::now().format("%Y-%m-%d").to_string();

    tokio::task::spawn_blocking(move || {
        if prune {
            services::log_archive::rotate(&log_dir, &active_date, max_files)
        } else {
            services::log_archive::compress_logs(&log_dir, &active_date).map(|_| ())
        }
    })
    .await
    .context("Log archive task panicked")?
}

async fn run_fetch(
    config: &Config,
    request: &FetchRequest,
    stamp: RunStamp,
) -> anyhow::Result<ExitCode> {
    if !config.has_credentials() {
        error!(
            "{} and {} must be set (environment, .env or config.toml)",
            constants::env::ACCESS_TOKEN,
            constants::env::BUSINESS_ACCOUNT_ID
        );
        return Ok(ExitCode::SUCCESS);
    }

    info!(
        query = %request.query,
        limit = request.limit,
        username = %request.username,
        "Starting fetch"
    );

    let pipeline = Pipeline::from_config(config).context("Failed to build Graph API client")?;
    let report = pipeline.run(request, stamp).await;

    if report.all_succeeded() {
        info!("Fetch complete");
    } else {
        info!("Fetch finished with failures; see errors above");
    }

    Ok(ExitCode::SUCCESS)
}
