//! Flowpilot - workflow editor companion
//!
//! Main entry point for the Flowpilot CLI.

mod cli;
mod commands;
mod store;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use flowpilot_config::{ConfigLoader, ConfigValidator, LoggingConfig};
use tracing::{debug, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;

/// Get the Flowpilot home directory (`~/.flowpilot`).
pub(crate) fn flowpilot_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".flowpilot")
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let log_dir = match &logging.directory {
        Some(dir) => PathBuf::from(ConfigLoader::expand_path(&dir.to_string_lossy())),
        None => flowpilot_dir().join("logs"),
    };
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("flowpilot")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes the file writer on exit.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    // stdout carries command output, so the console layer writes to stderr.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(endpoint) = cli.endpoint {
        config.browser.endpoint = endpoint;
    }
    if let Some(target) = cli.target {
        config.browser.target_url = Some(target);
    }

    init_tracing(&config.logging)?;
    debug!("Configuration loaded from {}", cli.config.display());

    for warning in ConfigValidator::validate(&config).into_result()? {
        warn!("{}: {}", warning.path, warning.message);
    }

    commands::run(cli.command, config).await
}
