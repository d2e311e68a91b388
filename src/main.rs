//! wsdom - Remote-DOM synchronization server
//!
//! Main entry point for the wsdom CLI and server.

mod cli;
mod cmd_mirror;
mod cmd_serve;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use wsdom_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};

use crate::cli::{Cli, Commands};

/// Initialize tracing with console and, if enabled, daily rolling file
/// output.
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let file_layer = if logging.file {
        let log_dir = ConfigLoader::expand_path(&logging.dir);
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir))?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("wsdom")
            .filename_suffix("log")
            .max_log_files(30)
            .build(&log_dir)
            .context("Failed to create log file appender")?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // The guard flushes on drop; keep it for the whole process.
        static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
            std::sync::OnceLock::new();
        let _ = GUARD.set(guard);

        Some(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .boxed(),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(file_layer)
        .init();

    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    ConfigLoader::load_or_default(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Print validation results. Returns `false` if there were errors.
fn check_config(path: &Path, config: &Config) -> Result<bool> {
    let result = ConfigValidator::validate(config)?;

    for warning in &result.warnings {
        println!("warning: {}", warning);
    }
    for error in &result.errors {
        println!("error: {}", error);
    }
    if result.is_valid() {
        println!(
            "{}: ok ({} warning(s))",
            path.display(),
            result.warnings.len()
        );
    }
    Ok(result.is_valid())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    init_tracing(&config.logging)?;

    match cli.command {
        None => cmd_serve::serve(config, None, None).await,
        Some(Commands::Serve { host, port }) => cmd_serve::serve(config, host, port).await,
        Some(Commands::Mirror {
            url,
            print_every_batch,
        }) => cmd_mirror::mirror(&url, &config, print_every_batch).await,
        Some(Commands::CheckConfig) => {
            if check_config(&cli.config, &config)? {
                Ok(())
            } else {
                anyhow::bail!("Configuration is invalid")
            }
        }
    }
}
