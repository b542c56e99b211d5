use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// File that receives every record when `--logging debug` is selected
pub const DEBUG_LOG_FILE: &str = "create_cluster_debug.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    Summary,
    Report,
    Info,
    Debug,
}

impl LogLevel {
    /// `summary` and `report` are progress levels shown on the console
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::Critical | LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Summary | LogLevel::Report | LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

/// `RUST_LOG` wins over the command line level when set
pub fn init(level: LogLevel) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));

    if level == LogLevel::Debug {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(DEBUG_LOG_FILE)
            .with_context(|| format!("Failed to open {}", DEBUG_LOG_FILE))?;

        println!(
            "{}",
            format!("Logs will be appended in {}", DEBUG_LOG_FILE).dimmed()
        );

        tracing_subscriber::fmt()
            .with_writer(Mutex::new(file))
            .with_env_filter(filter)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .init();
    }

    Ok(())
}
