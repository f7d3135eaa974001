// src/logging.rs

//! Tracing setup for the binary.
//!
//! The subscriber writes to stderr, keeping stdout free for task listings,
//! plans and script output. The level comes from the `--log-level` flag when
//! given, otherwise from `TASKDOCK_LOG` (which accepts full `EnvFilter`
//! directives, e.g. `taskdock=debug,info`), otherwise `info`.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Install the global subscriber. Call once, before the engine starts.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(directive(level)),
        None => EnvFilter::try_from_env("TASKDOCK_LOG")
            .unwrap_or_else(|_| EnvFilter::new("info")),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
