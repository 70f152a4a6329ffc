// src/logging.rs

//! Logging setup for `spiceserver` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `SPICESERVER_LOG` environment variable, either a bare level ("debug")
//!    or full directives ("spiceserver=trace,h2=info")
//! 3. default to `info`
//!
//! Logs always go to STDERR.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "SPICESERVER_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::new(directives_for(level)),
        None => match std::env::var(LOG_ENV) {
            Ok(spec) if !spec.trim().is_empty() => EnvFilter::try_new(spec.trim())
                .with_context(|| format!("parsing {LOG_ENV}={spec:?}"))?,
            _ => EnvFilter::new(directives_for(LogLevel::Info)),
        },
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}

/// Filter directives for a CLI level. Below `warn`, the HTTP/2 transport
/// crates are capped at `info`.
fn directives_for(level: LogLevel) -> String {
    let name = match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    };
    match level {
        LogLevel::Error | LogLevel::Warn | LogLevel::Info => name.to_string(),
        LogLevel::Debug | LogLevel::Trace => format!("{name},h2=info,hyper=info,tower=info"),
    }
}
