// src/config/validate.rs

use std::str::FromStr;

use nix::sys::signal::Signal;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SpiceError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SpiceError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

impl ConfigFile {
    /// The configured cancellation signal. Validation guarantees it parses.
    pub fn cancel_signal(&self) -> Signal {
        parse_signal(&self.jobs.cancel_signal).unwrap_or(Signal::SIGTERM)
    }
}

/// Accepts `"SIGTERM"`, `"TERM"` and any case thereof.
pub fn parse_signal(name: &str) -> Result<Signal> {
    let upper = name.trim().to_uppercase();
    let full = if upper.starts_with("SIG") {
        upper
    } else {
        format!("SIG{upper}")
    };
    Signal::from_str(&full)
        .map_err(|_| SpiceError::ConfigError(format!("unknown signal name '{name}'")))
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_server(cfg)?;
    validate_jobs(cfg)?;
    validate_netlister(cfg)?;
    validate_static_installs(cfg)?;
    Ok(())
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.poll_interval_ms == 0 {
        return Err(SpiceError::ConfigError(
            "[server].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.server.host.trim().is_empty() {
        return Err(SpiceError::ConfigError(
            "[server].host must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_jobs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.jobs.retention_secs == 0 {
        return Err(SpiceError::ConfigError(
            "[jobs].retention_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.jobs.cancel_grace_ms == 0 {
        return Err(SpiceError::ConfigError(
            "[jobs].cancel_grace_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.jobs.timeout_secs == Some(0) {
        return Err(SpiceError::ConfigError(
            "[jobs].timeout_secs must be >= 1 when set".to_string(),
        ));
    }
    parse_signal(&cfg.jobs.cancel_signal)?;
    Ok(())
}

fn validate_netlister(cfg: &RawConfigFile) -> Result<()> {
    if let Some(netlister) = &cfg.netlister {
        if netlister.command.as_os_str().is_empty() {
            return Err(SpiceError::ConfigError(
                "[netlister].command must not be empty".to_string(),
            ));
        }
        if netlister.timeout_secs == 0 {
            return Err(SpiceError::ConfigError(
                "[netlister].timeout_secs must be >= 1 (got 0)".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_static_installs(cfg: &RawConfigFile) -> Result<()> {
    for (idx, install) in cfg.simulator.iter().enumerate() {
        if install.path.as_os_str().is_empty() {
            return Err(SpiceError::ConfigError(format!(
                "[[simulator]] #{idx} ('{}') has an empty path",
                install.name
            )));
        }
        if install.flavours.is_empty() {
            return Err(SpiceError::ConfigError(format!(
                "[[simulator]] #{idx} ('{}') must list at least one flavour",
                install.name
            )));
        }
    }
    Ok(())
}
