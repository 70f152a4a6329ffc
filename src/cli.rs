// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `spiceserver`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "spiceserver",
    version,
    about = "Run SPICE simulators on behalf of gRPC clients and stream their output.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Without one, built-in defaults are used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Port to listen on. Overrides `[server].port`.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Search PATH for well-known simulators at startup (true/false).
    /// Overrides `[server].find_simulators`, which defaults to true.
    #[arg(long, value_name = "BOOL")]
    pub find_simulators: Option<bool>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SPICESERVER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load config, build the simulator registry and print it, but don't
    /// start the server.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
