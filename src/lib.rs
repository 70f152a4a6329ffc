// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod job;
pub mod logging;
pub mod netlist;
pub mod proto;
pub mod registry;
pub mod service;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_and_validate};
use crate::job::{JobManager, JobSettings, spawn_sweeper};
use crate::netlist::CommandNetlister;
use crate::registry::Registry;
use crate::service::SimulatorService;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the simulator registry (PATH probing + `[[simulator]]` entries)
/// - the job manager and optional netlister
/// - the job directory sweeper
/// - the gRPC server, until Ctrl-C or SIGTERM
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(&args)?;
    let registry = Arc::new(build_registry(&cfg));

    if args.dry_run {
        print_dry_run(&cfg, &registry);
        return Ok(());
    }

    if registry.is_empty() {
        warn!("no simulators registered; every simulation request will be rejected");
    } else {
        info!("installed simulators:\n{}", registry.report_installed());
    }

    let mut jobs = JobManager::new(Arc::clone(&registry), JobSettings::from_config(&cfg));
    if let Some(section) = &cfg.netlister {
        info!(command = %section.command.display(), "structured input enabled");
        jobs = jobs.with_netlister(Arc::new(CommandNetlister::from_config(
            section,
            cfg.server.poll_interval(),
        )));
    }

    let sweeper = cfg
        .jobs
        .sweep_interval()
        .map(|interval| {
            spawn_sweeper(
                cfg.jobs.root_dir(),
                cfg.jobs.retention(),
                interval,
                jobs.active_jobs().clone(),
            )
        });

    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    let service = SimulatorService::new(Arc::new(jobs)).with_job_timeout(cfg.jobs.timeout());
    let served = service::serve(service, listener, shutdown_signal()).await;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    served?;
    Ok(())
}

/// Config file (or defaults) with CLI overrides applied.
pub fn load_config(args: &CliArgs) -> Result<ConfigFile> {
    let mut cfg = match &args.config {
        Some(path) => {
            load_and_validate(path).with_context(|| format!("loading config from {path}"))?
        }
        None => ConfigFile::default(),
    };

    if let Some(port) = args.port {
        cfg.server.port = port;
    }
    if let Some(find) = args.find_simulators {
        cfg.server.find_simulators = find;
    }
    Ok(cfg)
}

/// Probe PATH when enabled, then let `[[simulator]]` entries override.
pub fn build_registry(cfg: &ConfigFile) -> Registry {
    let registry = if cfg.server.find_simulators {
        let search_path = std::env::var_os("PATH").unwrap_or_default();
        Registry::probed(&search_path)
    } else {
        Registry::new()
    };
    registry.merge_static(&cfg.simulator);
    registry
}

async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => Some(term),
        Err(e) => {
            warn!(error = %e, "failed to listen for SIGTERM");
            None
        }
    };

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
        _ = async {
            match term.as_mut() {
                Some(term) => { term.recv().await; }
                None => std::future::pending::<()>().await,
            }
        } => {}
    }

    info!("shutdown requested; draining in-flight requests");
}

fn print_dry_run(cfg: &ConfigFile, registry: &Registry) {
    println!("spiceserver dry-run");
    println!("  server.listen = {}:{}", cfg.server.host, cfg.server.port);
    println!("  server.find_simulators = {}", cfg.server.find_simulators);
    println!("  server.poll_interval_ms = {}", cfg.server.poll_interval_ms);
    println!("  jobs.root = {}", cfg.jobs.root_dir().display());
    println!("  jobs.retention_secs = {}", cfg.jobs.retention_secs);
    println!("  jobs.sweep_interval_secs = {}", cfg.jobs.sweep_interval_secs);
    if let Some(timeout) = cfg.jobs.timeout_secs {
        println!("  jobs.timeout_secs = {timeout}");
    }
    println!("  jobs.cancel_signal = {}", cfg.cancel_signal());
    println!("  jobs.cancel_grace_ms = {}", cfg.jobs.cancel_grace_ms);
    if let Some(ref netlister) = cfg.netlister {
        println!("  netlister.command = {}", netlister.command.display());
        println!("  netlister.timeout_secs = {}", netlister.timeout_secs);
    }
    println!();

    println!("simulators ({} flavours):", registry.len());
    print!("{}", registry.report_installed());

    debug!("dry-run complete (server not started)");
}
