// src/job/manager.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::Signal;
use tempfile::TempDir;
use tracing::{info, warn};

use crate::config::ConfigFile;
use crate::errors::{Result, SpiceError};
use crate::exec::ProcessRunner;
use crate::exec::runner::DEFAULT_POLL_INTERVAL;
use crate::job::active::{ActiveGuard, ActiveJobs};
use crate::job::workdir::{materialize_inputs, new_job_dir, remove_job_dir, validate_input_files};
use crate::job::{JobInput, StructuredInput};
use crate::netlist::Netlister;
use crate::registry::{Descriptor, Registry};
use crate::types::{ExitStatus, Flavour, StreamKind};

/// Knobs shared by every job a manager starts.
#[derive(Debug, Clone)]
pub struct JobSettings {
    /// Parent directory for job working directories.
    pub root: PathBuf,
    pub poll_interval: Duration,
    pub cancel_signal: Signal,
    pub cancel_grace: Duration,
    /// Upper bound on one netlister run.
    pub netlist_timeout: Duration,
}

/// Default cap on one netlister run.
pub const DEFAULT_NETLIST_TIMEOUT: Duration = Duration::from_secs(300);

impl JobSettings {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancel_signal: Signal::SIGTERM,
            cancel_grace: Duration::from_secs(2),
            netlist_timeout: DEFAULT_NETLIST_TIMEOUT,
        }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            root: cfg.jobs.root_dir(),
            poll_interval: cfg.server.poll_interval(),
            cancel_signal: cfg.cancel_signal(),
            cancel_grace: cfg.jobs.cancel_grace(),
            netlist_timeout: cfg
                .netlister
                .as_ref()
                .map_or(DEFAULT_NETLIST_TIMEOUT, |n| n.timeout()),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }

    pub fn with_netlist_timeout(mut self, timeout: Duration) -> Self {
        self.netlist_timeout = timeout;
        self
    }
}

/// Starts simulation jobs.
///
/// Shared by all requests; each call to [`JobManager::run_job`] produces an
/// independent [`Job`] with its own directory, pipes and child process.
pub struct JobManager {
    registry: Arc<Registry>,
    settings: JobSettings,
    netlister: Option<Arc<dyn Netlister>>,
    active: ActiveJobs,
}

impl JobManager {
    pub fn new(registry: Arc<Registry>, settings: JobSettings) -> Self {
        Self {
            registry,
            settings,
            netlister: None,
            active: ActiveJobs::new(),
        }
    }

    /// Enable structured input by routing it through `netlister`.
    pub fn with_netlister(mut self, netlister: Arc<dyn Netlister>) -> Self {
        self.netlister = Some(netlister);
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn settings(&self) -> &JobSettings {
        &self.settings
    }

    /// Directories of jobs this manager started that are still live.
    pub fn active_jobs(&self) -> &ActiveJobs {
        &self.active
    }

    /// Resolve `flavour`, lay out inputs in a fresh directory and spawn the
    /// simulator with `[<primary input>, extra_args...]`.
    ///
    /// Unregistered flavours and unsafe input paths fail before anything
    /// touches the disk. Until the spawn succeeds the directory is owned by a
    /// [`TempDir`], so any failure (or dropping this future) removes it.
    pub async fn run_job(
        &self,
        flavour: Flavour,
        input: JobInput,
        extra_args: Vec<String>,
    ) -> Result<Job> {
        let descriptor = self.registry.get_descriptor(flavour).ok_or_else(|| {
            SpiceError::InvalidArgument(format!("no simulator registered for flavour {flavour}"))
        })?;

        match input {
            JobInput::Verbatim(files) => {
                let relative_paths = validate_input_files(&files)?;
                let dir = new_job_dir(&self.settings.root)?;
                info!(%flavour, job_dir = %dir.path().display(), files = files.len(), "preparing job");

                materialize_inputs(dir.path(), &files, &relative_paths).await?;

                let primary = relative_paths[0].clone();
                self.start(flavour, &descriptor, dir, relative_paths, primary, extra_args)
                    .await
            }
            JobInput::Structured(structured) => {
                self.run_structured(flavour, &descriptor, structured, extra_args)
                    .await
            }
        }
    }

    async fn run_structured(
        &self,
        flavour: Flavour,
        descriptor: &Descriptor,
        structured: StructuredInput,
        extra_args: Vec<String>,
    ) -> Result<Job> {
        let netlister = self.netlister.as_ref().ok_or_else(|| {
            SpiceError::Unimplemented("structured input needs a configured netlister".into())
        })?;

        let dir = new_job_dir(&self.settings.root)?;
        info!(%flavour, job_dir = %dir.path().display(), format = %structured.format, "netlisting job input");

        let limit = self.settings.netlist_timeout;
        let netlisting = netlister.write_sim(&structured, flavour, dir.path());
        let Ok(generated) = tokio::time::timeout(limit, netlisting).await else {
            warn!(%flavour, job_dir = %dir.path().display(), ?limit, "netlister timed out");
            return Err(SpiceError::InvalidArgument(format!(
                "netlisting did not finish within {limit:?}"
            )));
        };
        let Some(primary) = generated.first().cloned() else {
            return Err(SpiceError::InvalidArgument(format!(
                "could not convert {} input to a {flavour} netlist",
                if structured.format.is_empty() { "structured" } else { structured.format.as_str() }
            )));
        };

        self.start(flavour, descriptor, dir, generated, primary, extra_args)
            .await
    }

    async fn start(
        &self,
        flavour: Flavour,
        descriptor: &Descriptor,
        dir: TempDir,
        input_files: Vec<PathBuf>,
        primary: PathBuf,
        extra_args: Vec<String>,
    ) -> Result<Job> {
        let mut args = Vec::with_capacity(extra_args.len() + 1);
        args.push(primary.to_string_lossy().into_owned());
        args.extend(extra_args.iter().cloned());

        let mut runner = ProcessRunner::new(self.settings.poll_interval);
        if let Err(err) = runner.spawn(&descriptor.executable_path, &args, dir.path()) {
            warn!(%flavour, job_dir = %dir.path().display(), error = %err, "failed to start simulator");
            return Err(err);
        }

        let working_dir = dir.keep();
        let active = self.active.track(working_dir.clone());
        Ok(Job {
            flavour,
            working_dir,
            input_files,
            extra_args,
            runner,
            cancel_signal: self.settings.cancel_signal,
            cancel_grace: self.settings.cancel_grace,
            _active: active,
        })
    }
}

/// One running (or finished) simulation.
///
/// Owned by exactly one request handler. Dropping a running job kills the
/// child; call [`Job::cancel`] to also reap it and remove its directory.
/// The directory counts as active, and is skipped by the sweeper, until the
/// job is dropped.
#[derive(Debug)]
pub struct Job {
    flavour: Flavour,
    working_dir: PathBuf,
    input_files: Vec<PathBuf>,
    extra_args: Vec<String>,
    runner: ProcessRunner,
    cancel_signal: Signal,
    cancel_grace: Duration,
    _active: ActiveGuard,
}

impl Job {
    pub fn flavour(&self) -> Flavour {
        self.flavour
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Input files relative to the working directory, primary first.
    pub fn input_files(&self) -> &[PathBuf] {
        &self.input_files
    }

    pub fn extra_args(&self) -> &[String] {
        &self.extra_args
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    pub async fn poll_output<F>(&mut self, on_chunk: F) -> bool
    where
        F: FnMut(&[u8], StreamKind),
    {
        self.runner.poll_output(on_chunk).await
    }

    pub async fn wait_for_completion(&mut self) -> Result<ExitStatus> {
        self.runner.wait_for_completion().await
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_running()
    }

    /// Stop the child with the configured signal, escalating to SIGKILL after
    /// the grace period. The working directory is left in place.
    pub async fn terminate(&mut self) -> Result<ExitStatus> {
        self.runner
            .terminate(self.cancel_signal, self.cancel_grace)
            .await
    }

    /// Abandon the job: stop the child if it is still running, then delete
    /// the working directory.
    pub async fn cancel(mut self) {
        if self.runner.is_running() {
            match self.terminate().await {
                Ok(status) => info!(job_dir = %self.working_dir.display(), %status, "cancelled job"),
                Err(e) => warn!(job_dir = %self.working_dir.display(), error = %e, "error while cancelling job"),
            }
        }
        remove_job_dir(&self.working_dir).await;
    }
}
