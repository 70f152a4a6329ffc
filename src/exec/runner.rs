// src/exec/runner.rs

//! Single child process with piped stdout/stderr.
//!
//! Lifecycle: `Idle → Spawned → Draining → Terminated`.
//!
//! Callers spawn the child, call [`ProcessRunner::poll_output`] until it
//! returns `false` (the "drain loop"), then call
//! [`ProcessRunner::wait_for_completion`] to reap it.

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::errors::{Result, SpiceError};
use crate::types::{ExitStatus, StreamKind};

/// Maximum bytes delivered per callback invocation.
pub const CHUNK_SIZE: usize = 4096;

/// Default cap on how long one `poll_output` pass waits for data.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Exit code reported when the target program cannot be found or executed.
pub const EXEC_FAILURE_EXIT_CODE: i32 = 127;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Idle,
    Spawned,
    Draining,
    Terminated,
}

/// A channel that closed because of a read error rather than EOF. Anything
/// the child wrote after that point is lost; the job itself keeps going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialOutputLoss {
    pub stream: StreamKind,
    pub error: String,
}

#[derive(Debug)]
pub struct ProcessRunner {
    state: RunnerState,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    /// Set when spawning failed at exec time: there is no child to wait on.
    pending_exit: Option<ExitStatus>,
    poll_interval: Duration,
    losses: Vec<PartialOutputLoss>,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl ProcessRunner {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            state: RunnerState::Idle,
            child: None,
            stdout: None,
            stderr: None,
            pending_exit: None,
            poll_interval,
            losses: Vec::new(),
        }
    }

    pub fn state(&self) -> RunnerState {
        self.state
    }

    /// True iff `spawn` succeeded and `wait_for_completion` has not returned.
    pub fn is_running(&self) -> bool {
        matches!(self.state, RunnerState::Spawned | RunnerState::Draining)
    }

    /// OS process id of the live child, if any.
    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }

    pub fn output_losses(&self) -> &[PartialOutputLoss] {
        &self.losses
    }

    /// Start `command` with `args` in `working_dir`.
    ///
    /// stdout and stderr each go to their own pipe; the child's write ends are
    /// closed in this process as soon as the child exists. If the program
    /// cannot be located or executed, this still succeeds: the runner reports
    /// no output and an exit code of [`EXEC_FAILURE_EXIT_CODE`].
    pub fn spawn(&mut self, command: &Path, args: &[String], working_dir: &Path) -> Result<()> {
        if self.is_running() {
            return Err(SpiceError::AlreadyRunning(format!(
                "runner already owns a child (state {:?})",
                self.state
            )));
        }

        self.losses.clear();
        self.pending_exit = None;

        let mut cmd = Command::new(command);
        cmd.args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match cmd.spawn() {
            Ok(mut child) => {
                self.stdout = child.stdout.take();
                self.stderr = child.stderr.take();
                info!(
                    command = %command.display(),
                    ?args,
                    working_dir = %working_dir.display(),
                    pid = child.id(),
                    "spawned child process"
                );
                self.child = Some(child);
            }
            Err(err) if is_exec_failure(&err) => {
                warn!(
                    command = %command.display(),
                    error = %err,
                    exit_code = EXEC_FAILURE_EXIT_CODE,
                    "program could not be executed"
                );
                self.pending_exit = Some(ExitStatus::Exited(EXEC_FAILURE_EXIT_CODE));
            }
            Err(err) => return Err(classify_spawn_error(command, err)),
        }

        self.state = RunnerState::Spawned;
        Ok(())
    }

    /// One bounded-latency pass over both channels.
    ///
    /// Waits at most the poll interval for either channel to become readable,
    /// reads up to [`CHUNK_SIZE`] bytes from the one that did and hands them
    /// to `on_chunk`. EOF or a hard read error closes that channel for good.
    ///
    /// Returns `true` while at least one channel is still open.
    pub async fn poll_output<F>(&mut self, mut on_chunk: F) -> bool
    where
        F: FnMut(&[u8], StreamKind),
    {
        if !self.channels_open() {
            return false;
        }
        if self.state == RunnerState::Spawned {
            self.state = RunnerState::Draining;
        }

        let mut out_buf = [0u8; CHUNK_SIZE];
        let mut err_buf = [0u8; CHUNK_SIZE];
        let interval = self.poll_interval;

        let ready = {
            let stdout = &mut self.stdout;
            let stderr = &mut self.stderr;
            tokio::select! {
                res = read_channel(stdout, &mut out_buf) => Some((StreamKind::Stdout, res)),
                res = read_channel(stderr, &mut err_buf) => Some((StreamKind::Stderr, res)),
                _ = tokio::time::sleep(interval) => None,
            }
        };

        if let Some((stream, res)) = ready {
            let buf = match stream {
                StreamKind::Stdout => &out_buf,
                StreamKind::Stderr => &err_buf,
            };
            match res {
                Ok(0) => {
                    debug!(%stream, "channel reached EOF");
                    self.close_channel(stream);
                }
                Ok(n) => on_chunk(&buf[..n], stream),
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                    ) => {}
                Err(err) => {
                    warn!(%stream, error = %err, "read error; closing channel, output may be lost");
                    self.losses.push(PartialOutputLoss {
                        stream,
                        error: err.to_string(),
                    });
                    self.close_channel(stream);
                }
            }
        }

        self.channels_open()
    }

    /// Block until the child exits.
    ///
    /// Both read ends are released first. Calling this while channels are
    /// still open is legal but drops any output not yet read.
    ///
    /// Cancel-safe: if the future is dropped before the child exits, the
    /// runner still owns the child and can `terminate` it.
    pub async fn wait_for_completion(&mut self) -> Result<ExitStatus> {
        if !self.is_running() {
            return Err(SpiceError::Internal(format!(
                "no child to wait for (state {:?})",
                self.state
            )));
        }

        if self.channels_open() {
            debug!("waiting with channels still open; unread output is discarded");
        }
        self.stdout = None;
        self.stderr = None;

        if let Some(status) = self.pending_exit.take() {
            self.state = RunnerState::Terminated;
            return Ok(status);
        }

        let Some(child) = self.child.as_mut() else {
            self.state = RunnerState::Terminated;
            return Err(SpiceError::Internal("spawned runner lost its child".into()));
        };

        let pid = child.id();
        let waited = child.wait().await;
        self.child = None;
        self.state = RunnerState::Terminated;

        let status = ExitStatus::from(
            waited.map_err(|e| SpiceError::Internal(format!("waiting for child {pid:?}: {e}")))?,
        );
        info!(?pid, exit_code = status.code(), %status, "child process exited");
        Ok(status)
    }

    /// Stop the child: send `signal`, give it `grace` to exit, then SIGKILL.
    ///
    /// Channels are dropped immediately and the child is always reaped.
    pub async fn terminate(&mut self, signal: Signal, grace: Duration) -> Result<ExitStatus> {
        if !self.is_running() {
            return Err(SpiceError::Internal(format!(
                "no child to terminate (state {:?})",
                self.state
            )));
        }

        self.stdout = None;
        self.stderr = None;

        if let Some(child) = self.child.as_mut() {
            if let Some(pid) = child.id() {
                match signal::kill(Pid::from_raw(pid as i32), signal) {
                    Ok(()) => info!(pid, %signal, "signalled child process"),
                    Err(Errno::ESRCH) => debug!(pid, "child already gone"),
                    Err(e) => warn!(pid, %signal, error = %e, "failed to signal child"),
                }
            }

            if tokio::time::timeout(grace, child.wait()).await.is_err() {
                warn!(pid = child.id(), "child ignored {signal}; sending SIGKILL");
                if let Err(e) = child.start_kill() {
                    warn!(error = %e, "failed to SIGKILL child");
                }
            }
        }

        self.wait_for_completion().await
    }

    fn channels_open(&self) -> bool {
        self.stdout.is_some() || self.stderr.is_some()
    }

    fn close_channel(&mut self, stream: StreamKind) {
        match stream {
            StreamKind::Stdout => self.stdout = None,
            StreamKind::Stderr => self.stderr = None,
        }
    }
}

async fn read_channel<R>(channel: &mut Option<R>, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match channel {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}

fn is_exec_failure(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    ) || err.raw_os_error() == Some(Errno::ENOEXEC as i32)
}

fn classify_spawn_error(command: &Path, err: io::Error) -> SpiceError {
    let exhausted = err.raw_os_error().is_some_and(|code| {
        matches!(
            Errno::from_raw(code),
            Errno::EMFILE | Errno::ENFILE | Errno::EAGAIN | Errno::ENOMEM
        )
    });
    let message = format!("spawning {}: {err}", command.display());
    if exhausted {
        SpiceError::ResourceExhausted(message)
    } else {
        SpiceError::Internal(message)
    }
}
