// src/netlist/command.rs

//! Netlister backed by an external command.
//!
//! Invocation, with the job directory as working directory:
//!
//! ```text
//! <command> [args...] sim_input.pb <FLAVOUR> <output_dir>
//! ```
//!
//! The tool prints one generated file path per line on stdout, top-level
//! file first. Anything on stderr is logged. A non-zero exit means failure.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::NetlisterSection;
use crate::exec::ProcessRunner;
use crate::exec::runner::DEFAULT_POLL_INTERVAL;
use crate::job::StructuredInput;
use crate::netlist::Netlister;
use crate::types::{Flavour, StreamKind};

/// File the structured payload is written to before the tool runs.
pub const SIM_INPUT_FILE: &str = "sim_input.pb";

#[derive(Debug, Clone)]
pub struct CommandNetlister {
    command: PathBuf,
    args: Vec<String>,
    poll_interval: Duration,
}

impl CommandNetlister {
    pub fn new(command: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn from_config(section: &NetlisterSection, poll_interval: Duration) -> Self {
        Self {
            command: section.command.clone(),
            args: section.args.clone(),
            poll_interval,
        }
    }

    async fn run(
        &self,
        input: &StructuredInput,
        flavour: Flavour,
        output_dir: &Path,
    ) -> Vec<PathBuf> {
        let input_path = output_dir.join(SIM_INPUT_FILE);
        if let Err(e) = tokio::fs::write(&input_path, &input.payload).await {
            warn!(path = %input_path.display(), error = %e, "failed to write structured input");
            return Vec::new();
        }
        debug!(path = %input_path.display(), bytes = input.payload.len(), "structured input written");

        let mut args = self.args.clone();
        args.push(SIM_INPUT_FILE.to_string());
        args.push(flavour.name().to_string());
        args.push(output_dir.to_string_lossy().into_owned());

        let mut runner = ProcessRunner::new(self.poll_interval);
        if let Err(e) = runner.spawn(&self.command, &args, output_dir) {
            warn!(command = %self.command.display(), error = %e, "failed to start netlister");
            return Vec::new();
        }

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        while runner
            .poll_output(|bytes, stream| match stream {
                StreamKind::Stdout => stdout.extend_from_slice(bytes),
                StreamKind::Stderr => stderr.extend_from_slice(bytes),
            })
            .await
        {}

        for line in String::from_utf8_lossy(&stderr).lines() {
            debug!(command = %self.command.display(), "netlister stderr: {}", line);
        }

        let status = match runner.wait_for_completion().await {
            Ok(status) => status,
            Err(e) => {
                warn!(command = %self.command.display(), error = %e, "waiting for netlister failed");
                return Vec::new();
            }
        };
        if !status.success() {
            warn!(command = %self.command.display(), %status, "netlister failed");
            return Vec::new();
        }

        let generated = parse_generated_paths(&stdout);
        info!(%flavour, files = generated.len(), "netlister finished");
        generated
    }
}

impl Netlister for CommandNetlister {
    fn write_sim<'a>(
        &'a self,
        input: &'a StructuredInput,
        flavour: Flavour,
        output_dir: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Vec<PathBuf>> + Send + 'a>> {
        Box::pin(self.run(input, flavour, output_dir))
    }
}

/// One path per non-blank line, surrounding whitespace trimmed.
pub fn parse_generated_paths(stdout: &[u8]) -> Vec<PathBuf> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}
