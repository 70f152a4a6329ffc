#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use spiceserver::config::{ConfigFile, RawConfigFile, StaticInstall};
use spiceserver::job::{JobManager, JobSettings};
use spiceserver::proto::simulation_request::Input;
use spiceserver::proto::{self, SimulationRequest, SimulationResponse};
use spiceserver::registry::Registry;
use spiceserver::service::SimulatorService;
use spiceserver::types::Flavour;
use tokio_stream::StreamExt;
use tonic::{Request, Status};

use crate::stub::shell_registry;

/// Poll interval used by test job managers.
pub const TEST_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_jobs_root(mut self, root: &Path) -> Self {
        self.config.jobs.root = Some(root.to_path_buf());
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.server.poll_interval_ms = ms;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.config.jobs.timeout_secs = Some(secs);
        self
    }

    pub fn with_simulator(mut self, name: &str, path: &Path, flavours: &[Flavour]) -> Self {
        self.config.simulator.push(StaticInstall {
            path: path.to_path_buf(),
            version: "1.0".to_string(),
            name: name.to_string(),
            license: String::new(),
            flavours: flavours.to_vec(),
        });
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Job settings for tests: fast polling, short cancellation grace.
pub fn test_settings(root: &Path) -> JobSettings {
    JobSettings::new(root)
        .with_poll_interval(TEST_POLL_INTERVAL)
        .with_cancel_grace(Duration::from_millis(500))
}

/// Job manager over [`shell_registry`] writing job dirs under `root`.
pub fn shell_job_manager(root: &Path) -> JobManager {
    JobManager::new(Arc::new(shell_registry()), test_settings(root))
}

pub fn job_manager_with(registry: Registry, root: &Path) -> JobManager {
    JobManager::new(Arc::new(registry), test_settings(root))
}

pub fn service_for(jobs: JobManager) -> SimulatorService {
    SimulatorService::new(Arc::new(jobs))
}

/// Request carrying `files` (path, contents) verbatim.
pub fn verbatim_request(
    flavour: Flavour,
    files: &[(&str, &str)],
    args: &[&str],
) -> SimulationRequest {
    SimulationRequest {
        simulator: flavour.wire_value(),
        input: Some(Input::VerbatimFiles(proto::VerbatimFiles {
            files: files
                .iter()
                .map(|(path, data)| proto::FileInfo {
                    path: path.to_string(),
                    data: data.as_bytes().to_vec(),
                })
                .collect(),
        })),
        additional_args: args.iter().map(|a| a.to_string()).collect(),
    }
}

pub fn structured_request(flavour: Flavour, format: &str, payload: &[u8]) -> SimulationRequest {
    SimulationRequest {
        simulator: flavour.wire_value(),
        input: Some(Input::StructuredInput(proto::StructuredInput {
            format: format.to_string(),
            payload: payload.to_vec(),
        })),
        additional_args: Vec::new(),
    }
}

/// Call `RunSimulation` in-process and collect the whole response stream.
pub async fn run_and_collect(
    service: &SimulatorService,
    request: SimulationRequest,
) -> Result<Vec<SimulationResponse>, Status> {
    use spiceserver::proto::spice_simulator_server::SpiceSimulator;

    let mut stream = service
        .run_simulation(Request::new(request))
        .await?
        .into_inner();

    let mut responses = Vec::new();
    while let Some(item) = stream.next().await {
        responses.push(item?);
    }
    Ok(responses)
}

/// Concatenated output of every non-final response on `stream_type`.
pub fn collected_output(
    responses: &[SimulationResponse],
    stream_type: proto::simulation_response::StreamType,
) -> Vec<u8> {
    responses
        .iter()
        .filter(|r| !r.done && r.stream_type == stream_type as i32)
        .flat_map(|r| r.output.iter().copied())
        .collect()
}
