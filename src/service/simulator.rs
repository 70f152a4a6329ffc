// src/service/simulator.rs

//! gRPC `SpiceSimulator` service.
//!
//! `RunSimulation` validates the request and starts a job on the calling
//! task, so every rejection (bad request, unregistered flavour, spawn failure)
//! comes back as an RPC error before any response is streamed. Once the child
//! exists, a dedicated Tokio task drains it into the response stream and the
//! call always finishes OK; the simulator's own outcome travels in the final
//! message's `exit_code`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};
use tracing::{debug, error, info, warn};

use crate::errors::SpiceError;
use crate::job::{Job, JobInput, JobManager};
use crate::proto::spice_simulator_server::SpiceSimulator;
use crate::proto::{
    ListSimulatorsRequest, ListSimulatorsResponse, SimulationRequest, SimulationResponse,
};
use crate::service::convert::{chunk_response, done_response, job_input_from_wire, simulator_entry};
use crate::types::{ExitStatus, Flavour, OutputChunk};

/// Responses buffered per call before the drain loop waits on the client.
const RESPONSE_BUFFER: usize = 64;

type ResponseSender = mpsc::Sender<Result<SimulationResponse, Status>>;

pub struct SimulatorService {
    jobs: Arc<JobManager>,
    job_timeout: Option<Duration>,
}

impl SimulatorService {
    pub fn new(jobs: Arc<JobManager>) -> Self {
        Self {
            jobs,
            job_timeout: None,
        }
    }

    /// Terminate jobs that run longer than `timeout`.
    pub fn with_job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.job_timeout = timeout;
        self
    }
}

/// Pull the flavour and input out of a request, rejecting incomplete ones.
pub fn validate_request(
    request: &mut SimulationRequest,
) -> Result<(Flavour, JobInput), SpiceError> {
    if request.simulator == 0 {
        return Err(SpiceError::InvalidArgument(
            "simulator flavour is required".into(),
        ));
    }
    let flavour = Flavour::from_wire(request.simulator).ok_or_else(|| {
        SpiceError::InvalidArgument(format!("unknown simulator flavour {}", request.simulator))
    })?;
    let input = job_input_from_wire(request.input.take())
        .ok_or_else(|| SpiceError::InvalidArgument("no circuit inputs".into()))?;
    Ok((flavour, input))
}

#[tonic::async_trait]
impl SpiceSimulator for SimulatorService {
    type RunSimulationStream = ReceiverStream<Result<SimulationResponse, Status>>;

    async fn run_simulation(
        &self,
        request: Request<SimulationRequest>,
    ) -> Result<Response<Self::RunSimulationStream>, Status> {
        let mut request = request.into_inner();
        let (flavour, input) = validate_request(&mut request).map_err(|e| {
            debug!(error = %e, "rejecting simulation request");
            Status::from(e)
        })?;

        let job = self
            .jobs
            .run_job(flavour, input, std::mem::take(&mut request.additional_args))
            .await
            .map_err(|e| {
                warn!(%flavour, error = %e, "failed to start simulation");
                Status::from(e)
            })?;

        info!(
            %flavour,
            job_dir = %job.working_dir().display(),
            pid = job.runner().pid(),
            "simulation started"
        );

        let (tx, rx) = mpsc::channel(RESPONSE_BUFFER);
        tokio::spawn(stream_job(job, tx, self.job_timeout));

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn list_simulators(
        &self,
        _request: Request<ListSimulatorsRequest>,
    ) -> Result<Response<ListSimulatorsResponse>, Status> {
        let simulators = self
            .jobs
            .registry()
            .get_all_descriptors()
            .iter()
            .map(|(flavour, descriptor)| simulator_entry(*flavour, descriptor))
            .collect();

        Ok(Response::new(ListSimulatorsResponse { simulators }))
    }
}

/// Drain `job` into `tx`, then send the single `done` message.
///
/// If the client goes away the job is cancelled (child stopped, directory
/// removed). If `timeout` elapses the child is terminated and the final
/// message is flagged `timed_out`. Both hold while waiting for a child that
/// has already closed its stdout and stderr.
async fn stream_job(mut job: Job, tx: ResponseSender, timeout: Option<Duration>) {
    let deadline = timeout.map(|t| Instant::now() + t);
    let mut pending: Vec<OutputChunk> = Vec::new();
    let mut timed_out = false;

    loop {
        let open = job
            .poll_output(|bytes, stream| pending.push(OutputChunk::new(bytes, stream)))
            .await;

        for chunk in pending.drain(..) {
            if tx.send(Ok(chunk_response(chunk))).await.is_err() {
                info!(job_dir = %job.working_dir().display(), "client went away; cancelling job");
                job.cancel().await;
                return;
            }
        }

        if !open {
            break;
        }
        if tx.is_closed() {
            info!(job_dir = %job.working_dir().display(), "client went away; cancelling job");
            job.cancel().await;
            return;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            timed_out = true;
            break;
        }
    }

    // Both channels may be closed while the child keeps running, so the wait
    // is still bounded by the deadline and abandoned if the client leaves.
    let outcome = if timed_out {
        WaitOutcome::DeadlinePassed
    } else {
        tokio::select! {
            biased;
            res = job.wait_for_completion() => WaitOutcome::Exited(res),
            _ = tx.closed() => WaitOutcome::ClientGone,
            _ = sleep_until(deadline) => WaitOutcome::DeadlinePassed,
        }
    };

    let result = match outcome {
        WaitOutcome::Exited(res) => res,
        WaitOutcome::ClientGone => {
            info!(job_dir = %job.working_dir().display(), "client went away; cancelling job");
            job.cancel().await;
            return;
        }
        WaitOutcome::DeadlinePassed => {
            timed_out = true;
            warn!(job_dir = %job.working_dir().display(), "job exceeded its deadline; terminating");
            job.terminate().await
        }
    };

    let status = result.unwrap_or_else(|e| {
        error!(job_dir = %job.working_dir().display(), error = %e, "lost track of simulator process");
        ExitStatus::Signaled(0)
    });

    info!(
        flavour = %job.flavour(),
        job_dir = %job.working_dir().display(),
        exit_code = status.code(),
        timed_out,
        "simulation finished"
    );

    if tx.send(Ok(done_response(status, timed_out))).await.is_err() {
        debug!("client went away before the final response");
    }
}

enum WaitOutcome {
    Exited(Result<ExitStatus, SpiceError>),
    ClientGone,
    DeadlinePassed,
}

/// Resolves at `deadline`, or never when there is none.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
