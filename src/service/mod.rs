// src/service/mod.rs

//! RPC surface: the `SpiceSimulator` gRPC service and its server.

pub mod convert;
pub mod simulator;

use std::future::Future;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tracing::info;

use crate::errors::Result;
use crate::proto::spice_simulator_server::SpiceSimulatorServer;

pub use simulator::{SimulatorService, validate_request};

/// Serve `service` on `listener` until `shutdown` resolves.
pub async fn serve<F>(service: SimulatorService, listener: TcpListener, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "spiceserver listening");
    }

    tonic::transport::Server::builder()
        .add_service(SpiceSimulatorServer::new(service))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await
        .map_err(anyhow::Error::from)?;

    info!("spiceserver stopped");
    Ok(())
}
