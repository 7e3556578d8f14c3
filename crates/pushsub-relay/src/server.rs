//! HTTP relay server
//!
//! Serves the relay endpoints on `127.0.0.1:8787` (configurable) until the
//! provided cancellation token is triggered.

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::handlers::{handle_request, RelayState};

/// HTTP server exposing the bind, unbind and send endpoints
pub struct RelayServer {
    state: Arc<RelayState>,
    addr: SocketAddr,
}

impl RelayServer {
    /// Creates a new `RelayServer`.
    ///
    /// # Arguments
    /// * `state` - Shared handler state
    /// * `endpoint` - Address to bind, e.g. `"127.0.0.1:8787"`
    pub fn new(state: Arc<RelayState>, endpoint: &str) -> anyhow::Result<Self> {
        let addr: SocketAddr = endpoint.parse()?;
        Ok(Self { state, addr })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Binds the configured address and serves until `shutdown` fires.
    ///
    /// Should be spawned as a background task or awaited from `main`.
    pub async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serves on an already-bound listener until `shutdown` fires.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> anyhow::Result<()> {
        let local = listener.local_addr()?;
        info!(addr = %local, topic = %self.state.topic(), "Relay server listening");

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, peer) = result?;
                    let io = TokioIo::new(stream);
                    let state = Arc::clone(&self.state);

                    tokio::spawn(async move {
                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move {
                                Ok::<_, std::convert::Infallible>(handle_request(req, &state).await)
                            }
                        });

                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            error!(error = %e, %peer, "Relay HTTP connection error");
                        }
                    });
                }
                _ = shutdown.cancelled() => {
                    info!("Relay server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}
