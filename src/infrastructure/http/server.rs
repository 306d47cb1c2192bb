//! Background HTTP server with a synchronous stop.
//!
//! The listener is bound before [`ServerHandle::start`] returns, so callers can
//! issue requests against [`ServerHandle::base_url`] straight away.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("server failed: {0}")]
    Io(#[from] io::Error),
    #[error("server task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    drain_timeout: Duration,
    task: JoinHandle<io::Result<()>>,
}

impl ServerHandle {
    /// Bind `addr` and start serving `router` on it
    pub async fn bind(addr: &str, router: Router) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Self::start(listener, router)
    }

    /// Serve `router` on an already bound listener
    pub fn start(listener: TcpListener, router: Router) -> io::Result<Self> {
        let local_addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let signal = shutdown.clone().cancelled_owned();

        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(signal)
                .await
        });

        info!(%local_addr, "Server listening");

        Ok(Self {
            local_addr,
            shutdown,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            task,
        })
    }

    /// How long [`stop`](Self::stop) waits for open connections before aborting them
    pub fn with_drain_timeout(mut self, drain_timeout: Duration) -> Self {
        self.drain_timeout = drain_timeout;
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Stop accepting, drain open connections, and wait for the server task.
    ///
    /// Once the drain timeout elapses the server task is aborted and the call
    /// returns; requests still in flight at that point are abandoned.
    pub async fn stop(self) -> Result<(), ServerError> {
        let Self {
            local_addr,
            shutdown,
            drain_timeout,
            mut task,
        } = self;

        shutdown.cancel();

        match tokio::time::timeout(drain_timeout, &mut task).await {
            Ok(joined) => {
                joined??;
                info!(%local_addr, "Server stopped");
            }
            Err(_) => {
                warn!(
                    %local_addr,
                    drain_timeout_ms = drain_timeout.as_millis() as u64,
                    "Connections still open after drain timeout, aborting server"
                );
                task.abort();
                // The abort surfaces as a cancelled JoinError
                let _ = task.await;
            }
        }

        Ok(())
    }

    /// Serve until `signal` resolves, then [`stop`](Self::stop).
    ///
    /// Returns early if the server task ends on its own.
    pub async fn run_until<F>(mut self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = signal => {
                info!("Shutdown signal received");
            }
            joined = &mut self.task => {
                joined??;
                return Ok(());
            }
        }

        self.stop().await
    }
}
