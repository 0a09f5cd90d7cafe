//! TCP listener: accepts connections and starts one session per client.

use std::{future::Future, sync::Arc};

use parley_shared::time::{Clock, SystemClock};
use tokio::net::TcpListener;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    actor::Directory,
    config::ServerConfig,
    session::{SessionError, serve_connection},
};

use super::signal::shutdown_signal;

/// Parley chat server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(ServerConfig::default());
/// server.run("127.0.0.1".to_string(), 2000).await?;
/// ```
pub struct Server {
    config: ServerConfig,
    clock: Arc<dyn Clock>,
}

impl Server {
    /// Create a new Server instance using the system clock
    pub fn new(config: ServerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// Run the chat server until Ctrl+C
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 2000)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Chat server listening on {}", listener.local_addr()?);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await;
        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Accept connections on `listener` until `shutdown` resolves.
    ///
    /// The Directory is started here, so every call serves an independent chat.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let directory = Directory::spawn(self.config, self.clock.clone());
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!("Failed to accept connection: {}", e);
                            continue;
                        }
                    };
                    let span = tracing::info_span!("session", id = %Uuid::new_v4(), %peer);
                    let session = serve_connection(
                        stream,
                        directory.clone(),
                        self.config,
                        self.clock.clone(),
                    );
                    tokio::spawn(
                        async move {
                            tracing::debug!("Connection accepted");
                            log_outcome(session.await);
                        }
                        .instrument(span),
                    );
                }
            }
        }
    }
}

fn log_outcome(outcome: Result<(), SessionError>) {
    match outcome {
        Ok(()) => tracing::debug!("Session ended"),
        Err(
            e @ (SessionError::LoginRejected(_)
            | SessionError::LoginTimeout
            | SessionError::ClosedBeforeLogin),
        ) => tracing::info!("Session ended: {}", e),
        Err(e) => tracing::warn!("Session ended: {}", e),
    }
}
