//! Server execution logic.

use std::{future::Future, io, sync::Arc};

use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{
    config::ServerConfig,
    handler::{
        connection::{ConnectionLimits, handle_connection},
        http::router,
    },
    state::AppState,
};

/// Fatal server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("admin HTTP server failed: {0}")]
    Http(#[source] io::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Collaborative editor server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(Arc::new(app_state), ServerConfig::default());
/// server.run(shutdown_signal()).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    config: ServerConfig,
}

impl Server {
    pub fn new(state: Arc<AppState>, config: ServerConfig) -> Self {
        Self { state, config }
    }

    /// Bind the configured ports and serve until `signal` resolves
    ///
    /// # Errors
    ///
    /// Returns an error if a port cannot be bound or the admin HTTP server fails.
    pub async fn run(self, signal: impl Future<Output = ()> + Send + 'static) -> Result<(), ServerError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        let http_listener = match self.config.http_bind_addr() {
            Some(addr) => Some(
                TcpListener::bind(&addr)
                    .await
                    .map_err(|source| ServerError::Bind { addr, source })?,
            ),
            None => None,
        };

        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            signal.await;
            trigger.cancel();
        });

        tracing::info!("Press Ctrl+C to shutdown gracefully");
        self.serve(listener, http_listener, shutdown).await
    }

    /// Serve on already bound listeners until `shutdown` is cancelled
    ///
    /// On shutdown the accept loop stops and every connection's receive loop ends.
    /// Once all connection tasks have finished, the current document is persisted once.
    pub async fn serve(
        self,
        listener: TcpListener,
        http_listener: Option<TcpListener>,
        shutdown: CancellationToken,
    ) -> Result<(), ServerError> {
        tracing::info!(
            "Collaborative editor server listening on {}",
            listener.local_addr()?
        );

        let http_task = match http_listener {
            Some(http_listener) => {
                tracing::info!(
                    "Admin HTTP listening on http://{}/api/health",
                    http_listener.local_addr()?
                );
                let app = router(self.state.clone());
                let http_shutdown = shutdown.clone();
                Some(tokio::spawn(async move {
                    axum::serve(http_listener, app)
                        .with_graceful_shutdown(async move { http_shutdown.cancelled().await })
                        .await
                }))
            }
            None => None,
        };

        let limits = ConnectionLimits::from(&self.config);
        let connections = TaskTracker::new();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Server shutting down");
                    break;
                }
                res = listener.accept() => {
                    match res {
                        Ok((stream, peer)) => {
                            tracing::info!("Accepted connection from {}", peer);
                            if let Err(e) = stream.set_nodelay(true) {
                                tracing::debug!("Failed to set TCP_NODELAY for {}: {}", peer, e);
                            }
                            connections.spawn(handle_connection(
                                stream,
                                self.state.clone(),
                                limits,
                                shutdown.child_token(),
                            ));
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }

        connections.close();
        tracing::info!("Waiting for {} connection(s) to finish", connections.len());
        connections.wait().await;

        match self.state.save_document_usecase.flush().await {
            Ok(()) => tracing::info!("Document persisted on shutdown"),
            Err(e) => tracing::error!("Failed to persist document on shutdown: {}", e),
        }

        if let Some(task) = http_task {
            match task.await {
                Ok(result) => result.map_err(ServerError::Http)?,
                Err(e) => tracing::error!("Admin HTTP task panicked: {}", e),
            }
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
