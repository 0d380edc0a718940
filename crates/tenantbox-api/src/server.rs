//! HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tenantbox_runtime::coordinator::Coordinator;
use tokio::net::TcpListener;

use crate::api::create_router;
use crate::error::ServerError;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub listen: SocketAddr,
}

impl ServerConfig {
    /// Parses the configured listen address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Address`] if `listen` is not `host:port`.
    pub fn parse(listen: &str) -> Result<Self, ServerError> {
        let listen = listen.parse().map_err(|e| ServerError::Address {
            addr: listen.to_string(),
            source: e,
        })?;
        Ok(Self { listen })
    }
}

/// tenantbox HTTP server.
#[derive(Debug)]
pub struct ApiServer {
    config: ServerConfig,
    coordinator: Arc<Coordinator>,
}

impl ApiServer {
    /// Creates a new server.
    #[must_use]
    pub const fn new(config: ServerConfig, coordinator: Arc<Coordinator>) -> Self {
        Self {
            config,
            coordinator,
        }
    }

    /// Serves until Ctrl-C is received.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or the server fails.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(shutdown_signal()).await
    }

    /// Serves until `shutdown` completes, then drains in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or the server fails.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let listener =
            TcpListener::bind(self.config.listen)
                .await
                .map_err(|e| ServerError::Bind {
                    addr: self.config.listen,
                    source: e,
                })?;
        let local = listener.local_addr()?;
        tracing::info!(addr = %local, image = %self.coordinator.image(), "API server listening");

        let app = create_router(self.coordinator);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
