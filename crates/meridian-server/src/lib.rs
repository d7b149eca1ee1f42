//! Meridian Server - Standalone ABCI endpoint
//!
//! Serves every consensus protocol method over HTTP/JSON so the consensus
//! engine can run as a separate process.

pub mod error;
pub mod http;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use meridian_abci::{Config, Consensus};
use meridian_core::Tx;
use tokio_util::sync::CancellationToken;
use tracing::info;

use http::{create_router, ServerState};

pub use error::ServerError;

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    /// Derive the listener from the adapter config; requires standalone mode
    pub fn from_config(cfg: &Config) -> Result<Self, ServerError> {
        if !cfg.standalone {
            return Err(ServerError::NotStandalone);
        }
        cfg.validate()?;
        Ok(ServerConfig {
            addr: cfg.listen_addr()?,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 26658)),
        }
    }
}

/// ABCI server
pub struct AbciServer<T: Tx> {
    state: Arc<ServerState<T>>,
}

impl<T: Tx> AbciServer<T> {
    pub fn new(consensus: Arc<Consensus<T>>) -> Self {
        AbciServer {
            state: Arc::new(ServerState {
                consensus,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Token cancelled when the server stops, on halt or on request
    pub fn shutdown_token(&self) -> CancellationToken {
        self.state.shutdown.clone()
    }

    pub fn router(&self) -> Router {
        create_router(Arc::clone(&self.state))
    }

    /// Serve until the shutdown token is cancelled
    pub async fn run(self) -> Result<(), ServerError> {
        let config = ServerConfig::from_config(self.state.consensus.config())?;
        let router = self.router();
        let shutdown = self.shutdown_token();

        info!("Starting ABCI server on {}", config.addr);

        let listener = tokio::net::TcpListener::bind(config.addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("ABCI server stopped");
        Ok(())
    }
}
