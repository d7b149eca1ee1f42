use std::collections::HashSet;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Operational policy of the adapter, fixed for the life of the process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serve the consensus engine over a local listener instead of in-process
    pub standalone: bool,

    /// Listener address used in standalone mode
    pub addr: String,

    /// Minimum number of recent blocks to keep; 0 disables pruning
    pub min_retain_blocks: u64,

    /// Stop once a block above this height is finalized; 0 disables
    pub halt_height: u64,

    /// Stop once a block later than this unix time is finalized; 0 disables
    pub halt_time: u64,

    /// Height of the first block of the chain
    pub initial_height: u64,

    /// `"{event}.{attribute}"` pairs to index; empty indexes everything
    pub index_events: Vec<String>,

    /// Put full error detail into wire logs
    pub debug: bool,

    pub app_name: String,

    pub version: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            standalone: false,
            addr: "127.0.0.1:26658".to_string(),
            min_retain_blocks: 0,
            halt_height: 0,
            halt_time: 0,
            initial_height: 1,
            index_events: Vec::new(),
            debug: false,
            app_name: "meridian".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_height == 0 {
            return Err(ConfigError::ZeroInitialHeight);
        }

        if self.standalone {
            if self.addr.is_empty() {
                return Err(ConfigError::MissingAddr);
            }
            self.listen_addr()?;
        }

        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.addr
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(self.addr.clone()))
    }

    pub fn index_set(&self) -> HashSet<String> {
        self.index_events.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("initial height must be at least 1")]
    ZeroInitialHeight,

    #[error("standalone mode requires a listener address")]
    MissingAddr,

    #[error("invalid listener address: {0}")]
    InvalidAddr(String),
}
