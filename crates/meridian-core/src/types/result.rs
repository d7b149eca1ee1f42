use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::types::event::Event;

/// Outcome of executing or validating a single transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    pub error: Option<AppError>,
    pub gas_wanted: u64,
    pub gas_used: u64,
    pub events: Vec<Event>,
    /// Encoded message responses, one per message in the transaction
    pub resp: Vec<Vec<u8>>,
}

impl TxResult {
    pub fn success(gas_wanted: u64, gas_used: u64) -> Self {
        TxResult {
            gas_wanted,
            gas_used,
            ..Default::default()
        }
    }

    pub fn failure(error: AppError, gas_wanted: u64, gas_used: u64) -> Self {
        TxResult {
            error: Some(error),
            gas_wanted,
            gas_used,
            ..Default::default()
        }
    }

    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Validator power change produced by the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub pub_key: Vec<u8>,
    /// e.g. "ed25519" or "secp256k1"; empty means ed25519
    pub pub_key_type: String,
    pub power: i64,
}

/// Everything the application produced while executing one block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockResponse {
    pub begin_block_events: Vec<Event>,
    pub end_block_events: Vec<Event>,
    pub tx_results: Vec<TxResult>,
    pub validator_updates: Vec<ValidatorUpdate>,
}
