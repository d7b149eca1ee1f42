use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::hash::{hash_blake3, Hash};
use crate::serialize::{from_bytes, to_bytes};

/// Capability the adapter needs from an application transaction.
///
/// Transactions are opaque to the adapter: it only reads their declared gas
/// limit, their stable encoding and the key derived from it.
pub trait Tx: Clone + Send + Sync + 'static {
    /// Gas the transaction declares it may consume (not gas actually used)
    fn gas_limit(&self) -> u64;

    /// Stable wire encoding
    fn bytes(&self) -> Vec<u8>;

    /// Encoded size in bytes
    fn size(&self) -> u64 {
        self.bytes().len() as u64
    }

    /// Identity key derived from the encoding
    fn hash(&self) -> Hash {
        hash_blake3(&self.bytes())
    }

    /// Ordering hint for priority pools; higher is proposed first
    fn priority(&self) -> u64 {
        0
    }
}

/// Decodes raw wire bytes into the application's transaction type
pub trait TxDecoder<T>: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<T, CoreError>;
}

/// Minimal transaction envelope: an opaque payload plus gas and priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleTx {
    pub payload: Vec<u8>,
    pub gas_limit: u64,
    pub priority: u64,
}

impl SimpleTx {
    pub fn new(payload: impl Into<Vec<u8>>, gas_limit: u64) -> Self {
        SimpleTx {
            payload: payload.into(),
            gas_limit,
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: u64) -> Self {
        self.priority = priority;
        self
    }
}

impl Tx for SimpleTx {
    fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    fn bytes(&self) -> Vec<u8> {
        // bincode of plain vec/u64 fields cannot fail
        to_bytes(self).unwrap_or_default()
    }

    fn priority(&self) -> u64 {
        self.priority
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTxDecoder;

impl TxDecoder<SimpleTx> for SimpleTxDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<SimpleTx, CoreError> {
        from_bytes(bytes).map_err(|e| CoreError::TxDecode(e.to_string()))
    }
}
