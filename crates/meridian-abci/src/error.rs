use meridian_core::{AppError, CodedError, CoreError};
use meridian_mempool::MempoolError;
use meridian_store::StoreError;
use thiserror::Error;

pub const CODESPACE: &str = "consensus";

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("invalid request type: {0}")]
    InvalidRequest(String),

    #[error("query failed: {0}")]
    QueryFailed(AppError),

    #[error("unexpected response type; expected: {expected}, got: {got}")]
    UnexpectedResponse {
        expected: &'static str,
        got: &'static str,
    },

    #[error("invalid height: {0}")]
    InvalidHeight(i64),

    #[error("invalid height: {got}; expected: {expected}")]
    HeightMismatch { got: i64, expected: u64 },

    #[error("initial height {got} does not match configured initial height {expected}")]
    InitialHeightMismatch { got: i64, expected: u64 },

    #[error("failed to validate tx: {0}")]
    TxValidation(AppError),

    #[error("total tx gas {total} exceeds max block gas {max}")]
    GasLimitExceeded { total: u64, max: u64 },

    #[error("halt per configuration height {height} time {time}")]
    Halt { height: u64, time: u64 },

    #[error("vote extensions are not enabled at height {0}")]
    VoteExtensionsDisabled(i64),

    #[error("unknown query path: {0}")]
    UnknownQuery(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("app error: {0}")]
    App(AppError),

    #[error("mempool error: {0}")]
    Mempool(#[from] MempoolError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl ConsensusError {
    /// Conditions the node must not recover from
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConsensusError::Halt { .. })
    }
}

impl CodedError for ConsensusError {
    fn codespace(&self) -> &str {
        match self {
            ConsensusError::QueryFailed(e) | ConsensusError::TxValidation(e) | ConsensusError::App(e) => {
                e.codespace()
            }
            ConsensusError::Mempool(e) => e.codespace(),
            ConsensusError::Store(e) => e.codespace(),
            ConsensusError::Core(e) => e.codespace(),
            _ => CODESPACE,
        }
    }

    fn code(&self) -> u32 {
        match self {
            ConsensusError::QueryFailed(e) | ConsensusError::TxValidation(e) | ConsensusError::App(e) => {
                e.code()
            }
            ConsensusError::Mempool(e) => e.code(),
            ConsensusError::Store(e) => e.code(),
            ConsensusError::Core(e) => e.code(),
            ConsensusError::InvalidRequest(_) => 2,
            ConsensusError::UnexpectedResponse { .. } => 4,
            ConsensusError::InvalidHeight(_) => 5,
            ConsensusError::HeightMismatch { .. } => 6,
            ConsensusError::GasLimitExceeded { .. } => 7,
            ConsensusError::Halt { .. } => 8,
            ConsensusError::UnknownQuery(_) => 9,
            ConsensusError::Cancelled => 10,
            ConsensusError::InitialHeightMismatch { .. } => 11,
            ConsensusError::VoteExtensionsDisabled(_) => 12,
        }
    }
}

impl From<ConsensusError> for AppError {
    fn from(err: ConsensusError) -> Self {
        AppError::new(err.codespace(), err.code(), err.to_string())
    }
}
