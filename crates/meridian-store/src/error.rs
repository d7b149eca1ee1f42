use meridian_core::{CodedError, INTERNAL_CODE, UNDEFINED_CODESPACE};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Initial version {requested} cannot be set after version {current} was committed")]
    InitialVersionAfterCommit { requested: u64, current: u64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Core error: {0}")]
    Core(#[from] meridian_core::CoreError),
}

impl CodedError for StoreError {
    fn codespace(&self) -> &str {
        UNDEFINED_CODESPACE
    }

    fn code(&self) -> u32 {
        INTERNAL_CODE
    }
}
