use std::error::Error as StdError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Codespace reported for errors that carry no registered code.
pub const UNDEFINED_CODESPACE: &str = "undefined";

/// Code reported for unregistered, internal errors.
pub const INTERNAL_CODE: u32 = 1;

const REDACTED_LOG: &str = "internal error";

/// An error that can be downgraded to a `(codespace, code, log)` triple at
/// the wire boundary.
pub trait CodedError: StdError {
    fn codespace(&self) -> &str;

    fn code(&self) -> u32;

    /// Internal errors have their log redacted unless debug output is enabled.
    fn is_internal(&self) -> bool {
        self.code() == INTERNAL_CODE
    }
}

/// Derive the wire `(codespace, code, log)` triple from a structured error.
///
/// With `debug` set the log carries the full source chain. Without it,
/// internal errors are reported as a fixed redacted message.
pub fn abci_info<E: CodedError + ?Sized>(err: &E, debug: bool) -> (String, u32, String) {
    let log = if debug {
        error_chain(err)
    } else if err.is_internal() {
        REDACTED_LOG.to_string()
    } else {
        err.to_string()
    };

    (err.codespace().to_string(), err.code(), log)
}

fn error_chain<E: StdError + ?Sized>(err: &E) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid hash length")]
    InvalidHashLength,

    #[error("Hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("Tx decode error: {0}")]
    TxDecode(String),
}

impl CodedError for CoreError {
    fn codespace(&self) -> &str {
        match self {
            CoreError::Deserialization(_) | CoreError::TxDecode(_) => "core",
            _ => UNDEFINED_CODESPACE,
        }
    }

    fn code(&self) -> u32 {
        match self {
            CoreError::Deserialization(_) | CoreError::TxDecode(_) => 2,
            _ => INTERNAL_CODE,
        }
    }
}

/// Error returned by the application, already carrying its wire code.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    pub codespace: String,
    pub code: u32,
    pub message: String,
}

impl AppError {
    pub fn new(codespace: impl Into<String>, code: u32, message: impl Into<String>) -> Self {
        AppError {
            codespace: codespace.into(),
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(UNDEFINED_CODESPACE, INTERNAL_CODE, message)
    }
}

impl CodedError for AppError {
    fn codespace(&self) -> &str {
        &self.codespace
    }

    fn code(&self) -> u32 {
        self.code
    }
}
