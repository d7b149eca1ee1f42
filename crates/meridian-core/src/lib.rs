//! Meridian Core - Shared types, hashing, and error codes
//!
//! This crate provides the transaction capability traits, the block and
//! transaction result types exchanged with the application, and the
//! `(codespace, code, log)` error model used at the wire boundary.

pub mod error;
pub mod hash;
pub mod serialize;
pub mod types;

pub use error::{abci_info, AppError, CodedError, CoreError, INTERNAL_CODE, UNDEFINED_CODESPACE};
pub use hash::{hash_blake3, merkle_root, Hash};
pub use types::*;
