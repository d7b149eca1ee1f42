//! Wire-level request and response types of the consensus engine's
//! application interface.

pub mod types;

pub use types::*;
