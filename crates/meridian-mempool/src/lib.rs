//! Meridian Mempool - Pluggable pending-transaction pools
//!
//! This crate defines the `Mempool` capability used by the proposal
//! pipeline, a no-op pool that defers ordering to the consensus engine, and
//! a bounded priority/FIFO pool.

pub mod mempool;
pub mod noop;
pub mod ordering;
pub mod pool;

pub use mempool::{is_noop, Mempool, MempoolError, MempoolIterator};
pub use noop::NoOpMempool;
pub use ordering::{OrderKey, OrderingMode};
pub use pool::{MempoolConfig, PendingTx, PriorityMempool};
