use std::any::Any;

use async_trait::async_trait;
use meridian_core::{CodedError, Tx};
use thiserror::Error;

use crate::noop::NoOpMempool;

/// Pool of admitted transactions not yet included in a committed block.
///
/// Implementations must tolerate `select` iterators being walked while
/// `insert`/`remove` run on other tasks.
#[async_trait]
pub trait Mempool<T: Tx>: Send + Sync + 'static {
    async fn insert(&self, tx: T) -> Result<(), MempoolError>;

    /// Remove the given transactions. Returns `TxNotFound` if any of them was
    /// absent; the present ones are still removed.
    async fn remove(&self, txs: &[T]) -> Result<(), MempoolError>;

    /// Iterate pending transactions in the pool's own order. `txs` are the
    /// candidates offered by the consensus engine; pools may ignore them.
    /// Returns `None` when there is nothing to iterate.
    async fn select(&self, txs: &[T]) -> Option<Box<dyn MempoolIterator<T>>>;

    fn as_any(&self) -> &dyn Any;
}

/// Cursor over a mempool selection, valid for one proposal build
pub trait MempoolIterator<T>: Send {
    fn tx(&self) -> &T;

    /// Advance; `None` once exhausted
    fn next(self: Box<Self>) -> Option<Box<dyn MempoolIterator<T>>>;
}

/// Whether the pool is the no-op variant, which callers treat as
/// "no pool-side guarantees, pass transactions through".
pub fn is_noop<T: Tx>(mempool: &dyn Mempool<T>) -> bool {
    mempool.as_any().is::<NoOpMempool<T>>()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MempoolError {
    #[error("tx not found in mempool")]
    TxNotFound,

    #[error("tx already exists in mempool")]
    AlreadyExists,

    #[error("mempool is full: {size} txs")]
    PoolFull { size: usize },
}

impl CodedError for MempoolError {
    fn codespace(&self) -> &str {
        "mempool"
    }

    fn code(&self) -> u32 {
        match self {
            MempoolError::TxNotFound => 2,
            MempoolError::AlreadyExists => 3,
            MempoolError::PoolFull { .. } => 4,
        }
    }
}
