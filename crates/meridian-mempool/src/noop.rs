use std::any::Any;
use std::marker::PhantomData;

use async_trait::async_trait;
use meridian_core::Tx;

use crate::mempool::{Mempool, MempoolError, MempoolIterator};

/// Mempool that holds nothing. Proposal handlers detect it and fall back to
/// the transactions supplied by the consensus engine.
pub struct NoOpMempool<T> {
    _tx: PhantomData<fn() -> T>,
}

impl<T> NoOpMempool<T> {
    pub fn new() -> Self {
        NoOpMempool { _tx: PhantomData }
    }
}

impl<T> Default for NoOpMempool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Tx> Mempool<T> for NoOpMempool<T> {
    async fn insert(&self, _tx: T) -> Result<(), MempoolError> {
        Ok(())
    }

    async fn remove(&self, _txs: &[T]) -> Result<(), MempoolError> {
        Ok(())
    }

    async fn select(&self, _txs: &[T]) -> Option<Box<dyn MempoolIterator<T>>> {
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
