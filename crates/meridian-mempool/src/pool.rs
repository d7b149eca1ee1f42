use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use meridian_core::{Hash, Tx};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::mempool::{Mempool, MempoolError, MempoolIterator};
use crate::ordering::{OrderKey, OrderingMode};

/// Configuration for the mempool
#[derive(Debug, Clone)]
pub struct MempoolConfig {
    /// Maximum number of transactions in the pool; 0 means unbounded
    pub max_size: usize,
    /// Ordering mode
    pub ordering_mode: OrderingMode,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        MempoolConfig {
            max_size: 10_000,
            ordering_mode: OrderingMode::Priority,
        }
    }
}

/// A pending transaction in the mempool
#[derive(Debug, Clone)]
pub struct PendingTx<T> {
    pub tx: T,
    pub hash: Hash,
    pub key: OrderKey,
}

struct PoolInner<T> {
    by_hash: HashMap<Hash, PendingTx<T>>,
    ordered: BTreeMap<OrderKey, Hash>,
    next_seq: u64,
}

impl<T> PoolInner<T> {
    fn remove(&mut self, hash: &Hash) -> Option<PendingTx<T>> {
        let pending = self.by_hash.remove(hash)?;
        self.ordered.remove(&pending.key);
        Some(pending)
    }
}

/// Bounded pool ordered by transaction priority or arrival.
///
/// Every operation takes the lock only for its own duration; `select` copies
/// the current order out so proposal building never holds it.
pub struct PriorityMempool<T> {
    config: MempoolConfig,
    inner: Arc<RwLock<PoolInner<T>>>,
}

impl<T: Tx> PriorityMempool<T> {
    pub fn new(config: MempoolConfig) -> Self {
        PriorityMempool {
            config,
            inner: Arc::new(RwLock::new(PoolInner {
                by_hash: HashMap::new(),
                ordered: BTreeMap::new(),
                next_seq: 0,
            })),
        }
    }

    /// Get a transaction by hash
    pub async fn get(&self, hash: &Hash) -> Option<T> {
        let inner = self.inner.read().await;
        inner.by_hash.get(hash).map(|p| p.tx.clone())
    }

    /// Check if a transaction exists
    pub async fn contains(&self, hash: &Hash) -> bool {
        self.inner.read().await.by_hash.contains_key(hash)
    }

    /// Get current pool size
    pub async fn size(&self) -> usize {
        self.inner.read().await.by_hash.len()
    }

    /// Make room for a transaction of `priority`. Only a strictly
    /// lower-priority transaction is ever evicted.
    fn evict_for(&self, inner: &mut PoolInner<T>, priority: u64) -> bool {
        if self.config.ordering_mode == OrderingMode::Fifo {
            return false;
        }

        let Some((&key, &hash)) = inner.ordered.last_key_value() else {
            return false;
        };
        if key.priority() >= priority {
            return false;
        }

        inner.remove(&hash);
        warn!("Evicted lowest priority transaction {}", hash);
        true
    }
}

#[async_trait]
impl<T: Tx> Mempool<T> for PriorityMempool<T> {
    async fn insert(&self, tx: T) -> Result<(), MempoolError> {
        let hash = tx.hash();
        let priority = tx.priority();
        let mut inner = self.inner.write().await;

        if inner.by_hash.contains_key(&hash) {
            return Err(MempoolError::AlreadyExists);
        }

        let size = inner.by_hash.len();
        if self.config.max_size > 0 && size >= self.config.max_size && !self.evict_for(&mut inner, priority) {
            return Err(MempoolError::PoolFull { size });
        }

        let key = OrderKey::new(self.config.ordering_mode, priority, inner.next_seq);
        inner.next_seq += 1;
        inner.ordered.insert(key, hash);
        inner.by_hash.insert(hash, PendingTx { tx, hash, key });

        debug!("Added transaction {} to mempool", hash);
        Ok(())
    }

    async fn remove(&self, txs: &[T]) -> Result<(), MempoolError> {
        let mut inner = self.inner.write().await;
        let mut missing = false;

        for tx in txs {
            let hash = tx.hash();
            match inner.remove(&hash) {
                Some(_) => debug!("Removed transaction {} from mempool", hash),
                None => missing = true,
            }
        }

        if missing {
            return Err(MempoolError::TxNotFound);
        }
        Ok(())
    }

    async fn select(&self, _txs: &[T]) -> Option<Box<dyn MempoolIterator<T>>> {
        let entries: Vec<(Hash, T)> = {
            let inner = self.inner.read().await;
            inner
                .ordered
                .values()
                .filter_map(|hash| inner.by_hash.get(hash).map(|p| (*hash, p.tx.clone())))
                .collect()
        };

        SnapshotIterator::start(entries, Arc::clone(&self.inner))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Walks a copy of the pool order taken at `select` time. On advance,
/// entries removed from the pool since then are skipped when the pool lock
/// is free; if it is contended the entry is yielded as-is rather than
/// waiting.
struct SnapshotIterator<T> {
    entries: Vec<(Hash, T)>,
    pos: usize,
    pool: Arc<RwLock<PoolInner<T>>>,
}

impl<T: Tx> SnapshotIterator<T> {
    fn start(
        entries: Vec<(Hash, T)>,
        pool: Arc<RwLock<PoolInner<T>>>,
    ) -> Option<Box<dyn MempoolIterator<T>>> {
        if entries.is_empty() {
            return None;
        }
        Some(Box::new(SnapshotIterator {
            entries,
            pos: 0,
            pool,
        }))
    }

    fn still_pending(&self, hash: &Hash) -> bool {
        match self.pool.try_read() {
            Ok(inner) => inner.by_hash.contains_key(hash),
            Err(_) => true,
        }
    }
}

impl<T: Tx> MempoolIterator<T> for SnapshotIterator<T> {
    fn tx(&self) -> &T {
        &self.entries[self.pos].1
    }

    fn next(mut self: Box<Self>) -> Option<Box<dyn MempoolIterator<T>>> {
        self.pos += 1;
        while self.pos < self.entries.len() {
            if self.still_pending(&self.entries[self.pos].0) {
                return Some(self);
            }
            self.pos += 1;
        }
        None
    }
}
