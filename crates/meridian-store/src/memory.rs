use std::collections::BTreeMap;

use async_trait::async_trait;
use meridian_core::{ChangeSet, Hash};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::merkle::compute_state_root;
use crate::Store;

#[derive(Debug, Default)]
struct Inner {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    version: u64,
    initial_version: u64,
    app_hash: Hash,
    /// App hash per committed version
    history: BTreeMap<u64, Hash>,
}

impl Inner {
    fn apply(data: &mut BTreeMap<Vec<u8>, Vec<u8>>, changes: &ChangeSet) {
        for change in &changes.changes {
            match &change.value {
                Some(v) => {
                    data.insert(change.key.clone(), v.clone());
                }
                None => {
                    data.remove(&change.key);
                }
            }
        }
    }

    fn root(data: &BTreeMap<Vec<u8>, Vec<u8>>) -> Hash {
        compute_state_root(data.iter().map(|(k, v)| (k.as_slice(), v.as_slice())))
    }

    fn next_version(&self) -> u64 {
        if self.version == 0 && self.initial_version > 1 {
            self.initial_version
        } else {
            self.version + 1
        }
    }
}

/// In-memory versioned store; app hash is the merkle root of all entries
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Committed value for `key`
    pub async fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.read().await.data.get(key).cloned()
    }

    /// App hash recorded for a committed version
    pub async fn hash_at(&self, version: u64) -> Option<Hash> {
        self.inner.read().await.history.get(&version).copied()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn state_latest(&self) -> Result<(u64, Hash), StoreError> {
        let inner = self.inner.read().await;
        Ok((inner.version, inner.app_hash))
    }

    async fn latest_version(&self) -> Result<u64, StoreError> {
        Ok(self.inner.read().await.version)
    }

    async fn set_initial_version(&self, version: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.version != 0 {
            return Err(StoreError::InitialVersionAfterCommit {
                requested: version,
                current: inner.version,
            });
        }
        inner.initial_version = version;
        Ok(())
    }

    async fn working_hash(&self, changes: &ChangeSet) -> Result<Hash, StoreError> {
        let inner = self.inner.read().await;
        let mut data = inner.data.clone();
        Inner::apply(&mut data, changes);
        Ok(Inner::root(&data))
    }

    async fn commit(&self, changes: &ChangeSet) -> Result<Hash, StoreError> {
        let mut inner = self.inner.write().await;
        Inner::apply(&mut inner.data, changes);

        let version = inner.next_version();
        let app_hash = Inner::root(&inner.data);
        inner.version = version;
        inner.app_hash = app_hash;
        inner.history.insert(version, app_hash);

        debug!("Committed version {} with app hash {}", version, app_hash.short());
        Ok(app_hash)
    }
}
