//! Meridian Store - Committed-height bookkeeping
//!
//! This crate defines the `Store` contract the consensus adapter reads
//! committed heights and app hashes from, and a versioned in-memory
//! implementation.

pub mod error;
pub mod memory;
pub mod merkle;

use async_trait::async_trait;
use meridian_core::{ChangeSet, Hash};

pub use error::StoreError;
pub use memory::MemoryStore;
pub use merkle::compute_state_root;

/// Versioned commitment store. Each commit produces a new version whose
/// number is the block height it was committed at.
#[async_trait]
pub trait Store: Send + Sync {
    /// Latest committed `(height, app hash)`; `(0, Hash::ZERO)` before the
    /// first commit
    async fn state_latest(&self) -> Result<(u64, Hash), StoreError>;

    async fn latest_version(&self) -> Result<u64, StoreError>;

    /// Version assigned to the first commit of a chain starting above 1
    async fn set_initial_version(&self, version: u64) -> Result<(), StoreError>;

    /// App hash the store would have after applying `changes`, without
    /// committing them
    async fn working_hash(&self, changes: &ChangeSet) -> Result<Hash, StoreError>;

    /// Apply `changes` as the next version and return the new app hash
    async fn commit(&self, changes: &ChangeSet) -> Result<Hash, StoreError>;
}
