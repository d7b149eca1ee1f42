use serde::{Deserialize, Serialize};

use crate::hash::Hash;
use crate::types::params::ConsensusParams;
use crate::types::result::ValidatorUpdate;

/// Wall-clock time of a block as reported by the consensus engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

impl Timestamp {
    pub fn from_unix(seconds: i64) -> Self {
        Timestamp { seconds, nanos: 0 }
    }

    pub fn unix(&self) -> i64 {
        self.seconds
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MisbehaviorType {
    Unknown,
    DuplicateVote,
    LightClientAttack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockIdFlag {
    Unknown,
    Absent,
    Commit,
    Nil,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub address: Vec<u8>,
    pub power: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub kind: MisbehaviorType,
    pub validator: Validator,
    pub height: i64,
    pub time: Timestamp,
    pub total_voting_power: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteInfo {
    pub validator: Validator,
    pub block_id_flag: BlockIdFlag,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub round: i32,
    pub votes: Vec<VoteInfo>,
}

/// A decided block handed to the application for execution
#[derive(Debug, Clone)]
pub struct BlockRequest<T> {
    pub height: u64,
    pub time: Timestamp,
    pub hash: Vec<u8>,
    pub chain_id: String,
    pub app_hash: Hash,
    pub txs: Vec<T>,
    pub evidence: Vec<Evidence>,
    pub last_commit: CommitInfo,
    pub proposer_address: Vec<u8>,
}

/// Chain initialisation handed to the application
#[derive(Debug, Clone, Default)]
pub struct GenesisRequest {
    pub chain_id: String,
    pub initial_height: u64,
    pub time: Timestamp,
    pub app_state: Vec<u8>,
    pub consensus_params: Option<ConsensusParams>,
    pub validators: Vec<ValidatorUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvChange {
    pub key: Vec<u8>,
    /// `None` deletes the key
    pub value: Option<Vec<u8>>,
}

/// State writes produced by the application, committed by the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changes: Vec<KvChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        ChangeSet::default()
    }

    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.changes.push(KvChange {
            key: key.into(),
            value: Some(value.into()),
        });
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.changes.push(KvChange {
            key: key.into(),
            value: None,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}
