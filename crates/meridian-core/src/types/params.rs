use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Consensus parameters as stored by the application's consensus module.
/// Every section is optional; absent sections impose no bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    pub block: Option<BlockParams>,
    pub evidence: Option<EvidenceParams>,
    pub validator: Option<ValidatorParams>,
    pub version: Option<VersionParams>,
    pub abci: Option<AbciParams>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockParams {
    pub max_bytes: i64,
    /// -1 or 0 means unlimited
    pub max_gas: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceParams {
    pub max_age_num_blocks: i64,
    pub max_age_duration: Duration,
    pub max_bytes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorParams {
    pub pub_key_types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionParams {
    pub app: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbciParams {
    pub vote_extensions_enable_height: i64,
}

impl ConsensusParams {
    /// Gas ceiling for a block; 0 means unlimited
    pub fn max_block_gas(&self) -> u64 {
        self.block
            .as_ref()
            .map_or(0, |block| u64::try_from(block.max_gas).unwrap_or(0))
    }

    pub fn app_version(&self) -> u64 {
        self.version.as_ref().map_or(0, |v| v.app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_block_gas() {
        assert_eq!(ConsensusParams::default().max_block_gas(), 0);

        let mut params = ConsensusParams {
            block: Some(BlockParams {
                max_bytes: 1024,
                max_gas: 100,
            }),
            ..Default::default()
        };
        assert_eq!(params.max_block_gas(), 100);

        params.block = Some(BlockParams {
            max_bytes: 1024,
            max_gas: -1,
        });
        assert_eq!(params.max_block_gas(), 0);
    }
}
