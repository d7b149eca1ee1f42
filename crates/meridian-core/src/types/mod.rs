pub mod block;
pub mod event;
pub mod params;
pub mod result;
pub mod tx;

pub use block::{
    BlockIdFlag, BlockRequest, ChangeSet, CommitInfo, Evidence, GenesisRequest, KvChange,
    MisbehaviorType, Timestamp, Validator, VoteInfo,
};
pub use event::{Event, EventAttribute};
pub use params::{AbciParams, BlockParams, ConsensusParams, EvidenceParams, ValidatorParams, VersionParams};
pub use result::{BlockResponse, TxResult, ValidatorUpdate};
pub use tx::{SimpleTx, SimpleTxDecoder, Tx, TxDecoder};
