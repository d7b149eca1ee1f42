use std::time::Duration;

use meridian_core::{BlockIdFlag, MisbehaviorType, Timestamp, Validator};
use serde::{Deserialize, Serialize};

// Shared records

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
    pub index: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: Vec<EventAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicKey {
    Ed25519(Vec<u8>),
    Secp256k1(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub pub_key: PublicKey,
    pub power: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecTxResult {
    pub code: u32,
    pub data: Vec<u8>,
    pub log: String,
    pub info: String,
    pub gas_wanted: i64,
    pub gas_used: i64,
    pub events: Vec<Event>,
    pub codespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Misbehavior {
    #[serde(rename = "type")]
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

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedVoteInfo {
    pub validator: Validator,
    pub vote_extension: Vec<u8>,
    pub extension_signature: Vec<u8>,
    pub block_id_flag: BlockIdFlag,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedCommitInfo {
    pub round: i32,
    pub votes: Vec<ExtendedVoteInfo>,
}

// Consensus parameters

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockParams {
    pub max_bytes: i64,
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

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    pub block: Option<BlockParams>,
    pub evidence: Option<EvidenceParams>,
    pub validator: Option<ValidatorParams>,
    pub version: Option<VersionParams>,
    pub abci: Option<AbciParams>,
}

// Info

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestInfo {
    pub version: String,
    pub block_version: u64,
    pub p2p_version: u64,
    pub abci_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInfo {
    pub data: String,
    pub version: String,
    pub app_version: u64,
    pub last_block_height: i64,
    pub last_block_app_hash: Vec<u8>,
}

// Query

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestQuery {
    pub data: Vec<u8>,
    pub path: String,
    pub height: i64,
    pub prove: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseQuery {
    pub code: u32,
    pub log: String,
    pub info: String,
    pub index: i64,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub height: i64,
    pub codespace: String,
}

// CheckTx

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckTxType {
    #[default]
    New,
    Recheck,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCheckTx {
    pub tx: Vec<u8>,
    #[serde(default, rename = "type")]
    pub kind: CheckTxType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCheckTx {
    pub code: u32,
    pub data: Vec<u8>,
    pub log: String,
    pub info: String,
    pub gas_wanted: i64,
    pub gas_used: i64,
    pub events: Vec<Event>,
    pub codespace: String,
}

// InitChain

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestInitChain {
    pub time: Timestamp,
    pub chain_id: String,
    pub consensus_params: Option<ConsensusParams>,
    pub validators: Vec<ValidatorUpdate>,
    pub app_state_bytes: Vec<u8>,
    pub initial_height: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInitChain {
    pub consensus_params: Option<ConsensusParams>,
    pub validators: Vec<ValidatorUpdate>,
    pub app_hash: Vec<u8>,
}

// PrepareProposal / ProcessProposal

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestPrepareProposal {
    pub max_tx_bytes: i64,
    pub txs: Vec<Vec<u8>>,
    pub local_last_commit: ExtendedCommitInfo,
    pub misbehavior: Vec<Misbehavior>,
    pub height: i64,
    pub time: Timestamp,
    pub next_validators_hash: Vec<u8>,
    pub proposer_address: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePrepareProposal {
    pub txs: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestProcessProposal {
    pub txs: Vec<Vec<u8>>,
    pub proposed_last_commit: CommitInfo,
    pub misbehavior: Vec<Misbehavior>,
    pub hash: Vec<u8>,
    pub height: i64,
    pub time: Timestamp,
    pub next_validators_hash: Vec<u8>,
    pub proposer_address: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    #[default]
    Unknown,
    Accept,
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseProcessProposal {
    pub status: ProposalStatus,
}

// Vote extensions

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestExtendVote {
    pub hash: Vec<u8>,
    pub height: i64,
    pub time: Timestamp,
    pub txs: Vec<Vec<u8>>,
    pub proposer_address: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseExtendVote {
    pub vote_extension: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestVerifyVoteExtension {
    pub hash: Vec<u8>,
    pub validator_address: Vec<u8>,
    pub height: i64,
    pub vote_extension: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyStatus {
    #[default]
    Unknown,
    Accept,
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseVerifyVoteExtension {
    pub status: VerifyStatus,
}

// FinalizeBlock / Commit

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestFinalizeBlock {
    pub txs: Vec<Vec<u8>>,
    pub decided_last_commit: CommitInfo,
    pub misbehavior: Vec<Misbehavior>,
    pub hash: Vec<u8>,
    pub height: i64,
    pub time: Timestamp,
    pub next_validators_hash: Vec<u8>,
    pub proposer_address: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseFinalizeBlock {
    pub events: Vec<Event>,
    pub tx_results: Vec<ExecTxResult>,
    pub validator_updates: Vec<ValidatorUpdate>,
    pub consensus_param_updates: Option<ConsensusParams>,
    pub app_hash: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCommit {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseCommit {
    pub retain_height: i64,
}

/// Any request the consensus engine can issue. Pluggable handlers receive
/// this envelope and must reject variants they do not serve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum Request {
    Info(RequestInfo),
    Query(RequestQuery),
    CheckTx(RequestCheckTx),
    InitChain(RequestInitChain),
    PrepareProposal(RequestPrepareProposal),
    ProcessProposal(RequestProcessProposal),
    ExtendVote(RequestExtendVote),
    VerifyVoteExtension(RequestVerifyVoteExtension),
    FinalizeBlock(RequestFinalizeBlock),
    Commit(RequestCommit),
}

impl Request {
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Info(_) => "RequestInfo",
            Request::Query(_) => "RequestQuery",
            Request::CheckTx(_) => "RequestCheckTx",
            Request::InitChain(_) => "RequestInitChain",
            Request::PrepareProposal(_) => "RequestPrepareProposal",
            Request::ProcessProposal(_) => "RequestProcessProposal",
            Request::ExtendVote(_) => "RequestExtendVote",
            Request::VerifyVoteExtension(_) => "RequestVerifyVoteExtension",
            Request::FinalizeBlock(_) => "RequestFinalizeBlock",
            Request::Commit(_) => "RequestCommit",
        }
    }
}
