//! Meridian ABCI - Consensus engine adapter
//!
//! This crate implements the request/response contract between a pluggable
//! consensus engine and the application:
//! - Proposal building and validation over a pluggable mempool
//! - Height continuity, halt and pruning policy
//! - Block execution and commitment
//! - Translation of application results to the wire protocol

pub mod abci;
pub mod app;
pub mod config;
pub mod consensus;
pub mod error;
pub mod handlers;
pub mod query;
pub mod selector;
pub mod translate;

#[cfg(test)]
mod testing;

pub use app::{query_consensus_params, AppManager, Context, QueryRequest, QueryResponse, SnapshotManager};
pub use config::{Config, ConfigError};
pub use consensus::Consensus;
pub use error::{ConsensusError, CODESPACE};
pub use handlers::{
    DefaultProposalHandler, ExtendVoteHandler, NoOpExtendVote, NoOpPrepareProposal,
    NoOpProcessProposal, NoOpVerifyVoteExtension, PrepareHandler, ProcessHandler,
    VerifyVoteExtensionHandler,
};
pub use query::{QueryRegistry, QueryRouter, CONSENSUS_PARAMS_PATH};
pub use selector::{DefaultTxSelector, TxSelector};
