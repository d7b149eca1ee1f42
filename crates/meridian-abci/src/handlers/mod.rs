//! Pluggable proposal and vote-extension handlers.
//!
//! Handlers receive the decoded transactions together with the wire request
//! that triggered them, and must reject request variants they do not serve.

pub mod defaults;

use async_trait::async_trait;
use meridian_core::Tx;

use crate::abci::Request;
use crate::app::{AppManager, Context};
use crate::error::ConsensusError;

pub use defaults::{
    DefaultProposalHandler, NoOpExtendVote, NoOpPrepareProposal, NoOpProcessProposal,
    NoOpVerifyVoteExtension,
};

/// Builds the transaction list of a block this node proposes
#[async_trait]
pub trait PrepareHandler<T: Tx>: Send + Sync {
    async fn prepare(
        &self,
        ctx: &Context,
        app: &dyn AppManager<T>,
        txs: Vec<T>,
        req: &Request,
    ) -> Result<Vec<T>, ConsensusError>;
}

/// Decides whether a block proposed by another node is acceptable.
/// `Ok(())` accepts; any error rejects.
#[async_trait]
pub trait ProcessHandler<T: Tx>: Send + Sync {
    async fn process(
        &self,
        ctx: &Context,
        app: &dyn AppManager<T>,
        txs: &[T],
        req: &Request,
    ) -> Result<(), ConsensusError>;
}

/// Produces this node's vote extension for a block
#[async_trait]
pub trait ExtendVoteHandler: Send + Sync {
    async fn extend_vote(&self, ctx: &Context, req: &Request) -> Result<Vec<u8>, ConsensusError>;
}

/// Checks another validator's vote extension. `Ok(())` accepts.
#[async_trait]
pub trait VerifyVoteExtensionHandler: Send + Sync {
    async fn verify_vote_extension(
        &self,
        ctx: &Context,
        req: &Request,
    ) -> Result<(), ConsensusError>;
}
