use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use meridian_core::Tx;
use meridian_mempool::{is_noop, Mempool, MempoolError};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::{ExtendVoteHandler, PrepareHandler, ProcessHandler, VerifyVoteExtensionHandler};
use crate::abci::Request;
use crate::app::{ensure_active, query_consensus_params, AppManager, Context};
use crate::error::ConsensusError;
use crate::selector::{DefaultTxSelector, TxSelector};
use crate::translate::int64_to_uint64;

/// Selector lock that clears the selection on every exit path
struct Selection<'a, T: Tx>(MutexGuard<'a, Box<dyn TxSelector<T>>>);

impl<T: Tx> Deref for Selection<'_, T> {
    type Target = Box<dyn TxSelector<T>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Tx> DerefMut for Selection<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: Tx> Drop for Selection<'_, T> {
    fn drop(&mut self) {
        self.0.clear();
    }
}

/// Mempool-aware proposal handler.
///
/// Without a mempool, or with the no-op one, proposals are the byte and gas
/// bounded prefix of the engine's candidates and every proposal is accepted.
/// With a real mempool, proposals are drawn from the pool in its own order
/// and every transaction is re-validated against the application.
pub struct DefaultProposalHandler<T: Tx> {
    mempool: Option<Arc<dyn Mempool<T>>>,
    tx_selector: Mutex<Box<dyn TxSelector<T>>>,
}

impl<T: Tx> DefaultProposalHandler<T> {
    pub fn new(mempool: Option<Arc<dyn Mempool<T>>>) -> Self {
        DefaultProposalHandler {
            mempool,
            tx_selector: Mutex::new(Box::new(DefaultTxSelector::new())),
        }
    }

    pub fn with_tx_selector(mut self, selector: Box<dyn TxSelector<T>>) -> Self {
        self.tx_selector = Mutex::new(selector);
        self
    }

    /// The pool to draw from, or `None` when proposals pass through
    fn active_mempool(&self) -> Option<&Arc<dyn Mempool<T>>> {
        let mempool = self.mempool.as_ref()?;
        if is_noop(mempool.as_ref()) {
            None
        } else {
            Some(mempool)
        }
    }

    async fn remove_invalid(&self, mempool: &dyn Mempool<T>, tx: &T) -> Result<(), ConsensusError> {
        match mempool.remove(std::slice::from_ref(tx)).await {
            Ok(()) | Err(MempoolError::TxNotFound) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl<T: Tx> PrepareHandler<T> for DefaultProposalHandler<T> {
    async fn prepare(
        &self,
        ctx: &Context,
        app: &dyn AppManager<T>,
        txs: Vec<T>,
        req: &Request,
    ) -> Result<Vec<T>, ConsensusError> {
        let Request::PrepareProposal(prepare) = req else {
            return Err(ConsensusError::InvalidRequest(req.kind().to_string()));
        };

        let params = query_consensus_params(app, ctx, 0).await?;
        let max_block_gas = params.max_block_gas();
        let max_tx_bytes = int64_to_uint64(prepare.max_tx_bytes);

        let mut selection = Selection(self.tx_selector.lock().await);

        let Some(mempool) = self.active_mempool() else {
            for tx in &txs {
                if selection.select_tx_for_proposal(max_tx_bytes, max_block_gas, tx) {
                    break;
                }
            }
            return Ok(selection.selected_txs());
        };

        let mut iter = mempool.select(&txs).await;
        while let Some(cursor) = iter {
            ensure_active(ctx)?;
            let tx = cursor.tx().clone();

            let invalid = match app.validate_tx(ctx, &tx).await {
                Ok(result) => result.error,
                Err(err) => Some(err),
            };

            match invalid {
                Some(err) => {
                    debug!("Removing invalid tx {} from mempool: {}", tx.hash().short(), err);
                    self.remove_invalid(mempool.as_ref(), &tx).await?;
                }
                None => {
                    if selection.select_tx_for_proposal(max_tx_bytes, max_block_gas, &tx) {
                        break;
                    }
                }
            }

            iter = cursor.next();
        }

        let selected = selection.selected_txs();
        info!(
            "Prepared proposal at height {} with {} txs",
            prepare.height,
            selected.len()
        );
        Ok(selected)
    }
}

#[async_trait]
impl<T: Tx> ProcessHandler<T> for DefaultProposalHandler<T> {
    async fn process(
        &self,
        ctx: &Context,
        app: &dyn AppManager<T>,
        txs: &[T],
        req: &Request,
    ) -> Result<(), ConsensusError> {
        if !matches!(req, Request::ProcessProposal(_)) {
            return Err(ConsensusError::InvalidRequest(req.kind().to_string()));
        }

        if self.active_mempool().is_none() {
            return Ok(());
        }

        let params = query_consensus_params(app, ctx, 0).await?;
        let max_block_gas = params.max_block_gas();
        let mut total_tx_gas: u64 = 0;

        for tx in txs {
            ensure_active(ctx)?;
            let result = app
                .validate_tx(ctx, tx)
                .await
                .map_err(ConsensusError::TxValidation)?;
            if let Some(err) = result.error {
                return Err(ConsensusError::TxValidation(err));
            }

            if max_block_gas > 0 {
                total_tx_gas = total_tx_gas.saturating_add(tx.gas_limit());
                if total_tx_gas > max_block_gas {
                    return Err(ConsensusError::GasLimitExceeded {
                        total: total_tx_gas,
                        max: max_block_gas,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Proposes the engine's candidates unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpPrepareProposal;

#[async_trait]
impl<T: Tx> PrepareHandler<T> for NoOpPrepareProposal {
    async fn prepare(
        &self,
        _ctx: &Context,
        _app: &dyn AppManager<T>,
        txs: Vec<T>,
        req: &Request,
    ) -> Result<Vec<T>, ConsensusError> {
        match req {
            Request::PrepareProposal(_) => Ok(txs),
            other => Err(ConsensusError::InvalidRequest(other.kind().to_string())),
        }
    }
}

/// Accepts every proposal
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProcessProposal;

#[async_trait]
impl<T: Tx> ProcessHandler<T> for NoOpProcessProposal {
    async fn process(
        &self,
        _ctx: &Context,
        _app: &dyn AppManager<T>,
        _txs: &[T],
        req: &Request,
    ) -> Result<(), ConsensusError> {
        match req {
            Request::ProcessProposal(_) => Ok(()),
            other => Err(ConsensusError::InvalidRequest(other.kind().to_string())),
        }
    }
}

/// Extends every vote with an empty extension
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpExtendVote;

#[async_trait]
impl ExtendVoteHandler for NoOpExtendVote {
    async fn extend_vote(&self, _ctx: &Context, req: &Request) -> Result<Vec<u8>, ConsensusError> {
        match req {
            Request::ExtendVote(_) => Ok(Vec::new()),
            other => Err(ConsensusError::InvalidRequest(other.kind().to_string())),
        }
    }
}

/// Accepts every vote extension
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpVerifyVoteExtension;

#[async_trait]
impl VerifyVoteExtensionHandler for NoOpVerifyVoteExtension {
    async fn verify_vote_extension(
        &self,
        _ctx: &Context,
        req: &Request,
    ) -> Result<(), ConsensusError> {
        match req {
            Request::VerifyVoteExtension(_) => Ok(()),
            other => Err(ConsensusError::InvalidRequest(other.kind().to_string())),
        }
    }
}
