use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use meridian_abci::abci::{
    RequestCheckTx, RequestCommit, RequestExtendVote, RequestFinalizeBlock, RequestInfo,
    RequestInitChain, RequestPrepareProposal, RequestProcessProposal, RequestQuery,
    RequestVerifyVoteExtension, ResponseCheckTx, ResponseCommit, ResponseExtendVote,
    ResponseFinalizeBlock, ResponseInfo, ResponseInitChain, ResponsePrepareProposal,
    ResponseProcessProposal, ResponseQuery, ResponseVerifyVoteExtension,
};
use meridian_abci::{Consensus, ConsensusError, Context};
use meridian_core::Tx;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::error::ServerError;

/// State shared with handlers
pub struct ServerState<T: Tx> {
    pub consensus: Arc<Consensus<T>>,
    /// Cancelled on a fatal error; stops the listener and in-flight calls
    pub shutdown: CancellationToken,
}

impl<T: Tx> ServerState<T> {
    fn context(&self) -> Context {
        self.shutdown.child_token()
    }

    fn fail(&self, err: ConsensusError) -> ServerError {
        if err.is_fatal() {
            error!("Fatal consensus error, shutting down: {}", err);
            self.shutdown.cancel();
        }
        ServerError::from_consensus(&err, self.consensus.config().debug)
    }
}

type SharedState<T> = State<Arc<ServerState<T>>>;

pub async fn info<T: Tx>(
    State(state): SharedState<T>,
    Json(req): Json<RequestInfo>,
) -> Result<Json<ResponseInfo>, ServerError> {
    let response = state
        .consensus
        .info(&state.context(), &req)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(response))
}

pub async fn query<T: Tx>(
    State(state): SharedState<T>,
    Json(req): Json<RequestQuery>,
) -> Json<ResponseQuery> {
    Json(state.consensus.query(&state.context(), &req).await)
}

pub async fn check_tx<T: Tx>(
    State(state): SharedState<T>,
    Json(req): Json<RequestCheckTx>,
) -> Json<ResponseCheckTx> {
    Json(state.consensus.check_tx(&state.context(), &req).await)
}

pub async fn init_chain<T: Tx>(
    State(state): SharedState<T>,
    Json(req): Json<RequestInitChain>,
) -> Result<Json<ResponseInitChain>, ServerError> {
    let response = state
        .consensus
        .init_chain(&state.context(), req)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(response))
}

pub async fn prepare_proposal<T: Tx>(
    State(state): SharedState<T>,
    Json(req): Json<RequestPrepareProposal>,
) -> Result<Json<ResponsePrepareProposal>, ServerError> {
    let response = state
        .consensus
        .prepare_proposal(&state.context(), req)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(response))
}

pub async fn process_proposal<T: Tx>(
    State(state): SharedState<T>,
    Json(req): Json<RequestProcessProposal>,
) -> Result<Json<ResponseProcessProposal>, ServerError> {
    let response = state
        .consensus
        .process_proposal(&state.context(), req)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(response))
}

pub async fn extend_vote<T: Tx>(
    State(state): SharedState<T>,
    Json(req): Json<RequestExtendVote>,
) -> Result<Json<ResponseExtendVote>, ServerError> {
    let response = state
        .consensus
        .extend_vote(&state.context(), req)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(response))
}

pub async fn verify_vote_extension<T: Tx>(
    State(state): SharedState<T>,
    Json(req): Json<RequestVerifyVoteExtension>,
) -> Result<Json<ResponseVerifyVoteExtension>, ServerError> {
    let response = state
        .consensus
        .verify_vote_extension(&state.context(), req)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(response))
}

pub async fn finalize_block<T: Tx>(
    State(state): SharedState<T>,
    Json(req): Json<RequestFinalizeBlock>,
) -> Result<Json<ResponseFinalizeBlock>, ServerError> {
    let response = state
        .consensus
        .finalize_block(&state.context(), req)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(response))
}

pub async fn commit<T: Tx>(
    State(state): SharedState<T>,
    Json(_req): Json<RequestCommit>,
) -> Result<Json<ResponseCommit>, ServerError> {
    let response = state
        .consensus
        .commit(&state.context())
        .await
        .map_err(|e| state.fail(e))?;
    Ok(Json(response))
}
