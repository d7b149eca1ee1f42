use async_trait::async_trait;
use meridian_core::{
    AppError, BlockRequest, BlockResponse, ChangeSet, ConsensusParams, GenesisRequest, Tx,
    TxResult, ValidatorUpdate,
};
use tokio_util::sync::CancellationToken;

use crate::error::ConsensusError;

/// Request-scoped context; cancelling it aborts the call at its next App
/// call or mempool advance.
pub type Context = CancellationToken;

pub(crate) fn ensure_active(ctx: &Context) -> Result<(), ConsensusError> {
    if ctx.is_cancelled() {
        return Err(ConsensusError::Cancelled);
    }
    Ok(())
}

/// Point query against the application's committed state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRequest {
    ConsensusParams,
    Custom { path: String, data: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResponse {
    ConsensusParams(ConsensusParams),
    Custom(Vec<u8>),
}

impl QueryResponse {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryResponse::ConsensusParams(_) => "ConsensusParams",
            QueryResponse::Custom(_) => "Custom",
        }
    }
}

/// The application's deterministic execution engine.
///
/// `validate_tx` and `query` may be called concurrently with each other and
/// with block execution.
#[async_trait]
pub trait AppManager<T: Tx>: Send + Sync {
    async fn init_genesis(
        &self,
        ctx: &Context,
        req: GenesisRequest,
    ) -> Result<(Vec<ValidatorUpdate>, ChangeSet), AppError>;

    /// Execute a decided block. Must return one `TxResult` per transaction.
    async fn deliver_block(
        &self,
        ctx: &Context,
        block: BlockRequest<T>,
    ) -> Result<(BlockResponse, ChangeSet), AppError>;

    async fn validate_tx(&self, ctx: &Context, tx: &T) -> Result<TxResult, AppError>;

    async fn simulate(&self, ctx: &Context, tx: &T) -> Result<TxResult, AppError>;

    /// `version == 0` reads the latest committed state
    async fn query(
        &self,
        ctx: &Context,
        version: u64,
        request: QueryRequest,
    ) -> Result<QueryResponse, AppError>;
}

/// Snapshot subsystem, consulted for pruning and triggered on commit
pub trait SnapshotManager: Send + Sync {
    /// Number of recent blocks snapshots still need; 0 for no constraint
    fn snapshot_block_retention_heights(&self) -> i64;

    fn snapshot_if_applicable(&self, height: i64);
}

/// Fetch the application's consensus parameters at `version`
pub async fn query_consensus_params<T: Tx>(
    app: &dyn AppManager<T>,
    ctx: &Context,
    version: u64,
) -> Result<ConsensusParams, ConsensusError> {
    ensure_active(ctx)?;
    let response = app
        .query(ctx, version, QueryRequest::ConsensusParams)
        .await
        .map_err(ConsensusError::QueryFailed)?;

    match response {
        QueryResponse::ConsensusParams(params) => Ok(params),
        other => Err(ConsensusError::UnexpectedResponse {
            expected: "ConsensusParams",
            got: other.kind(),
        }),
    }
}
