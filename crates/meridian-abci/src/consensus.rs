use std::collections::HashSet;
use std::sync::Arc;

use meridian_core::{
    AppError, BlockRequest, ChangeSet, CodedError, ConsensusParams as AppConsensusParams,
    CoreError, GenesisRequest, Hash, Timestamp, Tx, TxDecoder, TxResult,
};
use meridian_mempool::{is_noop, Mempool, MempoolError};
use meridian_store::Store;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::abci::{
    self, ProposalStatus, Request, RequestCheckTx, RequestExtendVote, RequestFinalizeBlock,
    RequestInfo, RequestInitChain, RequestPrepareProposal, RequestProcessProposal, RequestQuery,
    RequestVerifyVoteExtension, ResponseCheckTx, ResponseCommit, ResponseExtendVote,
    ResponseFinalizeBlock, ResponseInfo, ResponseInitChain, ResponsePrepareProposal,
    ResponseProcessProposal, ResponseQuery, ResponseVerifyVoteExtension, VerifyStatus,
};
use crate::app::{ensure_active, query_consensus_params, AppManager, Context, SnapshotManager};
use crate::config::Config;
use crate::error::ConsensusError;
use crate::handlers::{
    DefaultProposalHandler, ExtendVoteHandler, NoOpExtendVote, NoOpVerifyVoteExtension,
    PrepareHandler, ProcessHandler, VerifyVoteExtensionHandler,
};
use crate::query::{QueryRegistry, QueryRouter};
use crate::translate::{
    finalize_block_response, from_abci_consensus_params, from_abci_validator_updates,
    int64_to_uint64, into_abci_consensus_params, into_abci_events, into_abci_simulation_response,
    into_abci_validator_updates, query_result, response_exec_tx_result_with_events,
    split_query_path, to_app_commit_info, to_app_evidence, uint64_to_int64,
};

/// Protocol endpoint between the consensus engine and the application.
///
/// Block lifecycle calls (`init_chain`, `finalize_block`, `commit`) must be
/// issued sequentially; `query` and `check_tx` may run concurrently with them.
pub struct Consensus<T: Tx> {
    app: Arc<dyn AppManager<T>>,
    mempool: Option<Arc<dyn Mempool<T>>>,
    store: Arc<dyn Store>,
    tx_decoder: Arc<dyn TxDecoder<T>>,
    cfg: Config,
    index_set: HashSet<String>,

    prepare_handler: Arc<dyn PrepareHandler<T>>,
    process_handler: Arc<dyn ProcessHandler<T>>,
    extend_vote_handler: Arc<dyn ExtendVoteHandler>,
    verify_vote_extension_handler: Arc<dyn VerifyVoteExtensionHandler>,
    snapshot_manager: Option<Arc<dyn SnapshotManager>>,
    query_registry: Arc<dyn QueryRegistry>,

    chain_id: RwLock<String>,
    /// Genesis writes, committed together with the first block
    genesis_changes: Mutex<Option<ChangeSet>>,
}

impl<T: Tx> Consensus<T> {
    pub fn new(
        app: Arc<dyn AppManager<T>>,
        mempool: Option<Arc<dyn Mempool<T>>>,
        store: Arc<dyn Store>,
        tx_decoder: Arc<dyn TxDecoder<T>>,
        cfg: Config,
    ) -> Self {
        let proposal_handler = Arc::new(DefaultProposalHandler::new(mempool.clone()));
        let index_set = cfg.index_set();

        Consensus {
            app,
            mempool,
            store,
            tx_decoder,
            cfg,
            index_set,
            prepare_handler: proposal_handler.clone(),
            process_handler: proposal_handler,
            extend_vote_handler: Arc::new(NoOpExtendVote),
            verify_vote_extension_handler: Arc::new(NoOpVerifyVoteExtension),
            snapshot_manager: None,
            query_registry: Arc::new(QueryRouter::with_defaults()),
            chain_id: RwLock::new(String::new()),
            genesis_changes: Mutex::new(None),
        }
    }

    pub fn set_prepare_handler(&mut self, handler: Arc<dyn PrepareHandler<T>>) {
        self.prepare_handler = handler;
    }

    pub fn set_process_handler(&mut self, handler: Arc<dyn ProcessHandler<T>>) {
        self.process_handler = handler;
    }

    pub fn set_extend_vote_handler(&mut self, handler: Arc<dyn ExtendVoteHandler>) {
        self.extend_vote_handler = handler;
    }

    pub fn set_verify_vote_extension_handler(
        &mut self,
        handler: Arc<dyn VerifyVoteExtensionHandler>,
    ) {
        self.verify_vote_extension_handler = handler;
    }

    pub fn set_snapshot_manager(&mut self, manager: Arc<dyn SnapshotManager>) {
        self.snapshot_manager = Some(manager);
    }

    pub fn set_query_registry(&mut self, registry: Arc<dyn QueryRegistry>) {
        self.query_registry = registry;
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub async fn chain_id(&self) -> String {
        self.chain_id.read().await.clone()
    }

    /// Application identity and the last committed block
    pub async fn info(&self, ctx: &Context, _req: &RequestInfo) -> Result<ResponseInfo, ConsensusError> {
        let (height, app_hash) = self.store.state_latest().await?;

        let app_version = if height > 0 {
            query_consensus_params(self.app.as_ref(), ctx, height)
                .await?
                .app_version()
        } else {
            0
        };

        Ok(ResponseInfo {
            data: self.cfg.app_name.clone(),
            version: self.cfg.version.clone(),
            app_version,
            last_block_height: uint64_to_int64(height),
            last_block_app_hash: if height > 0 { app_hash.to_vec() } else { Vec::new() },
        })
    }

    /// Answer a state query. Failures are reported in the response code.
    pub async fn query(&self, ctx: &Context, req: &RequestQuery) -> ResponseQuery {
        match self.handle_query(ctx, req).await {
            Ok(response) => response,
            Err(err) => {
                debug!("Query {} failed: {}", req.path, err);
                query_result(&err, self.cfg.debug)
            }
        }
    }

    async fn handle_query(
        &self,
        ctx: &Context,
        req: &RequestQuery,
    ) -> Result<ResponseQuery, ConsensusError> {
        let height = if req.height > 0 {
            req.height
        } else {
            uint64_to_int64(self.store.latest_version().await?)
        };

        let value = if req.path.starts_with('/') {
            let request = self.query_registry.decode(&req.path, &req.data)?;
            ensure_active(ctx)?;
            let response = self
                .app
                .query(ctx, int64_to_uint64(req.height), request)
                .await
                .map_err(ConsensusError::QueryFailed)?;
            self.query_registry.encode(&req.path, response)?
        } else {
            match split_query_path(&req.path).as_slice() {
                ["app", "simulate"] => {
                    let tx = self.tx_decoder.decode(&req.data)?;
                    ensure_active(ctx)?;
                    let result = self
                        .app
                        .simulate(ctx, &tx)
                        .await
                        .map_err(ConsensusError::App)?;
                    into_abci_simulation_response(&result, &self.index_set)?
                }
                ["app", "version"] => self.cfg.version.as_bytes().to_vec(),
                _ => return Err(ConsensusError::UnknownQuery(req.path.clone())),
            }
        };

        Ok(ResponseQuery {
            value,
            height,
            ..Default::default()
        })
    }

    /// Mempool admission. Rejections are reported in the response code.
    pub async fn check_tx(&self, ctx: &Context, req: &RequestCheckTx) -> ResponseCheckTx {
        match self.handle_check_tx(ctx, req).await {
            Ok(result) => {
                let events = into_abci_events(&result.events, &self.index_set);
                check_tx_response(response_exec_tx_result_with_events(
                    result.error.as_ref(),
                    result.gas_wanted,
                    result.gas_used,
                    events,
                    self.cfg.debug,
                ))
            }
            Err(err) => {
                debug!("CheckTx rejected: {}", err);
                check_tx_response(response_exec_tx_result_with_events(
                    Some(&err),
                    0,
                    0,
                    Vec::new(),
                    self.cfg.debug,
                ))
            }
        }
    }

    async fn handle_check_tx(
        &self,
        ctx: &Context,
        req: &RequestCheckTx,
    ) -> Result<TxResult, ConsensusError> {
        let tx = self.tx_decoder.decode(&req.tx)?;
        ensure_active(ctx)?;

        let result = self
            .app
            .validate_tx(ctx, &tx)
            .await
            .map_err(ConsensusError::TxValidation)?;

        if result.is_ok() && req.kind == abci::CheckTxType::New {
            if let Some(mempool) = &self.mempool {
                mempool.insert(tx).await?;
            }
        }

        Ok(result)
    }

    /// Run the application's genesis. The resulting writes are committed
    /// with the first block.
    pub async fn init_chain(
        &self,
        ctx: &Context,
        req: RequestInitChain,
    ) -> Result<ResponseInitChain, ConsensusError> {
        let initial_height = if req.initial_height > 0 {
            int64_to_uint64(req.initial_height)
        } else {
            1
        };
        if initial_height != self.cfg.initial_height {
            return Err(ConsensusError::InitialHeightMismatch {
                got: req.initial_height,
                expected: self.cfg.initial_height,
            });
        }

        *self.chain_id.write().await = req.chain_id.clone();
        if initial_height > 1 {
            self.store.set_initial_version(initial_height).await?;
        }

        let genesis = GenesisRequest {
            chain_id: req.chain_id.clone(),
            initial_height,
            time: req.time,
            app_state: req.app_state_bytes,
            consensus_params: req.consensus_params.as_ref().map(from_abci_consensus_params),
            validators: from_abci_validator_updates(&req.validators),
        };

        ensure_active(ctx)?;
        let (validators, changes) = self
            .app
            .init_genesis(ctx, genesis)
            .await
            .map_err(ConsensusError::App)?;

        let app_hash = self.store.working_hash(&changes).await?;
        *self.genesis_changes.lock().await = Some(changes);

        let validators = if validators.is_empty() {
            req.validators
        } else {
            into_abci_validator_updates(&validators)
        };

        info!(
            "Initialized chain {} at height {} with {} validators",
            req.chain_id,
            initial_height,
            validators.len()
        );

        Ok(ResponseInitChain {
            consensus_params: req.consensus_params,
            validators,
            app_hash: app_hash.to_vec(),
        })
    }

    pub async fn prepare_proposal(
        &self,
        ctx: &Context,
        req: RequestPrepareProposal,
    ) -> Result<ResponsePrepareProposal, ConsensusError> {
        let txs: Vec<T> = req
            .txs
            .iter()
            .filter_map(|raw| match self.tx_decoder.decode(raw) {
                Ok(tx) => Some(tx),
                Err(err) => {
                    debug!("Dropping undecodable proposal candidate: {}", err);
                    None
                }
            })
            .collect();

        let request = Request::PrepareProposal(req);
        let selected = self
            .prepare_handler
            .prepare(ctx, self.app.as_ref(), txs, &request)
            .await?;

        Ok(ResponsePrepareProposal {
            txs: selected.iter().map(Tx::bytes).collect(),
        })
    }

    /// Accept or reject another node's proposal. Handler failures reject.
    pub async fn process_proposal(
        &self,
        ctx: &Context,
        req: RequestProcessProposal,
    ) -> Result<ResponseProcessProposal, ConsensusError> {
        let height = req.height;
        let mut txs = Vec::with_capacity(req.txs.len());
        for raw in &req.txs {
            match self.tx_decoder.decode(raw) {
                Ok(tx) => txs.push(tx),
                // Without a mempool proposals are not re-checked
                Err(err) if !self.has_active_mempool() => {
                    debug!("Passing undecodable tx at height {}: {}", height, err);
                }
                Err(err) => {
                    warn!("Rejecting proposal at height {}: {}", height, err);
                    return Ok(ResponseProcessProposal {
                        status: ProposalStatus::Reject,
                    });
                }
            }
        }

        let request = Request::ProcessProposal(req);
        let status = match self
            .process_handler
            .process(ctx, self.app.as_ref(), &txs, &request)
            .await
        {
            Ok(()) => ProposalStatus::Accept,
            Err(err) => {
                warn!("Rejecting proposal at height {}: {}", height, err);
                ProposalStatus::Reject
            }
        };

        Ok(ResponseProcessProposal { status })
    }

    pub async fn extend_vote(
        &self,
        ctx: &Context,
        req: RequestExtendVote,
    ) -> Result<ResponseExtendVote, ConsensusError> {
        self.ensure_vote_extensions(ctx, req.height).await?;

        let vote_extension = self
            .extend_vote_handler
            .extend_vote(ctx, &Request::ExtendVote(req))
            .await?;

        Ok(ResponseExtendVote { vote_extension })
    }

    pub async fn verify_vote_extension(
        &self,
        ctx: &Context,
        req: RequestVerifyVoteExtension,
    ) -> Result<ResponseVerifyVoteExtension, ConsensusError> {
        let height = req.height;
        self.ensure_vote_extensions(ctx, height).await?;

        let status = match self
            .verify_vote_extension_handler
            .verify_vote_extension(ctx, &Request::VerifyVoteExtension(req))
            .await
        {
            Ok(()) => VerifyStatus::Accept,
            Err(err) => {
                warn!("Rejecting vote extension at height {}: {}", height, err);
                VerifyStatus::Reject
            }
        };

        Ok(ResponseVerifyVoteExtension { status })
    }

    async fn ensure_vote_extensions(&self, ctx: &Context, height: i64) -> Result<(), ConsensusError> {
        let version = self.store.latest_version().await?;
        let params = query_consensus_params(self.app.as_ref(), ctx, version).await?;
        let enable_height = params
            .abci
            .as_ref()
            .map_or(0, |abci| abci.vote_extensions_enable_height);

        if enable_height <= 0 || height < enable_height {
            return Err(ConsensusError::VoteExtensionsDisabled(height));
        }
        Ok(())
    }

    /// Execute and commit a decided block
    pub async fn finalize_block(
        &self,
        ctx: &Context,
        req: RequestFinalizeBlock,
    ) -> Result<ResponseFinalizeBlock, ConsensusError> {
        self.check_halt(req.height, &req.time)?;
        self.validate_height(req.height).await?;

        let (_, last_app_hash) = self.store.state_latest().await?;

        // Undecodable txs keep their slot with a failed result
        let mut slots: Vec<Option<TxResult>> = Vec::with_capacity(req.txs.len());
        let mut txs = Vec::with_capacity(req.txs.len());
        for raw in &req.txs {
            match self.tx_decoder.decode(raw) {
                Ok(tx) => {
                    txs.push(tx);
                    slots.push(None);
                }
                Err(err) => slots.push(Some(decode_failure(&err))),
            }
        }

        let included = self.mempool.as_ref().map(|_| txs.clone());
        let decoded = txs.len();

        let block = BlockRequest {
            height: int64_to_uint64(req.height),
            time: req.time,
            hash: req.hash,
            chain_id: self.chain_id().await,
            app_hash: last_app_hash,
            txs,
            evidence: to_app_evidence(&req.misbehavior),
            last_commit: to_app_commit_info(&req.decided_last_commit),
            proposer_address: req.proposer_address,
        };

        ensure_active(ctx)?;
        let (mut block_response, mut changes) = self
            .app
            .deliver_block(ctx, block)
            .await
            .map_err(ConsensusError::App)?;

        if block_response.tx_results.len() != decoded {
            return Err(ConsensusError::App(AppError::internal(format!(
                "expected {} tx results, got {}",
                decoded,
                block_response.tx_results.len()
            ))));
        }

        let mut app_results = std::mem::take(&mut block_response.tx_results).into_iter();
        for slot in slots {
            match slot {
                Some(failed) => block_response.tx_results.push(failed),
                None => block_response.tx_results.extend(app_results.next()),
            }
        }
        let tx_count = block_response.tx_results.len();

        // No fallible step may follow the commit
        let consensus_params = self.get_consensus_params(ctx).await?;
        let mut response = finalize_block_response(
            block_response,
            Some(consensus_params),
            Hash::default(),
            &self.index_set,
        )?;

        let mut staged = self.genesis_changes.lock().await;
        if let Some(genesis) = staged.as_ref() {
            let mut merged = genesis.clone();
            merged.changes.append(&mut changes.changes);
            changes = merged;
        }
        let app_hash = self.store.commit(&changes).await?;
        staged.take();
        drop(staged);
        response.app_hash = app_hash.to_vec();

        if let (Some(mempool), Some(included)) = (&self.mempool, included) {
            match mempool.remove(&included).await {
                Ok(()) | Err(MempoolError::TxNotFound) => {}
                Err(err) => warn!("Failed to remove committed txs from mempool: {}", err),
            }
        }

        info!(
            "Finalized block {} with {} txs, app hash {}",
            req.height,
            tx_count,
            app_hash.short()
        );

        Ok(response)
    }

    /// Report how much block history the engine may prune
    pub async fn commit(&self, ctx: &Context) -> Result<ResponseCommit, ConsensusError> {
        let (height, _) = self.store.state_latest().await?;
        let commit_height = uint64_to_int64(height);

        let params = query_consensus_params(self.app.as_ref(), ctx, height).await?;
        let retain_height = self.get_block_retention_height(&params, commit_height);

        if let Some(manager) = &self.snapshot_manager {
            manager.snapshot_if_applicable(commit_height);
        }

        info!("Committed height {}, retain height {}", commit_height, retain_height);
        Ok(ResponseCommit { retain_height })
    }

    /// Reject heights that do not continue the committed chain
    pub async fn validate_height(&self, height: i64) -> Result<(), ConsensusError> {
        if height < 1 {
            return Err(ConsensusError::InvalidHeight(height));
        }

        let last = self.store.latest_version().await?;
        let expected = if last == 0 && self.cfg.initial_height > 1 {
            self.cfg.initial_height
        } else {
            last + 1
        };

        if int64_to_uint64(height) != expected {
            return Err(ConsensusError::HeightMismatch {
                got: height,
                expected,
            });
        }
        Ok(())
    }

    /// Consensus parameters at the latest committed version, in wire form
    pub async fn get_consensus_params(
        &self,
        ctx: &Context,
    ) -> Result<abci::ConsensusParams, ConsensusError> {
        let version = self.store.latest_version().await?;
        let params = query_consensus_params(self.app.as_ref(), ctx, version).await?;
        Ok(into_abci_consensus_params(&params))
    }

    /// Lowest height the engine must keep; 0 keeps everything.
    ///
    /// The bound is the smallest set (non-zero) value among the evidence age
    /// window, the snapshot window and `min_retain_blocks`, each counted back
    /// from `commit_height`. A negative bound keeps everything.
    pub fn get_block_retention_height(&self, params: &AppConsensusParams, commit_height: i64) -> i64 {
        if self.cfg.min_retain_blocks == 0 {
            return 0;
        }

        let mut retention_height = 0;

        if let Some(evidence) = &params.evidence {
            if evidence.max_age_num_blocks > 0 {
                retention_height = commit_height - evidence.max_age_num_blocks;
            }
        }

        if let Some(manager) = &self.snapshot_manager {
            let window = manager.snapshot_block_retention_heights();
            if window > 0 {
                retention_height = min_non_zero(retention_height, commit_height - window);
            }
        }

        let retain_blocks = commit_height - uint64_to_int64(self.cfg.min_retain_blocks);
        retention_height = min_non_zero(retention_height, retain_blocks);

        retention_height.max(0)
    }

    /// Fails once the configured halt height or halt time is passed
    pub fn check_halt(&self, height: i64, time: &Timestamp) -> Result<(), ConsensusError> {
        let halt_height = self.cfg.halt_height;
        let halt_time = self.cfg.halt_time;

        let halt = (halt_height > 0 && int64_to_uint64(height) > halt_height)
            || (halt_time > 0 && time.unix() > uint64_to_int64(halt_time));

        if halt {
            error!(
                "Halting node per configuration at height {} (halt height {}, halt time {})",
                height, halt_height, halt_time
            );
            return Err(ConsensusError::Halt {
                height: halt_height,
                time: halt_time,
            });
        }
        Ok(())
    }

    fn has_active_mempool(&self) -> bool {
        self.mempool
            .as_ref()
            .is_some_and(|mempool| !is_noop(mempool.as_ref()))
    }
}

fn decode_failure(err: &CoreError) -> TxResult {
    TxResult::failure(AppError::new(err.codespace(), err.code(), err.to_string()), 0, 0)
}

fn check_tx_response(exec: abci::ExecTxResult) -> ResponseCheckTx {
    ResponseCheckTx {
        code: exec.code,
        data: exec.data,
        log: exec.log,
        info: exec.info,
        gas_wanted: exec.gas_wanted,
        gas_used: exec.gas_used,
        events: exec.events,
        codespace: exec.codespace,
    }
}

/// Smaller of two bounds where 0 means unset. Negative bounds are kept so a
/// window reaching past genesis pins retention at 0.
fn min_non_zero(x: i64, y: i64) -> i64 {
    match (x, y) {
        (0, y) => y,
        (x, 0) => x,
        (x, y) => x.min(y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockApp;
    use meridian_core::{EvidenceParams, SimpleTx, SimpleTxDecoder};
    use meridian_store::MemoryStore;

    struct FixedSnapshots(i64);

    impl SnapshotManager for FixedSnapshots {
        fn snapshot_block_retention_heights(&self) -> i64 {
            self.0
        }

        fn snapshot_if_applicable(&self, _height: i64) {}
    }

    fn consensus_with(cfg: Config, store: Arc<MemoryStore>) -> Consensus<SimpleTx> {
        Consensus::new(
            Arc::new(MockApp::new()),
            None,
            store,
            Arc::new(SimpleTxDecoder),
            cfg,
        )
    }

    async fn store_at(height: u64) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for i in 0..height {
            let mut changes = ChangeSet::new();
            changes.set(format!("k{}", i).into_bytes(), b"v".to_vec());
            store.commit(&changes).await.unwrap();
        }
        store
    }

    fn evidence_params(max_age_num_blocks: i64) -> AppConsensusParams {
        AppConsensusParams {
            evidence: Some(EvidenceParams {
                max_age_num_blocks,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_first_height_follows_initial_height() {
        let cfg = Config {
            initial_height: 5,
            ..Default::default()
        };
        let consensus = consensus_with(cfg, store_at(0).await);

        consensus.validate_height(5).await.unwrap();
        for bad in [1, 6] {
            let err = consensus.validate_height(bad).await.unwrap_err();
            assert!(matches!(
                err,
                ConsensusError::HeightMismatch { got, expected: 5 } if got == bad
            ));
        }
    }

    #[tokio::test]
    async fn test_height_follows_last_commit() {
        let consensus = consensus_with(Config::default(), store_at(10).await);

        consensus.validate_height(11).await.unwrap();
        assert!(consensus.validate_height(10).await.is_err());
        assert!(consensus.validate_height(12).await.is_err());
    }

    #[tokio::test]
    async fn test_non_positive_height_invalid() {
        let consensus = consensus_with(Config::default(), store_at(0).await);
        assert!(matches!(
            consensus.validate_height(0).await,
            Err(ConsensusError::InvalidHeight(0))
        ));
        assert!(matches!(
            consensus.validate_height(-3).await,
            Err(ConsensusError::InvalidHeight(-3))
        ));
    }

    #[tokio::test]
    async fn test_retention_disabled_without_min_retain() {
        let consensus = consensus_with(Config::default(), store_at(0).await);
        assert_eq!(consensus.get_block_retention_height(&evidence_params(10), 1_000), 0);
    }

    #[tokio::test]
    async fn test_retention_clamps_to_zero() {
        let cfg = Config {
            min_retain_blocks: 100,
            ..Default::default()
        };
        let consensus = consensus_with(cfg, store_at(0).await);
        assert_eq!(
            consensus.get_block_retention_height(&AppConsensusParams::default(), 50),
            0
        );
    }

    #[tokio::test]
    async fn test_retention_takes_smallest_set_bound() {
        let cfg = Config {
            min_retain_blocks: 10,
            ..Default::default()
        };
        let mut consensus = consensus_with(cfg, store_at(0).await);
        assert_eq!(
            consensus.get_block_retention_height(&AppConsensusParams::default(), 50),
            40
        );

        // evidence window keeps more history
        assert_eq!(consensus.get_block_retention_height(&evidence_params(20), 50), 30);

        consensus.set_snapshot_manager(Arc::new(FixedSnapshots(45)));
        assert_eq!(consensus.get_block_retention_height(&evidence_params(20), 50), 5);

        // evidence window reaching past genesis keeps everything
        consensus.set_snapshot_manager(Arc::new(FixedSnapshots(0)));
        assert_eq!(consensus.get_block_retention_height(&evidence_params(80), 50), 0);

        consensus.set_snapshot_manager(Arc::new(FixedSnapshots(60)));
        assert_eq!(consensus.get_block_retention_height(&evidence_params(20), 50), 0);
    }

    #[tokio::test]
    async fn test_check_halt() {
        let cfg = Config {
            halt_height: 10,
            halt_time: 1_700_000_000,
            ..Default::default()
        };
        let consensus = consensus_with(cfg, store_at(0).await);
        let before = Timestamp::from_unix(1_600_000_000);

        consensus.check_halt(10, &before).unwrap();
        let err = consensus.check_halt(11, &before).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, ConsensusError::Halt { height: 10, .. }));

        assert!(consensus
            .check_halt(5, &Timestamp::from_unix(1_700_000_001))
            .is_err());
    }

    #[tokio::test]
    async fn test_disabled_halt_never_fires() {
        let consensus = consensus_with(Config::default(), store_at(0).await);
        consensus
            .check_halt(i64::MAX, &Timestamp::from_unix(i64::MAX))
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_finalize_commits_nothing() {
        let app = Arc::new(MockApp::new().failing_queries());
        let store = store_at(0).await;
        let consensus = Consensus::new(
            app.clone(),
            None,
            store.clone(),
            Arc::new(SimpleTxDecoder),
            Config::default(),
        );
        let ctx = Context::new();

        consensus
            .init_chain(
                &ctx,
                RequestInitChain {
                    chain_id: "retry".to_string(),
                    app_state_bytes: b"state".to_vec(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let request = RequestFinalizeBlock {
            height: 1,
            txs: vec![SimpleTx::new(b"a".to_vec(), 1).bytes()],
            ..Default::default()
        };

        let err = consensus
            .finalize_block(&ctx, request.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, ConsensusError::QueryFailed(_)));
        assert_eq!(store.latest_version().await.unwrap(), 0);

        // retrying the same height succeeds and still carries genesis
        app.set_failing_queries(false);
        let response = consensus.finalize_block(&ctx, request).await.unwrap();
        assert_eq!(store.latest_version().await.unwrap(), 1);
        assert_eq!(store.get(b"genesis").await, Some(b"state".to_vec()));
        assert_eq!(
            response.app_hash,
            store.state_latest().await.unwrap().1.to_vec()
        );
        assert_eq!(app.delivered(), vec![1, 1]);
    }

    #[test]
    fn test_min_non_zero() {
        assert_eq!(min_non_zero(3, 7), 3);
        assert_eq!(min_non_zero(-3, 7), -3);
        assert_eq!(min_non_zero(0, 7), 7);
        assert_eq!(min_non_zero(3, 0), 3);
        assert_eq!(min_non_zero(-1, -2), -2);
        assert_eq!(min_non_zero(0, 0), 0);
    }
}
