//! In-crate application double for unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use meridian_core::{
    AppError, BlockParams, BlockRequest, BlockResponse, ChangeSet, ConsensusParams, Event,
    GenesisRequest, SimpleTx, TxResult, ValidatorUpdate,
};

use crate::app::{AppManager, Context, QueryRequest, QueryResponse};

/// Transactions whose payload starts with this prefix fail validation
pub const BAD_PREFIX: &[u8] = b"bad";

pub struct MockApp {
    pub params: ConsensusParams,
    fail_queries: AtomicBool,
    validated: AtomicUsize,
    delivered: Mutex<Vec<u64>>,
}

impl MockApp {
    pub fn new() -> Self {
        MockApp {
            params: ConsensusParams::default(),
            fail_queries: AtomicBool::new(false),
            validated: AtomicUsize::new(0),
            delivered: Mutex::new(Vec::new()),
        }
    }

    pub fn with_max_gas(max_gas: i64) -> Self {
        let mut app = MockApp::new();
        app.params.block = Some(BlockParams {
            max_bytes: 1_048_576,
            max_gas,
        });
        app
    }

    pub fn failing_queries(self) -> Self {
        self.set_failing_queries(true);
        self
    }

    pub fn set_failing_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn validated(&self) -> usize {
        self.validated.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<u64> {
        self.delivered.lock().unwrap().clone()
    }

    fn check(&self, tx: &SimpleTx) -> TxResult {
        if tx.payload.starts_with(BAD_PREFIX) {
            TxResult::failure(AppError::new("mock", 3, "rejected tx"), tx.gas_limit, 0)
        } else {
            TxResult::success(tx.gas_limit, tx.gas_limit)
        }
    }
}

#[async_trait]
impl AppManager<SimpleTx> for MockApp {
    async fn init_genesis(
        &self,
        _ctx: &Context,
        req: GenesisRequest,
    ) -> Result<(Vec<ValidatorUpdate>, ChangeSet), AppError> {
        let mut changes = ChangeSet::new();
        changes.set(b"genesis".to_vec(), req.app_state);
        Ok((Vec::new(), changes))
    }

    async fn deliver_block(
        &self,
        _ctx: &Context,
        block: BlockRequest<SimpleTx>,
    ) -> Result<(BlockResponse, ChangeSet), AppError> {
        self.delivered.lock().unwrap().push(block.height);

        let tx_results = block
            .txs
            .iter()
            .map(|tx| {
                self.check(tx)
                    .with_events(vec![Event::new("tx").with_attribute("size", tx.payload.len().to_string())])
            })
            .collect();

        let mut changes = ChangeSet::new();
        changes.set(
            format!("height/{}", block.height).into_bytes(),
            block.txs.len().to_string().into_bytes(),
        );

        let response = BlockResponse {
            begin_block_events: vec![Event::new("begin")],
            end_block_events: vec![Event::new("end")],
            tx_results,
            validator_updates: Vec::new(),
        };
        Ok((response, changes))
    }

    async fn validate_tx(&self, _ctx: &Context, tx: &SimpleTx) -> Result<TxResult, AppError> {
        self.validated.fetch_add(1, Ordering::SeqCst);
        Ok(self.check(tx))
    }

    async fn simulate(&self, _ctx: &Context, tx: &SimpleTx) -> Result<TxResult, AppError> {
        Ok(self.check(tx))
    }

    async fn query(
        &self,
        _ctx: &Context,
        _version: u64,
        request: QueryRequest,
    ) -> Result<QueryResponse, AppError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(AppError::new("mock", 7, "query unavailable"));
        }

        match request {
            QueryRequest::ConsensusParams => Ok(QueryResponse::ConsensusParams(self.params.clone())),
            QueryRequest::Custom { data, .. } => Ok(QueryResponse::Custom(data)),
        }
    }
}
