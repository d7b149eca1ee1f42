//! Key/value application used by the adapter integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use meridian_abci::{AppManager, Config, Consensus, Context, QueryRequest, QueryResponse};
use meridian_core::{
    AbciParams, AppError, BlockParams, BlockRequest, BlockResponse, ChangeSet, ConsensusParams,
    Event, GenesisRequest, SimpleTx, SimpleTxDecoder, TxResult, ValidatorUpdate,
};
use meridian_mempool::{Mempool, MempoolConfig, OrderingMode, PriorityMempool};
use meridian_store::MemoryStore;

/// Applies `key=value` payloads; payloads starting with `bad` are invalid
pub struct KvApp {
    pub params: Mutex<ConsensusParams>,
    pub blocks: Mutex<Vec<BlockRequest<SimpleTx>>>,
    pub genesis_validators: Vec<ValidatorUpdate>,
}

impl KvApp {
    pub fn new() -> Self {
        KvApp {
            params: Mutex::new(ConsensusParams {
                block: Some(BlockParams {
                    max_bytes: 1_048_576,
                    max_gas: 0,
                }),
                ..Default::default()
            }),
            blocks: Mutex::new(Vec::new()),
            genesis_validators: Vec::new(),
        }
    }

    pub fn set_max_gas(&self, max_gas: i64) {
        let mut params = self.params.lock().unwrap();
        params.block = Some(BlockParams {
            max_bytes: 1_048_576,
            max_gas,
        });
    }

    pub fn enable_vote_extensions(&self, height: i64) {
        self.params.lock().unwrap().abci = Some(AbciParams {
            vote_extensions_enable_height: height,
        });
    }

    fn check(tx: &SimpleTx) -> TxResult {
        if tx.payload.starts_with(b"bad") {
            return TxResult::failure(AppError::new("kv", 4, "malformed entry"), tx.gas_limit, 0);
        }
        TxResult::success(tx.gas_limit, tx.gas_limit / 2)
    }
}

#[async_trait]
impl AppManager<SimpleTx> for KvApp {
    async fn init_genesis(
        &self,
        _ctx: &Context,
        req: GenesisRequest,
    ) -> Result<(Vec<ValidatorUpdate>, ChangeSet), AppError> {
        let mut changes = ChangeSet::new();
        changes.set(b"chain_id".to_vec(), req.chain_id.into_bytes());
        if let Some(params) = req.consensus_params {
            *self.params.lock().unwrap() = params;
        }
        Ok((self.genesis_validators.clone(), changes))
    }

    async fn deliver_block(
        &self,
        _ctx: &Context,
        block: BlockRequest<SimpleTx>,
    ) -> Result<(BlockResponse, ChangeSet), AppError> {
        let mut changes = ChangeSet::new();
        let mut tx_results = Vec::with_capacity(block.txs.len());

        for tx in &block.txs {
            let result = KvApp::check(tx);
            if result.is_ok() {
                let entry = String::from_utf8_lossy(&tx.payload).to_string();
                if let Some((key, value)) = entry.split_once('=') {
                    changes.set(key.as_bytes().to_vec(), value.as_bytes().to_vec());
                }
                tx_results.push(result.with_events(vec![
                    Event::new("kv").with_attribute("entry", entry.clone())
                ]));
            } else {
                tx_results.push(result);
            }
        }

        self.blocks.lock().unwrap().push(block);

        Ok((
            BlockResponse {
                begin_block_events: vec![Event::new("begin_block")],
                end_block_events: vec![Event::new("end_block")],
                tx_results,
                validator_updates: Vec::new(),
            },
            changes,
        ))
    }

    async fn validate_tx(&self, _ctx: &Context, tx: &SimpleTx) -> Result<TxResult, AppError> {
        Ok(KvApp::check(tx))
    }

    async fn simulate(&self, _ctx: &Context, tx: &SimpleTx) -> Result<TxResult, AppError> {
        Ok(KvApp::check(tx))
    }

    async fn query(
        &self,
        _ctx: &Context,
        _version: u64,
        request: QueryRequest,
    ) -> Result<QueryResponse, AppError> {
        match request {
            QueryRequest::ConsensusParams => Ok(QueryResponse::ConsensusParams(
                self.params.lock().unwrap().clone(),
            )),
            QueryRequest::Custom { path, .. } => {
                Err(AppError::new("kv", 6, format!("no handler for {}", path)))
            }
        }
    }
}

pub struct Harness {
    pub app: Arc<KvApp>,
    pub mempool: Arc<PriorityMempool<SimpleTx>>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new() -> Self {
        Harness {
            app: Arc::new(KvApp::new()),
            mempool: Arc::new(PriorityMempool::new(MempoolConfig {
                max_size: 1_000,
                ordering_mode: OrderingMode::Fifo,
            })),
            store: Arc::new(MemoryStore::new()),
        }
    }

    pub fn consensus(&self, cfg: Config) -> Consensus<SimpleTx> {
        let mempool: Arc<dyn Mempool<SimpleTx>> = self.mempool.clone();
        Consensus::new(
            self.app.clone(),
            Some(mempool),
            self.store.clone(),
            Arc::new(SimpleTxDecoder),
            cfg,
        )
    }
}

pub fn kv_tx(entry: &str, gas: u64) -> SimpleTx {
    SimpleTx::new(entry.as_bytes().to_vec(), gas)
}
