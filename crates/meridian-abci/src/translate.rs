//! Mapping between the application's result types and the wire protocol.
//!
//! Everything here is pure: no I/O, no locking.

use std::collections::HashSet;

use meridian_core::serialize::{to_bytes, to_json_bytes};
use meridian_core::{
    abci_info, AbciParams, BlockParams, BlockResponse, CodedError, CommitInfo as AppCommitInfo,
    ConsensusParams as AppConsensusParams, CoreError, Event as AppEvent, EvidenceParams, Evidence,
    Hash, TxResult, ValidatorParams, ValidatorUpdate as AppValidatorUpdate, VersionParams,
    VoteInfo as AppVoteInfo,
};
use serde::{Deserialize, Serialize};

use crate::abci;

const SECP256K1: &str = "secp256k1";

/// Wire events with attribute indexing applied. An attribute is indexed if
/// `"{event}.{key}"` is in `index_set`, or if `index_set` is empty.
pub fn into_abci_events(events: &[AppEvent], index_set: &HashSet<String>) -> Vec<abci::Event> {
    let index_all = index_set.is_empty();
    events
        .iter()
        .map(|event| abci::Event {
            kind: event.kind.clone(),
            attributes: event
                .attributes
                .iter()
                .map(|attr| abci::EventAttribute {
                    key: attr.key.clone(),
                    value: attr.value.clone(),
                    index: index_all || index_set.contains(&event.index_key(&attr.key)),
                })
                .collect(),
        })
        .collect()
}

/// Exec result from an optional error, gas values and events. A missing
/// error yields code 0.
pub fn response_exec_tx_result_with_events<E: CodedError + ?Sized>(
    err: Option<&E>,
    gas_wanted: u64,
    gas_used: u64,
    events: Vec<abci::Event>,
    debug: bool,
) -> abci::ExecTxResult {
    let (codespace, code, log) = match err {
        Some(err) => abci_info(err, debug),
        None => (String::new(), 0, String::new()),
    };

    abci::ExecTxResult {
        codespace,
        code,
        log,
        gas_wanted: uint64_to_int64(gas_wanted),
        gas_used: uint64_to_int64(gas_used),
        events,
        ..Default::default()
    }
}

/// One wire result per application result, in order. Failed results carry
/// their error's codespace, code and redacted log; successful ones carry
/// the encoded message responses as data.
pub fn into_abci_tx_results(
    results: &[TxResult],
    index_set: &HashSet<String>,
) -> Result<Vec<abci::ExecTxResult>, CoreError> {
    results
        .iter()
        .map(|result| {
            let events = into_abci_events(&result.events, index_set);
            let mut exec = response_exec_tx_result_with_events(
                result.error.as_ref(),
                result.gas_wanted,
                result.gas_used,
                events,
                false,
            );
            if result.is_ok() && !result.resp.is_empty() {
                exec.data = to_bytes(&result.resp)?;
            }
            Ok(exec)
        })
        .collect()
}

/// Validator updates default to ed25519 keys unless the update names
/// secp256k1.
pub fn into_abci_validator_updates(updates: &[AppValidatorUpdate]) -> Vec<abci::ValidatorUpdate> {
    updates
        .iter()
        .map(|update| {
            let pub_key = if update.pub_key_type == SECP256K1 {
                abci::PublicKey::Secp256k1(update.pub_key.clone())
            } else {
                abci::PublicKey::Ed25519(update.pub_key.clone())
            };
            abci::ValidatorUpdate {
                pub_key,
                power: update.power,
            }
        })
        .collect()
}

/// Inverse of `into_abci_validator_updates`, for genesis validators
pub fn from_abci_validator_updates(updates: &[abci::ValidatorUpdate]) -> Vec<AppValidatorUpdate> {
    updates
        .iter()
        .map(|update| {
            let (pub_key_type, pub_key) = match &update.pub_key {
                abci::PublicKey::Ed25519(key) => ("ed25519", key.clone()),
                abci::PublicKey::Secp256k1(key) => (SECP256K1, key.clone()),
            };
            AppValidatorUpdate {
                pub_key,
                pub_key_type: pub_key_type.to_string(),
                power: update.power,
            }
        })
        .collect()
}

pub fn finalize_block_response(
    block: BlockResponse,
    consensus_params: Option<abci::ConsensusParams>,
    app_hash: Hash,
    index_set: &HashSet<String>,
) -> Result<abci::ResponseFinalizeBlock, CoreError> {
    let mut events = block.begin_block_events;
    events.extend(block.end_block_events);

    Ok(abci::ResponseFinalizeBlock {
        events: into_abci_events(&events, index_set),
        tx_results: into_abci_tx_results(&block.tx_results, index_set)?,
        validator_updates: into_abci_validator_updates(&block.validator_updates),
        consensus_param_updates: consensus_params,
        app_hash: app_hash.to_vec(),
    })
}

/// Field-by-field translation of the application's consensus parameters
pub fn into_abci_consensus_params(params: &AppConsensusParams) -> abci::ConsensusParams {
    abci::ConsensusParams {
        block: params.block.as_ref().map(|b| abci::BlockParams {
            max_bytes: b.max_bytes,
            max_gas: b.max_gas,
        }),
        evidence: params.evidence.as_ref().map(|e| abci::EvidenceParams {
            max_age_num_blocks: e.max_age_num_blocks,
            max_age_duration: e.max_age_duration,
            max_bytes: e.max_bytes,
        }),
        validator: params.validator.as_ref().map(|v| abci::ValidatorParams {
            pub_key_types: v.pub_key_types.clone(),
        }),
        version: params
            .version
            .as_ref()
            .map(|v| abci::VersionParams { app: v.app }),
        abci: params.abci.as_ref().map(|a| abci::AbciParams {
            vote_extensions_enable_height: a.vote_extensions_enable_height,
        }),
    }
}

pub fn from_abci_consensus_params(params: &abci::ConsensusParams) -> AppConsensusParams {
    AppConsensusParams {
        block: params.block.as_ref().map(|b| BlockParams {
            max_bytes: b.max_bytes,
            max_gas: b.max_gas,
        }),
        evidence: params.evidence.as_ref().map(|e| EvidenceParams {
            max_age_num_blocks: e.max_age_num_blocks,
            max_age_duration: e.max_age_duration,
            max_bytes: e.max_bytes,
        }),
        validator: params.validator.as_ref().map(|v| ValidatorParams {
            pub_key_types: v.pub_key_types.clone(),
        }),
        version: params.version.as_ref().map(|v| VersionParams { app: v.app }),
        abci: params.abci.as_ref().map(|a| AbciParams {
            vote_extensions_enable_height: a.vote_extensions_enable_height,
        }),
    }
}

/// Wire query response carrying only the error triple
pub fn query_result<E: CodedError + ?Sized>(err: &E, debug: bool) -> abci::ResponseQuery {
    let (codespace, code, log) = abci_info(err, debug);
    abci::ResponseQuery {
        codespace,
        code,
        log,
        ..Default::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasInfo {
    pub gas_wanted: u64,
    pub gas_used: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub data: Vec<u8>,
    pub log: String,
    pub events: Vec<abci::Event>,
    pub msg_responses: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResponse {
    pub gas_info: GasInfo,
    pub result: SimulationResult,
}

/// JSON body returned by the `app/simulate` query
pub fn into_abci_simulation_response(
    result: &TxResult,
    index_set: &HashSet<String>,
) -> Result<Vec<u8>, CoreError> {
    let response = SimulationResponse {
        gas_info: GasInfo {
            gas_wanted: result.gas_wanted,
            gas_used: result.gas_used,
        },
        result: SimulationResult {
            data: Vec::new(),
            log: result
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_default(),
            events: into_abci_events(&result.events, index_set),
            msg_responses: result.resp.clone(),
        },
    };

    to_json_bytes(&response)
}

/// Split a query path on `/`, dropping the empty leading segment.
///
/// `"/app/simulate"` becomes `["app", "simulate"]`.
pub fn split_query_path(path: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = path.split('/').collect();
    if parts.first() == Some(&"") {
        parts.remove(0);
    }
    parts
}

pub fn to_app_evidence(misbehavior: &[abci::Misbehavior]) -> Vec<Evidence> {
    misbehavior
        .iter()
        .map(|m| Evidence {
            kind: m.kind,
            validator: m.validator.clone(),
            height: m.height,
            time: m.time,
            total_voting_power: m.total_voting_power,
        })
        .collect()
}

pub fn to_app_commit_info(commit: &abci::CommitInfo) -> AppCommitInfo {
    AppCommitInfo {
        round: commit.round,
        votes: commit
            .votes
            .iter()
            .map(|v| AppVoteInfo {
                validator: v.validator.clone(),
                block_id_flag: v.block_id_flag,
            })
            .collect(),
    }
}

/// Negative values clamp to 0
pub fn int64_to_uint64(i: i64) -> u64 {
    u64::try_from(i).unwrap_or(0)
}

/// Values above `i64::MAX` clamp to `i64::MAX`
pub fn uint64_to_int64(u: u64) -> i64 {
    i64::try_from(u).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use meridian_core::{AppError, BlockIdFlag, Validator};
    use meridian_core::serialize::from_json_bytes;

    fn transfer_event() -> AppEvent {
        AppEvent::new("transfer")
            .with_attribute("sender", "alice")
            .with_attribute("amount", "10")
    }

    #[test]
    fn test_empty_index_set_indexes_everything() {
        let events = into_abci_events(&[transfer_event()], &HashSet::new());
        assert_eq!(events[0].kind, "transfer");
        assert!(events[0].attributes.iter().all(|a| a.index));
    }

    #[test]
    fn test_index_set_selects_attributes() {
        let index_set: HashSet<String> = ["transfer.sender".to_string()].into_iter().collect();
        let events = into_abci_events(&[transfer_event()], &index_set);

        assert!(events[0].attributes[0].index);
        assert!(!events[0].attributes[1].index);
        assert_eq!(events[0].attributes[1].value, "10");
    }

    #[test]
    fn test_successful_result_translation() {
        let mut result = TxResult::success(200, 150).with_events(vec![transfer_event()]);
        result.resp = vec![b"ok".to_vec()];

        let exec = into_abci_tx_results(&[result], &HashSet::new()).unwrap();

        assert_eq!(exec[0].code, 0);
        assert_eq!(exec[0].codespace, "");
        assert_eq!(exec[0].gas_wanted, 200);
        assert_eq!(exec[0].gas_used, 150);
        assert_eq!(exec[0].events.len(), 1);
        assert!(!exec[0].data.is_empty());
    }

    #[test]
    fn test_failed_result_translation() {
        let failed = TxResult::failure(AppError::new("bank", 5, "insufficient funds"), 200, 80)
            .with_events(vec![AppEvent::new("fee").with_attribute("amount", "1")]);
        let internal = TxResult::failure(AppError::internal("panic in handler"), 10, 10);

        let exec = into_abci_tx_results(&[failed, internal], &HashSet::new()).unwrap();

        assert_eq!(exec.len(), 2);
        assert_eq!(exec[0].codespace, "bank");
        assert_eq!(exec[0].code, 5);
        assert_eq!(exec[0].log, "insufficient funds");
        assert_eq!(exec[0].gas_used, 80);
        assert_eq!(exec[0].events[0].kind, "fee");
        assert!(exec[0].data.is_empty());
        assert_eq!(exec[1].code, 1);
        assert_eq!(exec[1].log, "internal error");
    }

    #[test]
    fn test_validator_update_key_types() {
        let updates = vec![
            AppValidatorUpdate {
                pub_key: vec![1; 32],
                pub_key_type: String::new(),
                power: 10,
            },
            AppValidatorUpdate {
                pub_key: vec![2; 33],
                pub_key_type: "secp256k1".to_string(),
                power: 0,
            },
        ];

        let wire = into_abci_validator_updates(&updates);

        assert_eq!(wire[0].pub_key, abci::PublicKey::Ed25519(vec![1; 32]));
        assert_eq!(wire[0].power, 10);
        assert_eq!(wire[1].pub_key, abci::PublicKey::Secp256k1(vec![2; 33]));
        assert_eq!(from_abci_validator_updates(&wire)[1].pub_key_type, "secp256k1");
    }

    #[test]
    fn test_finalize_response_orders_begin_then_end_events() {
        let block = BlockResponse {
            begin_block_events: vec![AppEvent::new("mint")],
            end_block_events: vec![AppEvent::new("rewards")],
            tx_results: vec![TxResult::success(1, 1)],
            validator_updates: Vec::new(),
        };

        let response =
            finalize_block_response(block, None, Hash([7; 32]), &HashSet::new()).unwrap();

        let kinds: Vec<_> = response.events.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["mint", "rewards"]);
        assert_eq!(response.tx_results.len(), 1);
        assert_eq!(response.app_hash, vec![7; 32]);
    }

    #[test]
    fn test_consensus_params_field_by_field() {
        let app = AppConsensusParams {
            block: Some(BlockParams {
                max_bytes: 22_020_096,
                max_gas: 10_000_000,
            }),
            evidence: Some(EvidenceParams {
                max_age_num_blocks: 100_000,
                max_age_duration: Duration::from_secs(172_800),
                max_bytes: 1_048_576,
            }),
            validator: Some(ValidatorParams {
                pub_key_types: vec!["ed25519".to_string()],
            }),
            version: Some(VersionParams { app: 3 }),
            abci: Some(AbciParams {
                vote_extensions_enable_height: 12,
            }),
        };

        let wire = into_abci_consensus_params(&app);

        assert_eq!(wire.block.as_ref().unwrap().max_gas, 10_000_000);
        assert_eq!(
            wire.evidence.as_ref().unwrap().max_age_duration,
            Duration::from_secs(172_800)
        );
        assert_eq!(wire.version.as_ref().unwrap().app, 3);
        assert_eq!(wire.abci.as_ref().unwrap().vote_extensions_enable_height, 12);
        assert_eq!(from_abci_consensus_params(&wire), app);
    }

    #[test]
    fn test_missing_param_sections_stay_empty() {
        let wire = into_abci_consensus_params(&AppConsensusParams::default());
        assert_eq!(wire, abci::ConsensusParams::default());
    }

    #[test]
    fn test_query_result_from_error() {
        let err = AppError::new("bank", 9, "unknown denom");
        let response = query_result(&err, false);
        assert_eq!(response.codespace, "bank");
        assert_eq!(response.code, 9);
        assert_eq!(response.log, "unknown denom");
        assert!(response.value.is_empty());
    }

    #[test]
    fn test_simulation_response_carries_failure_log() {
        let result = TxResult::failure(AppError::new("bank", 5, "insufficient funds"), 100, 40);
        let bytes = into_abci_simulation_response(&result, &HashSet::new()).unwrap();
        let response: SimulationResponse = from_json_bytes(&bytes).unwrap();

        assert_eq!(response.gas_info.gas_used, 40);
        assert_eq!(response.result.log, "insufficient funds");

        let ok = into_abci_simulation_response(&TxResult::success(1, 1), &HashSet::new()).unwrap();
        let response: SimulationResponse = from_json_bytes(&ok).unwrap();
        assert_eq!(response.result.log, "");
    }

    #[test]
    fn test_split_query_path() {
        assert_eq!(split_query_path("/app/simulate"), vec!["app", "simulate"]);
        assert_eq!(split_query_path("store/main/key"), vec!["store", "main", "key"]);
        assert_eq!(split_query_path(""), Vec::<&str>::new());
    }

    #[test]
    fn test_commit_info_conversion() {
        let commit = abci::CommitInfo {
            round: 2,
            votes: vec![abci::VoteInfo {
                validator: Validator {
                    address: vec![1, 2],
                    power: 10,
                },
                block_id_flag: BlockIdFlag::Commit,
            }],
        };

        let app = to_app_commit_info(&commit);
        assert_eq!(app.round, 2);
        assert_eq!(app.votes[0].block_id_flag, BlockIdFlag::Commit);
        assert_eq!(app.votes[0].validator.power, 10);
    }

    #[test]
    fn test_integer_clamping() {
        assert_eq!(int64_to_uint64(-5), 0);
        assert_eq!(int64_to_uint64(5), 5);
        assert_eq!(uint64_to_int64(u64::MAX), i64::MAX);
        assert_eq!(uint64_to_int64(42), 42);
    }
}
