use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use meridian_abci::{ConfigError, ConsensusError};
use meridian_core::abci_info;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// A coded failure from the adapter, already downgraded for the wire
    #[error("{log}")]
    Abci {
        status: StatusCode,
        codespace: String,
        code: u32,
        log: String,
    },

    #[error("standalone mode is disabled")]
    NotStandalone,

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn from_consensus(err: &ConsensusError, debug: bool) -> Self {
        let (codespace, code, log) = abci_info(err, debug);
        ServerError::Abci {
            status: status_for(err),
            codespace,
            code,
            log,
        }
    }
}

fn status_for(err: &ConsensusError) -> StatusCode {
    match err {
        ConsensusError::InvalidRequest(_)
        | ConsensusError::InvalidHeight(_)
        | ConsensusError::HeightMismatch { .. }
        | ConsensusError::InitialHeightMismatch { .. }
        | ConsensusError::VoteExtensionsDisabled(_)
        | ConsensusError::UnknownQuery(_) => StatusCode::BAD_REQUEST,
        ConsensusError::Halt { .. } | ConsensusError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ServerError::Abci {
                status,
                codespace,
                code,
                log,
            } => (
                status,
                json!({ "codespace": codespace, "code": code, "log": log }),
            ),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "codespace": "server", "code": 1, "log": other.to_string() }),
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}
