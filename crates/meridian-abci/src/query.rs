use std::collections::HashMap;

use meridian_core::serialize::to_json_bytes;
use meridian_core::CoreError;

use crate::app::{QueryRequest, QueryResponse};
use crate::error::ConsensusError;

/// Path of the built-in consensus-parameters query
pub const CONSENSUS_PARAMS_PATH: &str = "/meridian.consensus.v1.Query/Params";

/// Resolves opaque, path-addressed queries to typed App requests and
/// encodes the typed responses back into payload bytes.
pub trait QueryRegistry: Send + Sync {
    fn decode(&self, path: &str, data: &[u8]) -> Result<QueryRequest, ConsensusError>;

    fn encode(&self, path: &str, response: QueryResponse) -> Result<Vec<u8>, ConsensusError>;
}

type DecodeFn = Box<dyn Fn(&[u8]) -> Result<QueryRequest, CoreError> + Send + Sync>;
type EncodeFn = Box<dyn Fn(QueryResponse) -> Result<Vec<u8>, ConsensusError> + Send + Sync>;

struct Route {
    decode: DecodeFn,
    encode: EncodeFn,
}

/// Table-driven registry keyed by exact query path
#[derive(Default)]
pub struct QueryRouter {
    routes: HashMap<String, Route>,
}

impl QueryRouter {
    pub fn new() -> Self {
        QueryRouter::default()
    }

    /// Router with the consensus-parameters route registered
    pub fn with_defaults() -> Self {
        let mut router = QueryRouter::new();
        router.register(
            CONSENSUS_PARAMS_PATH,
            |_| Ok(QueryRequest::ConsensusParams),
            |response| match response {
                QueryResponse::ConsensusParams(params) => Ok(to_json_bytes(&params)?),
                other => Err(ConsensusError::UnexpectedResponse {
                    expected: "ConsensusParams",
                    got: other.kind(),
                }),
            },
        );
        router
    }

    pub fn register<D, E>(&mut self, path: impl Into<String>, decode: D, encode: E)
    where
        D: Fn(&[u8]) -> Result<QueryRequest, CoreError> + Send + Sync + 'static,
        E: Fn(QueryResponse) -> Result<Vec<u8>, ConsensusError> + Send + Sync + 'static,
    {
        self.routes.insert(
            path.into(),
            Route {
                decode: Box::new(decode),
                encode: Box::new(encode),
            },
        );
    }

    /// Forward `path` to the App untouched as a `Custom` query
    pub fn register_passthrough(&mut self, path: impl Into<String>) {
        let path = path.into();
        let route_path = path.clone();
        self.register(
            path,
            move |data| {
                Ok(QueryRequest::Custom {
                    path: route_path.clone(),
                    data: data.to_vec(),
                })
            },
            |response| match response {
                QueryResponse::Custom(bytes) => Ok(bytes),
                other => Err(ConsensusError::UnexpectedResponse {
                    expected: "Custom",
                    got: other.kind(),
                }),
            },
        );
    }

    pub fn contains(&self, path: &str) -> bool {
        self.routes.contains_key(path)
    }

    fn route(&self, path: &str) -> Result<&Route, ConsensusError> {
        self.routes
            .get(path)
            .ok_or_else(|| ConsensusError::UnknownQuery(path.to_string()))
    }
}

impl QueryRegistry for QueryRouter {
    fn decode(&self, path: &str, data: &[u8]) -> Result<QueryRequest, ConsensusError> {
        Ok((self.route(path)?.decode)(data)?)
    }

    fn encode(&self, path: &str, response: QueryResponse) -> Result<Vec<u8>, ConsensusError> {
        (self.route(path)?.encode)(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::serialize::from_json_bytes;
    use meridian_core::{BlockParams, ConsensusParams};

    #[test]
    fn test_default_route_round_trip() {
        let router = QueryRouter::with_defaults();
        assert_eq!(
            router.decode(CONSENSUS_PARAMS_PATH, &[]).unwrap(),
            QueryRequest::ConsensusParams
        );

        let params = ConsensusParams {
            block: Some(BlockParams {
                max_bytes: 4096,
                max_gas: 100,
            }),
            ..Default::default()
        };
        let bytes = router
            .encode(CONSENSUS_PARAMS_PATH, QueryResponse::ConsensusParams(params.clone()))
            .unwrap();
        let decoded: ConsensusParams = from_json_bytes(&bytes).unwrap();
        assert_eq!(decoded, params);
    }

    #[test]
    fn test_unknown_path() {
        let router = QueryRouter::new();
        assert!(matches!(
            router.decode("/bank.v1.Query/Balance", &[]),
            Err(ConsensusError::UnknownQuery(path)) if path == "/bank.v1.Query/Balance"
        ));
    }

    #[test]
    fn test_passthrough_route() {
        let mut router = QueryRouter::new();
        router.register_passthrough("/bank.v1.Query/Balance");

        let request = router.decode("/bank.v1.Query/Balance", b"addr").unwrap();
        assert_eq!(
            request,
            QueryRequest::Custom {
                path: "/bank.v1.Query/Balance".to_string(),
                data: b"addr".to_vec(),
            }
        );

        let result = router.encode(
            "/bank.v1.Query/Balance",
            QueryResponse::ConsensusParams(ConsensusParams::default()),
        );
        assert!(matches!(
            result,
            Err(ConsensusError::UnexpectedResponse { expected: "Custom", .. })
        ));
    }
}
