use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Serialize to deterministic bincode bytes
pub fn to_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CoreError> {
    bincode::serialize(value).map_err(|e| CoreError::Serialization(e.to_string()))
}

/// Deserialize from bincode bytes
pub fn from_bytes<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, CoreError> {
    bincode::deserialize(bytes).map_err(|e| CoreError::Deserialization(e.to_string()))
}

/// Serialize to JSON bytes (query and simulation payloads)
pub fn to_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, CoreError> {
    serde_json::to_vec(value).map_err(|e| CoreError::Serialization(e.to_string()))
}

/// Deserialize from JSON bytes
pub fn from_json_bytes<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, CoreError> {
    serde_json::from_slice(bytes).map_err(|e| CoreError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Payload {
        height: u64,
        memo: String,
    }

    #[test]
    fn test_bincode_is_deterministic() {
        let value = Payload {
            height: 100,
            memo: "block".to_string(),
        };

        assert_eq!(to_bytes(&value).unwrap(), to_bytes(&value).unwrap());
        let recovered: Payload = from_bytes(&to_bytes(&value).unwrap()).unwrap();
        assert_eq!(recovered, value);
    }

    #[test]
    fn test_malformed_json_is_deserialization_error() {
        let result: Result<Payload, _> = from_json_bytes(b"{\"height\":");
        assert!(matches!(result, Err(CoreError::Deserialization(_))));
    }
}
