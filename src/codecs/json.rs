//! JSON codec backed by `serde_json`.

use bytes::Bytes;
use serde_json::Value;

use crate::error::CacheError;
use crate::traits::CacheCodec;

/// The default codec.
///
/// Stored entries are plain JSON text, which keeps them inspectable with
/// standard store tooling (`redis-cli GET` prints something readable) at the
/// cost of a larger encoded size than a binary format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl CacheCodec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<Bytes, CacheError> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|err| CacheError::encode("<json>", err))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CacheError> {
        serde_json::from_slice(bytes).map_err(|err| CacheError::decode("<json>", err))
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_payload_values() {
        let codec = JsonCodec;
        let value = json!({ "items": [1, 2, 3], "nextCursor": "abc" });

        let bytes = codec.encode(&value).unwrap();
        let decoded = codec.decode(&bytes).unwrap();

        assert_eq!(decoded, value);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let codec = JsonCodec;
        assert!(codec.decode(b"\x00\x01not json").is_err());
    }
}
