//! MessagePack codec backed by `rmp-serde`.

use bytes::Bytes;
use serde_json::Value;

use crate::error::CacheError;
use crate::traits::CacheCodec;

/// Binary codec for deployments that care about stored-entry size.
///
/// Encodes the same payload values as [`JsonCodec`](super::JsonCodec) but in
/// MessagePack framing. Entries written with one codec cannot be read with
/// the other; switching codecs on a live store turns existing entries into
/// decode errors, which the cache serves as misses until they expire.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgpackCodec;

impl CacheCodec for MsgpackCodec {
    fn encode(&self, value: &Value) -> Result<Bytes, CacheError> {
        rmp_serde::to_vec(value)
            .map(Bytes::from)
            .map_err(|err| CacheError::encode("<msgpack>", err))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CacheError> {
        rmp_serde::from_slice(bytes).map_err(|err| CacheError::decode("<msgpack>", err))
    }

    fn name(&self) -> &'static str {
        "msgpack"
    }
}
