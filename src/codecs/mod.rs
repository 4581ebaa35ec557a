//! Built-in implementations of the [`CacheCodec`](crate::traits::CacheCodec)
//! trait.

mod json;
pub use json::JsonCodec;

#[cfg(feature = "msgpack")]
mod msgpack;
#[cfg(feature = "msgpack")]
#[cfg_attr(docsrs, doc(cfg(feature = "msgpack")))]
pub use msgpack::MsgpackCodec;
