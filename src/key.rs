//! Cache-key derivation.
//!
//! Keys follow a `namespace:operation:digest` layout so related entries group
//! under a common, human-readable prefix while the digest keeps distinct
//! inputs distinct. Only the digest varies with the input; operators can scan
//! a keyspace by prefix without parsing hashes.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::canonical::{self, CanonicalInput};

/// Builds store keys of the form `namespace:operation:digest`.
///
/// The operation path has its `.` and `/` separators rewritten to `:` so the
/// whole key stays colon-delimited, and the digest is the SHA-256 of the
/// canonicalized input rendered as lowercase hex.
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder {
    namespace: String,
}

impl CacheKeyBuilder {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Build the key for an already-canonicalized input.
    pub fn build(&self, operation_path: &str, canonical: &CanonicalInput) -> String {
        format!(
            "{}:{}:{}",
            self.namespace,
            normalize_path(operation_path),
            digest_hex(canonical)
        )
    }

    /// Canonicalize `input` and build its key in one step.
    pub fn for_input(&self, operation_path: &str, input: &Value, exclude_keys: &[String]) -> String {
        let canonical = canonical::canonicalize(input, exclude_keys);
        self.build(operation_path, &canonical)
    }
}

/// Rewrite operation-path separators so keys stay colon-delimited.
fn normalize_path(path: &str) -> String {
    path.replace(['.', '/'], ":")
}

/// SHA-256 of the canonical serialization, as lowercase hex.
fn digest_hex(canonical: &CanonicalInput) -> String {
    let serialized = canonical::to_canonical_json(canonical);
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_layout_is_namespace_operation_digest() {
        let builder = CacheKeyBuilder::new("rpc");
        let key = builder.for_input("image.getInfinite", &json!({ "limit": 20 }), &[]);

        let segments: Vec<&str> = key.split(':').collect();
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0], "rpc");
        assert_eq!(segments[1], "image");
        assert_eq!(segments[2], "getInfinite");
        assert_eq!(segments[3].len(), 64);
        assert!(segments[3].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn slash_separators_normalize_like_dots() {
        let builder = CacheKeyBuilder::new("rpc");
        let input = json!({ "limit": 20 });

        let dotted = builder.for_input("image.getInfinite", &input, &[]);
        let slashed = builder.for_input("image/getInfinite", &input, &[]);

        assert_eq!(dotted, slashed);
    }

    #[test]
    fn equivalent_inputs_share_a_key() {
        let builder = CacheKeyBuilder::new("rpc");

        let sparse = builder.for_input("tag.list", &json!({ "query": "fog" }), &[]);
        let padded = builder.for_input(
            "tag.list",
            &json!({ "query": "fog", "page": 0, "cursor": null, "ids": [] }),
            &[],
        );

        assert_eq!(sparse, padded);
    }

    #[test]
    fn distinct_inputs_get_distinct_keys() {
        let builder = CacheKeyBuilder::new("rpc");

        let fog = builder.for_input("tag.list", &json!({ "query": "fog" }), &[]);
        let mist = builder.for_input("tag.list", &json!({ "query": "mist" }), &[]);

        assert_ne!(fog, mist);
    }

    #[test]
    fn excluded_fields_do_not_split_keys() {
        let builder = CacheKeyBuilder::new("rpc");
        let exclude = vec!["cursor".to_string()];

        let first = builder.for_input("tag.list", &json!({ "q": "a", "cursor": "p1" }), &exclude);
        let second = builder.for_input("tag.list", &json!({ "q": "a", "cursor": "p2" }), &exclude);

        assert_eq!(first, second);
    }
}
