//! Input canonicalization for cache-key derivation.
//!
//! Two call inputs that mean the same thing must produce the same cache key,
//! so inputs are reduced to a canonical form before hashing: absent-ish
//! fields are dropped, excluded fields are removed, and list fields are
//! sorted and deduplicated.
//!
//! The falsy rule intentionally collapses distinct values: `0`, `false`, `""`
//! and a missing field all canonicalize identically. Call sites where `0` or
//! `false` is meaningful must encode that meaning differently (for example as
//! a string) before caching.

use std::collections::BTreeMap;

use serde_json::Value;

/// Canonical form of a call input: top-level fields in sorted order, falsy
/// and excluded fields removed, list fields sorted and deduplicated.
pub type CanonicalInput = BTreeMap<String, Value>;

/// Reduce a call input to its canonical form.
///
/// Non-object inputs (including `null`) canonicalize to the empty form, the
/// same as an object whose fields were all dropped.
pub fn canonicalize(input: &Value, exclude_keys: &[String]) -> CanonicalInput {
    let Value::Object(fields) = input else {
        return CanonicalInput::new();
    };

    let mut canonical = CanonicalInput::new();
    for (name, value) in fields {
        if exclude_keys.iter().any(|excluded| excluded == name) {
            continue;
        }
        if is_falsy(value) {
            continue;
        }
        let value = match value {
            Value::Array(items) => Value::Array(normalize_list(items)),
            other => other.clone(),
        };
        canonical.insert(name.clone(), value);
    }
    canonical
}

/// Serialize a canonical input deterministically.
///
/// `BTreeMap` iteration gives sorted top-level fields regardless of the order
/// the caller supplied them in.
pub fn to_canonical_json(canonical: &CanonicalInput) -> String {
    serde_json::to_string(canonical).unwrap_or_default()
}

/// Fields that count as "absent" for key purposes.
///
/// Empty objects are kept: an object is present even when it has no fields.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(_) => false,
    }
}

/// Sort list elements into a stable order and drop duplicates.
///
/// Elements are ordered by their serialized form, which is injective for JSON
/// values, so equal serializations mean equal elements.
fn normalize_list(items: &[Value]) -> Vec<Value> {
    let mut rendered: Vec<(String, Value)> = items
        .iter()
        .map(|item| {
            (
                serde_json::to_string(item).unwrap_or_default(),
                item.clone(),
            )
        })
        .collect();
    rendered.sort_by(|left, right| left.0.cmp(&right.0));
    rendered.dedup_by(|left, right| left.0 == right.0);
    rendered.into_iter().map(|(_, item)| item).collect()
}
