//! Content equivalence
//!
//! Two objects are "the same" for merge purposes when they are equal after
//! removing every `description` and `summary` key at any depth. Prose-only
//! differences therefore never produce a conflict.

use serde::Serialize;
use serde_yaml::Value;

/// Keys ignored when comparing for equivalence.
pub const DESCRIPTIVE_FIELDS: [&str; 2] = ["description", "summary"];

/// Removes `keys` from every mapping in `value`, recursively.
pub fn strip_keys(value: &mut Value, keys: &[&str]) {
    match value {
        Value::Mapping(map) => {
            map.retain(|key, _| !matches!(key, Value::String(k) if keys.contains(&k.as_str())));
            for (_, child) in map.iter_mut() {
                strip_keys(child, keys);
            }
        }
        Value::Sequence(seq) => {
            for child in seq {
                strip_keys(child, keys);
            }
        }
        Value::Tagged(tagged) => strip_keys(&mut tagged.value, keys),
        _ => {}
    }
}

/// Serializes `item` with `ignored` keys removed at every depth.
fn comparable<T: Serialize + ?Sized>(item: &T, ignored: &[&str]) -> Option<Value> {
    let mut value = serde_yaml::to_value(item).ok()?;
    strip_keys(&mut value, ignored);
    Some(value)
}

/// Compares two objects ignoring descriptive fields.
pub fn equivalent<T: Serialize + ?Sized>(a: &T, b: &T) -> bool {
    equivalent_ignoring(a, b, &DESCRIPTIVE_FIELDS)
}

/// Compares two objects ignoring `ignored` keys at every depth. Objects
/// that cannot be serialized are never equivalent.
pub fn equivalent_ignoring<T: Serialize + ?Sized>(a: &T, b: &T, ignored: &[&str]) -> bool {
    match (comparable(a, ignored), comparable(b, ignored)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
