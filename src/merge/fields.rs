//! Overwrite and union rules for document fields other than tags and paths
//!
//! | Field | Rule |
//! |---|---|
//! | `openapi` | greatest version wins |
//! | `info`, `security`, `externalDocs` | last document wins |
//! | extensions | key-wise union, last wins on conflict |
//! | `servers` | merged by URL when the lists share a URL, otherwise pushed down onto operations |
//! | `components.*` | key-wise per kind, last wins, extensions of the replaced entry are kept |

use semver::Version;
use serde_yaml::Value;

use super::equivalence::equivalent;
use super::record;
use crate::document::{ComponentKind, Components, Document, Extensions, Server};
use crate::error::MergeWarning;

/// Keeps the greater of two `openapi` version strings.
///
/// Versions are compared as semver, padding `3.1` to `3.1.0`. A value that
/// cannot be read as a version loses to one that can; two unreadable values
/// are compared lexically.
pub fn merge_openapi_version(merged: &mut String, incoming: &str) {
    let replace = match (parse_version(merged), parse_version(incoming)) {
        (Some(current), Some(next)) => next > current,
        (None, Some(_)) => true,
        (Some(_), None) => false,
        (None, None) => incoming > merged.as_str(),
    };
    if replace {
        *merged = incoming.to_string();
    }
}

fn parse_version(raw: &str) -> Option<Version> {
    let trimmed = raw.trim();
    if let Ok(version) = Version::parse(trimmed) {
        return Some(version);
    }
    match trimmed.split('.').count() {
        1 => Version::parse(&format!("{}.0.0", trimmed)).ok(),
        2 => Version::parse(&format!("{}.0", trimmed)).ok(),
        _ => None,
    }
}

/// Unions `incoming` into `merged` key by key. On a key present in both with
/// different values the incoming value wins and a warning is recorded.
pub fn merge_extensions(
    merged: &mut Extensions,
    incoming: &Extensions,
    location: &str,
    warnings: &mut Vec<MergeWarning>,
) {
    for (key, value) in incoming {
        if let Some(existing) = merged.get(key) {
            if existing != value {
                record(
                    warnings,
                    MergeWarning::ConflictingExtension {
                        location: location.to_string(),
                        key: key.clone(),
                    },
                );
            }
        }
        merged.insert(key.clone(), value.clone());
    }
}

/// Merges server lists by URL; a later server with a known URL replaces the
/// earlier one in place.
///
/// With `global` set, two non-empty lists that share no URL are considered
/// incompatible defaults: `merged` is left untouched and `false` is returned
/// so the caller can push both lists down onto operations.
pub fn merge_servers(merged: &mut Vec<Server>, incoming: &[Server], global: bool) -> bool {
    if incoming.is_empty() {
        return true;
    }
    if merged.is_empty() {
        *merged = incoming.to_vec();
        return true;
    }

    let shares_url = incoming
        .iter()
        .any(|server| merged.iter().any(|existing| existing.url == server.url));
    if global && !shares_url {
        return false;
    }

    for server in incoming {
        match merged.iter_mut().find(|existing| existing.url == server.url) {
            Some(existing) => *existing = server.clone(),
            None => merged.push(server.clone()),
        }
    }
    true
}

/// Gives every operation under `paths` that has no servers of its own (and
/// whose path item declares none) a copy of `servers`.
pub fn push_down_servers(doc: &mut Document, servers: &[Server]) {
    if servers.is_empty() {
        return;
    }
    for item in doc.paths.items.values_mut() {
        if !item.servers.is_empty() {
            continue;
        }
        for (_, op) in item.operations_mut() {
            if op.servers.is_empty() {
                op.servers = servers.to_vec();
            }
        }
    }
}

/// Identity of a path-level parameter: its `$ref`, or its `name` and `in`.
fn parameter_identity(parameter: &Value) -> Option<(String, String)> {
    if let Some(reference) = parameter.get("$ref").and_then(Value::as_str) {
        return Some(("$ref".to_string(), reference.to_string()));
    }
    let name = parameter.get("name").and_then(Value::as_str)?;
    let location = parameter.get("in").and_then(Value::as_str).unwrap_or_default();
    Some((location.to_string(), name.to_string()))
}

/// Merges path-level parameters; a later parameter with the same identity
/// replaces the earlier one in place.
pub fn merge_parameters(merged: &mut Vec<Value>, incoming: &[Value]) {
    for parameter in incoming {
        let identity = parameter_identity(parameter);
        let position = identity.as_ref().and_then(|identity| {
            merged
                .iter()
                .position(|existing| parameter_identity(existing).as_ref() == Some(identity))
        });
        match position {
            Some(index) => merged[index] = parameter.clone(),
            None => merged.push(parameter.clone()),
        }
    }
}

/// Merges components kind by kind. Colliding names keep the incoming entry,
/// with any `x-` keys only the replaced entry had carried over.
pub fn merge_components(
    merged: &mut Option<Components>,
    incoming: Option<Components>,
    warnings: &mut Vec<MergeWarning>,
) {
    let Some(mut incoming) = incoming else {
        return;
    };
    let Some(target) = merged.as_mut() else {
        *merged = Some(incoming);
        return;
    };

    for kind in ComponentKind::ALL {
        let entries = std::mem::take(incoming.get_mut(kind));
        let existing_entries = target.get_mut(kind);
        for (name, mut value) in entries {
            match existing_entries.get_mut(&name) {
                Some(existing) => {
                    if !equivalent(&*existing, &value) {
                        record(
                            warnings,
                            MergeWarning::ComponentOverwritten {
                                kind: kind.as_str().to_string(),
                                name: name.clone(),
                            },
                        );
                    }
                    carry_extensions(existing, &mut value);
                    *existing = value;
                }
                None => {
                    existing_entries.insert(name, value);
                }
            }
        }
    }

    merge_extensions(&mut target.extensions, &incoming.extensions, "components", warnings);
}

fn carry_extensions(existing: &Value, incoming: &mut Value) {
    if let (Value::Mapping(old), Value::Mapping(new)) = (existing, incoming) {
        for (key, value) in old {
            let is_extension = key.as_str().is_some_and(|k| k.starts_with("x-"));
            if is_extension && !new.contains_key(key) {
                new.insert(key.clone(), value.clone());
            }
        }
    }
}
