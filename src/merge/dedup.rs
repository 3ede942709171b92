//! Passes run once over the fully folded document

use std::collections::{HashMap, HashSet};

use log::debug;

use super::state::{disambiguating_suffix, MergeState, OpLocation};
use crate::document::{Document, Scope};

/// Suffixes every operationId recorded at more than one location.
///
/// The suffix is the namespace of the document that contributed the
/// occurrence, or its 1-based position among the occurrences of that id.
/// A namespace that contributed the id more than once gets the position
/// appended as well. A suffixed id that is already used by another operation
/// gets a further `_2`, `_3`, ... until it is free.
pub fn deduplicate_operation_ids(state: &MergeState, doc: &mut Document) {
    let duplicates = state.duplicate_op_ids();
    if duplicates.is_empty() {
        return;
    }

    // location -> (current id, suffixed id)
    let mut planned: HashMap<OpLocation, (String, String)> = HashMap::new();
    for id in duplicates {
        let Some(entries) = state.op_ids.get(id) else {
            continue;
        };
        for (index, entry) in entries.iter().enumerate() {
            let mut suffix = disambiguating_suffix(entry.namespace.as_deref(), index + 1);
            let shared = entry.namespace.is_some()
                && entries.iter().filter(|other| other.namespace == entry.namespace).count() > 1;
            if shared {
                suffix = format!("{}_{}", suffix, index + 1);
            }
            planned.insert(entry.location.clone(), (id.to_string(), format!("{}_{}", id, suffix)));
        }
    }

    let is_planned = |location: &OpLocation, id: &str| {
        planned
            .get(location)
            .is_some_and(|(current, _)| current.as_str() == id)
    };

    let mut taken: HashSet<String> = HashSet::new();
    for scope in [Scope::Paths, Scope::Webhooks] {
        for (path, item) in doc.items(scope) {
            for (method, op) in item.operations() {
                if let Some(id) = op.id() {
                    if !is_planned(&OpLocation::new(scope, path, method), id) {
                        taken.insert(id.to_string());
                    }
                }
            }
        }
    }

    doc.for_each_operation_mut(|scope, path, method, op| {
        let location = OpLocation::new(scope, path, method);
        let Some((id, suffixed)) = planned.get(&location) else {
            return;
        };
        if op.id() != Some(id.as_str()) {
            return;
        }
        let renamed = unused_id(suffixed, &taken);
        debug!("{} {} {}: operationId {} renamed to {}", scope.as_str(), path, method, id, renamed);
        taken.insert(renamed.clone());
        op.operation_id = Some(renamed);
    });
}

fn unused_id(candidate: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(candidate) {
        return candidate.to_string();
    }
    let mut counter = 2;
    loop {
        let next = format!("{}_{}", candidate, counter);
        if !taken.contains(&next) {
            return next;
        }
        counter += 1;
    }
}

/// Rewrites operation tag references to a single casing per tag.
///
/// Declared tags define the canonical casing. A tag only referenced by
/// operations takes the casing of its first reference. Repeated references
/// within one operation are dropped.
pub fn normalize_operation_tags(doc: &mut Document) {
    let mut canonical: HashMap<String, String> = HashMap::new();
    for tag in &doc.tags {
        canonical
            .entry(tag.name.to_lowercase())
            .or_insert_with(|| tag.name.clone());
    }

    doc.for_each_operation_mut(|_, _, _, op| {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(op.tags.len());
        for tag in op.tags.drain(..) {
            let name = canonical
                .entry(tag.to_lowercase())
                .or_insert_with(|| tag.clone())
                .clone();
            if seen.insert(name.clone()) {
                normalized.push(name);
            }
        }
        op.tags = normalized;
    });
}
