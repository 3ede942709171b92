//! Path and webhook merging
//!
//! Operations are merged per path and per method. An incoming operation that
//! is equivalent to the one already at its slot (ignoring prose) replaces it
//! in place. A genuine conflict forks the slot: the existing operation moves
//! to `path#<existing suffix>`, the incoming one lands at
//! `path#<incoming suffix>`, and the original path is dropped once it has no
//! operations left.

use indexmap::IndexMap;
use log::debug;

use super::equivalence::equivalent;
use super::fields::{merge_extensions, merge_parameters, merge_servers};
use super::state::{MergeState, OpLocation, Provenance};
use crate::document::{HttpMethod, Operation, PathItem, Scope};
use crate::error::MergeWarning;

/// An operation waiting to be placed on a fragment path.
struct Fork {
    path: String,
    method: HttpMethod,
    operation: Operation,
    provenance: Provenance,
    template: PathItem,
}

/// The path-level fields a fragment path item starts with.
fn fragment_template(item: &PathItem) -> PathItem {
    PathItem {
        parameters: item.parameters.clone(),
        servers: item.servers.clone(),
        ..Default::default()
    }
}

fn register_item(state: &mut MergeState, scope: Scope, path: &str, item: &PathItem, provenance: &Provenance) {
    for (method, op) in item.operations() {
        state.register_op(OpLocation::new(scope, path, method), provenance, op);
    }
}

/// Merges the path-level fields of `incoming` into `existing`.
fn merge_path_level(existing: &mut PathItem, incoming: &PathItem, location: &str, warnings: &mut Vec<MergeWarning>) {
    if incoming.summary.as_deref().is_some_and(|s| !s.is_empty()) {
        existing.summary = incoming.summary.clone();
    }
    if incoming.description.as_deref().is_some_and(|d| !d.is_empty()) {
        existing.description = incoming.description.clone();
    }
    merge_parameters(&mut existing.parameters, &incoming.parameters);
    merge_servers(&mut existing.servers, &incoming.servers, false);
    merge_extensions(&mut existing.extensions, &incoming.extensions, location, warnings);
}

/// Merges the path items of one incoming document into the accumulator's
/// path items for `scope`.
pub fn merge_path_items(
    state: &mut MergeState,
    merged: &mut IndexMap<String, PathItem>,
    incoming: IndexMap<String, PathItem>,
    scope: Scope,
    provenance: &Provenance,
    warnings: &mut Vec<MergeWarning>,
) {
    for (path, mut item) in incoming {
        let Some(existing) = merged.get_mut(&path) else {
            register_item(state, scope, &path, &item, provenance);
            merged.insert(path, item);
            continue;
        };

        if item.is_reference() {
            if existing.is_reference() {
                *existing = item;
            } else {
                debug!("{} {}: keeping inline path item over incoming $ref", scope.as_str(), path);
            }
            continue;
        }
        if existing.is_reference() {
            register_item(state, scope, &path, &item, provenance);
            *existing = item;
            continue;
        }

        let conflicts: Vec<HttpMethod> = item
            .operations()
            .filter(|(method, op)| existing.operation(*method).is_some_and(|current| !equivalent(current, *op)))
            .map(|(method, _)| method)
            .collect();

        let existing_template = fragment_template(existing);
        let incoming_template = fragment_template(&item);
        let mut forks = Vec::new();

        for method in conflicts {
            let location = OpLocation::new(scope, &path, method);
            let (Some(current), Some(next)) = (existing.take_operation(method), item.take_operation(method)) else {
                continue;
            };
            let owner = state
                .unregister_op(&location, &current)
                .unwrap_or_else(|| provenance.clone());
            debug!(
                "{} {} {}: conflicting operations forked to #{} and #{}",
                scope.as_str(),
                path,
                method,
                owner.suffix(),
                provenance.suffix()
            );
            forks.push(Fork {
                path: format!("{}#{}", path, owner.suffix()),
                method,
                operation: current,
                provenance: owner,
                template: existing_template.clone(),
            });
            forks.push(Fork {
                path: format!("{}#{}", path, provenance.suffix()),
                method,
                operation: next,
                provenance: provenance.clone(),
                template: incoming_template.clone(),
            });
        }

        for method in HttpMethod::ALL {
            if let Some(op) = item.take_operation(method) {
                state.register_op(OpLocation::new(scope, &path, method), provenance, &op);
                existing.set_operation(method, op);
            }
        }
        let location = format!("{}.{}", scope.as_str(), path);
        merge_path_level(existing, &item, &location, warnings);

        let emptied = !existing.has_operations();
        for fork in forks {
            place_fork(state, merged, scope, fork);
        }
        if emptied {
            debug!("{} {}: removed, all operations forked", scope.as_str(), path);
            merged.shift_remove(&path);
        }
    }
}

/// Puts a forked operation on its fragment path, creating the path item from
/// the template if it does not exist yet.
fn place_fork(state: &mut MergeState, merged: &mut IndexMap<String, PathItem>, scope: Scope, fork: Fork) {
    let Fork {
        path,
        method,
        operation,
        provenance,
        template,
    } = fork;
    let location = OpLocation::new(scope, &path, method);
    let item = merged.entry(path).or_insert(template);
    if let Some(replaced) = item.take_operation(method) {
        state.unregister_op(&location, &replaced);
    }
    state.register_op(location, &provenance, &operation);
    item.set_operation(method, operation);
}
