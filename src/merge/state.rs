//! Cross-document bookkeeping for a single merge run
//!
//! `MergeState` remembers which input contributed every tag, every
//! path+method slot and every operationId currently in the accumulator, so
//! that a later conflicting document can compute disambiguating suffixes for
//! both sides. One state is created per merge call and threaded by `&mut`
//! through every step of the fold.

use std::collections::HashMap;

use crate::document::{Document, HttpMethod, Operation, Scope};

/// The single naming rule used for every disambiguation: the namespace if
/// there is one, otherwise the 1-based counter.
pub fn disambiguating_suffix(namespace: Option<&str>, counter: usize) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => ns.to_string(),
        _ => counter.to_string(),
    }
}

/// Which input document contributed something.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Provenance {
    pub namespace: Option<String>,
    /// 1-based position of the document in the input list.
    pub counter: usize,
}

impl Provenance {
    pub fn new(namespace: Option<&str>, counter: usize) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            counter,
        }
    }

    pub fn suffix(&self) -> String {
        disambiguating_suffix(self.namespace.as_deref(), self.counter)
    }
}

/// One live tag sharing a case-insensitive name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    /// Name of the tag in the accumulator, possibly suffixed.
    pub current_name: String,
    pub provenance: Provenance,
    /// Once set, the tag is never suffixed again.
    pub suffixed: bool,
}

/// Where an operation lives in the accumulator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OpLocation {
    pub scope: Scope,
    pub path: String,
    pub method: HttpMethod,
}

impl OpLocation {
    pub fn new(scope: Scope, path: &str, method: HttpMethod) -> Self {
        Self {
            scope,
            path: path.to_string(),
            method,
        }
    }
}

/// One occurrence of an operationId.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpIdEntry {
    pub location: OpLocation,
    pub namespace: Option<String>,
}

#[derive(Debug, Default)]
pub struct MergeState {
    /// lowercase tag name -> every live tag with that lowercase name
    pub tags: HashMap<String, Vec<TagEntry>>,
    /// path+method slot -> document that currently owns it
    pub ops: HashMap<OpLocation, Provenance>,
    /// operationId -> every location using it, in registration order
    pub op_ids: HashMap<String, Vec<OpIdEntry>>,
}

impl MergeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the tags and operations of the first document, which
    /// becomes the accumulator as-is.
    pub fn seed(&mut self, doc: &Document, provenance: &Provenance) {
        for tag in &doc.tags {
            self.tags
                .entry(tag.name.to_lowercase())
                .or_default()
                .push(TagEntry {
                    current_name: tag.name.clone(),
                    provenance: provenance.clone(),
                    suffixed: false,
                });
        }

        for scope in [Scope::Paths, Scope::Webhooks] {
            for (path, item) in doc.items(scope) {
                for (method, op) in item.operations() {
                    self.register_op(OpLocation::new(scope, path, method), provenance, op);
                }
            }
        }
    }

    /// Records `provenance` as the owner of `location` and tracks the
    /// operation's id there. Re-registering a location replaces its previous
    /// id entry instead of duplicating it.
    pub fn register_op(&mut self, location: OpLocation, provenance: &Provenance, op: &Operation) {
        if let Some(id) = op.id() {
            let entries = self.op_ids.entry(id.to_string()).or_default();
            entries.retain(|entry| entry.location != location);
            entries.push(OpIdEntry {
                location: location.clone(),
                namespace: provenance.namespace.clone(),
            });
        }
        self.ops.insert(location, provenance.clone());
    }

    /// Forgets the operation at `location`, returning who owned it.
    pub fn unregister_op(&mut self, location: &OpLocation, op: &Operation) -> Option<Provenance> {
        if let Some(id) = op.id() {
            if let Some(entries) = self.op_ids.get_mut(id) {
                entries.retain(|entry| &entry.location != location);
            }
        }
        self.ops.remove(location)
    }

    pub fn owner(&self, location: &OpLocation) -> Option<&Provenance> {
        self.ops.get(location)
    }

    /// operationIds recorded at more than one location.
    pub fn duplicate_op_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .op_ids
            .iter()
            .filter(|(_, entries)| entries.len() > 1)
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op_with_id(id: &str) -> Operation {
        Operation {
            operation_id: Some(id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_suffix_prefers_namespace() {
        assert_eq!(disambiguating_suffix(Some("svcA"), 3), "svcA");
        assert_eq!(disambiguating_suffix(None, 3), "3");
        assert_eq!(disambiguating_suffix(Some(""), 2), "2");
    }

    #[test]
    fn test_register_same_location_twice_keeps_one_entry() {
        let mut state = MergeState::new();
        let location = OpLocation::new(Scope::Paths, "/pets", HttpMethod::Get);
        state.register_op(location.clone(), &Provenance::new(None, 1), &op_with_id("listPets"));
        state.register_op(location.clone(), &Provenance::new(None, 2), &op_with_id("listPets"));

        assert_eq!(state.op_ids["listPets"].len(), 1);
        assert_eq!(state.owner(&location).unwrap().counter, 2);
        assert!(state.duplicate_op_ids().is_empty());
    }

    #[test]
    fn test_duplicate_ids_across_locations() {
        let mut state = MergeState::new();
        state.register_op(
            OpLocation::new(Scope::Paths, "/a", HttpMethod::Get),
            &Provenance::new(Some("a"), 1),
            &op_with_id("fetch"),
        );
        state.register_op(
            OpLocation::new(Scope::Webhooks, "/a", HttpMethod::Get),
            &Provenance::new(Some("b"), 2),
            &op_with_id("fetch"),
        );
        assert_eq!(state.duplicate_op_ids(), vec!["fetch"]);
    }

    #[test]
    fn test_unregister_returns_owner_and_drops_id() {
        let mut state = MergeState::new();
        let location = OpLocation::new(Scope::Paths, "/pets", HttpMethod::Post);
        let op = op_with_id("createPet");
        state.register_op(location.clone(), &Provenance::new(Some("svc"), 1), &op);

        let owner = state.unregister_op(&location, &op).unwrap();
        assert_eq!(owner.namespace.as_deref(), Some("svc"));
        assert!(state.op_ids["createPet"].is_empty());
        assert!(state.owner(&location).is_none());
    }

    #[test]
    fn test_operations_without_id_are_not_tracked_by_id() {
        let mut state = MergeState::new();
        state.register_op(
            OpLocation::new(Scope::Paths, "/pets", HttpMethod::Get),
            &Provenance::new(None, 1),
            &Operation::default(),
        );
        assert!(state.op_ids.is_empty());
        assert_eq!(state.ops.len(), 1);
    }
}
