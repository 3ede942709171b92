//! Property-based tests for the merge engine.
//!
//! These tests use proptest to generate small families of overlapping
//! documents and verify that the uniqueness and determinism invariants of a
//! merge hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use std::collections::{HashMap, HashSet};

    use crate::config::MergeOptions;
    use crate::document::{Document, HttpMethod, Operation, Tag};
    use crate::merge::{merge, MergeInput};
    use crate::serialize::{sort_document, to_yaml};
    use proptest::prelude::*;
    use serde_yaml::Value;

    // includes names shaped like disambiguated ones
    const TAG_NAMES: [&str; 6] = ["pets", "owners", "stores", "pets_1", "pets_2", "pets_2_3"];
    const PATHS: [&str; 3] = ["/pets", "/owners", "/stores/{id}"];
    const METHODS: [HttpMethod; 3] = [HttpMethod::Get, HttpMethod::Post, HttpMethod::Delete];
    const IDS: [&str; 6] = ["list", "fetch", "update", "list_1", "list_2", "list_2_2"];

    fn capitalized(name: &str) -> String {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// A generated operation: where it goes, its id, content variant and
    /// which declared tag (if any) it references.
    type GeneratedOp = (&'static str, HttpMethod, &'static str, u8, prop::sample::Index);

    fn op_strategy() -> impl Strategy<Value = GeneratedOp> {
        (
            prop::sample::select(PATHS.to_vec()),
            prop::sample::select(METHODS.to_vec()),
            prop::sample::select(IDS.to_vec()),
            0u8..2,
            any::<prop::sample::Index>(),
        )
    }

    fn document_strategy() -> impl Strategy<Value = Document> {
        (
            prop::sample::subsequence(TAG_NAMES.to_vec(), 0..=TAG_NAMES.len()),
            prop::collection::vec((any::<bool>(), 0u8..2), TAG_NAMES.len()),
            prop::collection::vec(op_strategy(), 0..5),
        )
            .prop_map(|(names, styles, ops)| {
                let mut doc = Document {
                    openapi: "3.1.0".to_string(),
                    ..Default::default()
                };
                for (name, (upper, variant)) in names.iter().zip(styles) {
                    let mut tag = Tag::new(if upper { capitalized(name) } else { name.to_string() });
                    tag.extensions.insert("x-variant".to_string(), Value::from(variant));
                    doc.tags.push(tag);
                }
                for (path, method, id, shape, tag_index) in ops {
                    let mut operation = Operation {
                        operation_id: Some(id.to_string()),
                        ..Default::default()
                    };
                    if !doc.tags.is_empty() {
                        let tag = &doc.tags[tag_index.index(doc.tags.len())];
                        operation.tags.push(tag.name.clone());
                    }
                    operation.rest.insert("x-shape".to_string(), Value::from(shape));
                    doc.paths
                        .items
                        .entry(path.to_string())
                        .or_default()
                        .set_operation(method, operation);
                }
                doc
            })
    }

    fn merged(documents: &[Document], namespaced: bool) -> Document {
        let inputs = documents
            .iter()
            .enumerate()
            .map(|(index, doc)| {
                let input = MergeInput::parsed(doc.clone());
                if namespaced {
                    input.with_namespace(format!("ns{}", index))
                } else {
                    input
                }
            })
            .collect();
        merge(inputs, &MergeOptions::default()).unwrap().document
    }

    fn operations(doc: &Document) -> Vec<&Operation> {
        doc.paths
            .items
            .values()
            .chain(doc.webhooks.values())
            .flat_map(|item| item.operations().map(|(_, op)| op))
            .collect()
    }

    proptest! {
        /// Property: no two declared tags share a case-insensitive name
        #[test]
        fn tags_are_case_insensitively_unique(
            documents in prop::collection::vec(document_strategy(), 1..5),
            namespaced in any::<bool>(),
        ) {
            let result = merged(&documents, namespaced);
            let mut seen = HashSet::new();
            for tag in &result.tags {
                prop_assert!(seen.insert(tag.name.to_lowercase()), "duplicate tag {}", tag.name);
            }
        }

        /// Property: every non-empty operationId is unique
        #[test]
        fn operation_ids_are_unique(
            documents in prop::collection::vec(document_strategy(), 1..5),
            namespaced in any::<bool>(),
        ) {
            let result = merged(&documents, namespaced);
            let mut seen = HashSet::new();
            for op in operations(&result) {
                if let Some(id) = op.id() {
                    prop_assert!(seen.insert(id.to_string()), "duplicate operationId {}", id);
                }
            }
        }

        /// Property: a tag is spelled one way across all operations, and that
        /// spelling is the declared one when the tag is declared
        #[test]
        fn operation_tags_use_one_casing(
            documents in prop::collection::vec(document_strategy(), 1..5),
        ) {
            let result = merged(&documents, false);
            let declared: HashMap<String, &str> = result
                .tags
                .iter()
                .map(|tag| (tag.name.to_lowercase(), tag.name.as_str()))
                .collect();
            let mut spelling: HashMap<String, String> = HashMap::new();
            for op in operations(&result) {
                for tag in &op.tags {
                    let key = tag.to_lowercase();
                    if let Some(name) = declared.get(&key) {
                        prop_assert_eq!(tag.as_str(), *name);
                    }
                    let first = spelling.entry(key).or_insert_with(|| tag.clone());
                    prop_assert_eq!(first.as_str(), tag.as_str());
                }
            }
        }

        /// Property: merging the same inputs twice yields identical output
        #[test]
        fn merge_is_deterministic(
            documents in prop::collection::vec(document_strategy(), 1..5),
            namespaced in any::<bool>(),
        ) {
            let first = to_yaml(&merged(&documents, namespaced)).unwrap();
            let second = to_yaml(&merged(&documents, namespaced)).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Property: merging a single valid document only sorts it
        #[test]
        fn single_document_merge_is_identity(mut document in document_strategy()) {
            let mut counter = 0;
            document.for_each_operation_mut(|_, _, _, op| {
                counter += 1;
                op.operation_id = Some(format!("op{}", counter));
            });

            let result = merged(std::slice::from_ref(&document), false);
            sort_document(&mut document);
            prop_assert_eq!(result, document);
        }
    }
}
