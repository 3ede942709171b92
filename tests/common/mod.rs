//! Shared test utilities for the merge integration tests.
//!
//! This module provides document fixtures and helper functions to reduce
//! duplication across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let report = merge_yaml(&[fixtures::PETS_SERVICE, fixtures::OWNERS_SERVICE]);
//!     // ... test code
//! }
//! ```

#![allow(dead_code)]

use openapi_merge::config::MergeOptions;
use openapi_merge::document::{Document, HttpMethod, Operation};
use openapi_merge::merge::{merge, MergeInput, MergeReport};

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use super::fixtures;
    pub use super::{
        merge_namespaced, merge_yaml, merge_yaml_with, operation, operation_ids, parse, path_keys, tag_names,
    };
    pub use openapi_merge::document::HttpMethod;
}

/// OpenAPI documents used across tests.
pub mod fixtures {
    /// A pets service with schemas, parameters, responses and a security scheme.
    pub const PETS_SERVICE: &str = include_str!("../testdata/openapi/pets-service.yaml");

    /// An owners service overlapping the pets service on `/pets`, on the
    /// `Pets` tag and on every component name.
    pub const OWNERS_SERVICE: &str = include_str!("../testdata/openapi/owners-service.yaml");

    /// `GET /pets` with operationId `listPets`, described as "List pets v1".
    pub const LIST_PETS_V1: &str = r#"
openapi: 3.1.0
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        '200':
          description: List pets v1
"#;

    /// Same operation as [`LIST_PETS_V1`] with a different response description.
    pub const LIST_PETS_V2: &str = r#"
openapi: 3.1.0
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        '200':
          description: List pets v2
"#;

    /// `GET /pets` with a different operationId than [`LIST_PETS_V1`].
    pub const LIST_ANIMALS: &str = r#"
openapi: 3.1.0
paths:
  /pets:
    get:
      operationId: listAnimals
      responses:
        '200':
          description: List animals
"#;
}

/// Parse a YAML fixture into a document.
pub fn parse(yaml: &str) -> Document {
    serde_yaml::from_str(yaml).expect("fixture should parse")
}

/// Merge raw YAML documents with default options and no namespaces.
pub fn merge_yaml(documents: &[&str]) -> MergeReport {
    merge_yaml_with(documents, &MergeOptions::default())
}

/// Merge raw YAML documents with the given options and no namespaces.
pub fn merge_yaml_with(documents: &[&str], options: &MergeOptions) -> MergeReport {
    let inputs = documents
        .iter()
        .map(|yaml| MergeInput::raw(yaml.as_bytes().to_vec()))
        .collect();
    merge(inputs, options).expect("merge should succeed")
}

/// Merge `(namespace, yaml)` pairs with default options.
pub fn merge_namespaced(documents: &[(&str, &str)]) -> MergeReport {
    let inputs = documents
        .iter()
        .map(|(namespace, yaml)| {
            MergeInput::raw(yaml.as_bytes().to_vec())
                .with_namespace(*namespace)
                .with_name(format!("{}.yaml", namespace))
        })
        .collect();
    merge(inputs, &MergeOptions::default()).expect("merge should succeed")
}

/// The operation at `path` and `method`, panicking if it is missing.
pub fn operation<'a>(doc: &'a Document, path: &str, method: HttpMethod) -> &'a Operation {
    doc.paths
        .items
        .get(path)
        .and_then(|item| item.operation(method))
        .unwrap_or_else(|| panic!("no {} operation at {}", method, path))
}

/// Every operationId under `paths`, in document order.
pub fn operation_ids(doc: &Document) -> Vec<String> {
    doc.paths
        .items
        .values()
        .flat_map(|item| item.operations().filter_map(|(_, op)| op.operation_id.clone()))
        .collect()
}

pub fn path_keys(doc: &Document) -> Vec<String> {
    doc.paths.items.keys().cloned().collect()
}

pub fn tag_names(doc: &Document) -> Vec<String> {
    doc.tags.iter().map(|tag| tag.name.clone()).collect()
}
