//! # OpenAPI Merge Library
//!
//! This library folds an ordered list of OpenAPI 3.x documents into a single,
//! internally consistent document. It is meant for APIs described as several
//! independently written fragments (for example one document per service)
//! that must be combined before code generation.
//!
//! ## Quick Example
//!
//! ```
//! use openapi_merge::config::MergeOptions;
//! use openapi_merge::merge::{merge, MergeInput};
//! use openapi_merge::serialize;
//!
//! let pets = r#"
//! openapi: 3.1.0
//! info: {title: Pets, version: "1.0"}
//! paths:
//!   /pets:
//!     get:
//!       operationId: listPets
//!       responses:
//!         '200': {description: OK}
//! "#;
//! let owners = r#"
//! openapi: 3.1.0
//! info: {title: Owners, version: "1.0"}
//! paths:
//!   /pets:
//!     get:
//!       operationId: listPetsByOwner
//!       responses:
//!         '200': {description: OK}
//! "#;
//!
//! let inputs = vec![
//!     MergeInput::raw(pets).with_namespace("pets"),
//!     MergeInput::raw(owners).with_namespace("owners"),
//! ];
//! let report = merge(inputs, &MergeOptions::default()).unwrap();
//!
//! // Conflicting operations on the same path and method are forked.
//! let paths: Vec<_> = report.document.paths.items.keys().cloned().collect();
//! assert_eq!(paths, vec!["/pets#owners", "/pets#pets"]);
//!
//! let yaml = serialize::to_yaml(&report.document).unwrap();
//! assert!(yaml.contains("listPetsByOwner"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Document model (`document`)**: typed tags, paths, operations,
//!   webhooks and components; everything else is carried as opaque YAML
//!   values.
//! - **Merge (`merge`)**: the left-to-right fold with provenance tracking,
//!   tag and operation disambiguation, and the passes run after the fold.
//! - **Namespacing (`namespace`)**: optional per-input prefixing of component
//!   names with `$ref` rewriting.
//! - **Serialization (`serialize`)**: stable ordering plus YAML and JSON
//!   output.
//! - **Loading (`loader`)** and **options (`config`)**.
//!
//! ## Disambiguation
//!
//! Whenever two inputs collide on a tag, a path and method, or an
//! operationId, both sides are renamed with a suffix: the input's namespace
//! if inputs carry namespaces, otherwise its 1-based position in the input
//! list. Differences in `description` or `summary` alone never count as a
//! collision.

pub mod config;
pub mod document;
pub mod error;
pub mod loader;
pub mod merge;
pub mod namespace;
pub mod serialize;

#[cfg(test)]
mod merge_proptest;

pub use config::MergeOptions;
pub use document::Document;
pub use error::{Error, MergeWarning, Result};
pub use merge::{merge, merge_two, merge_with_namespaces, MergeInput, MergeReport};
