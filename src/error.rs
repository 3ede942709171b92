//! # Error Handling
//!
//! This module defines the error and warning types used across the merge
//! engine. Fatal problems are reported through the [`Error`] enum, built with
//! `thiserror`; they abort a merge before any output is produced.
//!
//! ## Key Components
//!
//! - **`Error`**: Every failure that stops a merge. Input validation errors
//!   (no inputs, inconsistent or invalid namespaces) are raised before any
//!   document is touched; malformed-document errors abort the fold.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! - **`MergeWarning`**: Non-fatal findings collected while folding, such as
//!   an extension value overwritten by a later document or a `$ref` that
//!   could not be rewritten. Warnings never fail a merge; they are returned
//!   alongside the merged document and logged at `warn` level.

use std::fmt;

use thiserror::Error;

/// Main error type for merge operations
#[derive(Error, Debug)]
pub enum Error {
    /// The merge was invoked with an empty input list.
    #[error("No documents to merge")]
    NoInputs,

    /// A positional namespace list was supplied whose length differs from
    /// the number of documents.
    #[error("Namespace count ({namespaces}) must match document count ({documents})")]
    NamespaceCount { namespaces: usize, documents: usize },

    /// Some inputs carry a namespace and others do not.
    #[error("Inconsistent namespace usage: {with} input(s) have a namespace, {without} do not\n  hint: either every input or no input must specify a namespace")]
    InconsistentNamespaces { with: usize, without: usize },

    /// A namespace contains characters that cannot be used in component names.
    #[error("Invalid namespace {namespace:?}: {message}")]
    InvalidNamespace { namespace: String, message: String },

    /// Two inputs share a namespace, so their renamed components and forked
    /// paths would collide.
    #[error("Duplicate namespace {namespace:?}\n  hint: every input must use a distinct namespace")]
    DuplicateNamespace { namespace: String },

    /// An input could not be parsed or has an unusable shape.
    #[error("Malformed document {source_name}: {message}")]
    MalformedDocument {
        source_name: String,
        message: String,
    },

    /// An input declares an `openapi` version other than 3.x.
    #[error("Unsupported OpenAPI version {version:?} in {source_name}: only OpenAPI 3.x is supported")]
    UnsupportedVersion {
        source_name: String,
        version: String,
    },

    /// Merge options could not be read.
    ///
    /// Includes an optional hint about how to fix the configuration.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        hint: Option<String>,
    },

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// A non-fatal finding recorded while merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeWarning {
    /// Two documents set the same extension key to different values; the
    /// later value was kept.
    ConflictingExtension { location: String, key: String },

    /// Two documents defined the same component with different content; the
    /// later definition was kept.
    ComponentOverwritten { kind: String, name: String },

    /// A local `$ref` into a namespaced component kind pointed at a name that
    /// was not renamed. The reference was left unchanged.
    UnresolvedReference { reference: String, namespace: String },

    /// A `$ref` value was not a string and could not be inspected.
    InvalidReference { location: String },
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeWarning::ConflictingExtension { location, key } => {
                write!(f, "conflicting extension {} in {}, last value wins", key, location)
            }
            MergeWarning::ComponentOverwritten { kind, name } => {
                write!(f, "component {}/{} differs between documents, last definition wins", kind, name)
            }
            MergeWarning::UnresolvedReference {
                reference,
                namespace,
            } => write!(
                f,
                "reference {} does not target a component renamed for namespace {}, left unchanged",
                reference, namespace
            ),
            MergeWarning::InvalidReference { location } => {
                write!(f, "non-string $ref at {}, left unchanged", location)
            }
        }
    }
}
