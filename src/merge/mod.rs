//! Merging of OpenAPI documents
//!
//! The inputs are folded left to right into one accumulator. The first
//! document becomes the accumulator as-is; every later document is merged
//! into it field by field, while a [`MergeState`](state::MergeState) records
//! which input contributed each tag, operation and operationId. Once all
//! inputs are folded, operationIds are deduplicated, operation tag casing is
//! normalized and, if enabled, equivalent namespaced security schemes are
//! collapsed and the result is sorted.
//!
//! ## Submodules
//!
//! - `state` - provenance bookkeeping and the disambiguating suffix rule
//! - `equivalence` - comparison that ignores `description` and `summary`
//! - `fields` - overwrite and union rules for scalar and collection fields
//! - `tags` - case-insensitive tag merging and tag rename maps
//! - `paths` - per-method operation merging with `path#suffix` forking
//! - `dedup` - the operationId and tag casing passes run after the fold
//!
//! Input order is significant: on a genuine conflict the later document wins,
//! and positional suffixes depend on where each document sits in the list.

pub mod dedup;
pub mod equivalence;
pub mod fields;
pub mod paths;
pub mod state;
pub mod tags;

use log::{debug, warn};

use crate::config::MergeOptions;
use crate::document::{Document, Scope};
use crate::error::{Error, MergeWarning, Result};
use crate::loader::parse_document;
use crate::namespace::{apply_namespace, collapse_equivalent_security_schemes, validate_namespaces};
use crate::serialize::sort_document;
use state::{MergeState, Provenance};

/// Where an input's document comes from.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// An already parsed document.
    Parsed(Document),
    /// YAML or JSON bytes, parsed before merging.
    Raw(Vec<u8>),
}

/// One document to merge, with an optional namespace.
#[derive(Debug, Clone)]
pub struct MergeInput {
    pub source: InputSource,
    pub namespace: Option<String>,
    /// Used in errors and log messages; defaults to `input #<position>`.
    pub name: String,
}

impl MergeInput {
    pub fn parsed(document: Document) -> Self {
        Self {
            source: InputSource::Parsed(document),
            namespace: None,
            name: String::new(),
        }
    }

    pub fn raw(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            source: InputSource::Raw(bytes.into()),
            namespace: None,
            name: String::new(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn display_name(&self, counter: usize) -> String {
        if self.name.is_empty() {
            format!("input #{}", counter)
        } else {
            self.name.clone()
        }
    }
}

/// The outcome of a merge: the merged document and every non-fatal finding.
#[derive(Debug, Clone)]
pub struct MergeReport {
    pub document: Document,
    pub warnings: Vec<MergeWarning>,
}

/// Logs a warning and keeps it for the report.
pub(crate) fn record(warnings: &mut Vec<MergeWarning>, warning: MergeWarning) {
    warn!("{}", warning);
    warnings.push(warning);
}

/// Merge an ordered list of documents into one
///
/// # Errors
///
/// Fails before any merging if the list is empty or namespace usage is
/// inconsistent or invalid, and aborts with no partial result if an input
/// cannot be parsed or namespaced.
///
/// # Examples
///
/// ```
/// use openapi_merge::config::MergeOptions;
/// use openapi_merge::merge::{merge, MergeInput};
///
/// let a = MergeInput::raw("openapi: 3.1.0\npaths:\n  /a:\n    get:\n      operationId: fetch\n");
/// let b = MergeInput::raw("openapi: 3.1.0\npaths:\n  /b:\n    get:\n      operationId: fetch\n");
///
/// let report = merge(vec![a, b], &MergeOptions::default()).unwrap();
/// let ids: Vec<_> = report
///     .document
///     .paths
///     .items
///     .values()
///     .flat_map(|item| item.operations().filter_map(|(_, op)| op.id().map(str::to_string)))
///     .collect();
/// assert_eq!(ids, vec!["fetch_1", "fetch_2"]);
/// ```
pub fn merge(inputs: Vec<MergeInput>, options: &MergeOptions) -> Result<MergeReport> {
    if inputs.is_empty() {
        return Err(Error::NoInputs);
    }
    validate_namespaces(inputs.iter().map(|input| input.namespace.as_deref()))?;

    let mut state = MergeState::new();
    let mut warnings = Vec::new();
    let mut merged: Option<Document> = None;

    for (index, input) in inputs.into_iter().enumerate() {
        let counter = index + 1;
        let name = input.display_name(counter);
        let namespace = input.namespace.filter(|ns| !ns.is_empty());
        let mut doc = match input.source {
            InputSource::Parsed(doc) => doc,
            InputSource::Raw(bytes) => parse_document(&bytes, &name)?,
        };

        if let Some(ns) = namespace.as_deref() {
            apply_namespace(&mut doc, ns, &options.namespace_components, &name, &mut warnings)?;
        }

        let provenance = Provenance::new(namespace.as_deref(), counter);
        match merged.as_mut() {
            None => {
                debug!("{}: seeding merge", name);
                state.seed(&doc, &provenance);
                merged = Some(doc);
            }
            Some(accumulator) => {
                debug!("{}: merging as document {}", name, counter);
                merge_document(&mut state, accumulator, doc, &provenance, &mut warnings);
            }
        }
    }

    let mut document = merged.ok_or(Error::NoInputs)?;
    dedup::deduplicate_operation_ids(&state, &mut document);
    dedup::normalize_operation_tags(&mut document);
    if options.collapse_equivalent_security_schemes {
        collapse_equivalent_security_schemes(&mut document);
    }
    if options.sort_output {
        sort_document(&mut document);
    }

    debug!("merge finished with {} warning(s)", warnings.len());
    Ok(MergeReport { document, warnings })
}

/// Merge documents with a positional namespace list
///
/// The list is either empty (no namespacing) or has one entry per document.
pub fn merge_with_namespaces(
    documents: Vec<Document>,
    namespaces: &[&str],
    options: &MergeOptions,
) -> Result<MergeReport> {
    if !namespaces.is_empty() && namespaces.len() != documents.len() {
        return Err(Error::NamespaceCount {
            namespaces: namespaces.len(),
            documents: documents.len(),
        });
    }

    let inputs = documents
        .into_iter()
        .enumerate()
        .map(|(index, document)| {
            let input = MergeInput::parsed(document);
            match namespaces.get(index) {
                Some(namespace) => input.with_namespace(*namespace),
                None => input,
            }
        })
        .collect();
    merge(inputs, options)
}

/// Merges `incoming` into `existing` as the second of two documents.
///
/// No namespaces, no sorting and no tag casing pass; duplicated operationIds
/// are still suffixed.
pub fn merge_two(existing: Document, incoming: Document) -> MergeReport {
    let mut state = MergeState::new();
    let mut warnings = Vec::new();
    let mut document = existing;

    state.seed(&document, &Provenance::new(None, 1));
    merge_document(&mut state, &mut document, incoming, &Provenance::new(None, 2), &mut warnings);
    dedup::deduplicate_operation_ids(&state, &mut document);

    MergeReport { document, warnings }
}

/// Folds one document into the accumulator.
fn merge_document(
    state: &mut MergeState,
    merged: &mut Document,
    mut incoming: Document,
    provenance: &Provenance,
    warnings: &mut Vec<MergeWarning>,
) {
    fields::merge_openapi_version(&mut merged.openapi, &incoming.openapi);
    merged.info = std::mem::take(&mut incoming.info);
    if incoming.json_schema_dialect.is_some() {
        merged.json_schema_dialect = incoming.json_schema_dialect.take();
    }
    fields::merge_extensions(&mut merged.extensions, &incoming.extensions, "document", warnings);

    if !fields::merge_servers(&mut merged.servers, &incoming.servers, true) {
        debug!("servers share no URL, moving them onto operations");
        let existing_servers = std::mem::take(&mut merged.servers);
        fields::push_down_servers(merged, &existing_servers);
        let incoming_servers = std::mem::take(&mut incoming.servers);
        fields::push_down_servers(&mut incoming, &incoming_servers);
    }

    if incoming.security.is_some() {
        merged.security = incoming.security.take();
    }

    let renames = tags::merge_tags(state, &mut merged.tags, std::mem::take(&mut incoming.tags), provenance);
    tags::apply_tag_renames(merged, &renames.existing);
    tags::apply_tag_renames(&mut incoming, &renames.incoming);

    paths::merge_path_items(
        state,
        &mut merged.paths.items,
        std::mem::take(&mut incoming.paths.items),
        Scope::Paths,
        provenance,
        warnings,
    );
    fields::merge_extensions(&mut merged.paths.extensions, &incoming.paths.extensions, "paths", warnings);

    fields::merge_components(&mut merged.components, incoming.components.take(), warnings);

    paths::merge_path_items(
        state,
        &mut merged.webhooks,
        std::mem::take(&mut incoming.webhooks),
        Scope::Webhooks,
        provenance,
        warnings,
    );

    if incoming.external_docs.is_some() {
        merged.external_docs = incoming.external_docs.take();
    }
}
