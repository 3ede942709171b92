//! # Component Namespacing
//!
//! When an input carries a namespace, its referenceable components are
//! renamed `<namespace>_<name>` before the document is folded into the
//! accumulator, so that components of independently written documents never
//! overwrite each other. Renamed schemas are marked with two extensions that
//! let a generator recover the original model name:
//!
//! - `x-speakeasy-name-override`: the name before prefixing
//! - `x-speakeasy-model-namespace`: the namespace
//!
//! Every local `$ref` into a renamed kind is rewritten with a walk over the
//! whole document, and security requirements are remapped to renamed
//! security schemes.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::config::NamespacedKinds;
use crate::document::{ComponentKind, Document, SecurityRequirement};
use crate::error::{Error, MergeWarning, Result};
use crate::merge::equivalence::{equivalent_ignoring, DESCRIPTIVE_FIELDS};
use crate::merge::record;

/// Extension holding a component's name before namespacing.
pub const NAME_OVERRIDE_EXTENSION: &str = "x-speakeasy-name-override";

/// Extension holding the namespace a component was renamed for.
pub const MODEL_NAMESPACE_EXTENSION: &str = "x-speakeasy-model-namespace";

static NAMESPACE_PATTERN: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-\.]+$"));

/// Old component name to new component name, per kind.
pub type KindRenames = HashMap<ComponentKind, HashMap<String, String>>;

/// Check that a namespace only uses characters valid in component names.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    let pattern = NAMESPACE_PATTERN.as_ref().map_err(|err| Error::InvalidNamespace {
        namespace: namespace.to_string(),
        message: err.to_string(),
    })?;
    if !pattern.is_match(namespace) {
        return Err(Error::InvalidNamespace {
            namespace: namespace.to_string(),
            message: "must contain only letters, digits, underscores (_), hyphens (-) and dots (.)".to_string(),
        });
    }
    Ok(())
}

/// Check namespace usage across a whole input list.
///
/// Either every input has a namespace or none does, and no namespace is
/// used twice. Empty strings count as no namespace.
pub fn validate_namespaces<'a, I>(namespaces: I) -> Result<()>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut with = 0;
    let mut without = 0;
    let mut seen = HashSet::new();
    for namespace in namespaces {
        match namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) => {
                validate_namespace(ns)?;
                if !seen.insert(ns) {
                    return Err(Error::DuplicateNamespace {
                        namespace: ns.to_string(),
                    });
                }
                with += 1;
            }
            None => without += 1,
        }
    }
    if with > 0 && without > 0 {
        return Err(Error::InconsistentNamespaces { with, without });
    }
    Ok(())
}

/// Prefixes the components of `kinds` in `doc` with `namespace` and rewrites
/// every reference to them.
///
/// # Errors
///
/// Returns `Error::MalformedDocument` if the rewritten document can no longer
/// be read back into the document model.
pub fn apply_namespace(
    doc: &mut Document,
    namespace: &str,
    kinds: &NamespacedKinds,
    source_name: &str,
    warnings: &mut Vec<MergeWarning>,
) -> Result<()> {
    let Some(components) = doc.components.as_mut() else {
        return Ok(());
    };

    let mut renames = KindRenames::new();
    for kind in kinds.kinds() {
        let entries = std::mem::take(components.get_mut(kind));
        let mut mapping = HashMap::with_capacity(entries.len());
        let mut renamed = IndexMap::with_capacity(entries.len());
        for (name, mut value) in entries {
            let new_name = format!("{}_{}", namespace, name);
            mark_component(kind, &mut value, &name, namespace);
            mapping.insert(name, new_name.clone());
            renamed.insert(new_name, value);
        }
        *components.get_mut(kind) = renamed;
        if !mapping.is_empty() {
            debug!("{}: namespaced {} {} as {}", source_name, mapping.len(), kind.as_str(), namespace);
            renames.insert(kind, mapping);
        }
    }
    if renames.is_empty() {
        return Ok(());
    }

    let mut value = doc.to_value()?;
    rewrite_references(&mut value, "#", &renames, namespace, warnings);
    *doc = Document::from_value(value, source_name)?;

    if let Some(schemes) = renames.get(&ComponentKind::SecuritySchemes) {
        remap_security_requirements(doc, schemes);
    }
    Ok(())
}

/// Adds the namespacing extensions wherever `kind` keeps its schema.
fn mark_component(kind: ComponentKind, value: &mut Value, original: &str, namespace: &str) {
    match kind {
        ComponentKind::Schemas => mark_inline(value, original, namespace),
        ComponentKind::Parameters | ComponentKind::Headers => {
            if let Some(schema) = value.get_mut("schema") {
                mark_inline(schema, original, namespace);
            }
        }
        ComponentKind::Responses | ComponentKind::RequestBodies => {
            if let Some(Value::Mapping(content)) = value.get_mut("content") {
                for (_, media) in content.iter_mut() {
                    if let Some(schema) = media.get_mut("schema") {
                        mark_inline(schema, original, namespace);
                    }
                }
            }
        }
        ComponentKind::SecuritySchemes => mark_inline(value, original, namespace),
        _ => {}
    }
}

/// Marks an object unless it is a pure reference.
fn mark_inline(value: &mut Value, original: &str, namespace: &str) {
    let Value::Mapping(map) = value else {
        return;
    };
    if map.contains_key("$ref") {
        return;
    }
    map.insert(Value::from(NAME_OVERRIDE_EXTENSION), Value::from(original));
    map.insert(Value::from(MODEL_NAMESPACE_EXTENSION), Value::from(namespace));
}

enum Rewrite {
    Untouched,
    Renamed(String),
    Unresolved,
}

fn unescape_pointer(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Maps `#/components/<kind>/<name>[/...]` onto the renamed component.
fn rewrite_reference(reference: &str, renames: &KindRenames) -> Rewrite {
    let Some(pointer) = reference.strip_prefix("#/components/") else {
        return Rewrite::Untouched;
    };
    let mut parts = pointer.splitn(3, '/');
    let (Some(kind_key), Some(name)) = (parts.next(), parts.next()) else {
        return Rewrite::Untouched;
    };
    let rest = parts.next();

    let Some(kind) = ComponentKind::ALL.into_iter().find(|k| k.as_str() == kind_key) else {
        return Rewrite::Untouched;
    };
    let Some(mapping) = renames.get(&kind) else {
        return Rewrite::Untouched;
    };
    match mapping.get(&unescape_pointer(name)) {
        Some(new_name) => {
            let mut rewritten = format!("#/components/{}/{}", kind_key, escape_pointer(new_name));
            if let Some(rest) = rest {
                rewritten.push('/');
                rewritten.push_str(rest);
            }
            Rewrite::Renamed(rewritten)
        }
        None => Rewrite::Unresolved,
    }
}

/// Maps whose keys are names chosen by the author, so a key such as
/// `example` or `x-id` is a property or component name there.
const NAME_MAPS: &[&str] = &[
    "properties",
    "patternProperties",
    "dependentSchemas",
    "$defs",
    "definitions",
    "schemas",
    "parameters",
    "responses",
    "requestBodies",
    "headers",
    "securitySchemes",
];

/// Example payloads and extension values are opaque data.
fn is_payload(key: &str, container: &str) -> bool {
    (key == "example" || key == "examples" || key.starts_with("x-")) && !NAME_MAPS.contains(&container)
}

fn rewrite_references(
    value: &mut Value,
    location: &str,
    renames: &KindRenames,
    namespace: &str,
    warnings: &mut Vec<MergeWarning>,
) {
    match value {
        Value::Mapping(map) => {
            let container = location.rsplit('/').next().unwrap_or_default();
            for (key, child) in map.iter_mut() {
                let key = key.as_str().unwrap_or_default();
                if is_payload(key, container) {
                    continue;
                }
                if key == "$ref" {
                    match child {
                        Value::String(reference) => match rewrite_reference(reference, renames) {
                            Rewrite::Renamed(new_reference) => *reference = new_reference,
                            Rewrite::Unresolved => record(
                                warnings,
                                MergeWarning::UnresolvedReference {
                                    reference: reference.clone(),
                                    namespace: namespace.to_string(),
                                },
                            ),
                            Rewrite::Untouched => {}
                        },
                        // a property literally named `$ref`
                        Value::Mapping(_) => {
                            rewrite_references(child, &format!("{}/$ref", location), renames, namespace, warnings)
                        }
                        _ => record(
                            warnings,
                            MergeWarning::InvalidReference {
                                location: location.to_string(),
                            },
                        ),
                    }
                    continue;
                }
                let child_location = format!("{}/{}", location, escape_pointer(key));
                rewrite_references(child, &child_location, renames, namespace, warnings);
            }
        }
        Value::Sequence(items) => {
            for (index, child) in items.iter_mut().enumerate() {
                rewrite_references(child, &format!("{}/{}", location, index), renames, namespace, warnings);
            }
        }
        Value::Tagged(tagged) => rewrite_references(&mut tagged.value, location, renames, namespace, warnings),
        _ => {}
    }
}

/// Renames the scheme keys of every security requirement in `doc`. Two keys
/// of one requirement that end up with the same name have their scopes
/// combined.
pub fn remap_security_requirements(doc: &mut Document, renames: &HashMap<String, String>) {
    fn remap(requirements: &mut [SecurityRequirement], renames: &HashMap<String, String>) {
        for requirement in requirements.iter_mut() {
            let mut remapped = SecurityRequirement::with_capacity(requirement.len());
            for (scheme, scopes) in std::mem::take(requirement) {
                let name = renames.get(&scheme).cloned().unwrap_or(scheme);
                let merged_scopes = remapped.entry(name).or_default();
                for scope in scopes {
                    if !merged_scopes.contains(&scope) {
                        merged_scopes.push(scope);
                    }
                }
            }
            *requirement = remapped;
        }
    }

    if renames.is_empty() {
        return;
    }
    if let Some(requirements) = doc.security.as_mut() {
        remap(requirements, renames);
    }
    doc.for_each_operation_mut(|_, _, _, op| {
        if let Some(requirements) = op.security.as_mut() {
            remap(requirements, renames);
        }
    });
}

/// Collapses namespaced security schemes that were renamed from the same
/// original name and are equal apart from prose and the namespacing
/// extensions. The last of each group survives under the original name,
/// without the namespacing extensions.
pub fn collapse_equivalent_security_schemes(doc: &mut Document) {
    let Some(components) = doc.components.as_mut() else {
        return;
    };

    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    for (name, scheme) in &components.security_schemes {
        if let Some(original) = scheme.get(NAME_OVERRIDE_EXTENSION).and_then(Value::as_str) {
            groups.entry(original.to_string()).or_default().push(name.clone());
        }
    }

    let ignored = [
        DESCRIPTIVE_FIELDS[0],
        DESCRIPTIVE_FIELDS[1],
        NAME_OVERRIDE_EXTENSION,
        MODEL_NAMESPACE_EXTENSION,
    ];
    let mut renames = HashMap::new();
    let mut dropped = HashSet::new();
    for (original, names) in &groups {
        let (Some(first), Some(last)) = (names.first(), names.last()) else {
            continue;
        };
        if names.len() < 2 {
            continue;
        }
        let reference = &components.security_schemes[first];
        let all_equal = names[1..]
            .iter()
            .all(|name| equivalent_ignoring(reference, &components.security_schemes[name], &ignored));
        if !all_equal {
            continue;
        }
        debug!("security schemes {:?} collapsed into {}", names, original);
        for name in names {
            renames.insert(name.clone(), original.clone());
            if name != last {
                dropped.insert(name.clone());
            }
        }
    }
    if renames.is_empty() {
        return;
    }

    let schemes = std::mem::take(&mut components.security_schemes);
    for (name, mut scheme) in schemes {
        if dropped.contains(&name) {
            continue;
        }
        match renames.get(&name) {
            Some(original) => {
                if let Value::Mapping(map) = &mut scheme {
                    strip_namespace_extensions(map);
                }
                components.security_schemes.insert(original.clone(), scheme);
            }
            None => {
                components.security_schemes.insert(name, scheme);
            }
        }
    }
    remap_security_requirements(doc, &renames);
}

fn strip_namespace_extensions(map: &mut Mapping) {
    map.remove(NAME_OVERRIDE_EXTENSION);
    map.remove(MODEL_NAMESPACE_EXTENSION);
}
