//! # Merge Options
//!
//! This module defines the knobs that shape a merge run and the logic for
//! reading them from YAML. Every option has a default, so an empty mapping
//! (or no configuration at all) yields the standard behaviour.
//!
//! ## Example
//!
//! ```
//! use openapi_merge::config;
//!
//! let options = config::parse("sortOutput: false").unwrap();
//! assert!(!options.sort_output);
//! assert!(options.collapse_equivalent_security_schemes);
//! ```

use serde::{Deserialize, Serialize};

use crate::document::ComponentKind;
use crate::error::{Error, Result};

/// Options for a merge run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct MergeOptions {
    /// Sort `paths` and `components` of the merged document for stable output.
    pub sort_output: bool,
    /// Collapse namespaced security schemes that only differ in prose.
    pub collapse_equivalent_security_schemes: bool,
    /// Component kinds, besides schemas, that receive namespace prefixes.
    pub namespace_components: NamespacedKinds,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            sort_output: true,
            collapse_equivalent_security_schemes: true,
            namespace_components: NamespacedKinds::default(),
        }
    }
}

/// Which component kinds are prefixed when a document carries a namespace.
///
/// Schemas are always prefixed; the remaining referenceable kinds can be
/// switched off individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct NamespacedKinds {
    pub parameters: bool,
    pub responses: bool,
    pub request_bodies: bool,
    pub headers: bool,
    pub security_schemes: bool,
}

impl Default for NamespacedKinds {
    fn default() -> Self {
        Self {
            parameters: true,
            responses: true,
            request_bodies: true,
            headers: true,
            security_schemes: true,
        }
    }
}

impl NamespacedKinds {
    /// Only schemas are namespaced.
    pub fn schemas_only() -> Self {
        Self {
            parameters: false,
            responses: false,
            request_bodies: false,
            headers: false,
            security_schemes: false,
        }
    }

    /// The enabled kinds, schemas first.
    pub fn kinds(&self) -> Vec<ComponentKind> {
        let mut kinds = vec![ComponentKind::Schemas];
        let optional = [
            (self.parameters, ComponentKind::Parameters),
            (self.responses, ComponentKind::Responses),
            (self.request_bodies, ComponentKind::RequestBodies),
            (self.headers, ComponentKind::Headers),
            (self.security_schemes, ComponentKind::SecuritySchemes),
        ];
        kinds.extend(optional.into_iter().filter(|(on, _)| *on).map(|(_, kind)| kind));
        kinds
    }
}

/// Parse merge options from a YAML string
///
/// An empty or comment-only string yields the defaults.
pub fn parse(yaml_content: &str) -> Result<MergeOptions> {
    let has_content = yaml_content
        .lines()
        .any(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'));
    if !has_content {
        return Ok(MergeOptions::default());
    }

    serde_yaml::from_str(yaml_content).map_err(|err| Error::Config {
        message: err.to_string(),
        hint: Some(
            "valid keys are sortOutput, collapseEquivalentSecuritySchemes and namespaceComponents"
                .to_string(),
        ),
    })
}
