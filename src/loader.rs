//! Loading raw OpenAPI bytes into the document model
//!
//! YAML is a superset of JSON, so both formats go through `serde_yaml`. Only
//! OpenAPI 3.x documents are accepted. External `$ref`s are not resolved
//! here; inputs are expected to be bundled already.

use log::debug;

use crate::document::Document;
use crate::error::{Error, Result};

/// Parse a YAML or JSON OpenAPI document
///
/// # Errors
///
/// Returns `Error::MalformedDocument` if the bytes are not UTF-8 or do not
/// describe an OpenAPI object, and `Error::UnsupportedVersion` if the
/// `openapi` field is not a 3.x version.
pub fn parse_document(bytes: &[u8], source_name: &str) -> Result<Document> {
    let content = std::str::from_utf8(bytes).map_err(|_| Error::MalformedDocument {
        source_name: source_name.to_string(),
        message: "content is not valid UTF-8".to_string(),
    })?;

    let document: Document = serde_yaml::from_str(content).map_err(|err| Error::MalformedDocument {
        source_name: source_name.to_string(),
        message: err.to_string(),
    })?;

    if !document.openapi.starts_with("3.") {
        return Err(Error::UnsupportedVersion {
            source_name: source_name.to_string(),
            version: document.openapi,
        });
    }

    debug!(
        "{}: loaded OpenAPI {} with {} path(s) and {} tag(s)",
        source_name,
        document.openapi,
        document.paths.items.len(),
        document.tags.len()
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_document() {
        let doc = parse_document(b"openapi: 3.0.3\ninfo:\n  title: A\n  version: 1.0.0\n", "a.yaml").unwrap();
        assert_eq!(doc.openapi, "3.0.3");
        assert_eq!(doc.info.title, "A");
    }

    #[test]
    fn test_parse_json_document() {
        let json = br#"{"openapi": "3.1.0", "paths": {"/pets": {"get": {"operationId": "listPets"}}}}"#;
        let doc = parse_document(json, "a.json").unwrap();
        assert_eq!(doc.paths.items.len(), 1);
    }

    #[test]
    fn test_rejects_swagger_2() {
        let err = parse_document(b"openapi: 2.0\n", "old.yaml").unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_rejects_missing_openapi_field() {
        let err = parse_document(b"info:\n  title: A\n", "bad.yaml").unwrap_err();
        match err {
            Error::MalformedDocument { source_name, .. } => assert_eq!(source_name, "bad.yaml"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let err = parse_document(&[0xff, 0xfe, 0x00], "bin").unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }
}
