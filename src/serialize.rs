//! Stable ordering and serialization of merged documents
//!
//! Every map in the document model keeps insertion order, so serializing the
//! same merge twice is already byte-identical. [`sort_document`] additionally
//! puts `paths`, `webhooks` and every `components` map into lexicographic key
//! order, so that the output does not depend on input order either.

use serde_yaml::{Mapping, Value};

use crate::document::{ComponentKind, Document};
use crate::error::Result;

/// Sorts path keys, webhook keys and components (recursively).
///
/// Sequences keep their element order. Operations within a path item always
/// serialize in method order.
pub fn sort_document(doc: &mut Document) {
    doc.paths.items.sort_keys();
    doc.webhooks.sort_keys();
    if let Some(components) = doc.components.as_mut() {
        for kind in ComponentKind::ALL {
            let entries = components.get_mut(kind);
            entries.sort_keys();
            for value in entries.values_mut() {
                sort_value(value);
            }
        }
    }
}

fn key_text(key: &Value) -> String {
    match key.as_str() {
        Some(text) => text.to_string(),
        None => serde_yaml::to_string(key).unwrap_or_default(),
    }
}

/// Sorts the keys of every mapping inside `value`.
pub fn sort_value(value: &mut Value) {
    match value {
        Value::Mapping(map) => {
            let mut entries: Vec<(Value, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by_cached_key(|(key, _)| key_text(key));
            let mut sorted = Mapping::with_capacity(entries.len());
            for (key, mut child) in entries {
                sort_value(&mut child);
                sorted.insert(key, child);
            }
            *map = sorted;
        }
        Value::Sequence(items) => items.iter_mut().for_each(sort_value),
        Value::Tagged(tagged) => sort_value(&mut tagged.value),
        _ => {}
    }
}

/// Serialize a document as YAML
pub fn to_yaml(doc: &Document) -> Result<String> {
    Ok(serde_yaml::to_string(doc)?)
}

/// Serialize a document as pretty-printed JSON
pub fn to_json(doc: &Document) -> Result<String> {
    Ok(serde_json::to_string_pretty(doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNSORTED: &str = r#"
openapi: 3.1.0
paths:
  /zebras:
    get: {operationId: listZebras}
  /apes:
    post: {operationId: createApe}
    get: {operationId: listApes}
components:
  schemas:
    Zebra:
      type: object
      required: [stripes, name]
      properties:
        stripes: {type: integer}
        name: {type: string}
    Ape:
      type: object
"#;

    #[test]
    fn test_sort_document() {
        let mut doc: Document = serde_yaml::from_str(UNSORTED).unwrap();
        sort_document(&mut doc);

        let paths: Vec<_> = doc.paths.items.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["/apes", "/zebras"]);

        let components = doc.components.as_ref().unwrap();
        let schemas: Vec<_> = components.schemas.keys().map(String::as_str).collect();
        assert_eq!(schemas, vec!["Ape", "Zebra"]);

        let zebra = components.schemas["Zebra"].as_mapping().unwrap();
        let keys: Vec<_> = zebra.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["properties", "required", "type"]);
        // sequences keep their order
        assert_eq!(
            components.schemas["Zebra"]["required"],
            serde_yaml::from_str::<Value>("[stripes, name]").unwrap()
        );
    }

    #[test]
    fn test_operations_serialize_in_method_order() {
        let doc: Document = serde_yaml::from_str(UNSORTED).unwrap();
        let yaml = to_yaml(&doc).unwrap();
        let get = yaml.find("listApes").unwrap();
        let post = yaml.find("createApe").unwrap();
        assert!(get < post);
    }

    #[test]
    fn test_serialization_is_stable() {
        let mut first: Document = serde_yaml::from_str(UNSORTED).unwrap();
        let mut second: Document = serde_yaml::from_str(UNSORTED).unwrap();
        sort_document(&mut first);
        sort_document(&mut second);
        assert_eq!(to_yaml(&first).unwrap(), to_yaml(&second).unwrap());
        assert_eq!(to_json(&first).unwrap(), to_json(&second).unwrap());
    }

    #[test]
    fn test_to_json() {
        let doc: Document = serde_yaml::from_str("openapi: 3.1.0\ninfo: {title: T, version: '1'}\n").unwrap();
        let json = to_json(&doc).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["openapi"], "3.1.0");
        assert_eq!(value["info"]["title"], "T");
    }
}
