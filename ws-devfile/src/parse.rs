use crate::error::{DevfileError, Result};
use crate::model::Devfile;
use serde_json::Value;
use serde_yaml_ng as serde_yaml;

/// Parse devfile YAML into an untyped document.
///
/// The document is kept untyped until flattening, since parents and plugins
/// may contribute fields a partial document does not have yet.
pub fn parse_devfile_yaml(yaml: &str) -> Result<Value> {
    serde_yaml::from_str::<Value>(yaml)
        .map_err(|e| DevfileError::Parse(format!("Devfile YAML could not be parsed: {}", e)))
}

/// Serialize a processed devfile back to YAML.
pub fn to_yaml(devfile: &Devfile) -> Result<String> {
    serde_yaml::to_string(devfile)
        .map_err(|e| DevfileError::Parse(format!("Devfile could not be serialized: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mapping() {
        let doc = parse_devfile_yaml("schemaVersion: 2.2.0\ncomponents: []\n").unwrap();
        assert_eq!(doc["schemaVersion"], "2.2.0");
        assert!(doc["components"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_parse_error_is_prefixed() {
        let err = parse_devfile_yaml("components: [unclosed").unwrap_err();
        match err {
            DevfileError::Parse(msg) => {
                assert!(msg.starts_with("Devfile YAML could not be parsed: "))
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_components_entry_is_null() {
        let doc = parse_devfile_yaml("schemaVersion: 2.2.0\ncomponents:\n").unwrap();
        assert!(doc["components"].is_null());
    }
}
