use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The shared configuration document.
///
/// Only the plugin registry is a known field; every other top-level key is
/// carried verbatim in `extra` so a write never drops data another tool (or
/// the user's editor) put there. BTreeMap keeps serialization order stable,
/// which keeps rewrites diff-friendly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigDocument {
    /// Ordered list of enabled plugin identifiers.
    #[serde(default)]
    pub plugins: Vec<String>,

    /// Unknown top-level keys, preserved across round-trips.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ConfigDocument {
    /// Append a plugin if not already present. Returns true if added.
    pub fn add_plugin(&mut self, name: &str) -> bool {
        if self.plugins.iter().any(|p| p == name) {
            return false;
        }
        self.plugins.push(name.to_string());
        true
    }

    /// Remove a plugin by name. Returns true if it was present.
    pub fn remove_plugin(&mut self, name: &str) -> bool {
        let before = self.plugins.len();
        self.plugins.retain(|p| p != name);
        self.plugins.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_plugin_deduplicates() {
        let mut doc = ConfigDocument::default();
        assert!(doc.add_plugin("alpha"));
        assert!(!doc.add_plugin("alpha"));
        assert_eq!(doc.plugins, vec!["alpha"]);
    }

    #[test]
    fn test_remove_plugin() {
        let mut doc = ConfigDocument::default();
        doc.add_plugin("alpha");
        assert!(doc.remove_plugin("alpha"));
        assert!(!doc.remove_plugin("alpha"));
        assert!(doc.plugins.is_empty());
    }

    #[test]
    fn test_unknown_keys_roundtrip() {
        let input = json!({
            "plugins": ["a", "b"],
            "theme": "dark",
            "nested": { "levels": [1, 2, { "deep": true }] }
        });

        let doc: ConfigDocument = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(doc.plugins, vec!["a", "b"]);
        assert_eq!(doc.extra["theme"], json!("dark"));

        let output = serde_json::to_value(&doc).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_missing_plugins_field_defaults_empty() {
        let doc: ConfigDocument = serde_json::from_str(r#"{"other": 1}"#).unwrap();
        assert!(doc.plugins.is_empty());
        assert_eq!(doc.extra["other"], json!(1));
    }
}
