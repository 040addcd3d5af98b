//! Declared instances and their persisted documents

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// What a declared instance is, independent of which provider implements it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceKind {
    /// Managed through the full create/update/delete lifecycle
    Resource,
    /// Read-only source, re-read on every apply, never torn down
    Data,
    /// Published by a separate flow; not reconciled
    Artifact,
}

impl fmt::Display for InstanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Resource => "resource",
            Self::Data => "data",
            Self::Artifact => "artifact",
        };
        write!(f, "{s}")
    }
}

/// One item the caller wants reconciled
///
/// Transient: produced fresh each run by whatever front end resolved the
/// declarations. `argument` must already be fully resolved - the engine
/// never evaluates references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclaredInstance {
    /// Unique identifier within the run and across restarts
    pub address: String,
    pub kind: InstanceKind,
    /// Provider reference, e.g. `terraform/resource/aws` (see [`crate::ProviderRef`])
    pub provider: String,
    /// Desired configuration as an arbitrary structured value
    #[serde(default)]
    pub argument: Value,
}

/// Persisted record of one instance
///
/// Created on first successful apply, overwritten on each later apply,
/// removed on successful destroy. `output` is the attribute map the plugin
/// returned from the last completed operation and is what later operations
/// receive as their state input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub provider: String,
    pub custom_state_dir: String,
    pub argument: Value,
    pub output: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn declared_instance_deserializes_from_manifest_json() {
        let raw = r#"{
            "address": "web",
            "kind": "resource",
            "provider": "docker-container/resource/run",
            "argument": {"image": "nginx", "port": "80:80"}
        }"#;
        let instance: DeclaredInstance = serde_json::from_str(raw).unwrap();
        assert_eq!(instance.address, "web");
        assert_eq!(instance.kind, InstanceKind::Resource);
        assert_eq!(instance.argument["image"], "nginx");
    }

    #[test]
    fn missing_argument_defaults_to_null() {
        let raw = r#"{"address": "a", "kind": "data", "provider": "x/data/y"}"#;
        let instance: DeclaredInstance = serde_json::from_str(raw).unwrap();
        assert!(instance.argument.is_null());
    }

    #[test]
    fn document_round_trips_nested_values() {
        let document = Document {
            provider: "terraform/resource/aws".to_string(),
            custom_state_dir: ".gantry/custom_state/vm".to_string(),
            argument: json!({"nested": {"list": [1, 2.5, true, null, "s"]}}),
            output: json!({"id": "i-123", "tags": {"env": "prod"}}),
        };
        let encoded = serde_json::to_string(&document).unwrap();
        let decoded: Document = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, document);
    }
}
