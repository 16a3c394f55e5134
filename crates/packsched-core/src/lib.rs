//! Packsched Core - Shared types for the packing scheduler plugins
//!
//! This crate provides:
//! - Kubernetes object re-exports (Pod, Node)
//! - Kubernetes quantity parsing (CPU millicores, memory bytes, counts)
//! - Error types with miette diagnostics
//! - JSON/YAML document loading

pub mod error;
pub mod resources;

// Re-export commonly used types
pub use error::{PackschedError, Result};
pub use resources::quantities::{format_memory, parse_count, parse_cpu, parse_memory};
pub use resources::{is_valid_name, Resource, ResourceError};

// Re-export k8s-openapi types for convenience
pub use k8s_openapi;
pub use k8s_openapi::api::core::v1::{Container, Node, NodeCondition, Pod};
pub use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use std::path::Path;

/// Deserialize a resource from JSON
pub fn from_json<T: for<'de> serde::Deserialize<'de>>(data: &str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| {
        PackschedError::serialization_error(
            format!("Failed to deserialize from JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Deserialize a resource from YAML
pub fn from_yaml<T: for<'de> serde::Deserialize<'de>>(data: &str) -> Result<T> {
    serde_yaml::from_str(data).map_err(|e| {
        PackschedError::serialization_error(
            format!("Failed to deserialize from YAML: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Read a document from disk.
///
/// Files ending in `.json` are parsed as JSON, everything else as YAML
/// (which also accepts plain JSON documents).
pub fn from_file<T: for<'de> serde::Deserialize<'de>>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path).map_err(|e| {
        PackschedError::io_error(format!("Failed to read {}", path.display()), e)
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => from_json(&data),
        _ => from_yaml(&data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_json() {
        let pod: Pod = from_json(r#"{"metadata": {"name": "nginx"}}"#).unwrap();
        assert_eq!(pod.metadata.name, Some("nginx".to_string()));

        let err = from_json::<Pod>("{not json").unwrap_err();
        assert!(matches!(err, PackschedError::SerializationError { .. }));
    }

    #[test]
    fn test_from_yaml() {
        let node: Node = from_yaml("metadata:\n  name: worker-1\n").unwrap();
        assert_eq!(node.metadata.name, Some("worker-1".to_string()));

        let err = from_yaml::<Node>("metadata: [").unwrap_err();
        assert!(matches!(err, PackschedError::SerializationError { .. }));
    }

    #[test]
    fn test_from_file_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("pod.json");
        let mut f = std::fs::File::create(&json_path).unwrap();
        write!(f, r#"{{"metadata": {{"name": "from-json"}}}}"#).unwrap();

        let yaml_path = dir.path().join("pod.yaml");
        let mut f = std::fs::File::create(&yaml_path).unwrap();
        writeln!(f, "metadata:\n  name: from-yaml").unwrap();

        let pod: Pod = from_file(&json_path).unwrap();
        assert_eq!(pod.metadata.name.as_deref(), Some("from-json"));

        let pod: Pod = from_file(&yaml_path).unwrap();
        assert_eq!(pod.metadata.name.as_deref(), Some("from-yaml"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = from_file::<Pod>("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, PackschedError::IoError { .. }));
    }
}
