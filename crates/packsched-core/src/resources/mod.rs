pub mod quantities;

use crate::{Node, ObjectMeta, Pod};

/// Placeholder used in logs for objects without a name
pub const UNNAMED: &str = "unknown";

/// Trait for the Kubernetes objects the scheduler reads
pub trait Resource {
    /// Get the metadata of this resource
    fn metadata(&self) -> &ObjectMeta;

    /// Name for log and error messages, `namespace/name` when namespaced
    fn display_name(&self) -> String {
        let metadata = self.metadata();
        let name = metadata.name.as_deref().unwrap_or(UNNAMED);
        match metadata.namespace.as_deref() {
            Some(namespace) if !namespace.is_empty() => format!("{}/{}", namespace, name),
            _ => name.to_string(),
        }
    }

    /// Validate the resource
    fn validate(&self) -> Result<(), ResourceError> {
        validate_base(self.metadata())
    }
}

/// Base validation for all resources
pub fn validate_base(metadata: &ObjectMeta) -> Result<(), ResourceError> {
    let name = metadata
        .name
        .as_ref()
        .ok_or_else(|| ResourceError::MissingField("metadata.name".to_string()))?;

    if !is_valid_name(name) {
        return Err(ResourceError::InvalidName(name.clone()));
    }

    Ok(())
}

/// Resource-related errors
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid resource name: {0}")]
    InvalidName(String),
}

/// Validate a Kubernetes resource name (DNS-1123 subdomain)
pub fn is_valid_name(name: &str) -> bool {
    if name.is_empty() || name.len() > 253 {
        return false;
    }

    let bytes = name.as_bytes();
    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    // Must start and end with alphanumeric
    if !alnum(bytes[0]) || !alnum(bytes[bytes.len() - 1]) {
        return false;
    }

    bytes.iter().all(|&b| alnum(b) || b == b'-' || b == b'.')
}

impl Resource for Pod {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    /// Pods under evaluation may still be nameless (generateName), so only a
    /// present name is checked.
    fn validate(&self) -> Result<(), ResourceError> {
        match &self.metadata.name {
            Some(name) if !is_valid_name(name) => Err(ResourceError::InvalidName(name.clone())),
            _ => Ok(()),
        }
    }
}

impl Resource for Node {
    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn display_name(&self) -> String {
        self.metadata
            .name
            .clone()
            .unwrap_or_else(|| UNNAMED.to_string())
    }
}
