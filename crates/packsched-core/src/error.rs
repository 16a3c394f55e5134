// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Core error type for packsched operations
#[derive(Error, Debug, Diagnostic)]
pub enum PackschedError {
    /// A Kubernetes quantity string could not be interpreted
    #[error("Invalid quantity '{value}': {reason}")]
    #[diagnostic(
        code(packsched::invalid_quantity),
        help(
            "Use a Kubernetes quantity such as '500m', '2', '128Mi' or '1G'; \
             negative values are not accepted"
        )
    )]
    InvalidQuantity {
        #[allow(unused)]
        value: String,
        #[allow(unused)]
        reason: String,
    },

    /// A required field is absent from a node or pod object
    #[error("Missing required field {field} on {kind}")]
    #[diagnostic(
        code(packsched::missing_field),
        help("The object handed to the scheduler must carry {field}")
    )]
    MissingField {
        #[allow(unused)]
        kind: String,
        #[allow(unused)]
        field: String,
    },

    /// Serialization error
    #[error("Serialization error: {message}")]
    #[diagnostic(
        code(packsched::serialization_error),
        help("Ensure the document is valid JSON or YAML")
    )]
    SerializationError {
        #[allow(unused)]
        message: String,
        #[source]
        #[allow(unused)]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// File could not be read
    #[error("I/O error: {message}")]
    #[diagnostic(
        code(packsched::io_error),
        help("Check that the path exists and is readable")
    )]
    IoError {
        #[allow(unused)]
        message: String,
        #[source]
        #[allow(unused)]
        source: std::io::Error,
    },
}

/// Result type alias for packsched operations
pub type Result<T> = std::result::Result<T, PackschedError>;

impl PackschedError {
    /// Create an InvalidQuantity error
    pub fn invalid_quantity(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidQuantity {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(kind: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            kind: kind.into(),
            field: field.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::SerializationError {
            message: message.into(),
            source,
        }
    }

    /// Create an IoError
    pub fn io_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            message: message.into(),
            source,
        }
    }
}
