// Allow unused assignments for diagnostic fields - they're used by the macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Scheduler error type
#[derive(Error, Debug, Diagnostic)]
pub enum SchedulerError {
    /// Node snapshot could not be resolved
    #[error("Node not found: {node_name}")]
    #[diagnostic(
        code(scheduler::node_not_found),
        help("The node must be part of the snapshot handed to the scheduler")
    )]
    NodeNotFound {
        node_name: String,
    },

    /// No suitable nodes found
    #[error("No suitable nodes found for pod {pod_name}: {reason}")]
    #[diagnostic(
        code(scheduler::no_suitable_nodes),
        help("Check node capacity, disk conditions and workload labels")
    )]
    NoSuitableNodes {
        pod_name: String,
        reason: String,
    },

    /// Policy names a plugin that was never registered
    #[error("Unknown {kind} plugin: {name}")]
    #[diagnostic(
        code(scheduler::unknown_plugin),
        help("Registered {kind} plugins: {available}")
    )]
    UnknownPlugin {
        kind: String,
        name: String,
        available: String,
    },

    /// Policy values are out of range
    #[error("Invalid scheduler policy: {message}")]
    #[diagnostic(
        code(scheduler::invalid_policy),
        help("Priority weights must be positive and default requests non-negative")
    )]
    InvalidPolicy {
        message: String,
    },

    /// Core error
    #[error("Core error: {0}")]
    #[diagnostic(
        code(scheduler::core_error),
        help("The node or pod object could not be read")
    )]
    CoreError(#[from] packsched_core::PackschedError),

    /// Internal error
    #[error("Internal error: {message}")]
    #[diagnostic(
        code(scheduler::internal_error),
        help("This is likely a bug. Please report it")
    )]
    InternalError {
        message: String,
    },
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

impl SchedulerError {
    /// Create a NodeNotFound error
    pub fn node_not_found(node_name: impl Into<String>) -> Self {
        Self::NodeNotFound {
            node_name: node_name.into(),
        }
    }

    /// Create a NoSuitableNodes error
    pub fn no_suitable_nodes(pod_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NoSuitableNodes {
            pod_name: pod_name.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnknownPlugin error
    pub fn unknown_plugin(
        kind: impl Into<String>,
        name: impl Into<String>,
        available: impl Into<String>,
    ) -> Self {
        Self::UnknownPlugin {
            kind: kind.into(),
            name: name.into(),
            available: available.into(),
        }
    }

    /// Create an InvalidPolicy error
    pub fn invalid_policy(message: impl Into<String>) -> Self {
        Self::InvalidPolicy {
            message: message.into(),
        }
    }

    /// Create an InternalError
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}
