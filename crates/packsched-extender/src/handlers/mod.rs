pub mod filter;
pub mod prioritize;

// Re-export handler functions
pub use filter::*;
pub use prioritize::*;

use crate::{ApiError, Result};
use packsched_core::{Pod, Resource};
use packsched_scheduler::{ClusterSnapshot, NodeObjects, PodSnapshot};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Request body shared by `/filter` and `/prioritize`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtenderArgs {
    /// Pod being scheduled
    pub pod: Pod,
    /// Candidate nodes and the pods already bound to each
    #[serde(default)]
    pub nodes: Vec<NodeObjects>,
}

impl ExtenderArgs {
    /// Decode a request body
    pub fn from_body(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Convert the wire objects into scheduler snapshots
    pub fn snapshots(&self) -> Result<(PodSnapshot, ClusterSnapshot)> {
        self.pod.validate().map_err(|e| {
            ApiError::BadRequest(format!("Pod {}: {}", self.pod.display_name(), e))
        })?;

        let pod = PodSnapshot::try_from(&self.pod)?;
        let cluster = ClusterSnapshot::from_objects(&self.nodes)?;

        if cluster.len() < self.nodes.len() {
            warn!(
                "Request for pod {} repeats {} node entries; later entries win",
                pod.name,
                self.nodes.len() - cluster.len()
            );
        }

        Ok((pod, cluster))
    }
}
