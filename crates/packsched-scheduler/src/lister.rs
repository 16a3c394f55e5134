use crate::types::NodeInfo;
use crate::{Result, SchedulerError};
use packsched_core::{Node, Pod, Resource};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Source of node snapshots for the scheduler.
///
/// Resolving which pods are bound to which node is the lister's job; both
/// calls may fail when that state is unavailable.
pub trait NodeLister: Send + Sync {
    /// Names of every candidate node
    fn node_names(&self) -> Result<Vec<String>>;

    /// Snapshot of one node and the pods bound to it
    fn node_info(&self, node_name: &str) -> Result<NodeInfo>;
}

/// A node object and the pod objects bound to it, as they arrive on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeObjects {
    pub node: Node,
    #[serde(default)]
    pub pods: Vec<Pod>,
}

/// On-disk cluster snapshot document: `{nodes: [{node, pods}]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterDocument {
    #[serde(default)]
    pub nodes: Vec<NodeObjects>,
}

/// In-memory cluster view keyed by node name
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    nodes: BTreeMap<String, NodeInfo>,
}

impl ClusterSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert wire objects into snapshots. Fails on the first malformed object.
    pub fn from_objects(entries: &[NodeObjects]) -> Result<Self> {
        let mut snapshot = Self::new();
        for entry in entries {
            if let Err(e) = entry.node.validate() {
                warn!("Node {}: {}", entry.node.display_name(), e);
            }
            snapshot.insert(NodeInfo::from_objects(&entry.node, &entry.pods)?);
        }
        Ok(snapshot)
    }

    /// Load a YAML or JSON cluster document
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let document: ClusterDocument = packsched_core::from_file(path)?;
        let snapshot = Self::from_objects(&document.nodes)?;

        info!(
            "Loaded cluster snapshot from {} ({} nodes)",
            path.display(),
            snapshot.len()
        );

        Ok(snapshot)
    }

    /// Add or replace a node
    pub fn insert(&mut self, info: NodeInfo) -> Option<NodeInfo> {
        self.nodes.insert(info.name().to_string(), info)
    }

    pub fn get(&self, node_name: &str) -> Option<&NodeInfo> {
        self.nodes.get(node_name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl FromIterator<NodeInfo> for ClusterSnapshot {
    fn from_iter<I: IntoIterator<Item = NodeInfo>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for info in iter {
            snapshot.insert(info);
        }
        snapshot
    }
}

impl NodeLister for ClusterSnapshot {
    fn node_names(&self) -> Result<Vec<String>> {
        Ok(self.nodes.keys().cloned().collect())
    }

    fn node_info(&self, node_name: &str) -> Result<NodeInfo> {
        self.nodes
            .get(node_name)
            .cloned()
            .ok_or_else(|| SchedulerError::node_not_found(node_name))
    }
}
