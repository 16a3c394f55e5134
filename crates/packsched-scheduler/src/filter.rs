use crate::accounting::ResourceAccountant;
use crate::selector::LabelSelector;
use crate::types::{NodeInfo, PlacementDecision, PodSnapshot, RejectReason};
use packsched_core::format_memory;
use serde::{Deserialize, Serialize};
use std::iter;
use tracing::debug;

/// Condition types that signal a node has run out of disk
pub const DEFAULT_DISK_CONDITION_TYPES: &[&str] = &["OutOfDisk", "DiskPressure"];

/// Label marking pods that belong to the managed workload family
pub const DEFAULT_WORKLOAD_LABEL: &str = "heritage";

/// Value of [`DEFAULT_WORKLOAD_LABEL`] the uniqueness rule applies to
pub const DEFAULT_WORKLOAD_VALUE: &str = "deis";

/// Filter predicate trait
pub trait FilterPredicate: Send + Sync {
    /// Decide whether `pod` may be placed on `node`, given the pods already bound there
    fn filter(&self, pod: &PodSnapshot, node: &NodeInfo) -> PlacementDecision;

    /// Name of the filter
    fn name(&self) -> &str;
}

/// Rejects nodes whose pod count, CPU or memory would be overcommitted
#[derive(Debug, Clone, Default)]
pub struct PodOverCommitNode {
    accountant: ResourceAccountant,
}

impl PodOverCommitNode {
    pub const NAME: &'static str = "PodOverCommitNode";

    pub fn new(accountant: ResourceAccountant) -> Self {
        Self { accountant }
    }
}

impl FilterPredicate for PodOverCommitNode {
    fn filter(&self, pod: &PodSnapshot, node: &NodeInfo) -> PlacementDecision {
        let capacity = node.node.capacity;
        let pod_count = node.pods.len() as i64 + 1;

        if pod_count > capacity.pods {
            debug!(
                "Cannot schedule pod {}, node {} would exceed pod capacity ({} > {})",
                pod.name,
                node.name(),
                pod_count,
                capacity.pods
            );
            return PlacementDecision::reject(node.name(), RejectReason::ExceedsPodCapacity);
        }

        // Running totals, existing pods first and the candidate last
        let mut total_cpu = 0i64;
        let mut total_memory = 0i64;

        for p in node.pods.iter().chain(iter::once(pod)) {
            let demand = self.accountant.pod_demand(p);
            total_cpu = total_cpu.saturating_add(demand.cpu_millicores);
            total_memory = total_memory.saturating_add(demand.memory_bytes);

            if total_cpu > capacity.cpu_millicores {
                debug!(
                    "Cannot schedule pod {}, node {} would be overcommitted on CPU ({}m > {}m)",
                    pod.name,
                    node.name(),
                    total_cpu,
                    capacity.cpu_millicores
                );
                return PlacementDecision::reject(node.name(), RejectReason::ExceedsCpu);
            }

            if total_memory > capacity.memory_bytes {
                debug!(
                    "Cannot schedule pod {}, node {} would be overcommitted on memory ({} > {})",
                    pod.name,
                    node.name(),
                    format_memory(total_memory),
                    format_memory(capacity.memory_bytes)
                );
                return PlacementDecision::reject(node.name(), RejectReason::ExceedsMemory);
            }
        }

        PlacementDecision::admit(node.name())
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

/// Rejects nodes reporting that they are out of disk.
///
/// A node without any disk condition is admitted.
#[derive(Debug, Clone)]
pub struct NodeOutOfDisk {
    condition_types: Vec<String>,
}

impl NodeOutOfDisk {
    pub const NAME: &'static str = "NodeOutOfDisk";

    pub fn new(condition_types: Vec<String>) -> Self {
        Self { condition_types }
    }
}

impl Default for NodeOutOfDisk {
    fn default() -> Self {
        Self::new(
            DEFAULT_DISK_CONDITION_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        )
    }
}

impl FilterPredicate for NodeOutOfDisk {
    fn filter(&self, _pod: &PodSnapshot, node: &NodeInfo) -> PlacementDecision {
        let out_of_disk = node
            .node
            .conditions
            .iter()
            .filter(|c| self.condition_types.contains(&c.condition_type))
            .find(|c| c.is_true());

        if let Some(condition) = out_of_disk {
            debug!(
                "Node {} reports {}={}",
                node.name(),
                condition.condition_type,
                condition.status
            );
            return PlacementDecision::reject(node.name(), RejectReason::DiskPressure);
        }

        PlacementDecision::admit(node.name())
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

/// Label identifying the workload family [`UniqueWorkload`] applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkloadMarker {
    pub label: String,
    pub value: String,
}

impl Default for WorkloadMarker {
    fn default() -> Self {
        Self {
            label: DEFAULT_WORKLOAD_LABEL.to_string(),
            value: DEFAULT_WORKLOAD_VALUE.to_string(),
        }
    }
}

impl WorkloadMarker {
    fn is_marked(&self, pod: &PodSnapshot) -> bool {
        pod.labels.get(&self.label) == Some(&self.value)
    }
}

/// Keeps at most one pod per exact label set of a marked workload on a node
#[derive(Debug, Clone, Default)]
pub struct UniqueWorkload {
    marker: WorkloadMarker,
}

impl UniqueWorkload {
    pub const NAME: &'static str = "UniqueWorkload";
    /// Name older scheduler policies use for this predicate
    pub const LEGACY_NAME: &'static str = "DeisUniqueApp";

    pub fn new(marker: WorkloadMarker) -> Self {
        Self { marker }
    }
}

impl FilterPredicate for UniqueWorkload {
    fn filter(&self, pod: &PodSnapshot, node: &NodeInfo) -> PlacementDecision {
        if !self.marker.is_marked(pod) {
            return PlacementDecision::admit(node.name());
        }

        let selector = LabelSelector::from_labels(&pod.labels);

        if let Some(existing) = node.pods.iter().find(|p| selector.matches(&p.labels)) {
            debug!(
                "Pod {} duplicates workload of {} on node {}",
                pod.name,
                existing.name,
                node.name()
            );
            return PlacementDecision::reject(node.name(), RejectReason::DuplicateWorkload);
        }

        PlacementDecision::admit(node.name())
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContainerResources, DeclaredResources, NodeCapacity, NodeSnapshot};

    fn create_test_node(pods: i64, cpu: i64, memory: i64, existing: Vec<PodSnapshot>) -> NodeInfo {
        NodeInfo::new(
            NodeSnapshot::new("node1", NodeCapacity::new(pods, cpu, memory)),
            existing,
        )
    }

    fn create_test_pod(name: &str, cpu: i64, memory: i64) -> PodSnapshot {
        PodSnapshot::new(name).with_container(ContainerResources::new(
            DeclaredResources::new(cpu, memory),
            DeclaredResources::new(cpu, memory),
        ))
    }

    fn create_marked_pod(version: &str) -> PodSnapshot {
        PodSnapshot::new(format!("app-{}", version))
            .with_label("app", "testApp")
            .with_label("heritage", "deis")
            .with_label("version", version)
    }

    #[test]
    fn test_overcommit_pass() {
        let node = create_test_node(10, 4000, 8000, vec![create_test_pod("a", 1000, 2000)]);
        let result = PodOverCommitNode::default().filter(&create_test_pod("b", 1000, 2000), &node);
        assert!(result.is_admitted());
    }

    #[test]
    fn test_overcommit_exact_fit_is_admitted() {
        let node = create_test_node(2, 4000, 8000, vec![create_test_pod("a", 3000, 6000)]);
        let result = PodOverCommitNode::default().filter(&create_test_pod("b", 1000, 2000), &node);
        assert!(result.is_admitted());
    }

    #[test]
    fn test_overcommit_pod_capacity() {
        let node = create_test_node(
            2,
            100_000,
            100_000,
            vec![create_test_pod("a", 0, 0), create_test_pod("b", 0, 0)],
        );
        let result = PodOverCommitNode::default().filter(&create_test_pod("c", 0, 0), &node);
        assert_eq!(result.reason, Some(RejectReason::ExceedsPodCapacity));
    }

    #[test]
    fn test_overcommit_pod_capacity_ignores_demand() {
        // Even a node with plenty of room rejects once the pod count is reached
        let node = create_test_node(0, i64::MAX, i64::MAX, Vec::new());
        let result = PodOverCommitNode::default().filter(&create_test_pod("a", 0, 0), &node);
        assert_eq!(result.reason, Some(RejectReason::ExceedsPodCapacity));
    }

    #[test]
    fn test_overcommit_fail_cpu() {
        let node = create_test_node(10, 2000, 8000, vec![create_test_pod("a", 1500, 1000)]);
        let result = PodOverCommitNode::default().filter(&create_test_pod("b", 1000, 1000), &node);
        assert_eq!(result.reason, Some(RejectReason::ExceedsCpu));
    }

    #[test]
    fn test_overcommit_fail_memory() {
        let node = create_test_node(10, 8000, 2000, vec![create_test_pod("a", 1000, 1500)]);
        let result = PodOverCommitNode::default().filter(&create_test_pod("b", 1000, 1000), &node);
        assert_eq!(result.reason, Some(RejectReason::ExceedsMemory));
    }

    #[test]
    fn test_overcommit_cpu_checked_before_memory() {
        let node = create_test_node(10, 1000, 1000, Vec::new());
        let result = PodOverCommitNode::default().filter(&create_test_pod("a", 5000, 5000), &node);
        assert_eq!(result.reason, Some(RejectReason::ExceedsCpu));
    }

    #[test]
    fn test_overcommit_zero_cpu_capacity() {
        let node = create_test_node(10, 0, 8000, Vec::new());
        let result = PodOverCommitNode::default().filter(&create_test_pod("a", 1, 0), &node);
        assert_eq!(result.reason, Some(RejectReason::ExceedsCpu));

        // A pod with zero effective demand never trips the resource checks
        let result = PodOverCommitNode::default().filter(&create_test_pod("b", 0, 0), &node);
        assert!(result.is_admitted());
    }

    #[test]
    fn test_overcommit_counts_defaults() {
        // A bare container counts as 250m / 500Mi
        let node = create_test_node(10, 200, i64::MAX, Vec::new());
        let pod = PodSnapshot::new("bare").with_container(ContainerResources::default());
        let result = PodOverCommitNode::default().filter(&pod, &node);
        assert_eq!(result.reason, Some(RejectReason::ExceedsCpu));
    }

    #[test]
    fn test_node_disk() {
        let filter = NodeOutOfDisk::default();
        let pod = PodSnapshot::new("pod");

        let full = NodeInfo::new(
            NodeSnapshot::new("DiskFull", NodeCapacity::default())
                .with_condition("OutOfDisk", "True"),
            Vec::new(),
        );
        let result = filter.filter(&pod, &full);
        assert_eq!(result.reason, Some(RejectReason::DiskPressure));

        let fine = NodeInfo::new(
            NodeSnapshot::new("DiskFine", NodeCapacity::default())
                .with_condition("OutOfDisk", "False"),
            Vec::new(),
        );
        assert!(filter.filter(&pod, &fine).is_admitted());
    }

    #[test]
    fn test_node_disk_pressure_condition() {
        let filter = NodeOutOfDisk::default();
        let node = NodeInfo::new(
            NodeSnapshot::new("node1", NodeCapacity::default())
                .with_condition("Ready", "True")
                .with_condition("DiskPressure", "true"),
            Vec::new(),
        );
        assert_eq!(
            filter.filter(&PodSnapshot::new("pod"), &node).reason,
            Some(RejectReason::DiskPressure)
        );
    }

    #[test]
    fn test_node_disk_fails_open() {
        let filter = NodeOutOfDisk::default();
        let pod = PodSnapshot::new("pod");

        let no_conditions =
            NodeInfo::new(NodeSnapshot::new("node1", NodeCapacity::default()), Vec::new());
        assert!(filter.filter(&pod, &no_conditions).is_admitted());

        let unknown = NodeInfo::new(
            NodeSnapshot::new("node2", NodeCapacity::default())
                .with_condition("OutOfDisk", "Unknown"),
            Vec::new(),
        );
        assert!(filter.filter(&pod, &unknown).is_admitted());

        // Other conditions being true does not matter
        let memory = NodeInfo::new(
            NodeSnapshot::new("node3", NodeCapacity::default())
                .with_condition("MemoryPressure", "True"),
            Vec::new(),
        );
        assert!(filter.filter(&pod, &memory).is_admitted());
    }

    #[test]
    fn test_unique_workload() {
        let filter = UniqueWorkload::default();

        let cases = vec![
            ("NoMarkedApps", create_marked_pod("v1"), vec![PodSnapshot::new("plain")], true),
            ("SameVersion", create_marked_pod("v1"), vec![create_marked_pod("v1")], false),
            ("DifferentVersion", create_marked_pod("v2"), vec![create_marked_pod("v1")], true),
            ("EmptyPod", PodSnapshot::new("empty"), vec![create_marked_pod("v1")], true),
        ];

        for (name, pod, existing, expected) in cases {
            let node = create_test_node(10, 1000, 1000, existing);
            let result = filter.filter(&pod, &node);
            assert_eq!(result.is_admitted(), expected, "case {}", name);
        }
    }

    #[test]
    fn test_unique_workload_superset_labels_match() {
        let pod = PodSnapshot::new("candidate")
            .with_label("app", "x")
            .with_label("version", "v1")
            .with_label("heritage", "deis");
        let existing = PodSnapshot::new("existing")
            .with_label("app", "x")
            .with_label("version", "v1")
            .with_label("heritage", "deis")
            .with_label("pod-template-hash", "abc123");

        let node = create_test_node(10, 1000, 1000, vec![existing]);
        let result = UniqueWorkload::default().filter(&pod, &node);
        assert_eq!(result.reason, Some(RejectReason::DuplicateWorkload));
    }

    #[test]
    fn test_unique_workload_requires_exact_marker_value() {
        let pod = PodSnapshot::new("candidate")
            .with_label("app", "x")
            .with_label("heritage", "helm");
        let node = create_test_node(10, 1000, 1000, vec![pod.clone()]);
        assert!(UniqueWorkload::default().filter(&pod, &node).is_admitted());
    }

    #[test]
    fn test_unique_workload_custom_marker() {
        let filter = UniqueWorkload::new(WorkloadMarker {
            label: "app.kubernetes.io/managed-by".to_string(),
            value: "packer".to_string(),
        });
        let pod = PodSnapshot::new("candidate")
            .with_label("app.kubernetes.io/managed-by", "packer")
            .with_label("app", "x");
        let node = create_test_node(10, 1000, 1000, vec![pod.clone()]);
        assert_eq!(
            filter.filter(&pod, &node).reason,
            Some(RejectReason::DuplicateWorkload)
        );
    }

    #[test]
    fn test_predicates_are_idempotent() {
        let node = create_test_node(3, 2000, 2000, vec![create_marked_pod("v1")]);
        let pod = create_marked_pod("v1");
        let predicates: Vec<Box<dyn FilterPredicate>> = vec![
            Box::new(PodOverCommitNode::default()),
            Box::new(NodeOutOfDisk::default()),
            Box::new(UniqueWorkload::default()),
        ];

        for predicate in &predicates {
            assert_eq!(predicate.filter(&pod, &node), predicate.filter(&pod, &node));
        }
    }
}
