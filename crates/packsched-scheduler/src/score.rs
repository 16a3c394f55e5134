use crate::accounting::ResourceAccountant;
use crate::types::{NodeInfo, PodSnapshot, ScoreResult};
use tracing::debug;

/// Highest score a scoring function hands out
pub const MAX_PRIORITY: i64 = 10;

/// Scoring function trait
pub trait ScoreFunction: Send + Sync {
    /// Score a node for the given pod (0-10, higher is better)
    fn score(&self, pod: &PodSnapshot, node: &NodeInfo) -> ScoreResult;

    /// Score every node in `nodes`, in the order given
    fn prioritize(&self, pod: &PodSnapshot, nodes: &[NodeInfo]) -> Vec<ScoreResult> {
        nodes.iter().map(|node| self.score(pod, node)).collect()
    }

    /// Name of the scoring function
    fn name(&self) -> &str;
}

/// Score one resource dimension on a 0-10 scale, rising as the node fills up.
///
/// 0 when the node has no capacity or `requested` already exceeds it;
/// otherwise `11 - ceil(10 * (capacity - requested) / capacity)`, i.e. 1 for
/// an empty node. A node filled exactly to capacity is capped at 10.
pub fn most_requested_score(requested: i64, capacity: i64) -> i64 {
    if capacity <= 0 || requested > capacity {
        return 0;
    }

    let unused = i128::from(capacity - requested) * i128::from(MAX_PRIORITY);
    let capacity = i128::from(capacity);
    let headroom = (unused + capacity - 1) / capacity;

    (MAX_PRIORITY + 1 - headroom as i64).min(MAX_PRIORITY)
}

/// Score based on most requested resources (bin packing)
#[derive(Debug, Clone, Default)]
pub struct MostRequested {
    accountant: ResourceAccountant,
}

impl MostRequested {
    pub const NAME: &'static str = "MostRequested";
    /// Name older scheduler policies use for this priority
    pub const LEGACY_NAME: &'static str = "MostUsed";

    pub fn new(accountant: ResourceAccountant) -> Self {
        Self { accountant }
    }
}

impl ScoreFunction for MostRequested {
    fn score(&self, pod: &PodSnapshot, node: &NodeInfo) -> ScoreResult {
        let capacity = node.node.capacity;

        // The candidate is included so that differently sized empty nodes
        // still score differently
        let total = self.accountant.total_demand(&node.pods) + self.accountant.pod_demand(pod);

        let cpu_score = most_requested_score(total.cpu_millicores, capacity.cpu_millicores);
        let memory_score = most_requested_score(total.memory_bytes, capacity.memory_bytes);

        if cpu_score == 0 || memory_score == 0 {
            debug!(
                "Node {} cannot hold requested ({}) within capacity (cpu={}m memory={})",
                node.name(),
                total,
                capacity.cpu_millicores,
                capacity.memory_bytes
            );
        }

        // Either dimension being exhausted vetoes the node
        let score = if cpu_score != 0 && memory_score != 0 {
            (cpu_score + memory_score) / 2
        } else {
            0
        };

        debug!(
            "{} -> {}: most requested, requested ({}, {}) / capacity ({}, {}) score ({}, {}) = {}",
            pod.name,
            node.name(),
            total.cpu_millicores,
            total.memory_bytes,
            capacity.cpu_millicores,
            capacity.memory_bytes,
            cpu_score,
            memory_score,
            score
        );

        ScoreResult::new(node.name(), score)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}
