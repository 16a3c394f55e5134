//! Scheduler policy: which plugins run and the values they are built with.
//!
//! Every field has a default, so an empty document is a valid policy.
//!
//! ```yaml
//! predicates: [PodOverCommitNode, NodeOutOfDisk, UniqueWorkload]
//! priorities:
//!   - name: MostRequested
//!     weight: 1
//! defaultRequests:
//!   cpuMillicores: 250
//!   memoryBytes: 524288000
//! uniqueWorkload:
//!   label: heritage
//!   value: deis
//! diskConditionTypes: [OutOfDisk, DiskPressure]
//! ```

use crate::accounting::DefaultRequests;
use crate::filter::{
    NodeOutOfDisk, PodOverCommitNode, UniqueWorkload, WorkloadMarker, DEFAULT_DISK_CONDITION_TYPES,
};
use crate::score::MostRequested;
use crate::{Result, SchedulerError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// A scoring function and how much it counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityPolicy {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: i64,
}

fn default_weight() -> i64 {
    1
}

impl PriorityPolicy {
    pub fn new(name: impl Into<String>, weight: i64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

/// Scheduler policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerPolicy {
    /// Predicates to run, in order
    pub predicates: Vec<String>,
    /// Scoring functions to run
    pub priorities: Vec<PriorityPolicy>,
    /// Values assumed for unset container requests/limits
    pub default_requests: DefaultRequests,
    /// Label marking workloads that must stay unique per node
    pub unique_workload: WorkloadMarker,
    /// Condition types meaning the node is out of disk
    pub disk_condition_types: Vec<String>,
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        Self {
            predicates: vec![
                PodOverCommitNode::NAME.to_string(),
                NodeOutOfDisk::NAME.to_string(),
                UniqueWorkload::NAME.to_string(),
            ],
            priorities: vec![PriorityPolicy::new(MostRequested::NAME, 1)],
            default_requests: DefaultRequests::default(),
            unique_workload: WorkloadMarker::default(),
            disk_condition_types: DEFAULT_DISK_CONDITION_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl SchedulerPolicy {
    /// Load and validate a policy from a YAML or JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let policy: Self = packsched_core::from_file(path)?;
        policy.validate()?;

        info!(
            "Loaded scheduler policy from {} ({} predicates, {} priorities)",
            path.display(),
            policy.predicates.len(),
            policy.priorities.len()
        );

        Ok(policy)
    }

    /// Check values the plugins cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.default_requests.cpu_millicores < 0 || self.default_requests.memory_bytes < 0 {
            return Err(SchedulerError::invalid_policy(
                "default requests must not be negative",
            ));
        }

        for priority in &self.priorities {
            if priority.weight <= 0 {
                return Err(SchedulerError::invalid_policy(format!(
                    "priority {} has weight {}",
                    priority.name, priority.weight
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for name in &self.predicates {
            if !seen.insert(name) {
                return Err(SchedulerError::invalid_policy(format!(
                    "predicate {} listed twice",
                    name
                )));
            }
        }

        let mut seen = BTreeSet::new();
        for priority in &self.priorities {
            if !seen.insert(&priority.name) {
                return Err(SchedulerError::invalid_policy(format!(
                    "priority {} listed twice",
                    priority.name
                )));
            }
        }

        if self.unique_workload.label.is_empty() {
            return Err(SchedulerError::invalid_policy(
                "unique workload label must not be empty",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_policy_is_valid() {
        let policy = SchedulerPolicy::default();
        assert!(policy.validate().is_ok());
        assert_eq!(policy.predicates.len(), 3);
        assert_eq!(policy.priorities, vec![PriorityPolicy::new("MostRequested", 1)]);
        assert_eq!(policy.default_requests.cpu_millicores, 250);
        assert_eq!(policy.default_requests.memory_bytes, 500 * 1024 * 1024);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let policy: SchedulerPolicy = serde_yaml::from_str("{}").unwrap();
        assert_eq!(policy, SchedulerPolicy::default());
    }

    #[test]
    fn test_partial_document() {
        let yaml = r#"
predicates: [PodOverCommitNode]
priorities:
  - name: MostRequested
defaultRequests:
  cpuMillicores: 100
uniqueWorkload:
  label: app.kubernetes.io/managed-by
  value: packer
"#;
        let policy: SchedulerPolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.predicates, vec!["PodOverCommitNode".to_string()]);
        assert_eq!(policy.priorities[0].weight, 1);
        assert_eq!(policy.default_requests.cpu_millicores, 100);
        // Unset field keeps its default
        assert_eq!(policy.default_requests.memory_bytes, 500 * 1024 * 1024);
        assert_eq!(policy.unique_workload.value, "packer");
        assert_eq!(policy.disk_condition_types.len(), 2);
    }

    #[test]
    fn test_validate_rejects_bad_weight() {
        let mut policy = SchedulerPolicy::default();
        policy.priorities[0].weight = 0;
        assert!(matches!(
            policy.validate(),
            Err(SchedulerError::InvalidPolicy { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_negative_defaults() {
        let mut policy = SchedulerPolicy::default();
        policy.default_requests.memory_bytes = -1;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut policy = SchedulerPolicy::default();
        policy.predicates.push("NodeOutOfDisk".to_string());
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, r#"{{"predicates": ["NodeOutOfDisk"], "priorities": []}}"#).unwrap();

        let policy = SchedulerPolicy::from_file(&path).unwrap();
        assert_eq!(policy.predicates, vec!["NodeOutOfDisk".to_string()]);
        assert!(policy.priorities.is_empty());
    }

    #[test]
    fn test_from_file_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.yaml");
        std::fs::write(&path, "priorities:\n  - name: MostRequested\n    weight: -2\n").unwrap();

        assert!(matches!(
            SchedulerPolicy::from_file(&path),
            Err(SchedulerError::InvalidPolicy { .. })
        ));
    }
}
