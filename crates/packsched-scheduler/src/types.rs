use packsched_core::{
    parse_count, parse_cpu, parse_memory, Node, PackschedError, Pod, Quantity, Resource,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// CPU and memory footprint, of a single container or summed over pods
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceDemand {
    /// CPU in millicores (1000 = 1 core)
    pub cpu_millicores: i64,
    /// Memory in bytes
    pub memory_bytes: i64,
}

impl ResourceDemand {
    pub const ZERO: Self = Self {
        cpu_millicores: 0,
        memory_bytes: 0,
    };

    pub fn new(cpu_millicores: i64, memory_bytes: i64) -> Self {
        Self {
            cpu_millicores,
            memory_bytes,
        }
    }
}

impl Add for ResourceDemand {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            cpu_millicores: self.cpu_millicores.saturating_add(rhs.cpu_millicores),
            memory_bytes: self.memory_bytes.saturating_add(rhs.memory_bytes),
        }
    }
}

impl AddAssign for ResourceDemand {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for ResourceDemand {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for ResourceDemand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cpu={}m memory={}", self.cpu_millicores, self.memory_bytes)
    }
}

/// Capacity a node advertises in `status.capacity`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCapacity {
    /// Maximum number of pods
    pub pods: i64,
    /// CPU in millicores
    pub cpu_millicores: i64,
    /// Memory in bytes
    pub memory_bytes: i64,
}

impl NodeCapacity {
    pub fn new(pods: i64, cpu_millicores: i64, memory_bytes: i64) -> Self {
        Self {
            pods,
            cpu_millicores,
            memory_bytes,
        }
    }
}

/// One condition from `status.conditions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConditionSnapshot {
    /// Condition type, e.g. `OutOfDisk` or `Ready`
    pub condition_type: String,
    /// Raw status, normally `True`, `False` or `Unknown`
    pub status: String,
}

impl NodeConditionSnapshot {
    pub fn new(condition_type: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            condition_type: condition_type.into(),
            status: status.into(),
        }
    }

    /// Whether the status reads `True` (case-insensitive)
    pub fn is_true(&self) -> bool {
        self.status.eq_ignore_ascii_case("true")
    }
}

/// Read-only view of a candidate node at decision time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Node name
    pub name: String,
    /// Advertised capacity
    pub capacity: NodeCapacity,
    /// Last reported conditions
    pub conditions: Vec<NodeConditionSnapshot>,
}

impl NodeSnapshot {
    /// Create a snapshot with no reported conditions
    pub fn new(name: impl Into<String>, capacity: NodeCapacity) -> Self {
        Self {
            name: name.into(),
            capacity,
            conditions: Vec::new(),
        }
    }

    /// Add a reported condition
    pub fn with_condition(
        mut self,
        condition_type: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        self.conditions
            .push(NodeConditionSnapshot::new(condition_type, status));
        self
    }
}

impl TryFrom<&Node> for NodeSnapshot {
    type Error = PackschedError;

    fn try_from(node: &Node) -> Result<Self, Self::Error> {
        let name = node
            .metadata
            .name
            .clone()
            .ok_or_else(|| PackschedError::missing_field("Node", "metadata.name"))?;

        let status = node.status.as_ref();

        // Absent capacity entries read as zero
        let capacity = match status.and_then(|s| s.capacity.as_ref()) {
            Some(capacity) => NodeCapacity {
                pods: quantity(capacity, "pods", parse_count)?.unwrap_or(0),
                cpu_millicores: quantity(capacity, "cpu", parse_cpu)?.unwrap_or(0),
                memory_bytes: quantity(capacity, "memory", parse_memory)?.unwrap_or(0),
            },
            None => NodeCapacity::default(),
        };

        let conditions = status
            .and_then(|s| s.conditions.as_ref())
            .map(|conditions| {
                conditions
                    .iter()
                    .map(|c| NodeConditionSnapshot::new(&c.type_, &c.status))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            name,
            capacity,
            conditions,
        })
    }
}

/// CPU/memory a container declares in one of `requests` or `limits`.
///
/// `None` means the value was never set; `Some(0)` means explicitly zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredResources {
    pub cpu_millicores: Option<i64>,
    pub memory_bytes: Option<i64>,
}

impl DeclaredResources {
    /// Both values explicitly declared
    pub fn new(cpu_millicores: i64, memory_bytes: i64) -> Self {
        Self {
            cpu_millicores: Some(cpu_millicores),
            memory_bytes: Some(memory_bytes),
        }
    }

    /// Neither value declared
    pub fn unset() -> Self {
        Self::default()
    }

    fn from_k8s_resource_map(
        resources: Option<&BTreeMap<String, Quantity>>,
    ) -> Result<Self, PackschedError> {
        let Some(resources) = resources else {
            return Ok(Self::unset());
        };

        Ok(Self {
            cpu_millicores: quantity(resources, "cpu", parse_cpu)?,
            memory_bytes: quantity(resources, "memory", parse_memory)?,
        })
    }
}

/// Declared requests and limits of one container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerResources {
    pub requests: DeclaredResources,
    pub limits: DeclaredResources,
}

impl ContainerResources {
    pub fn new(requests: DeclaredResources, limits: DeclaredResources) -> Self {
        Self { requests, limits }
    }

    /// Only requests declared, limits unset
    pub fn requests(cpu_millicores: i64, memory_bytes: i64) -> Self {
        Self::new(
            DeclaredResources::new(cpu_millicores, memory_bytes),
            DeclaredResources::unset(),
        )
    }
}

/// Read-only view of a pod: labels plus per-container resources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSnapshot {
    /// Name for logs (`namespace/name`)
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub containers: Vec<ContainerResources>,
}

impl PodSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_container(mut self, container: ContainerResources) -> Self {
        self.containers.push(container);
        self
    }
}

impl TryFrom<&Pod> for PodSnapshot {
    type Error = PackschedError;

    fn try_from(pod: &Pod) -> Result<Self, Self::Error> {
        let containers = match &pod.spec {
            Some(spec) => spec
                .containers
                .iter()
                .map(|container| {
                    let resources = container.resources.as_ref();
                    Ok(ContainerResources {
                        requests: DeclaredResources::from_k8s_resource_map(
                            resources.and_then(|r| r.requests.as_ref()),
                        )?,
                        limits: DeclaredResources::from_k8s_resource_map(
                            resources.and_then(|r| r.limits.as_ref()),
                        )?,
                    })
                })
                .collect::<Result<Vec<_>, PackschedError>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            name: pod.display_name(),
            labels: pod.metadata.labels.clone().unwrap_or_default(),
            containers,
        })
    }
}

/// A node together with the pods already bound to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub node: NodeSnapshot,
    pub pods: Vec<PodSnapshot>,
}

impl NodeInfo {
    pub fn new(node: NodeSnapshot, pods: Vec<PodSnapshot>) -> Self {
        Self { node, pods }
    }

    /// Build from the Kubernetes objects
    pub fn from_objects(node: &Node, pods: &[Pod]) -> Result<Self, PackschedError> {
        let node = NodeSnapshot::try_from(node)?;
        let pods = pods
            .iter()
            .map(PodSnapshot::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { node, pods })
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }
}

/// Why a predicate turned a node down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// Node would exceed its pod count
    ExceedsPodCapacity,
    /// Node would be overcommitted on CPU
    ExceedsCpu,
    /// Node would be overcommitted on memory
    ExceedsMemory,
    /// Node reports it is out of disk
    DiskPressure,
    /// Node already runs a pod with the same workload labels
    DuplicateWorkload,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            RejectReason::ExceedsPodCapacity => "Node would exceed pod capacity",
            RejectReason::ExceedsCpu => "Node would be overcommitted on CPU",
            RejectReason::ExceedsMemory => "Node would be overcommitted on memory",
            RejectReason::DiskPressure => "Node is reporting out of disk",
            RejectReason::DuplicateWorkload => "Node already runs this workload version",
        };
        f.write_str(message)
    }
}

/// Result of running a predicate against a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementDecision {
    /// Node name
    pub node_name: String,
    /// Rejection reason; `None` means the node was admitted
    pub reason: Option<RejectReason>,
}

impl PlacementDecision {
    /// Create an admitting decision
    pub fn admit(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            reason: None,
        }
    }

    /// Create a rejecting decision
    pub fn reject(node_name: impl Into<String>, reason: RejectReason) -> Self {
        Self {
            node_name: node_name.into(),
            reason: Some(reason),
        }
    }

    pub fn is_admitted(&self) -> bool {
        self.reason.is_none()
    }
}

/// Result of scoring a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Node name
    pub node_name: String,
    /// Score, higher is better
    pub score: i64,
}

impl ScoreResult {
    /// Create a new score result
    pub fn new(node_name: impl Into<String>, score: i64) -> Self {
        Self {
            node_name: node_name.into(),
            score,
        }
    }
}

fn quantity(
    resources: &BTreeMap<String, Quantity>,
    key: &str,
    parse: fn(&str) -> packsched_core::Result<i64>,
) -> Result<Option<i64>, PackschedError> {
    resources.get(key).map(|q| parse(&q.0)).transpose()
}
