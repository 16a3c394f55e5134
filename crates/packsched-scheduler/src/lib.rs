//! Packsched Scheduler - Packing placement for pods
//!
//! This crate provides:
//! - Resource accounting with default requests for unset values
//! - Filter predicates (pod overcommit, out of disk, unique workload)
//! - Scoring function (most requested)
//! - Plugin registry and policy configuration
//! - Scheduling over a node lister

pub mod accounting;
pub mod error;
pub mod filter;
pub mod lister;
pub mod policy;
pub mod registry;
pub mod scheduler;
pub mod score;
pub mod selector;
pub mod types;

// Re-export commonly used types
pub use accounting::{DefaultRequests, ResourceAccountant};
pub use error::{Result, SchedulerError};
pub use filter::{FilterPredicate, NodeOutOfDisk, PodOverCommitNode, UniqueWorkload, WorkloadMarker};
pub use lister::{ClusterDocument, ClusterSnapshot, NodeLister, NodeObjects};
pub use policy::{PriorityPolicy, SchedulerPolicy};
pub use registry::PluginRegistry;
pub use scheduler::{FilterOutcome, ScheduleResult, Scheduler, WeightedPriority};
pub use score::{most_requested_score, MostRequested, ScoreFunction, MAX_PRIORITY};
pub use types::{
    ContainerResources, DeclaredResources, NodeCapacity, NodeConditionSnapshot, NodeInfo,
    NodeSnapshot, PlacementDecision, PodSnapshot, RejectReason, ResourceDemand, ScoreResult,
};
