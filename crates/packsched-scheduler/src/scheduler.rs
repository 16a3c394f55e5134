use crate::filter::FilterPredicate;
use crate::lister::NodeLister;
use crate::policy::SchedulerPolicy;
use crate::registry::PluginRegistry;
use crate::score::ScoreFunction;
use crate::types::{NodeInfo, PlacementDecision, PodSnapshot, ScoreResult};
use crate::{Result, SchedulerError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A scoring function and its weight in the combined score
#[derive(Clone)]
pub struct WeightedPriority {
    pub function: Arc<dyn ScoreFunction>,
    pub weight: i64,
}

impl WeightedPriority {
    pub fn new(function: Arc<dyn ScoreFunction>, weight: i64) -> Self {
        Self { function, weight }
    }
}

/// Outcome of the filter phase
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterOutcome {
    /// Nodes every predicate admitted, in lister order
    pub feasible: Vec<String>,
    /// Rejected nodes and the first predicate decision that turned them down
    pub failed: BTreeMap<String, PlacementDecision>,
}

/// Outcome of a full scheduling attempt
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleResult {
    /// Chosen node
    pub node_name: String,
    /// Combined score of the chosen node
    pub score: i64,
    /// Combined scores of every feasible node, best first
    pub scores: Vec<ScoreResult>,
    /// Nodes filtered out
    pub failed: BTreeMap<String, PlacementDecision>,
}

/// Runs predicates, then scoring functions, over a set of nodes.
///
/// Holds no mutable state; one instance can serve concurrent callers.
#[derive(Clone)]
pub struct Scheduler {
    predicates: Vec<Arc<dyn FilterPredicate>>,
    priorities: Vec<WeightedPriority>,
}

impl Scheduler {
    /// Create a scheduler from explicit plugin lists
    pub fn new(
        predicates: Vec<Arc<dyn FilterPredicate>>,
        priorities: Vec<WeightedPriority>,
    ) -> Self {
        Self {
            predicates,
            priorities,
        }
    }

    /// Create a scheduler with the built-in plugins selected by `policy`
    pub fn from_policy(policy: &SchedulerPolicy) -> Result<Self> {
        PluginRegistry::from_policy(policy).build(policy)
    }

    pub fn predicate_names(&self) -> Vec<&str> {
        self.predicates.iter().map(|p| p.name()).collect()
    }

    pub fn priority_names(&self) -> Vec<&str> {
        self.priorities.iter().map(|p| p.function.name()).collect()
    }

    /// Run every predicate against one node, stopping at the first rejection
    pub fn check_node(&self, pod: &PodSnapshot, node: &NodeInfo) -> PlacementDecision {
        for predicate in &self.predicates {
            let decision = predicate.filter(pod, node);
            if !decision.is_admitted() {
                debug!(
                    "Node {} filtered out by {}: {}",
                    node.name(),
                    predicate.name(),
                    decision
                        .reason
                        .map(|r| r.to_string())
                        .unwrap_or_default()
                );
                return decision;
            }
        }

        PlacementDecision::admit(node.name())
    }

    /// Weighted score of one node, saturating at `i64::MAX`
    pub fn score_node(&self, pod: &PodSnapshot, node: &NodeInfo) -> ScoreResult {
        let score = self.priorities.iter().fold(0i64, |total, p| {
            let weighted = p.weight.saturating_mul(p.function.score(pod, node).score);
            total.saturating_add(weighted)
        });

        ScoreResult::new(node.name(), score)
    }

    /// Phase 1: split the lister's nodes into feasible and rejected
    pub fn filter(&self, pod: &PodSnapshot, lister: &dyn NodeLister) -> Result<FilterOutcome> {
        let mut outcome = FilterOutcome::default();

        for node_name in lister.node_names()? {
            let node = lister.node_info(&node_name)?;
            let decision = self.check_node(pod, &node);

            if decision.is_admitted() {
                outcome.feasible.push(node_name);
            } else {
                outcome.failed.insert(node_name, decision);
            }
        }

        info!(
            "Pod {} has {} feasible nodes ({} filtered out)",
            pod.name,
            outcome.feasible.len(),
            outcome.failed.len()
        );

        Ok(outcome)
    }

    /// Phase 2: score the named nodes, in the order given
    pub fn prioritize(
        &self,
        pod: &PodSnapshot,
        node_names: &[String],
        lister: &dyn NodeLister,
    ) -> Result<Vec<ScoreResult>> {
        node_names
            .iter()
            .map(|name| {
                let node = lister.node_info(name)?;
                Ok(self.score_node(pod, &node))
            })
            .collect()
    }

    /// Filter, score and pick the best node.
    ///
    /// Ties go to the lexicographically smallest node name.
    pub fn schedule(&self, pod: &PodSnapshot, lister: &dyn NodeLister) -> Result<ScheduleResult> {
        let FilterOutcome { feasible, failed } = self.filter(pod, lister)?;

        if feasible.is_empty() {
            let reason = if failed.is_empty() {
                "no nodes available".to_string()
            } else {
                failed
                    .iter()
                    .map(|(name, decision)| {
                        format!(
                            "{}: {}",
                            name,
                            decision.reason.map(|r| r.to_string()).unwrap_or_default()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            return Err(SchedulerError::no_suitable_nodes(&pod.name, reason));
        }

        let mut scores = self.prioritize(pod, &feasible, lister)?;
        scores.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.node_name.cmp(&b.node_name))
        });

        let best = scores
            .first()
            .cloned()
            .ok_or_else(|| SchedulerError::internal_error("No nodes scored"))?;

        info!(
            "Selected node {} for pod {} with score {}",
            best.node_name, pod.name, best.score
        );

        Ok(ScheduleResult {
            node_name: best.node_name,
            score: best.score,
            scores,
            failed,
        })
    }
}
