use crate::accounting::ResourceAccountant;
use crate::filter::{FilterPredicate, NodeOutOfDisk, PodOverCommitNode, UniqueWorkload};
use crate::policy::SchedulerPolicy;
use crate::score::{MostRequested, ScoreFunction};
use crate::scheduler::{Scheduler, WeightedPriority};
use crate::{Result, SchedulerError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Name-keyed set of predicates and scoring functions.
///
/// Built explicitly at startup; the scheduler picks its plugins from here
/// according to the policy.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    predicates: BTreeMap<String, Arc<dyn FilterPredicate>>,
    priorities: BTreeMap<String, Arc<dyn ScoreFunction>>,
    /// Alternate names, mapped to the registered name
    aliases: BTreeMap<String, String>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in plugins, configured from `policy`
    pub fn from_policy(policy: &SchedulerPolicy) -> Self {
        let accountant = ResourceAccountant::new(policy.default_requests);

        let mut registry = Self::new();
        registry.register_predicate(Arc::new(PodOverCommitNode::new(accountant)));
        registry.register_predicate(Arc::new(NodeOutOfDisk::new(
            policy.disk_condition_types.clone(),
        )));
        registry.register_predicate(Arc::new(UniqueWorkload::new(
            policy.unique_workload.clone(),
        )));
        registry.register_priority(Arc::new(MostRequested::new(accountant)));

        registry.register_alias(UniqueWorkload::LEGACY_NAME, UniqueWorkload::NAME);
        registry.register_alias(MostRequested::LEGACY_NAME, MostRequested::NAME);
        registry
    }

    /// Make `alias` resolve to the plugin registered as `name`
    pub fn register_alias(&mut self, alias: impl Into<String>, name: impl Into<String>) {
        self.aliases.insert(alias.into(), name.into());
    }

    fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Register a predicate under its own name, replacing any previous one
    pub fn register_predicate(&mut self, predicate: Arc<dyn FilterPredicate>) {
        debug!("Registering predicate {}", predicate.name());
        self.predicates
            .insert(predicate.name().to_string(), predicate);
    }

    /// Register a scoring function under its own name, replacing any previous one
    pub fn register_priority(&mut self, priority: Arc<dyn ScoreFunction>) {
        debug!("Registering priority {}", priority.name());
        self.priorities.insert(priority.name().to_string(), priority);
    }

    pub fn predicate(&self, name: &str) -> Option<Arc<dyn FilterPredicate>> {
        self.predicates.get(self.resolve(name)).cloned()
    }

    pub fn priority(&self, name: &str) -> Option<Arc<dyn ScoreFunction>> {
        self.priorities.get(self.resolve(name)).cloned()
    }

    pub fn predicate_names(&self) -> Vec<&str> {
        self.predicates.keys().map(String::as_str).collect()
    }

    pub fn priority_names(&self) -> Vec<&str> {
        self.priorities.keys().map(String::as_str).collect()
    }

    /// Build a scheduler running the plugins `policy` names, in policy order
    pub fn build(&self, policy: &SchedulerPolicy) -> Result<Scheduler> {
        policy.validate()?;

        let predicates = policy
            .predicates
            .iter()
            .map(|name| {
                self.predicate(name).ok_or_else(|| {
                    SchedulerError::unknown_plugin(
                        "predicate",
                        name,
                        self.predicate_names().join(", "),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let priorities = policy
            .priorities
            .iter()
            .map(|p| -> Result<WeightedPriority> {
                let function = self.priority(&p.name).ok_or_else(|| {
                    SchedulerError::unknown_plugin(
                        "priority",
                        &p.name,
                        self.priority_names().join(", "),
                    )
                })?;
                Ok(WeightedPriority::new(function, p.weight))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Scheduler::new(predicates, priorities))
    }
}
