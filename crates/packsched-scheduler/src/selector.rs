use std::collections::BTreeMap;

/// Equality-based label selector: every requirement must hold
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: BTreeMap<String, String>,
}

impl LabelSelector {
    /// Selector requiring every `key=value` pair in `labels`
    pub fn from_labels(labels: &BTreeMap<String, String>) -> Self {
        Self {
            requirements: labels.clone(),
        }
    }

    /// Whether `labels` satisfies all requirements.
    ///
    /// Extra labels are ignored, so an empty selector matches everything.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}
