//! Resource accounting for packing decisions.
//!
//! A container's footprint is the larger of its request and its limit. Any
//! value the container leaves unset counts as a fixed default rather than
//! zero, so pods without requests still look like they occupy a node and do
//! not all stack onto whichever node currently appears emptiest.

use crate::types::{ContainerResources, DeclaredResources, PodSnapshot, ResourceDemand};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// CPU assumed for a container that does not declare one (0.25 core)
pub const DEFAULT_MILLI_CPU_REQUEST: i64 = 250;

/// Memory assumed for a container that does not declare one (500 MiB)
pub const DEFAULT_MEMORY_REQUEST: i64 = 500 * 1024 * 1024;

/// Values substituted for unset CPU/memory declarations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DefaultRequests {
    pub cpu_millicores: i64,
    pub memory_bytes: i64,
}

impl Default for DefaultRequests {
    fn default() -> Self {
        Self {
            cpu_millicores: DEFAULT_MILLI_CPU_REQUEST,
            memory_bytes: DEFAULT_MEMORY_REQUEST,
        }
    }
}

/// Converts declared container resources into effective demand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceAccountant {
    defaults: DefaultRequests,
}

impl ResourceAccountant {
    pub fn new(defaults: DefaultRequests) -> Self {
        Self { defaults }
    }

    /// Substitute defaults for unset values. Explicit zero stays zero.
    fn non_zero(&self, declared: &DeclaredResources) -> ResourceDemand {
        ResourceDemand {
            cpu_millicores: declared
                .cpu_millicores
                .unwrap_or(self.defaults.cpu_millicores)
                .max(0),
            memory_bytes: declared
                .memory_bytes
                .unwrap_or(self.defaults.memory_bytes)
                .max(0),
        }
    }

    /// Effective demand of a single container
    pub fn container_demand(&self, container: &ContainerResources) -> ResourceDemand {
        let requests = self.non_zero(&container.requests);
        let limits = self.non_zero(&container.limits);

        trace!("Requests: ({}) Limits: ({})", requests, limits);

        ResourceDemand {
            cpu_millicores: requests.cpu_millicores.max(limits.cpu_millicores),
            memory_bytes: requests.memory_bytes.max(limits.memory_bytes),
        }
    }

    /// Effective demand of a pod, summed over its containers
    pub fn pod_demand(&self, pod: &PodSnapshot) -> ResourceDemand {
        pod.containers
            .iter()
            .map(|container| self.container_demand(container))
            .sum()
    }

    /// Effective demand of a set of pods
    pub fn total_demand<'a>(
        &self,
        pods: impl IntoIterator<Item = &'a PodSnapshot>,
    ) -> ResourceDemand {
        pods.into_iter().map(|pod| self.pod_demand(pod)).sum()
    }
}
