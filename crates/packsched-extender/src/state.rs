use packsched_scheduler::Scheduler;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configured scheduler, shared read-only across requests
    pub scheduler: Arc<Scheduler>,
}

impl AppState {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler: Arc::new(scheduler),
        }
    }
}
