use crate::handlers::ExtenderArgs;
use crate::response::ApiResponse;
use crate::{AppState, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use packsched_scheduler::Scheduler;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Response body of `/filter`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtenderFilterResult {
    /// Nodes that passed every predicate
    pub node_names: Vec<String>,
    /// Rejected nodes mapped to the reason
    pub failed_nodes: BTreeMap<String, String>,
    /// Empty on success
    #[serde(default)]
    pub error: String,
}

/// Run the configured predicates over every node in `args`
pub fn filter_args(scheduler: &Scheduler, args: &ExtenderArgs) -> Result<ExtenderFilterResult> {
    let (pod, cluster) = args.snapshots()?;
    let outcome = scheduler.filter(&pod, &cluster)?;

    let failed_nodes = outcome
        .failed
        .into_iter()
        .map(|(name, decision)| {
            let reason = decision.reason.map(|r| r.to_string()).unwrap_or_default();
            (name, reason)
        })
        .collect();

    Ok(ExtenderFilterResult {
        node_names: outcome.feasible,
        failed_nodes,
        error: String::new(),
    })
}

/// POST /filter
pub async fn filter_nodes(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response> {
    let args = ExtenderArgs::from_body(&body)?;
    let result = filter_args(&state.scheduler, &args)?;

    info!(
        "Filtered {} nodes: {} feasible",
        args.nodes.len(),
        result.node_names.len()
    );

    Ok(ApiResponse::ok(result).into_response())
}
