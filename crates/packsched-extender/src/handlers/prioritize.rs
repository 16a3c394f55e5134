use crate::handlers::ExtenderArgs;
use crate::response::ApiResponse;
use crate::{AppState, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use packsched_scheduler::{NodeLister, Scheduler};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// One entry of the `/prioritize` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPriority {
    pub host: String,
    pub score: i64,
}

/// Score every node in `args` with the configured priorities
pub fn prioritize_args(scheduler: &Scheduler, args: &ExtenderArgs) -> Result<Vec<HostPriority>> {
    let (pod, cluster) = args.snapshots()?;
    let node_names = cluster.node_names()?;

    Ok(scheduler
        .prioritize(&pod, &node_names, &cluster)?
        .into_iter()
        .map(|s| HostPriority {
            host: s.node_name,
            score: s.score,
        })
        .collect())
}

/// POST /prioritize
pub async fn prioritize_nodes(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response> {
    let args = ExtenderArgs::from_body(&body)?;
    let priorities = prioritize_args(&state.scheduler, &args)?;

    info!("Prioritized {} nodes", priorities.len());

    Ok(ApiResponse::ok(priorities).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{body_json, node, pod, state};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_prioritize_nodes() {
        let body = json!({
            "pod": pod("api", "1", "2Gi"),
            "nodes": [
                {"node": node("empty", "4", "8Gi"), "pods": []},
                {"node": node("busy", "4", "8Gi"), "pods": [pod("web", "2", "4Gi")]}
            ]
        });

        let response = prioritize_nodes(State(state()), Bytes::from(body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let priorities: Vec<HostPriority> =
            serde_json::from_value(body_json(response.into_body()).await).unwrap();
        assert_eq!(
            priorities,
            vec![
                HostPriority {
                    host: "busy".to_string(),
                    score: 8
                },
                HostPriority {
                    host: "empty".to_string(),
                    score: 3
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_prioritize_overcommitted_node_scores_zero() {
        let body = json!({
            "pod": pod("api", "2", "1Gi"),
            "nodes": [{"node": node("tiny", "1", "8Gi"), "pods": []}]
        });

        let response = prioritize_nodes(State(state()), Bytes::from(body.to_string()))
            .await
            .unwrap();
        let value = body_json(response.into_body()).await;
        assert_eq!(value, json!([{"host": "tiny", "score": 0}]));
    }

    #[tokio::test]
    async fn test_prioritize_rejects_nameless_node() {
        let body = json!({
            "pod": pod("api", "1", "1Gi"),
            "nodes": [{"node": {"metadata": {}}, "pods": []}]
        });

        let err = prioritize_nodes(State(state()), Bytes::from(body.to_string()))
            .await
            .err()
            .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
