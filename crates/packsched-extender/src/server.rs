use crate::handlers::*;
use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Extender server configuration
#[derive(Clone)]
pub struct Config {
    /// Address to listen on
    pub listen_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 10262)),
        }
    }
}

/// Scheduler extender HTTP server
pub struct ExtenderServer {
    config: Config,
    state: Arc<AppState>,
}

impl ExtenderServer {
    /// Create a new extender server
    pub fn new(config: Config, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Build the router
    fn build_router(&self) -> Router {
        Router::new()
            // Health checks
            .route("/healthz", get(healthz))
            .route("/livez", get(livez))
            .route("/readyz", get(readyz))
            // Extender verbs
            .route("/filter", post(filter_nodes))
            .route("/prioritize", post(prioritize_nodes))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server
    pub async fn run(self) -> Result<(), std::io::Error> {
        let app = self.build_router();

        info!(
            "Starting scheduler extender on {} (predicates: {}, priorities: {})",
            self.config.listen_addr,
            self.state.scheduler.predicate_names().join(", "),
            self.state.scheduler.priority_names().join(", ")
        );

        let listener = TcpListener::bind(self.config.listen_addr).await?;

        axum::serve(listener, app).await
    }
}

/// Health check endpoint
async fn healthz() -> &'static str {
    "ok"
}

/// Liveness probe
async fn livez() -> &'static str {
    "ok"
}

/// Readiness probe
async fn readyz() -> &'static str {
    "ok"
}
