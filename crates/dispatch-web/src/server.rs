//! Router assembly and HTTP server startup.
//!
//! Composes the Axum router the way the teacher's `WebServer` does:
//! build the route groups, layer auth per group, then CORS and request
//! tracing over the whole thing.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use dispatch_auth::Keys;
use dispatch_core::Scheduler;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth_middleware::{admin_auth, nodes_auth};
use crate::state::AppState;
use crate::{admin, node};

/// Bind address configuration for the HTTP listener.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// e.g. `:1323` or `0.0.0.0:1323`.
    pub listen_addr: String,
}

/// The dispatcher's HTTP server.
pub struct WebServer {
    config: WebConfig,
    state: Arc<AppState>,
}

impl WebServer {
    pub fn new(config: WebConfig, scheduler: Scheduler, keys: Keys) -> Self {
        let state = Arc::new(AppState {
            scheduler,
            keys: Arc::new(keys),
        });
        Self { config, state }
    }

    /// Build the full Axum router. Exposed so tests can drive it directly
    /// without binding a socket.
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state))
    }

    /// Start the server and block until it is shut down.
    pub async fn start(self) -> std::io::Result<()> {
        let router = self.router();

        tracing::info!(addr = %self.config.listen_addr, "starting web server");

        let listener = tokio::net::TcpListener::bind(&self.config.listen_addr).await?;
        axum::serve(listener, router).await
    }

    /// Start the server, shutting down gracefully (in-flight requests are
    /// allowed to finish) once `shutdown` resolves.
    pub async fn start_with_graceful_shutdown(
        self,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let router = self.router();

        tracing::info!(addr = %self.config.listen_addr, "starting web server");

        let listener = tokio::net::TcpListener::bind(&self.config.listen_addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// Assemble the admin and node route groups, each gated by its own realm,
/// under shared CORS and request-tracing layers.
pub fn build_router(state: Arc<AppState>) -> Router {
    let admin_routes = Router::new()
        .route("/admin/jobs", post(admin::submit_job))
        .route("/admin/jobs/{job_id}", get(admin::get_job))
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth));

    let node_routes = Router::new()
        .route(
            "/organizations/{org}/foodtruck/nodes/{name}/tasks/next",
            post(node::claim_next_task),
        )
        .route(
            "/organizations/{org}/foodtruck/nodes/{name}/tasks/status",
            post(node::update_status),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), nodes_auth));

    Router::new()
        .merge(admin_routes)
        .merge(node_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
