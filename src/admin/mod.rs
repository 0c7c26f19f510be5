//! Admin API for breaker inspection and recovery.
//!
//! # Routes
//! ```text
//! GET  /admin/status               → version, store kind, breaker count
//! GET  /admin/breakers             → snapshot of every registered breaker
//! GET  /admin/breakers/{key}       → one snapshot, 404 if unknown
//! POST /admin/breakers/{key}/reset → force closed, return snapshot
//! ```
//!
//! All routes require `Authorization: Bearer <admin.api_key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::resilience::CircuitBreakerRegistry;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State injected into admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub registry: Arc<CircuitBreakerRegistry>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(registry: Arc<CircuitBreakerRegistry>, api_key: &str) -> Self {
        Self {
            registry,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/breakers", get(list_breakers))
        .route("/admin/breakers/{key}", get(get_breaker))
        .route("/admin/breakers/{key}/reset", post(reset_breaker))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the admin API until a shutdown signal is received.
pub async fn serve(
    listener: TcpListener,
    state: AdminState,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Admin API listening");

    axum::serve(listener, setup_admin_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("Admin API stopped");
    Ok(())
}
