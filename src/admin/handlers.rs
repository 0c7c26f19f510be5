use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use crate::admin::AdminState;
use crate::resilience::BreakerSnapshot;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub store: String,
    pub breakers: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        store: state.registry.store_kind().to_string(),
        breakers: state.registry.len(),
    })
}

pub async fn list_breakers(State(state): State<AdminState>) -> Json<Vec<BreakerSnapshot>> {
    let mut snapshots = Vec::new();
    for breaker in state.registry.breakers() {
        snapshots.push(breaker.snapshot().await);
    }
    Json(snapshots)
}

pub async fn get_breaker(
    State(state): State<AdminState>,
    Path(key): Path<String>,
) -> Result<Json<BreakerSnapshot>, StatusCode> {
    let breaker = state.registry.get(&key).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(breaker.snapshot().await))
}

pub async fn reset_breaker(
    State(state): State<AdminState>,
    Path(key): Path<String>,
) -> Result<Json<BreakerSnapshot>, StatusCode> {
    let breaker = state.registry.get(&key).ok_or(StatusCode::NOT_FOUND)?;
    tracing::info!(breaker = %key, "Manual reset requested via admin API");
    breaker.reset().await;
    Ok(Json(breaker.snapshot().await))
}
