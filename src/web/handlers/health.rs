use axum::{extract::State, response::Response};

use crate::web::{
    AppState,
    responses::{HealthResponse, ok},
};

/// Liveness plus database connectivity and firing counters
pub async fn health_check(State(state): State<AppState>) -> Response {
    let database = match &state.database {
        Some(db) if db.health_check().await => "connected",
        Some(_) => "disconnected",
        None => "in-memory",
    };

    let jobs = state.jobs.list().await.map(|j| j.len()).unwrap_or(0);
    let status = if database == "disconnected" {
        "unhealthy"
    } else {
        "healthy"
    };

    ok(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        jobs,
        firings: state.scheduler.stats(),
    })
}
