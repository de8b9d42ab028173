use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{WatchAccepted, WatchRequest};
use crate::web::{
    AppState,
    responses::{accepted, handle_error, no_content, ok},
};

/// Register a watch. The requester only learns that it was accepted.
pub async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<WatchRequest>,
) -> Response {
    debug!(
        "Watch request {} {}->{}",
        request.date, request.start_station, request.end_station
    );
    match state.jobs.register(request).await {
        Ok(job) => accepted(WatchAccepted {
            id: job.id,
            next_run_time: job.next_run_time,
        }),
        Err(e) => handle_error(AppError::from(e)),
    }
}

pub async fn list_jobs(State(state): State<AppState>) -> Response {
    match state.jobs.list().await {
        Ok(jobs) => ok(jobs),
        Err(e) => handle_error(AppError::from(e)),
    }
}

pub async fn get_job(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.jobs.get(id).await {
        Ok(job) => ok(job),
        Err(e) => handle_error(AppError::from(e)),
    }
}

pub async fn delete_job(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    match state.jobs.remove(id).await {
        Ok(()) => no_content(),
        Err(e) => handle_error(AppError::from(e)),
    }
}

pub async fn scheduler_stats(State(state): State<AppState>) -> Response {
    ok(state.scheduler.stats())
}
