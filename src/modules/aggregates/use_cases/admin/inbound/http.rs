// Admin surface for the projection pipeline.
//
// Every mutation goes through the projector's command channel so the projector
// stays the only writer of the read model store.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::modules::aggregates::use_cases::project_events::runner::ProjectorHandleError;
use crate::modules::aggregates::use_cases::project_events::status::Health;
use crate::shared::core::error_response::ErrorResponse;
use crate::shell::state::AppState;

#[derive(Serialize)]
pub struct TriggerResponse {
    pub processed: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayResponse {
    pub events_replayed: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

fn projector_error(error: ProjectorHandleError) -> Response {
    tracing::error!(%error, "projector command failed");
    let status = match error {
        ProjectorHandleError::Stopped => StatusCode::SERVICE_UNAVAILABLE,
        ProjectorHandleError::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse::with_details(
            "Projection unavailable",
            error.to_string(),
        )),
    )
        .into_response()
}

pub async fn trigger(State(state): State<AppState>) -> Response {
    match state.projector.trigger().await {
        Ok(processed) => Json(TriggerResponse { processed }).into_response(),
        Err(error) => projector_error(error),
    }
}

pub async fn replay(State(state): State<AppState>) -> Response {
    // Full replay only; a fromEventId query parameter is not supported.
    match state.projector.replay().await {
        Ok(events_replayed) => {
            tracing::info!(events_replayed, "replay requested through admin endpoint");
            Json(ReplayResponse { events_replayed }).into_response()
        }
        Err(error) => projector_error(error),
    }
}

pub async fn status(State(state): State<AppState>) -> Response {
    match state.projector.status().await {
        Ok(status) => Json(status).into_response(),
        Err(error) => projector_error(error),
    }
}

pub async fn dead_letters(State(state): State<AppState>) -> Response {
    match state.queries.dead_letters().await {
        Ok(letters) => Json(letters).into_response(),
        Err(error) => {
            tracing::error!(%error, "failed to list dead letters");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Read model store unavailable")),
            )
                .into_response()
        }
    }
}

/// 503 once projection lag crosses the critical threshold.
pub async fn health(State(state): State<AppState>) -> Response {
    match state.projector.status().await {
        Ok(status) if status.health == Health::Critical => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse { status: "DOWN" }),
        )
            .into_response(),
        Ok(_) => Json(HealthResponse { status: "UP" }).into_response(),
        Err(error) => {
            tracing::warn!(%error, "health check could not reach the projector");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse { status: "DOWN" }),
            )
                .into_response()
        }
    }
}
