use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::shared::core::error_response::ErrorResponse;
use crate::shell::state::AppState;

fn unavailable(error: anyhow::Error) -> Response {
    tracing::error!(%error, "failed to query read models");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Read model store unavailable")),
    )
        .into_response()
}

/// 404 until the projector has applied at least one event for the aggregate.
pub async fn handle(
    State(state): State<AppState>,
    Path((aggregate_type, id)): Path<(String, String)>,
) -> Response {
    match state.queries.find(&aggregate_type, &id).await {
        Ok(Some(model)) => Json(model).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!(
                "Aggregate {aggregate_type}/{id} not found"
            ))),
        )
            .into_response(),
        Err(error) => unavailable(error),
    }
}

pub async fn list(State(state): State<AppState>, Path(aggregate_type): Path<String>) -> Response {
    match state.queries.list_by_type(&aggregate_type).await {
        Ok(models) => Json(models).into_response(),
        Err(error) => unavailable(error),
    }
}
