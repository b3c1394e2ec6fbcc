use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::shared::core::error_response::ErrorResponse;
use crate::shared::infrastructure::event_store::{EventStore, EventStoreError, StoredEvent};
use crate::shell::state::AppState;

fn respond(result: Result<Vec<StoredEvent>, EventStoreError>) -> Response {
    match result {
        Ok(events) => Json(events).into_response(),
        Err(error) => {
            tracing::error!(%error, "failed to list events");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Event store unavailable")),
            )
                .into_response()
        }
    }
}

/// The subject's full stream in version order.
pub async fn by_subject(State(state): State<AppState>, Path(subject): Path<String>) -> Response {
    respond(state.event_store.read_stream(&subject, 0).await)
}

/// Every event of one type in commit order.
pub async fn by_type(State(state): State<AppState>, Path(event_type): Path<String>) -> Response {
    respond(state.event_store.list_by_type(&event_type).await)
}
