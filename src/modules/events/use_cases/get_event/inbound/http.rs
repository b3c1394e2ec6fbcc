use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::shared::core::error_response::ErrorResponse;
use crate::shared::infrastructure::event_store::EventStore;
use crate::shell::state::AppState;

pub async fn handle(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_details(
                "Invalid event id",
                format!("{id} is not a UUID"),
            )),
        )
            .into_response();
    };

    match state.event_store.read(id).await {
        Ok(Some(event)) => Json(event).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(format!("Event {id} not found"))),
        )
            .into_response(),
        Err(error) => {
            tracing::error!(%id, %error, "failed to read event");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Event store unavailable")),
            )
                .into_response()
        }
    }
}
