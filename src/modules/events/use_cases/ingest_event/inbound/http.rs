use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::modules::events::use_cases::ingest_event::command::IngestEvent;
use crate::modules::events::use_cases::ingest_event::handler::IngestError;
use crate::shared::core::error_response::ErrorResponse;
use crate::shared::infrastructure::event_store::AppendOutcome;
use crate::shell::state::AppState;

pub async fn handle(
    State(state): State<AppState>,
    body: Result<Json<IngestEvent>, JsonRejection>,
) -> Response {
    let Json(command) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_details(
                    "Malformed event",
                    rejection.body_text(),
                )),
            )
                .into_response();
        }
    };

    match state.ingest_handler.handle(command).await {
        Ok(AppendOutcome::Created(event)) => (
            StatusCode::CREATED,
            [(header::LOCATION, format!("/events/{}", event.id))],
            Json(event),
        )
            .into_response(),
        Ok(AppendOutcome::Duplicate(event)) => (StatusCode::ACCEPTED, Json(event)).into_response(),
        Err(IngestError::Validation(error)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_details(
                "Malformed event",
                error.to_string(),
            )),
        )
            .into_response(),
        Err(error @ IngestError::Conflict { .. }) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::with_details(
                "Version conflict",
                error.to_string(),
            )),
        )
            .into_response(),
        Err(IngestError::Backend(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Event store unavailable")),
        )
            .into_response(),
    }
}
