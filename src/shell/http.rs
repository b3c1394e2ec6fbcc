use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::modules::aggregates::use_cases::admin::inbound::http as admin_http;
use crate::modules::aggregates::use_cases::get_aggregate::inbound::http as aggregate_http;
use crate::modules::events::use_cases::get_event::inbound::http as get_event_http;
use crate::modules::events::use_cases::ingest_event::inbound::http as ingest_http;
use crate::modules::events::use_cases::list_events::inbound::http as list_events_http;
use crate::shell::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/events", post(ingest_http::handle))
        .route("/events/{id}", get(get_event_http::handle))
        .route("/events/subject/{subject}", get(list_events_http::by_subject))
        .route("/events/type/{event_type}", get(list_events_http::by_type))
        .route("/aggregates/{aggregate_type}", get(aggregate_http::list))
        .route("/aggregates/{aggregate_type}/{id}", get(aggregate_http::handle))
        .route("/admin/projection", get(admin_http::status))
        .route("/admin/projection/trigger", post(admin_http::trigger))
        .route("/admin/replay", post(admin_http::replay))
        .route("/admin/dead-letters", get(admin_http::dead_letters))
        .route("/health", get(admin_http::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
