// Read model row for one aggregate, plus the dead letter written when a fold fails.
//
// Purpose
// - Represent projected state for fast reads.
//
// Responsibilities
// - Carry applied_version so idempotent re-application is possible.
// - Carry last_event_id so a reader can correlate state with the log.

use crate::shared::core::primitives::Version;
use crate::shared::infrastructure::event_store::StoredEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateReadModel {
    #[serde(rename = "type")]
    pub aggregate_type: String,
    pub id: String,
    pub state: Value,
    pub applied_version: Version,
    pub last_event_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

impl AggregateReadModel {
    pub fn from_event(aggregate_type: &str, state: Value, event: &StoredEvent) -> Self {
        Self {
            aggregate_type: aggregate_type.to_string(),
            id: event.subject.clone(),
            state,
            applied_version: event.aggregate_version,
            last_event_id: event.id,
            updated_at: event.time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    pub event_id: Uuid,
    #[serde(rename = "type")]
    pub event_type: String,
    pub subject: String,
    pub aggregate_version: Version,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

impl DeadLetter {
    pub fn new(event: &StoredEvent, reason: impl Into<String>) -> Self {
        Self {
            event_id: event.id,
            event_type: event.event_type.clone(),
            subject: event.subject.clone(),
            aggregate_version: event.aggregate_version,
            reason: reason.into(),
            recorded_at: Utc::now(),
        }
    }
}
