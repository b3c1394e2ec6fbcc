// Event log port: the single source of truth for committed events.
//
// Purpose
// - Describe what ingestion, queries and the projector need from an append-only event log.
//
// Responsibilities
// - Deduplicate by global event id before anything else.
// - Enforce optimistic concurrency per subject: a new event must carry `current + 1`.
// - Assign a global commit position so consumers can pull in commit order.
//
// Boundaries
// - No retries on behalf of callers. A conflict is reported, never resolved here.

pub mod in_memory;

use crate::shared::core::primitives::{Position, Version};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_SPEC_VERSION: &str = "1.0";
pub const DEFAULT_DATA_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventStoreError {
    #[error("version conflict on subject {subject}: submitted {submitted}, current {current}")]
    VersionConflict {
        subject: String,
        submitted: Version,
        current: Version,
    },

    #[error("backend error: {0}")]
    Backend(String),
}

/// A validated event that has not been committed yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub id: Uuid,
    pub source: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub subject: String,
    pub aggregate_version: Version,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataschema: Option<String>,
    pub specversion: String,
    pub datacontenttype: String,
}

/// A committed, immutable event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    pub id: Uuid,
    pub source: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub subject: String,
    pub aggregate_version: Version,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataschema: Option<String>,
    pub specversion: String,
    pub datacontenttype: String,
    pub time: DateTime<Utc>,
    pub position: Position,
}

impl StoredEvent {
    pub fn commit(event: NewEvent, position: Position, time: DateTime<Utc>) -> Self {
        Self {
            id: event.id,
            source: event.source,
            event_type: event.event_type,
            subject: event.subject,
            aggregate_version: event.aggregate_version,
            data: event.data,
            dataschema: event.dataschema,
            specversion: event.specversion,
            datacontenttype: event.datacontenttype,
            time,
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    Created(StoredEvent),
    /// The id was already committed; nothing was written.
    Duplicate(StoredEvent),
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn append(&self, event: NewEvent) -> Result<AppendOutcome, EventStoreError>;

    /// Point lookup by global id. Reflects every completed append.
    async fn read(&self, id: Uuid) -> Result<Option<StoredEvent>, EventStoreError>;

    /// Events of one subject with `aggregate_version >= from_version`, in version order.
    async fn read_stream(
        &self,
        subject: &str,
        from_version: Version,
    ) -> Result<Vec<StoredEvent>, EventStoreError>;

    /// Up to `limit` events committed after `after`, in commit order.
    async fn read_all(
        &self,
        after: Position,
        limit: usize,
    ) -> Result<Vec<StoredEvent>, EventStoreError>;

    async fn list_by_type(&self, event_type: &str) -> Result<Vec<StoredEvent>, EventStoreError>;

    async fn stream_version(&self, subject: &str) -> Result<Version, EventStoreError>;

    async fn head(&self) -> Result<Position, EventStoreError>;

    /// Resolves once a position greater than `after` has been committed.
    async fn wait_for_commit(&self, after: Position);
}

#[cfg(test)]
mod event_store_port_tests {
    use super::*;
    use crate::tests::fixtures::events::NewEventBuilder;
    use rstest::rstest;

    #[rstest]
    fn it_should_serialize_the_wire_field_names() {
        let event = NewEventBuilder::new().subject("A").aggregate_version(3).build();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.event_type);
        assert_eq!(json["subject"], "A");
        assert_eq!(json["aggregateVersion"], 3);
        assert!(json.get("dataschema").is_none());
    }

    #[rstest]
    fn it_should_keep_every_field_when_committing() {
        let event = NewEventBuilder::new().dataschema("vertreter.created.json").build();
        let time = Utc::now();
        let stored = StoredEvent::commit(event.clone(), 7, time);
        assert_eq!(stored.id, event.id);
        assert_eq!(stored.event_type, event.event_type);
        assert_eq!(stored.aggregate_version, event.aggregate_version);
        assert_eq!(stored.data, event.data);
        assert_eq!(stored.dataschema, event.dataschema);
        assert_eq!(stored.position, 7);
        assert_eq!(stored.time, time);
    }
}
