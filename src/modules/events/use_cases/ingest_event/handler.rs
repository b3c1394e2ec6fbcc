// Ingestion handler orchestrates the write flow.
//
// Responsibilities
// - Validate the command.
// - Append to the event log, which enforces deduplication and optimistic concurrency.
// - Never touch the read model store and never retry a conflict.

use crate::modules::events::use_cases::ingest_event::command::{IngestEvent, ValidationError};
use crate::shared::core::primitives::Version;
use crate::shared::infrastructure::event_store::{AppendOutcome, EventStore, EventStoreError};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("version conflict on subject {subject}: submitted {submitted}, current {current}")]
    Conflict {
        subject: String,
        submitted: Version,
        current: Version,
    },

    #[error("event store unavailable: {0}")]
    Backend(String),
}

impl From<EventStoreError> for IngestError {
    fn from(error: EventStoreError) -> Self {
        match error {
            EventStoreError::VersionConflict {
                subject,
                submitted,
                current,
            } => IngestError::Conflict {
                subject,
                submitted,
                current,
            },
            EventStoreError::Backend(message) => IngestError::Backend(message),
        }
    }
}

pub struct IngestEventHandler<TEventStore>
where
    TEventStore: EventStore + 'static,
{
    event_store: Arc<TEventStore>,
}

impl<TEventStore> IngestEventHandler<TEventStore>
where
    TEventStore: EventStore + 'static,
{
    pub fn new(event_store: Arc<TEventStore>) -> Self {
        Self { event_store }
    }

    pub async fn handle(&self, command: IngestEvent) -> Result<AppendOutcome, IngestError> {
        let event = command.validate()?;
        let event_id = event.id;
        let outcome = self.event_store.append(event).await.inspect_err(|error| {
            tracing::info!(%event_id, %error, "event rejected");
        })?;
        match &outcome {
            AppendOutcome::Created(stored) => tracing::info!(
                event_id = %stored.id,
                event_type = %stored.event_type,
                subject = %stored.subject,
                version = stored.aggregate_version,
                "event stored"
            ),
            AppendOutcome::Duplicate(_) => {
                tracing::info!(%event_id, "event already exists, returning existing")
            }
        }
        Ok(outcome)
    }
}
