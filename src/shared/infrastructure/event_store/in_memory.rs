// In memory implementation of the EventStore port.
//
// Purpose
// - Back the service and its tests without a database.
//
// Responsibilities
// - Keep one sequencer (a mutex over the stream) per subject, so appends to
//   different subjects never wait on each other.
// - Commit into a global index (id lookup + commit order) in one short critical
//   section, so readers never observe a half-written event.
// - Publish the head position so idle consumers can await new commits.

use crate::shared::core::primitives::{Position, Version};
use crate::shared::infrastructure::event_store::{
    AppendOutcome, EventStore, EventStoreError, NewEvent, StoredEvent,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};
use uuid::Uuid;

type Stream = Arc<Mutex<Vec<Arc<StoredEvent>>>>;

#[derive(Default)]
struct CommitIndex {
    by_id: HashMap<Uuid, Arc<StoredEvent>>,
    log: Vec<Arc<StoredEvent>>,
}

pub struct InMemoryEventStore {
    streams: RwLock<HashMap<String, Stream>>,
    index: RwLock<CommitIndex>,
    head: watch::Sender<Position>,
    is_offline: bool,
    delay_append_ms: AtomicU64,
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        let (head, _) = watch::channel(0);
        Self {
            streams: RwLock::new(HashMap::new()),
            index: RwLock::new(CommitIndex::default()),
            head,
            is_offline: false,
            delay_append_ms: AtomicU64::new(0),
        }
    }

    pub fn toggle_offline(&mut self) {
        self.is_offline = !self.is_offline;
    }

    /// Sleep between the version check and the commit, while holding the subject sequencer.
    pub fn set_delay_append_ms(&self, ms: u64) {
        self.delay_append_ms.store(ms, Ordering::Relaxed);
    }

    fn ensure_online(&self) -> Result<(), EventStoreError> {
        if self.is_offline {
            return Err(EventStoreError::Backend("Event store offline".into()));
        }
        Ok(())
    }

    async fn sequencer(&self, subject: &str) -> Stream {
        if let Some(stream) = self.streams.read().await.get(subject) {
            return stream.clone();
        }
        self.streams
            .write()
            .await
            .entry(subject.to_string())
            .or_default()
            .clone()
    }

    async fn existing(&self, id: &Uuid) -> Option<StoredEvent> {
        self.index
            .read()
            .await
            .by_id
            .get(id)
            .map(|event| event.as_ref().clone())
    }
}

#[async_trait::async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: NewEvent) -> Result<AppendOutcome, EventStoreError> {
        self.ensure_online()?;

        if let Some(existing) = self.existing(&event.id).await {
            tracing::debug!(event_id = %event.id, "event already committed");
            return Ok(AppendOutcome::Duplicate(existing));
        }

        let sequencer = self.sequencer(&event.subject).await;
        let mut stream = sequencer.lock().await;
        let current = stream.len() as Version;
        if event.aggregate_version != current + 1 {
            // A concurrent client may have committed this very id meanwhile.
            if let Some(existing) = self.existing(&event.id).await {
                return Ok(AppendOutcome::Duplicate(existing));
            }
            return Err(EventStoreError::VersionConflict {
                subject: event.subject,
                submitted: event.aggregate_version,
                current,
            });
        }

        let delay = self.delay_append_ms.load(Ordering::Relaxed);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let mut index = self.index.write().await;
        if let Some(existing) = index.by_id.get(&event.id) {
            return Ok(AppendOutcome::Duplicate(existing.as_ref().clone()));
        }
        let position = index.log.len() as Position + 1;
        let stored = Arc::new(StoredEvent::commit(event, position, Utc::now()));
        index.by_id.insert(stored.id, stored.clone());
        index.log.push(stored.clone());
        stream.push(stored.clone());
        self.head.send_replace(position);
        drop(index);

        tracing::debug!(
            event_id = %stored.id,
            subject = %stored.subject,
            version = stored.aggregate_version,
            position,
            "event committed"
        );
        Ok(AppendOutcome::Created(stored.as_ref().clone()))
    }

    async fn read(&self, id: Uuid) -> Result<Option<StoredEvent>, EventStoreError> {
        self.ensure_online()?;
        Ok(self.existing(&id).await)
    }

    async fn read_stream(
        &self,
        subject: &str,
        from_version: Version,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        self.ensure_online()?;
        let Some(sequencer) = self.streams.read().await.get(subject).cloned() else {
            return Ok(Vec::new());
        };
        let stream = sequencer.lock().await;
        let skip = from_version.saturating_sub(1) as usize;
        Ok(stream
            .iter()
            .skip(skip)
            .map(|event| event.as_ref().clone())
            .collect())
    }

    async fn read_all(
        &self,
        after: Position,
        limit: usize,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        self.ensure_online()?;
        let index = self.index.read().await;
        Ok(index
            .log
            .iter()
            .skip(after as usize)
            .take(limit)
            .map(|event| event.as_ref().clone())
            .collect())
    }

    async fn list_by_type(&self, event_type: &str) -> Result<Vec<StoredEvent>, EventStoreError> {
        self.ensure_online()?;
        let index = self.index.read().await;
        Ok(index
            .log
            .iter()
            .filter(|event| event.event_type == event_type)
            .map(|event| event.as_ref().clone())
            .collect())
    }

    async fn stream_version(&self, subject: &str) -> Result<Version, EventStoreError> {
        self.ensure_online()?;
        let Some(sequencer) = self.streams.read().await.get(subject).cloned() else {
            return Ok(0);
        };
        Ok(sequencer.lock().await.len() as Version)
    }

    async fn head(&self) -> Result<Position, EventStoreError> {
        self.ensure_online()?;
        Ok(*self.head.borrow())
    }

    async fn wait_for_commit(&self, after: Position) {
        let mut receiver = self.head.subscribe();
        // The sender lives as long as the store, so this only errors on teardown.
        let _ = receiver.wait_for(|head| *head > after).await;
    }
}
