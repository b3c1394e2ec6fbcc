// Projector consumes committed events in commit order, folds them into read
// models, and advances its watermark.
//
// Purpose
// - Guarantee strict per-subject sequential application: version v is never
//   folded before v-1, and never folded twice.
//
// Responsibilities
// - Discard versions at or below the applied version (at-least-once delivery).
// - Buffer versions beyond the next expected one and re-fetch the subject's
//   stream from the log to close the gap.
// - Isolate a failed fold to its subject: record a dead letter, stall the
//   subject at its last good version, keep projecting everything else.
//
// Boundaries
// - Never writes to the event log. It is the only writer of the read model store.

use crate::modules::aggregates::adapters::outbound::read_models::{
    DeadLetterRepository, ReadModelRepository, WatermarkRepository,
};
use crate::modules::aggregates::core::fold::{FoldError, FoldRegistry};
use crate::modules::aggregates::core::read_model::{AggregateReadModel, DeadLetter};
use crate::modules::aggregates::use_cases::project_events::status::{
    LagThresholds, PhaseCounts, ProjectionStatus,
};
use crate::shared::core::primitives::{Position, Version};
use crate::shared::infrastructure::event_store::{EventStore, StoredEvent};
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubjectPhase {
    Unseen,
    CatchingUp,
    Current,
    Stalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// The event and any buffered successors were applied, through this version.
    Applied { through: Version },
    Duplicate,
    /// Waiting for an earlier version.
    Buffered,
    Stalled,
}

struct SubjectProgress {
    applied: Version,
    phase: SubjectPhase,
    pending: BTreeMap<Version, StoredEvent>,
}

pub struct Projector<TEventStore, TRepository, TWatermarkRepository>
where
    TEventStore: EventStore + 'static,
    TRepository: ReadModelRepository + DeadLetterRepository + 'static,
    TWatermarkRepository: WatermarkRepository + 'static,
{
    name: String,
    event_store: Arc<TEventStore>,
    repository: Arc<TRepository>,
    watermark_repository: Arc<TWatermarkRepository>,
    folds: FoldRegistry,
    batch_size: usize,
    cursor: Position,
    subjects: HashMap<String, SubjectProgress>,
}

impl<TEventStore, TRepository, TWatermarkRepository>
    Projector<TEventStore, TRepository, TWatermarkRepository>
where
    TEventStore: EventStore + 'static,
    TRepository: ReadModelRepository + DeadLetterRepository + 'static,
    TWatermarkRepository: WatermarkRepository + 'static,
{
    pub fn new(
        name: impl Into<String>,
        event_store: Arc<TEventStore>,
        repository: Arc<TRepository>,
        watermark: Arc<TWatermarkRepository>,
        folds: FoldRegistry,
        batch_size: usize,
    ) -> Self {
        Self {
            name: name.into(),
            event_store,
            repository,
            watermark_repository: watermark,
            folds,
            batch_size: batch_size.max(1),
            cursor: 0,
            subjects: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cursor(&self) -> Position {
        self.cursor
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn event_store(&self) -> Arc<TEventStore> {
        self.event_store.clone()
    }

    pub fn phase(&self, subject: &str) -> SubjectPhase {
        self.subjects
            .get(subject)
            .map(|progress| progress.phase)
            .unwrap_or(SubjectPhase::Unseen)
    }

    /// Reload the watermark and the stalled subjects. Other per-subject
    /// progress is reloaded lazily from the read model store.
    pub async fn resume(&mut self) -> anyhow::Result<Position> {
        self.cursor = self
            .watermark_repository
            .get(&self.name)
            .await?
            .unwrap_or(0);
        self.subjects.clear();

        // A subject stays stalled while its next version is a dead letter.
        for letter in self.repository.list().await? {
            let applied = self.repository.applied_version(&letter.subject).await?;
            if letter.aggregate_version == applied + 1 {
                self.subjects.insert(
                    letter.subject,
                    SubjectProgress {
                        applied,
                        phase: SubjectPhase::Stalled,
                        pending: BTreeMap::new(),
                    },
                );
            }
        }

        let stalled = self
            .subjects
            .values()
            .filter(|progress| progress.phase == SubjectPhase::Stalled)
            .count();
        tracing::info!(
            projector = %self.name,
            cursor = self.cursor,
            stalled,
            "projector resumed"
        );
        Ok(self.cursor)
    }

    pub async fn checkpoint(&self) -> anyhow::Result<()> {
        self.watermark_repository
            .set(&self.name, self.cursor)
            .await
    }

    /// Pull and handle up to one batch. Returns how many events were read.
    pub async fn run_batch(&mut self) -> anyhow::Result<usize> {
        let events = self
            .event_store
            .read_all(self.cursor, self.batch_size)
            .await?;
        let count = events.len();
        for event in &events {
            self.handle(event).await?;
            self.cursor = event.position;
        }
        if count > 0 {
            self.checkpoint().await?;
            tracing::debug!(projector = %self.name, count, cursor = self.cursor, "batch projected");
        }
        if count < self.batch_size {
            self.mark_caught_up();
        }
        Ok(count)
    }

    pub async fn handle(&mut self, event: &StoredEvent) -> anyhow::Result<Handled> {
        let subject = event.subject.as_str();
        let (applied, phase) = self.progress_of(subject).await?;
        if phase == SubjectPhase::Stalled {
            tracing::debug!(event_id = %event.id, subject, "subject stalled, event skipped");
            return Ok(Handled::Stalled);
        }

        let version = event.aggregate_version;
        if version <= applied {
            tracing::debug!(event_id = %event.id, subject, version, applied, "already applied");
            return Ok(Handled::Duplicate);
        }

        let needs_refetch = match self.subjects.get_mut(subject) {
            Some(progress) => {
                progress.phase = SubjectPhase::CatchingUp;
                progress
                    .pending
                    .entry(version)
                    .or_insert_with(|| event.clone());
                version > applied + 1 && !progress.pending.contains_key(&(applied + 1))
            }
            None => false,
        };
        if needs_refetch {
            tracing::debug!(subject, version, applied, "gap detected, re-fetching stream");
            self.close_gap(subject, applied + 1).await?;
        }
        self.drain(subject).await
    }

    /// Clear every read model and rewind to the start of the log.
    pub async fn reset(&mut self) -> anyhow::Result<()> {
        self.repository.clear().await?;
        self.repository.clear_dead_letters().await?;
        self.cursor = 0;
        self.checkpoint().await?;
        self.subjects.clear();
        tracing::info!(projector = %self.name, "projection reset for replay");
        Ok(())
    }

    pub async fn status(&self, thresholds: LagThresholds) -> anyhow::Result<ProjectionStatus> {
        let head = self.event_store.head().await?;
        let oldest_pending = self.event_store.read_all(self.cursor, 1).await?;
        let lag = oldest_pending
            .first()
            .map(|event| (Utc::now() - event.time).to_std().unwrap_or_default())
            .unwrap_or_default();

        let mut subjects = PhaseCounts::default();
        let mut stalled = Vec::new();
        for (subject, progress) in &self.subjects {
            match progress.phase {
                SubjectPhase::CatchingUp => subjects.catching_up += 1,
                SubjectPhase::Current => subjects.current += 1,
                SubjectPhase::Stalled => {
                    subjects.stalled += 1;
                    stalled.push(subject.clone());
                }
                SubjectPhase::Unseen => {}
            }
        }
        stalled.sort();

        Ok(ProjectionStatus {
            projector: self.name.clone(),
            cursor: self.cursor,
            head,
            lag_events: head.saturating_sub(self.cursor),
            lag_seconds: lag.as_secs_f64(),
            health: thresholds.classify(lag),
            subjects,
            stalled,
            dead_letters: self.repository.list().await?.len(),
        })
    }

    async fn progress_of(&mut self, subject: &str) -> anyhow::Result<(Version, SubjectPhase)> {
        if let Some(progress) = self.subjects.get(subject) {
            return Ok((progress.applied, progress.phase));
        }
        let applied = self.repository.applied_version(subject).await?;
        let phase = if applied > 0 {
            SubjectPhase::Current
        } else {
            SubjectPhase::Unseen
        };
        self.subjects.insert(
            subject.to_string(),
            SubjectProgress {
                applied,
                phase,
                pending: BTreeMap::new(),
            },
        );
        Ok((applied, phase))
    }

    async fn close_gap(&mut self, subject: &str, from: Version) -> anyhow::Result<()> {
        let missing = self.event_store.read_stream(subject, from).await?;
        if let Some(progress) = self.subjects.get_mut(subject) {
            for event in missing {
                progress
                    .pending
                    .entry(event.aggregate_version)
                    .or_insert(event);
            }
        }
        Ok(())
    }

    async fn drain(&mut self, subject: &str) -> anyhow::Result<Handled> {
        let mut through = None;
        loop {
            let Some(progress) = self.subjects.get_mut(subject) else {
                break;
            };
            let next = progress.applied + 1;
            let Some(event) = progress.pending.remove(&next) else {
                break;
            };
            if !self.apply_one(&event).await? {
                return Ok(Handled::Stalled);
            }
            through = Some(event.aggregate_version);
        }
        Ok(match through {
            Some(through) => Handled::Applied { through },
            None => Handled::Buffered,
        })
    }

    /// Returns false when the fold failed and the subject is now stalled.
    async fn apply_one(&mut self, event: &StoredEvent) -> anyhow::Result<bool> {
        let folded = match self.folds.resolve(&event.event_type) {
            None => {
                tracing::debug!(event_type = %event.event_type, "no fold registered, advancing");
                Ok(None)
            }
            Some(fold) => {
                let prior = self
                    .repository
                    .get(fold.aggregate_type(), &event.subject)
                    .await?;
                fold.apply(prior.as_ref().map(|model| &model.state), event)
                    .map(|state| {
                        Some(AggregateReadModel::from_event(
                            fold.aggregate_type(),
                            state,
                            event,
                        ))
                    })
            }
        };
        let model = match folded {
            Ok(model) => model,
            Err(error) => {
                self.stall(event, error).await?;
                return Ok(false);
            }
        };

        // Re-applying the same event after a crash is a no-op thanks to the
        // applied version, so the model and the progress are saved together.
        self.repository
            .save(&event.subject, event.aggregate_version, model)
            .await?;
        if let Some(progress) = self.subjects.get_mut(&event.subject) {
            progress.applied = event.aggregate_version;
        }
        tracing::debug!(
            event_id = %event.id,
            subject = %event.subject,
            version = event.aggregate_version,
            "event projected"
        );
        Ok(true)
    }

    async fn stall(&mut self, event: &StoredEvent, error: FoldError) -> anyhow::Result<()> {
        tracing::error!(
            event_id = %event.id,
            subject = %event.subject,
            version = event.aggregate_version,
            %error,
            "fold failed, aggregate stalled at last good version"
        );
        self.repository
            .record(DeadLetter::new(event, error.to_string()))
            .await?;
        if let Some(progress) = self.subjects.get_mut(&event.subject) {
            progress.phase = SubjectPhase::Stalled;
            progress.pending.clear();
        }
        Ok(())
    }

    fn mark_caught_up(&mut self) {
        for progress in self.subjects.values_mut() {
            if progress.phase == SubjectPhase::CatchingUp && progress.pending.is_empty() {
                progress.phase = SubjectPhase::Current;
            }
        }
    }
}
