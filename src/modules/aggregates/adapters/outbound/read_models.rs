// Repository traits for the read model store, the projector watermark and dead letters.
//
// Purpose
// - ReadModelRepository: persist projected state together with per-subject progress.
// - WatermarkRepository: track the last processed commit position per projector.
// - DeadLetterRepository: keep events whose fold failed.

use crate::modules::aggregates::core::read_model::{AggregateReadModel, DeadLetter};
use crate::shared::core::primitives::{Position, Version};
use async_trait::async_trait;

#[async_trait]
pub trait ReadModelRepository: Send + Sync {
    /// Record that `subject` has been applied through `applied_version`, and
    /// store `model` if the event produced one. Both happen atomically.
    async fn save(
        &self,
        subject: &str,
        applied_version: Version,
        model: Option<AggregateReadModel>,
    ) -> anyhow::Result<()>;

    async fn applied_version(&self, subject: &str) -> anyhow::Result<Version>;

    async fn get(
        &self,
        aggregate_type: &str,
        id: &str,
    ) -> anyhow::Result<Option<AggregateReadModel>>;

    async fn clear(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait WatermarkRepository: Send + Sync {
    async fn get(&self, name: &str) -> anyhow::Result<Option<Position>>;
    async fn set(&self, name: &str, last: Position) -> anyhow::Result<()>;
}

#[async_trait]
pub trait DeadLetterRepository: Send + Sync {
    /// Keeps the first letter recorded for an event id.
    async fn record(&self, letter: DeadLetter) -> anyhow::Result<()>;
    async fn list(&self) -> anyhow::Result<Vec<DeadLetter>>;
    async fn clear_dead_letters(&self) -> anyhow::Result<()>;
}
