// In memory read model store, watermark repository and dead letter repository.
//
// Purpose
// - Exercise the projector and the query side without a database.
//
// Responsibilities
// - Store read models keyed by (aggregate type, aggregate id).
// - Store per-subject applied versions next to them so a save is atomic.
// - Track the last processed position per projector.

use crate::modules::aggregates::adapters::outbound::read_models::{
    DeadLetterRepository, ReadModelRepository, WatermarkRepository,
};
use crate::modules::aggregates::core::read_model::{AggregateReadModel, DeadLetter};
use crate::modules::aggregates::use_cases::get_aggregate::queries_port::AggregateQueries;
use crate::shared::core::primitives::{Position, Version};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct Models {
    rows: HashMap<(String, String), AggregateReadModel>,
    applied: HashMap<String, Version>,
}

#[derive(Default)]
pub struct InMemoryReadModels {
    models: RwLock<Models>,
    watermark: RwLock<HashMap<String, Position>>,
    dead_letters: RwLock<Vec<DeadLetter>>,
    is_offline: AtomicBool,
}

impl InMemoryReadModels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_offline(&self) {
        self.is_offline.fetch_xor(true, Ordering::SeqCst);
    }

    fn ensure_online(&self, what: &str) -> anyhow::Result<()> {
        if self.is_offline.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("{what} repository offline"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReadModelRepository for InMemoryReadModels {
    async fn save(
        &self,
        subject: &str,
        applied_version: Version,
        model: Option<AggregateReadModel>,
    ) -> anyhow::Result<()> {
        self.ensure_online("Read model")?;
        let mut guard = self.models.write().await;
        if let Some(model) = model {
            guard
                .rows
                .insert((model.aggregate_type.clone(), model.id.clone()), model);
        }
        guard.applied.insert(subject.to_string(), applied_version);
        Ok(())
    }

    async fn applied_version(&self, subject: &str) -> anyhow::Result<Version> {
        self.ensure_online("Read model")?;
        Ok(self
            .models
            .read()
            .await
            .applied
            .get(subject)
            .copied()
            .unwrap_or(0))
    }

    async fn get(
        &self,
        aggregate_type: &str,
        id: &str,
    ) -> anyhow::Result<Option<AggregateReadModel>> {
        self.ensure_online("Read model")?;
        Ok(self
            .models
            .read()
            .await
            .rows
            .get(&(aggregate_type.to_string(), id.to_string()))
            .cloned())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        self.ensure_online("Read model")?;
        let mut guard = self.models.write().await;
        guard.rows.clear();
        guard.applied.clear();
        Ok(())
    }
}

#[async_trait::async_trait]
impl WatermarkRepository for InMemoryReadModels {
    async fn get(&self, name: &str) -> anyhow::Result<Option<Position>> {
        self.ensure_online("Watermark")?;
        Ok(self.watermark.read().await.get(name).copied())
    }

    async fn set(&self, name: &str, last: Position) -> anyhow::Result<()> {
        self.ensure_online("Watermark")?;
        self.watermark.write().await.insert(name.to_string(), last);
        Ok(())
    }
}

#[async_trait::async_trait]
impl DeadLetterRepository for InMemoryReadModels {
    async fn record(&self, letter: DeadLetter) -> anyhow::Result<()> {
        self.ensure_online("Dead letter")?;
        let mut letters = self.dead_letters.write().await;
        if letters.iter().any(|known| known.event_id == letter.event_id) {
            return Ok(());
        }
        letters.push(letter);
        Ok(())
    }

    async fn list(&self) -> anyhow::Result<Vec<DeadLetter>> {
        self.ensure_online("Dead letter")?;
        Ok(self.dead_letters.read().await.clone())
    }

    async fn clear_dead_letters(&self) -> anyhow::Result<()> {
        self.ensure_online("Dead letter")?;
        self.dead_letters.write().await.clear();
        Ok(())
    }
}

#[async_trait::async_trait]
impl AggregateQueries for InMemoryReadModels {
    async fn find(
        &self,
        aggregate_type: &str,
        id: &str,
    ) -> anyhow::Result<Option<AggregateReadModel>> {
        ReadModelRepository::get(self, aggregate_type, id).await
    }

    async fn list_by_type(&self, aggregate_type: &str) -> anyhow::Result<Vec<AggregateReadModel>> {
        self.ensure_online("Read model")?;
        let guard = self.models.read().await;
        let mut items: Vec<AggregateReadModel> = guard
            .rows
            .iter()
            .filter(|((kind, _), _)| kind == aggregate_type)
            .map(|(_, row)| row.clone())
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    async fn dead_letters(&self) -> anyhow::Result<Vec<DeadLetter>> {
        DeadLetterRepository::list(self).await
    }
}
