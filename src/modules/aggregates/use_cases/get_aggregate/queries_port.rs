// Read side of the read model store. The query service only ever reads.

use crate::modules::aggregates::core::read_model::{AggregateReadModel, DeadLetter};
use async_trait::async_trait;

#[async_trait]
pub trait AggregateQueries {
    async fn find(
        &self,
        aggregate_type: &str,
        id: &str,
    ) -> anyhow::Result<Option<AggregateReadModel>>;

    async fn list_by_type(&self, aggregate_type: &str) -> anyhow::Result<Vec<AggregateReadModel>>;

    async fn dead_letters(&self) -> anyhow::Result<Vec<DeadLetter>>;
}
