// Background workers owned by the composition root.

use crate::modules::aggregates::adapters::outbound::read_models_in_memory::InMemoryReadModels;
use crate::modules::aggregates::core::fold::FoldRegistry;
use crate::modules::aggregates::core::folds::MergeFold;
use crate::modules::aggregates::use_cases::project_events::projector::Projector;
use crate::modules::aggregates::use_cases::project_events::runner::{
    ProjectorHandle, RunnerConfig, spawn,
};
use crate::shared::infrastructure::event_store::in_memory::InMemoryEventStore;
use crate::shell::config::AppConfig;
use std::sync::Arc;

pub const AGGREGATE_PROJECTOR: &str = "aggregates";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectorSettings {
    pub batch_size: usize,
    pub runner: RunnerConfig,
}

impl From<&AppConfig> for ProjectorSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            batch_size: config.projector_batch_size,
            runner: config.runner,
        }
    }
}

/// One merge fold per configured aggregate type.
pub fn folds_from_config(config: &AppConfig) -> FoldRegistry {
    config
        .aggregate_types
        .iter()
        .fold(FoldRegistry::new(), |registry, aggregate_type| {
            registry.register(MergeFold::new(
                config.event_type_namespace.as_str(),
                aggregate_type.as_str(),
            ))
        })
}

pub fn start_projector(
    event_store: Arc<InMemoryEventStore>,
    read_models: Arc<InMemoryReadModels>,
    folds: FoldRegistry,
    settings: ProjectorSettings,
) -> ProjectorHandle {
    tracing::info!(
        aggregate_types = ?folds.aggregate_types(),
        batch_size = settings.batch_size,
        "starting aggregate projector"
    );
    let projector = Projector::new(
        AGGREGATE_PROJECTOR,
        event_store,
        read_models.clone(),
        read_models,
        folds,
        settings.batch_size,
    );
    spawn(projector, settings.runner)
}
