use crate::modules::aggregates::adapters::outbound::read_models_in_memory::InMemoryReadModels;
use crate::modules::aggregates::core::fold::FoldRegistry;
use crate::modules::aggregates::use_cases::get_aggregate::queries_port::AggregateQueries;
use crate::modules::aggregates::use_cases::project_events::runner::ProjectorHandle;
use crate::modules::events::use_cases::ingest_event::handler::IngestEventHandler;
use crate::shared::infrastructure::event_store::in_memory::InMemoryEventStore;
use crate::shell::workers::{ProjectorSettings, start_projector};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub ingest_handler: Arc<IngestEventHandler<InMemoryEventStore>>,
    pub event_store: Arc<InMemoryEventStore>,
    pub queries: Arc<dyn AggregateQueries + Send + Sync>,
    pub projector: ProjectorHandle,
}

impl AppState {
    /// Wire the in-memory adapters and start the projector. Needs a running tokio runtime.
    pub fn in_memory(
        event_store: Arc<InMemoryEventStore>,
        read_models: Arc<InMemoryReadModels>,
        folds: FoldRegistry,
        settings: ProjectorSettings,
    ) -> Self {
        let projector = start_projector(event_store.clone(), read_models.clone(), folds, settings);
        AppState {
            ingest_handler: Arc::new(IngestEventHandler::new(event_store.clone())),
            event_store,
            queries: read_models,
            projector,
        }
    }
}
