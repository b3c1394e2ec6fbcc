// App state wired for tests: in-memory adapters, the vertreter merge fold,
// and a projector tuned to react within milliseconds.

use crate::modules::aggregates::adapters::outbound::read_models_in_memory::InMemoryReadModels;
use crate::modules::aggregates::core::fold::FoldRegistry;
use crate::modules::aggregates::core::folds::MergeFold;
use crate::modules::aggregates::use_cases::project_events::runner::RunnerConfig;
use crate::modules::aggregates::use_cases::project_events::status::LagThresholds;
use crate::shared::infrastructure::event_store::in_memory::InMemoryEventStore;
use crate::shell::state::AppState;
use crate::shell::workers::ProjectorSettings;
use std::sync::Arc;
use std::time::Duration;

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<InMemoryEventStore>,
    pub read_models: Arc<InMemoryReadModels>,
}

pub fn test_settings() -> ProjectorSettings {
    ProjectorSettings {
        batch_size: 50,
        runner: RunnerConfig {
            poll_interval: Duration::from_millis(20),
            backoff_base: Duration::from_millis(5),
            backoff_max: Duration::from_millis(50),
            lag: LagThresholds::default(),
        },
    }
}

pub fn test_folds() -> FoldRegistry {
    FoldRegistry::new().register(MergeFold::new("space.maatini.", "vertreter"))
}

fn build(store: InMemoryEventStore) -> TestApp {
    let store = Arc::new(store);
    let read_models = Arc::new(InMemoryReadModels::new());
    let state = AppState::in_memory(
        store.clone(),
        read_models.clone(),
        test_folds(),
        test_settings(),
    );
    TestApp {
        state,
        store,
        read_models,
    }
}

/// Must be called from inside a tokio runtime.
pub fn test_app() -> TestApp {
    build(InMemoryEventStore::new())
}

pub fn offline_event_store_app() -> TestApp {
    let mut store = InMemoryEventStore::new();
    store.toggle_offline();
    build(store)
}
