use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use eventsourcing::modules::aggregates::adapters::outbound::read_models_in_memory;
use eventsourcing::shared::infrastructure::event_store::in_memory::InMemoryEventStore;
use eventsourcing::shell::config::AppConfig;
use eventsourcing::shell::http::router;
use eventsourcing::shell::state::AppState;
use eventsourcing::shell::workers::{ProjectorSettings, folds_from_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        http_addr = %config.http_addr,
        aggregate_types = ?config.aggregate_types,
        namespace = %config.event_type_namespace,
        "configuration loaded"
    );

    // In-memory adapters for now
    let event_store = Arc::new(InMemoryEventStore::new());
    let read_models = Arc::new(read_models_in_memory::InMemoryReadModels::new());
    let state = AppState::in_memory(
        event_store,
        read_models,
        folds_from_config(&config),
        ProjectorSettings::from(&config),
    );
    let projector = state.projector.clone();

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    tracing::info!("listening on http://{}", config.http_addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    projector.shutdown().await;
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
