// Composition root.
//
// Responsibilities
// - Read config from environment.
// - Instantiate the in-memory event log and read model store.
// - Wire them into the ingestion handler, the query port and the router.
// - Spawn the projector worker and stop it on shutdown.

pub mod config;
pub mod http;
pub mod state;
pub mod workers;
