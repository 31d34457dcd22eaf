use std::sync::Arc;

use examhall_db::FleetStore;

use crate::config::ServerConfig;
use crate::storage::ObjectStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Relational persistence (devices, heartbeats, tasks, reports).
    pub store: Arc<dyn FleetStore>,
    /// Blob storage for uploaded and scheduled files.
    pub objects: Arc<dyn ObjectStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
