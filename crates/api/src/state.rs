use sentinel_core::service::MonitorService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (the service holds its collaborators behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Patient store, query engine and notification gate.
    pub service: MonitorService,
}
