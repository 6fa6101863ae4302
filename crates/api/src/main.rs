use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sentinel_core::gate::NotificationGate;
use sentinel_core::service::MonitorService;
use sentinel_core::store::{MemoryStore, PatientStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sentinel_api::config::ServerConfig;
use sentinel_api::router::build_app_router;
use sentinel_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "sentinel_api=debug,sentinel_core=debug,sentinel_db=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        notify_policy = %config.notify_policy,
        "Loaded server configuration"
    );

    // --- Patient store ---
    let store = build_store(&config).await;

    // --- Notification gate ---
    let notifier = sentinel_delivery::notifier_from_env(config.notify_timeout);
    let gate = Arc::new(NotificationGate::new(
        notifier,
        config.notify_policy,
        config.notify_timeout,
    ));

    // --- App state ---
    let service = MonitorService::new(store, gate);
    let state = AppState {
        service: service.clone(),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, draining notifications");
    let grace = Duration::from_secs(config.shutdown_timeout_secs);
    if !service.drain_notifications(grace).await {
        tracing::warn!(?grace, "Some notifications were still in flight at shutdown");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Connect to PostgreSQL when `DATABASE_URL` is set, otherwise keep patients
/// in memory.
async fn build_store(config: &ServerConfig) -> Arc<dyn PatientStore> {
    let Some(database_url) = &config.database_url else {
        tracing::info!("DATABASE_URL not set, using in-memory patient store");
        return Arc::new(MemoryStore::new());
    };

    let pool = sentinel_db::create_pool(database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    sentinel_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    sentinel_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    Arc::new(sentinel_db::PgPatientStore::new(pool))
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
