//! Serve command - Starts the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, Database};
use crate::services::AuthService;

/// Execute the serve command
pub async fn execute(args: ServeArgs, mut config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");

    if let Some(host) = args.host {
        config.server_host = host;
    }
    if let Some(port) = args.port {
        config.server_port = port;
    }

    // Connecting also applies pending migrations
    let db = Arc::new(
        Database::connect(&config)
            .await
            .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?,
    );

    let cache = Arc::new(Cache::connect(&config).await?);

    let addr = config.server_addr();
    let cleanup_every = Duration::from_secs(config.cleanup_interval_seconds.max(1));
    let app_state = AppState::from_config(db, cache, config);

    tokio::spawn(sweep_expired_auth(
        app_state.services.auth(),
        cleanup_every,
    ));

    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Periodically purge expired tokens, sessions and blacklist entries.
async fn sweep_expired_auth(auth: Arc<dyn AuthService>, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match auth.cleanup_expired().await {
            Ok(report) if report.total() > 0 => {
                tracing::info!(
                    tokens = report.tokens,
                    sessions = report.sessions,
                    blacklisted_tokens = report.blacklisted_tokens,
                    "Expired auth data removed"
                );
            }
            Ok(_) => tracing::debug!("Nothing to clean up"),
            Err(e) => tracing::error!(error = %e, "Auth cleanup failed"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal, draining connections...");
}
