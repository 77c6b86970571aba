//! Application state - Dependency injection container.
//!
//! Handlers reach services through the container trait so tests can swap
//! in mocks without a database.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Cache, Database};
use crate::services::{ServiceContainer, Services};

/// Shared state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceContainer>,
    /// Redis cache, also backing the rate limiter
    pub cache: Arc<Cache>,
    pub database: Arc<Database>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the production services on top of the database connection.
    pub fn from_config(database: Arc<Database>, cache: Arc<Cache>, config: Config) -> Self {
        let services = Arc::new(Services::from_connection(
            database.get_connection(),
            config.clone(),
        ));

        Self::new(services, cache, database, config)
    }

    /// Create state around an already assembled service container.
    pub fn new(
        services: Arc<dyn ServiceContainer>,
        cache: Arc<Cache>,
        database: Arc<Database>,
        config: Config,
    ) -> Self {
        Self {
            services,
            cache,
            database,
            config: Arc::new(config),
        }
    }
}
