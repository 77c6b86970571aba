//! Cleanup command - One-off purge of expired auth data.

use std::sync::Arc;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Database, Persistence};
use crate::services::{AuthService, Authenticator};

pub async fn execute(config: Config) -> AppResult<()> {
    let db = Database::connect_without_migrations(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;

    let auth = Authenticator::new(Arc::new(Persistence::new(db.get_connection())), config);
    let report = auth.cleanup_expired().await?;

    println!("Expired tokens removed:       {}", report.tokens);
    println!("Expired sessions removed:     {}", report.sessions);
    println!("Expired blacklist entries:    {}", report.blacklisted_tokens);
    println!("Total:                        {}", report.total());

    Ok(())
}
