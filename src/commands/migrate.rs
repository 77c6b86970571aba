//! Migrate command - Apply, revert or inspect schema migrations.

use crate::cli::args::{MigrateAction, MigrateArgs};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;

pub async fn execute(args: MigrateArgs, config: Config) -> AppResult<()> {
    let db = Database::connect_without_migrations(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;

    match args.action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            tracing::info!("Schema is up to date");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            tracing::info!("Last migration reverted");
        }
        MigrateAction::Status => {
            let states = db.migration_status().await?;
            let pending = states.iter().filter(|m| !m.applied).count();

            for state in &states {
                let marker = if state.applied { "applied" } else { "pending" };
                println!("{:<8} {}", marker, state.name);
            }
            println!("{} migration(s), {} pending", states.len(), pending);
        }
        MigrateAction::Fresh => {
            tracing::warn!("Dropping all tables");
            db.fresh_migrations().await?;
            tracing::info!("Schema rebuilt from scratch");
        }
    }

    Ok(())
}
