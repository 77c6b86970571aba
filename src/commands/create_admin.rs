//! Create-admin command - Bootstrap the first administrator.

use std::sync::Arc;

use crate::cli::args::CreateAdminArgs;
use crate::config::Config;
use crate::domain::{CreateUser, UserRole, UserStatus};
use crate::errors::{AppError, AppResult};
use crate::infra::{Database, Persistence};
use crate::services::{UserManager, UserService};

pub async fn execute(args: CreateAdminArgs, config: Config) -> AppResult<()> {
    let db = Database::connect(&config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;

    let users = UserManager::new(Arc::new(Persistence::new(db.get_connection())));
    let admin = users
        .create_user(CreateUser {
            email: args.email,
            password: args.password,
            first_name: args.first_name,
            last_name: args.last_name,
            phone: None,
            role: UserRole::Admin,
            status: UserStatus::Active,
        })
        .await?;

    tracing::info!(user_id = admin.id, "Administrator created");
    println!("Created admin {} (id {})", admin.email, admin.id);

    Ok(())
}
