//! User service - Handles user-related business logic.
//!
//! Admin management of accounts plus the self-service profile.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{
    validate_phone, CreateUser, NewUser, Password, UpdateProfile, UpdateUser, User, UserChanges,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{UnitOfWork, UserRepository};

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create an account with any role and status
    async fn create_user(&self, input: CreateUser) -> AppResult<User>;

    async fn get_user(&self, id: i64) -> AppResult<User>;

    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Administrative update
    async fn update_user(&self, id: i64, input: UpdateUser) -> AppResult<User>;

    /// Self-service update; role and status are not reachable from here
    async fn update_profile(&self, id: i64, input: UpdateProfile) -> AppResult<User>;

    async fn delete_user(&self, id: i64) -> AppResult<()>;
}

/// Hash the password and insert the account after uniqueness checks.
pub(crate) async fn create_account(
    users: &dyn UserRepository,
    input: CreateUser,
) -> AppResult<User> {
    ensure_available(users, None, Some(&input.email), input.phone.as_deref()).await?;

    let password_hash = Password::new(&input.password)?.into_string();
    users
        .create(NewUser {
            email: input.email,
            password_hash,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
            role: input.role,
            status: input.status,
        })
        .await
}

/// Fail with a conflict if `email` or `phone` belongs to someone other
/// than `owner`.
async fn ensure_available(
    users: &dyn UserRepository,
    owner: Option<i64>,
    email: Option<&str>,
    phone: Option<&str>,
) -> AppResult<()> {
    let is_other = |user: &User| Some(user.id) != owner;

    if let Some(email) = email {
        if users.find_by_email(email).await?.is_some_and(|u| is_other(&u)) {
            return Err(AppError::conflict("User with this email"));
        }
    }

    if let Some(phone) = phone {
        validate_phone(phone)?;
        if users.find_by_phone(phone).await?.is_some_and(|u| is_other(&u)) {
            return Err(AppError::conflict("User with this phone"));
        }
    }

    Ok(())
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn create_user(&self, input: CreateUser) -> AppResult<User> {
        let user = create_account(self.uow.users().as_ref(), input).await?;
        tracing::info!(user_id = user.id, role = %user.role, "User created");
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> AppResult<User> {
        self.uow.users().find_by_id(id).await?.ok_or_not_found("User")
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        self.uow.users().list().await
    }

    async fn update_user(&self, id: i64, input: UpdateUser) -> AppResult<User> {
        let users = self.uow.users();
        users.find_by_id(id).await?.ok_or_not_found("User")?;

        ensure_available(
            users.as_ref(),
            Some(id),
            input.email.as_deref(),
            input.phone.as_deref(),
        )
        .await?;

        let password_hash = match input.password {
            Some(plain) => Some(Password::new(&plain)?.into_string()),
            None => None,
        };

        let user = users
            .update(
                id,
                UserChanges {
                    email: input.email,
                    first_name: input.first_name,
                    last_name: input.last_name,
                    phone: input.phone,
                    role: input.role,
                    status: input.status,
                    password_hash,
                },
            )
            .await?;

        // A deactivated or banned account loses its refresh sessions.
        if input.status.is_some() && !user.is_active() {
            let sessions = self.uow.auth().delete_user_sessions(id).await?;
            tracing::info!(user_id = id, sessions, status = %user.status, "Sessions revoked");
        }

        Ok(user)
    }

    async fn update_profile(&self, id: i64, input: UpdateProfile) -> AppResult<User> {
        let users = self.uow.users();
        let current = users.find_by_id(id).await?.ok_or_not_found("User")?;

        ensure_available(
            users.as_ref(),
            Some(id),
            input.email.as_deref(),
            input.phone.as_deref(),
        )
        .await?;

        let password_hash = match input.new_password {
            Some(new_password) => {
                let current_password = input
                    .current_password
                    .ok_or_else(|| AppError::bad_request("Current password is required"))?;
                if !Password::from_hash(current.password_hash).verify(&current_password) {
                    return Err(AppError::bad_request("Current password is incorrect"));
                }
                Some(Password::new(&new_password)?.into_string())
            }
            None => None,
        };

        users
            .update(
                id,
                UserChanges {
                    email: input.email,
                    first_name: input.first_name,
                    last_name: input.last_name,
                    phone: input.phone,
                    password_hash,
                    ..Default::default()
                },
            )
            .await
    }

    async fn delete_user(&self, id: i64) -> AppResult<()> {
        // Deleting cascades to rides, which would strand a rented motorbike
        if let Some(ride) = self.uow.rides().find_active_by_user(id).await? {
            tracing::warn!(user_id = id, ride_id = ride.id, "Delete refused: active ride");
            return Err(AppError::bad_request("User has an active ride"));
        }

        self.uow.users().delete(id).await?;
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }
}
