//! Persistence for issued tokens, refresh sessions and revoked tokens.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use super::entities::{session, token, token_blacklist};
use crate::domain::{CleanupReport, IssuedToken, NewSession, Session};
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Record an issued token pair
    async fn save_token(&self, token: IssuedToken) -> AppResult<()>;

    async fn create_session(&self, session: NewSession) -> AppResult<Session>;

    async fn find_session_by_refresh_token(&self, refresh_token: &str)
        -> AppResult<Option<Session>>;

    /// Swap the session's refresh token and extend its expiry
    async fn rotate_session(
        &self,
        id: i64,
        refresh_token: String,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Session>;

    /// Delete the user's session holding `refresh_token`; returns rows removed
    async fn delete_session(&self, user_id: i64, refresh_token: &str) -> AppResult<u64>;

    /// Delete every session of a user; returns rows removed
    async fn delete_user_sessions(&self, user_id: i64) -> AppResult<u64>;

    /// Revoke a token until it would have expired anyway
    async fn blacklist_token(&self, token: String, expires_at: DateTime<Utc>) -> AppResult<()>;

    async fn is_blacklisted(&self, token: &str) -> AppResult<bool>;

    /// Remove everything that expired before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<CleanupReport>;
}

pub struct AuthStore {
    db: DatabaseConnection,
}

impl AuthStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthRepository for AuthStore {
    async fn save_token(&self, issued: IssuedToken) -> AppResult<()> {
        token::ActiveModel {
            user_id: Set(issued.user_id),
            access_token: Set(issued.access_token),
            refresh_token: Set(issued.refresh_token),
            expires_at: Set(issued.expires_at),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    async fn create_session(&self, new: NewSession) -> AppResult<Session> {
        let now = Utc::now();
        let model = session::ActiveModel {
            user_id: Set(new.user_id),
            refresh_token: Set(new.refresh_token),
            user_agent: Set(new.client.user_agent),
            client_ip: Set(new.client.client_ip),
            is_blocked: Set(false),
            expires_at: Set(new.expires_at),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(Session::from(model))
    }

    async fn find_session_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> AppResult<Option<Session>> {
        let result = session::Entity::find()
            .filter(session::Column::RefreshToken.eq(refresh_token))
            .one(&self.db)
            .await?;

        Ok(result.map(Session::from))
    }

    async fn rotate_session(
        &self,
        id: i64,
        refresh_token: String,
        expires_at: DateTime<Utc>,
    ) -> AppResult<Session> {
        let current = session::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Session")?;

        let mut active: session::ActiveModel = current.into();
        active.refresh_token = Set(refresh_token);
        active.expires_at = Set(expires_at);
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await?;
        Ok(Session::from(model))
    }

    async fn delete_session(&self, user_id: i64, refresh_token: &str) -> AppResult<u64> {
        let result = session::Entity::delete_many()
            .filter(session::Column::UserId.eq(user_id))
            .filter(session::Column::RefreshToken.eq(refresh_token))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn delete_user_sessions(&self, user_id: i64) -> AppResult<u64> {
        let result = session::Entity::delete_many()
            .filter(session::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn blacklist_token(&self, token: String, expires_at: DateTime<Utc>) -> AppResult<()> {
        let entry = token_blacklist::ActiveModel {
            token: Set(token),
            expires_at: Set(expires_at),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        // Logging out twice with the same token is not an error.
        token_blacklist::Entity::insert(entry)
            .on_conflict(
                OnConflict::column(token_blacklist::Column::Token)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(AppError::from)?;
        Ok(())
    }

    async fn is_blacklisted(&self, token: &str) -> AppResult<bool> {
        let count = token_blacklist::Entity::find()
            .filter(token_blacklist::Column::Token.eq(token))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<CleanupReport> {
        let tokens = token::Entity::delete_many()
            .filter(token::Column::ExpiresAt.lt(now))
            .exec(&self.db)
            .await?
            .rows_affected;

        let sessions = session::Entity::delete_many()
            .filter(session::Column::ExpiresAt.lt(now))
            .exec(&self.db)
            .await?
            .rows_affected;

        let blacklisted_tokens = token_blacklist::Entity::delete_many()
            .filter(token_blacklist::Column::ExpiresAt.lt(now))
            .exec(&self.db)
            .await?
            .rows_affected;

        Ok(CleanupReport {
            tokens,
            sessions,
            blacklisted_tokens,
        })
    }
}
