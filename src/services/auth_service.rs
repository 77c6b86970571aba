//! Authentication service - Handles user authentication and authorization.
//!
//! Access and password-reset tokens are signed with `JWT_SECRET`, refresh
//! tokens with `JWT_REFRESH_SECRET`. The `purpose` claim keeps one kind of
//! token from being accepted where another is expected.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::user_service::create_account;
use crate::config::{
    Config, PASSWORD_RESET_TOKEN_MINUTES, SECONDS_PER_HOUR, SESSION_LIFETIME_HOURS,
    TOKEN_PURPOSE_ACCESS, TOKEN_PURPOSE_PASSWORD_RESET, TOKEN_PURPOSE_REFRESH, TOKEN_TYPE_BEARER,
};
use crate::domain::{
    CleanupReport, ClientInfo, CreateUser, IssuedToken, NewSession, Password, User, UserChanges,
    UserResponse, UserRole, UserStatus,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub role: String,
    pub status: String,
    pub purpose: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    fn new(user: &User, purpose: &str, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            email: user.email.clone(),
            role: user.role.to_string(),
            status: user.status.to_string(),
            purpose: purpose.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    pub fn role(&self) -> UserRole {
        UserRole::from(self.role.as_str())
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// Token pair returned after login or refresh
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenPair {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// JWT refresh token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub refresh_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds
    #[schema(example = 54000)]
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Password reset token. Delivered in the response since no mailer exists.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PasswordResetTicket {
    pub reset_token: String,
    #[schema(example = 3600)]
    pub expires_in: i64,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Self-service sign up. Role and status are always `user`/`active`.
    async fn register(&self, input: CreateUser) -> AppResult<User>;

    /// Exchange credentials for a token pair and open a session
    async fn login(&self, email: String, password: String, client: ClientInfo)
        -> AppResult<TokenPair>;

    /// Rotate a refresh token into a new pair
    async fn refresh(&self, refresh_token: &str, client: ClientInfo) -> AppResult<TokenPair>;

    /// Revoke the access token and drop the matching session
    async fn logout(&self, access_token: &str, refresh_token: Option<String>) -> AppResult<()>;

    async fn forgot_password(&self, email: &str) -> AppResult<PasswordResetTicket>;

    async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()>;

    /// Verify an access token: signature, expiry, purpose and revocation
    async fn validate_token(&self, token: &str) -> AppResult<Claims>;

    /// Purge expired tokens, sessions and blacklist entries
    async fn cleanup_expired(&self) -> AppResult<CleanupReport>;
}

fn sign(claims: &Claims, secret: &[u8]) -> AppResult<String> {
    let token = encode(&Header::default(), claims, &EncodingKey::from_secret(secret))?;
    Ok(token)
}

fn decode_claims(token: &str, secret: &[u8], purpose: &str) -> AppResult<Claims> {
    let claims = decode::<Claims>(token, &DecodingKey::from_secret(secret), &Validation::default())?
        .claims;

    if claims.purpose != purpose {
        return Err(AppError::Unauthorized);
    }
    Ok(claims)
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, config: Config) -> Self {
        Self { uow, config }
    }

    fn access_lifetime(&self) -> Duration {
        Duration::hours(self.config.jwt_expiration_hours)
    }

    fn refresh_lifetime(&self) -> Duration {
        Duration::days(self.config.jwt_refresh_expiration_days)
    }

    /// Sign a new pair for `user` and record it.
    async fn issue_pair(&self, user: &User) -> AppResult<TokenPair> {
        let access = Claims::new(user, TOKEN_PURPOSE_ACCESS, self.access_lifetime());
        let refresh = Claims::new(user, TOKEN_PURPOSE_REFRESH, self.refresh_lifetime());

        let access_token = sign(&access, self.config.jwt_secret_bytes())?;
        let refresh_token = sign(&refresh, self.config.jwt_refresh_secret_bytes())?;

        self.uow
            .auth()
            .save_token(IssuedToken {
                user_id: user.id,
                access_token: access_token.clone(),
                refresh_token: refresh_token.clone(),
                expires_at: access.expires_at(),
            })
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.config.jwt_expiration_hours * SECONDS_PER_HOUR,
            user: UserResponse::from(user.clone()),
        })
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(&self, input: CreateUser) -> AppResult<User> {
        let input = CreateUser {
            role: UserRole::User,
            status: UserStatus::Active,
            ..input
        };

        let user = create_account(self.uow.users().as_ref(), input).await?;
        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    async fn login(
        &self,
        email: String,
        password: String,
        client: ClientInfo,
    ) -> AppResult<TokenPair> {
        let found = self.uow.users().find_by_email(&email).await?;

        // Unknown emails still pay for a hash check so response timing does
        // not reveal which accounts exist.
        let verified = Password::verify_optional(
            found.as_ref().map(|u| u.password_hash.as_str()),
            &password,
        );

        let user = match found {
            Some(user) if verified => user,
            _ => {
                tracing::warn!("Login failed: invalid credentials");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !user.is_active() {
            tracing::warn!(user_id = user.id, status = %user.status, "Login refused for inactive account");
            return Err(AppError::AccountInactive);
        }

        let pair = self.issue_pair(&user).await?;
        let now = Utc::now();

        self.uow
            .auth()
            .create_session(NewSession {
                user_id: user.id,
                refresh_token: pair.refresh_token.clone(),
                client,
                expires_at: now + Duration::hours(SESSION_LIFETIME_HOURS),
            })
            .await?;
        self.uow.users().touch_last_login(user.id, now).await?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str, client: ClientInfo) -> AppResult<TokenPair> {
        let claims = decode_claims(
            refresh_token,
            self.config.jwt_refresh_secret_bytes(),
            TOKEN_PURPOSE_REFRESH,
        )?;

        let now = Utc::now();
        let session = self
            .uow
            .auth()
            .find_session_by_refresh_token(refresh_token)
            .await?
            .filter(|s| s.user_id == claims.sub && s.is_valid_at(now))
            .ok_or(AppError::SessionInvalid)?;

        let user = self
            .uow
            .users()
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::SessionInvalid)?;
        if !user.is_active() {
            return Err(AppError::AccountInactive);
        }

        let pair = self.issue_pair(&user).await?;
        self.uow
            .auth()
            .rotate_session(
                session.id,
                pair.refresh_token.clone(),
                now + Duration::hours(SESSION_LIFETIME_HOURS),
            )
            .await?;

        tracing::debug!(
            user_id = user.id,
            session_id = session.id,
            client_ip = %client.client_ip,
            "Session rotated"
        );
        Ok(pair)
    }

    async fn logout(&self, access_token: &str, refresh_token: Option<String>) -> AppResult<()> {
        let claims = self.validate_token(access_token).await?;

        self.uow
            .auth()
            .blacklist_token(access_token.to_string(), claims.expires_at())
            .await?;

        if let Some(refresh_token) = refresh_token {
            let removed = self
                .uow
                .auth()
                .delete_session(claims.sub, &refresh_token)
                .await?;
            if removed == 0 {
                tracing::debug!(user_id = claims.sub, "Logout: no matching session");
            }
        }

        tracing::info!(user_id = claims.sub, "User logged out");
        Ok(())
    }

    async fn forgot_password(&self, email: &str) -> AppResult<PasswordResetTicket> {
        let user = self
            .uow
            .users()
            .find_by_email(email)
            .await?
            .ok_or_not_found("User")?;

        let lifetime = Duration::minutes(PASSWORD_RESET_TOKEN_MINUTES);
        let claims = Claims::new(&user, TOKEN_PURPOSE_PASSWORD_RESET, lifetime);
        let reset_token = sign(&claims, self.config.jwt_secret_bytes())?;

        tracing::info!(user_id = user.id, "Password reset requested");
        tracing::debug!(user_id = user.id, reset_token = %reset_token, "Password reset token issued");

        Ok(PasswordResetTicket {
            reset_token,
            expires_in: lifetime.num_seconds(),
        })
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        let claims = decode_claims(
            token,
            self.config.jwt_secret_bytes(),
            TOKEN_PURPOSE_PASSWORD_RESET,
        )
        .map_err(|_| AppError::Unauthorized)?;

        if self.uow.auth().is_blacklisted(token).await? {
            return Err(AppError::TokenRevoked);
        }

        let user = self
            .uow
            .users()
            .find_by_id(claims.sub)
            .await?
            .ok_or_not_found("User")?;

        let password_hash = Password::new(new_password)?.into_string();
        self.uow
            .users()
            .update(
                user.id,
                UserChanges {
                    password_hash: Some(password_hash),
                    ..Default::default()
                },
            )
            .await?;

        // Reset tokens are single use.
        self.uow
            .auth()
            .blacklist_token(token.to_string(), claims.expires_at())
            .await?;
        let sessions = self.uow.auth().delete_user_sessions(user.id).await?;

        tracing::info!(user_id = user.id, sessions, "Password reset");
        Ok(())
    }

    async fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let claims = decode_claims(token, self.config.jwt_secret_bytes(), TOKEN_PURPOSE_ACCESS)?;

        if self.uow.auth().is_blacklisted(token).await? {
            return Err(AppError::TokenRevoked);
        }
        Ok(claims)
    }

    async fn cleanup_expired(&self) -> AppResult<CleanupReport> {
        let report = self.uow.auth().delete_expired(Utc::now()).await?;
        tracing::info!(
            tokens = report.tokens,
            sessions = report.sessions,
            blacklisted_tokens = report.blacklisted_tokens,
            "Expired auth data removed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Session;
    use crate::infra::{MockAuthRepository, MockPersistence, MockUserRepository};
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    const SECRET: &str = "test-secret-key-for-testing-only-32chars";
    const REFRESH_SECRET: &str = "test-refresh-secret-for-testing-32chars";

    fn config() -> Config {
        Config::new(SECRET, REFRESH_SECRET)
    }

    fn user(status: UserStatus, password: &str) -> User {
        let now = Utc::now();
        User {
            id: 7,
            email: "rider@example.com".into(),
            password_hash: Password::new(password).unwrap().into_string(),
            first_name: "Rider".into(),
            last_name: "One".into(),
            phone: None,
            role: UserRole::User,
            status,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn service(uow: MockPersistence) -> Authenticator<MockPersistence> {
        Authenticator::new(Arc::new(uow), config())
    }

    fn not_blacklisted() -> MockAuthRepository {
        let mut auth = MockAuthRepository::new();
        auth.expect_is_blacklisted().returning(|_| Ok(false));
        auth
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let existing = user(UserStatus::Active, "secret1");
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .withf(|email| email == "rider@example.com")
            .returning(move |_| Ok(Some(existing.clone())));

        let svc = service(MockPersistence::new().with_users(users));
        let err = svc
            .register(CreateUser {
                email: "rider@example.com".into(),
                password: "secret1".into(),
                first_name: "A".into(),
                last_name: "B".into(),
                phone: None,
                role: UserRole::Admin,
                status: UserStatus::Active,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_register_forces_user_role() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        users
            .expect_create()
            .withf(|new| new.role == UserRole::User && new.status == UserStatus::Active)
            .returning(|new| {
                let mut u = user(new.status, "secret1");
                u.email = new.email;
                u.role = new.role;
                Ok(u)
            });

        let svc = service(MockPersistence::new().with_users(users));
        let created = assert_ok!(
            svc.register(CreateUser {
                email: "new@example.com".into(),
                password: "secret1".into(),
                first_name: "A".into(),
                last_name: "B".into(),
                phone: None,
                role: UserRole::Admin,
                status: UserStatus::Banned,
            })
            .await
        );
        assert!(!created.is_admin());
    }

    #[tokio::test]
    async fn test_login_wrong_password_and_unknown_email_look_the_same() {
        let existing = user(UserStatus::Active, "correct-password");
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(move |email| {
            Ok((email == "rider@example.com").then(|| existing.clone()))
        });

        let svc = service(MockPersistence::new().with_users(users));

        let wrong = svc
            .login("rider@example.com".into(), "nope-nope".into(), ClientInfo::default())
            .await;
        let unknown = svc
            .login("ghost@example.com".into(), "nope-nope".into(), ClientInfo::default())
            .await;

        assert!(matches!(wrong, Err(AppError::InvalidCredentials)));
        assert!(matches!(unknown, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_refuses_inactive_account() {
        let banned = user(UserStatus::Banned, "secret1");
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(banned.clone())));

        let svc = service(MockPersistence::new().with_users(users));
        let result = svc
            .login("rider@example.com".into(), "secret1".into(), ClientInfo::default())
            .await;

        assert!(matches!(result, Err(AppError::AccountInactive)));
    }

    #[tokio::test]
    async fn test_login_issues_tokens_and_opens_session() {
        let active = user(UserStatus::Active, "secret1");
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(active.clone())));
        users
            .expect_touch_last_login()
            .withf(|id, _| *id == 7)
            .times(1)
            .returning(|_, _| Ok(()));

        let mut auth = not_blacklisted();
        auth.expect_save_token().times(1).returning(|_| Ok(()));
        auth.expect_create_session()
            .withf(|s| s.user_id == 7 && s.client.client_ip == "10.0.0.1")
            .times(1)
            .returning(|s| {
                Ok(Session {
                    id: 1,
                    user_id: s.user_id,
                    refresh_token: s.refresh_token,
                    user_agent: s.client.user_agent,
                    client_ip: s.client.client_ip,
                    is_blocked: false,
                    expires_at: s.expires_at,
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                })
            });

        let svc = service(MockPersistence::new().with_users(users).with_auth(auth));
        let client = ClientInfo {
            user_agent: "curl".into(),
            client_ip: "10.0.0.1".into(),
        };
        let pair = assert_ok!(
            svc.login("rider@example.com".into(), "secret1".into(), client)
                .await
        );

        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 15 * 3600);
        assert_ne!(pair.access_token, pair.refresh_token);

        let claims = assert_ok!(svc.validate_token(&pair.access_token).await);
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.purpose, "access");

        // A refresh token is not an access token.
        assert_err!(svc.validate_token(&pair.refresh_token).await);
    }

    #[tokio::test]
    async fn test_blacklisted_token_is_revoked() {
        let active = user(UserStatus::Active, "secret1");
        let claims = Claims::new(&active, TOKEN_PURPOSE_ACCESS, Duration::hours(1));
        let token = sign(&claims, SECRET.as_bytes()).unwrap();

        let mut auth = MockAuthRepository::new();
        auth.expect_is_blacklisted().returning(|_| Ok(true));

        let svc = service(MockPersistence::new().with_auth(auth));
        let result = svc.validate_token(&token).await;
        assert!(matches!(result, Err(AppError::TokenRevoked)));
    }

    #[tokio::test]
    async fn test_expired_token_is_auth_error() {
        let active = user(UserStatus::Active, "secret1");
        let claims = Claims::new(&active, TOKEN_PURPOSE_ACCESS, Duration::hours(-2));
        let token = sign(&claims, SECRET.as_bytes()).unwrap();

        let svc = service(MockPersistence::new().with_auth(not_blacklisted()));
        let err = svc.validate_token(&token).await.unwrap_err();
        assert_eq!(err.code(), "AUTH_ERROR");
    }

    #[tokio::test]
    async fn test_refresh_with_unknown_session_fails() {
        let active = user(UserStatus::Active, "secret1");
        let claims = Claims::new(&active, TOKEN_PURPOSE_REFRESH, Duration::days(1));
        let token = sign(&claims, REFRESH_SECRET.as_bytes()).unwrap();

        let mut auth = MockAuthRepository::new();
        auth.expect_find_session_by_refresh_token()
            .returning(|_| Ok(None));

        let svc = service(MockPersistence::new().with_auth(auth));
        let result = svc.refresh(&token, ClientInfo::default()).await;
        assert!(matches!(result, Err(AppError::SessionInvalid)));
    }

    #[tokio::test]
    async fn test_refresh_with_blocked_session_fails() {
        let active = user(UserStatus::Active, "secret1");
        let claims = Claims::new(&active, TOKEN_PURPOSE_REFRESH, Duration::days(1));
        let token = sign(&claims, REFRESH_SECRET.as_bytes()).unwrap();

        let stored = token.clone();
        let mut auth = MockAuthRepository::new();
        auth.expect_find_session_by_refresh_token()
            .returning(move |_| {
                Ok(Some(Session {
                    id: 3,
                    user_id: 7,
                    refresh_token: stored.clone(),
                    user_agent: String::new(),
                    client_ip: String::new(),
                    is_blocked: true,
                    expires_at: Utc::now() + Duration::hours(1),
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                }))
            });

        let svc = service(MockPersistence::new().with_auth(auth));
        let result = svc.refresh(&token, ClientInfo::default()).await;
        assert!(matches!(result, Err(AppError::SessionInvalid)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let active = user(UserStatus::Active, "secret1");
        let claims = Claims::new(&active, TOKEN_PURPOSE_ACCESS, Duration::hours(1));
        let token = sign(&claims, SECRET.as_bytes()).unwrap();

        let svc = service(MockPersistence::new());
        assert_err!(svc.refresh(&token, ClientInfo::default()).await);
    }

    #[tokio::test]
    async fn test_logout_blacklists_and_drops_session() {
        let active = user(UserStatus::Active, "secret1");
        let claims = Claims::new(&active, TOKEN_PURPOSE_ACCESS, Duration::hours(1));
        let token = sign(&claims, SECRET.as_bytes()).unwrap();
        let expected = token.clone();

        let mut auth = not_blacklisted();
        auth.expect_blacklist_token()
            .withf(move |t, _| *t == expected)
            .times(1)
            .returning(|_, _| Ok(()));
        auth.expect_delete_session()
            .withf(|user_id, rt| *user_id == 7 && rt == "refresh-1")
            .times(1)
            .returning(|_, _| Ok(1));

        let svc = service(MockPersistence::new().with_auth(auth));
        assert_ok!(svc.logout(&token, Some("refresh-1".into())).await);
    }

    #[tokio::test]
    async fn test_reset_password_requires_reset_token() {
        let active = user(UserStatus::Active, "secret1");
        let claims = Claims::new(&active, TOKEN_PURPOSE_ACCESS, Duration::hours(1));
        let token = sign(&claims, SECRET.as_bytes()).unwrap();

        let svc = service(MockPersistence::new());
        let result = svc.reset_password(&token, "brand-new").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_forgot_then_reset_password() {
        let active = user(UserStatus::Active, "secret1");
        let by_email = active.clone();
        let by_id = active.clone();

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(by_email.clone())));
        users
            .expect_find_by_id()
            .with(eq(7))
            .returning(move |_| Ok(Some(by_id.clone())));
        users
            .expect_update()
            .withf(|id, changes| *id == 7 && changes.password_hash.is_some())
            .times(1)
            .returning(move |_, _| Ok(active.clone()));

        let mut auth = not_blacklisted();
        auth.expect_blacklist_token().times(1).returning(|_, _| Ok(()));
        auth.expect_delete_user_sessions()
            .with(eq(7))
            .times(1)
            .returning(|_| Ok(2));

        let svc = service(MockPersistence::new().with_users(users).with_auth(auth));
        let ticket = assert_ok!(svc.forgot_password("rider@example.com").await);
        assert_eq!(ticket.expires_in, 3600);

        assert_ok!(svc.reset_password(&ticket.reset_token, "brand-new").await);
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));

        let svc = service(MockPersistence::new().with_users(users));
        let result = svc.forgot_password("ghost@example.com").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
