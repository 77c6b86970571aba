//! Authentication handlers.

use axum::{
    extract::{Extension, State},
    middleware,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::user_handler::{forget_user, forget_user_list};
use crate::api::extractors::{Client, ValidatedJson};
use crate::api::middleware::{auth_middleware, AccessToken};
use crate::api::AppState;
use crate::domain::{CreateUser, UserResponse, UserRole, UserStatus};
use crate::errors::AppResult;
use crate::services::{PasswordResetTicket, TokenPair};
use crate::types::{ApiResponse, Created};

/// User registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "rider@example.com")]
    pub email: String,
    /// Minimum 6 characters
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "secret123", min_length = 6)]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    #[schema(example = "John")]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "+905551112233")]
    pub phone: Option<String>,
}

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "rider@example.com")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "secret123")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Optional body of a logout; naming the refresh token also ends its session.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "rider@example.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    #[schema(example = "newsecret123", min_length = 6)]
    pub new_password: String,
}

/// Create authentication routes. Only logout needs a bearer token.
pub fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// Register a new rider account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email or phone already in use"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<Created<UserResponse>> {
    let user = state
        .services
        .auth()
        .register(CreateUser {
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
            role: UserRole::User,
            status: UserStatus::Active,
        })
        .await?;

    forget_user_list(&state).await;

    Ok(Created(UserResponse::from(user)))
}

/// Login and get a token pair
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenPair),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account is not active")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Client(client): Client,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<ApiResponse<TokenPair>> {
    let tokens = state
        .services
        .auth()
        .login(payload.email, payload.password, client)
        .await?;

    // last_login changed
    forget_user(&state, tokens.user.id).await;

    Ok(ApiResponse::with_message(tokens, "Login successful"))
}

/// Exchange a refresh token for a new token pair
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "Authentication",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = TokenPair),
        (status = 401, description = "Unknown, blocked or expired session")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Client(client): Client,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> AppResult<ApiResponse<TokenPair>> {
    let tokens = state
        .services
        .auth()
        .refresh(&payload.refresh_token, client)
        .await?;

    Ok(ApiResponse::success(tokens))
}

/// Revoke the current access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    request_body(content = LogoutRequest, description = "Optional", content_type = "application/json"),
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(AccessToken(token)): Extension<AccessToken>,
    body: Option<Json<LogoutRequest>>,
) -> AppResult<ApiResponse<()>> {
    let Json(body) = body.unwrap_or_default();

    state
        .services
        .auth()
        .logout(&token, body.refresh_token)
        .await?;

    Ok(ApiResponse::message("Logged out successfully"))
}

/// Issue a password reset token
#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    tag = "Authentication",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset token issued", body = PasswordResetTicket),
        (status = 404, description = "User not found")
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> AppResult<ApiResponse<PasswordResetTicket>> {
    let ticket = state.services.auth().forgot_password(&payload.email).await?;
    Ok(ApiResponse::success(ticket))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    tag = "Authentication",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid or used token")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .services
        .auth()
        .reset_password(&payload.token, &payload.new_password)
        .await?;

    Ok(ApiResponse::message("Password has been reset"))
}
