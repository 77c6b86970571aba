//! User handlers.
//!
//! Reads go through the Redis user cache; every write drops the affected
//! keys. A failing cache is logged and otherwise ignored.

use axum::{
    extract::{Extension, Path, State},
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::AppState;
use crate::domain::{CreateUser, UpdateProfile, UpdateUser, UserResponse, UserRole, UserStatus};
use crate::errors::AppResult;
use crate::types::{ApiResponse, Created};

/// Account created by an administrator
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "staff@example.com")]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,
    pub phone: Option<String>,
    /// Defaults to `user`
    pub role: Option<UserRole>,
    /// Defaults to `active`
    pub status: Option<UserStatus>,
}

/// Administrative update; absent fields are left unchanged
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
}

/// Self-service profile update
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "First name cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,
    pub phone: Option<String>,
    /// Required together with `new_password`
    pub current_password: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: Option<String>,
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/me", get(get_current_user).put(update_current_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

// =============================================================================
// Cache helpers
// =============================================================================

async fn cached_user(state: &AppState, id: i64) -> Option<UserResponse> {
    state
        .cache
        .get_user(id)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(user_id = id, error = %e, "User cache read failed");
            None
        })
}

async fn remember_user(state: &AppState, user: &UserResponse) {
    if let Err(e) = state.cache.set_user(user).await {
        tracing::warn!(user_id = user.id, error = %e, "User cache write failed");
    }
}

/// Drop the cached user list after any account change.
pub(super) async fn forget_user_list(state: &AppState) {
    if let Err(e) = state.cache.invalidate_user_list().await {
        tracing::warn!(error = %e, "User list cache invalidation failed");
    }
}

pub(super) async fn forget_user(state: &AppState, id: i64) {
    if let Err(e) = state.cache.invalidate_user(id).await {
        tracing::warn!(user_id = id, error = %e, "User cache invalidation failed");
    }
    forget_user_list(state).await;
}

async fn load_user(state: &AppState, id: i64) -> AppResult<UserResponse> {
    if let Some(user) = cached_user(state, id).await {
        return Ok(user);
    }

    let user = UserResponse::from(state.services.users().get_user(id).await?);
    remember_user(state, &user).await;
    Ok(user)
}

// =============================================================================
// Handlers
// =============================================================================

/// Get current authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_current_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = load_user(&state, current_user.id).await?;
    Ok(ApiResponse::success(user))
}

/// Update own profile
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error or wrong current password"),
        (status = 409, description = "Email or phone already in use")
    )
)]
pub async fn update_current_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .services
        .users()
        .update_profile(
            current_user.id,
            UpdateProfile {
                email: payload.email,
                first_name: payload.first_name,
                last_name: payload.last_name,
                phone: payload.phone,
                current_password: payload.current_password,
                new_password: payload.new_password,
            },
        )
        .await?;

    forget_user(&state, current_user.id).await;

    Ok(ApiResponse::with_message(
        UserResponse::from(user),
        "Profile updated",
    ))
}

/// List all users (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of all users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_users(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    require_admin(&current_user)?;

    let cached = state.cache.get_user_list().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "User list cache read failed");
        None
    });
    if let Some(users) = cached {
        return Ok(ApiResponse::list(users));
    }

    let users: Vec<UserResponse> = state
        .services
        .users()
        .list_users()
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    if let Err(e) = state.cache.set_user_list(&users).await {
        tracing::warn!(error = %e, "User list cache write failed");
    }

    Ok(ApiResponse::list(users))
}

/// Create a user with any role and status (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 409, description = "Email or phone already in use")
    )
)]
pub async fn create_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> AppResult<Created<UserResponse>> {
    require_admin(&current_user)?;

    let user = state
        .services
        .users()
        .create_user(CreateUser {
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
            role: payload.role.unwrap_or(UserRole::User),
            status: payload.status.unwrap_or(UserStatus::Active),
        })
        .await?;

    forget_user_list(&state).await;

    Ok(Created(UserResponse::from(user)))
}

/// Get user by ID (admin only)
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<UserResponse>> {
    require_admin(&current_user)?;

    let user = load_user(&state, id).await?;
    Ok(ApiResponse::success(user))
}

/// Update any user (admin only)
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email or phone already in use")
    )
)]
pub async fn update_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateUserRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    require_admin(&current_user)?;

    let user = state
        .services
        .users()
        .update_user(
            id,
            UpdateUser {
                email: payload.email,
                first_name: payload.first_name,
                last_name: payload.last_name,
                phone: payload.phone,
                role: payload.role,
                status: payload.status,
                password: payload.password,
            },
        )
        .await?;

    forget_user(&state, id).await;

    Ok(ApiResponse::with_message(UserResponse::from(user), "User updated"))
}

/// Delete a user (admin only)
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<()>> {
    require_admin(&current_user)?;

    state.services.users().delete_user(id).await?;
    forget_user(&state, id).await;

    Ok(ApiResponse::message("User deleted"))
}
