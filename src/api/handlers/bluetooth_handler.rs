//! Bluetooth lock handlers.
//!
//! Riders connect to unlock the motorbike they are renting and disconnect
//! to lock it. Administrators manage the raw connection log.

use axum::{
    extract::{Extension, Path, State},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::AppState;
use crate::domain::{BluetoothConnection, ConnectionChanges, NewConnection};
use crate::errors::{AppResult, ResultExt};
use crate::types::{ApiResponse, Created};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateConnectionRequest {
    #[validate(range(min = 1, message = "Invalid user id"))]
    pub user_id: i64,
    #[validate(range(min = 1, message = "Invalid motorbike id"))]
    pub motorbike_id: i64,
    /// Defaults to now
    pub connected_at: Option<DateTime<Utc>>,
    pub disconnected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateConnectionRequest {
    pub connected_at: Option<DateTime<Utc>>,
    pub disconnected_at: Option<DateTime<Utc>>,
}

pub fn bluetooth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_connections).post(create_connection))
        .route("/me", get(list_my_connections))
        .route("/connect/:motorbike_id", post(connect))
        .route("/disconnect/:motorbike_id", post(disconnect))
        .route(
            "/:id",
            get(get_connection)
                .put(update_connection)
                .delete(delete_connection),
        )
}

/// Pair with a rented motorbike and unlock it
#[utoipa::path(
    post,
    path = "/api/v1/bluetooth/connect/{motorbike_id}",
    tag = "Bluetooth",
    security(("bearer_auth" = [])),
    params(
        ("motorbike_id" = i64, Path, description = "Motorbike ID")
    ),
    responses(
        (status = 200, description = "Connected, motorbike unlocked", body = BluetoothConnection),
        (status = 400, description = "No active ride on this motorbike"),
        (status = 404, description = "Motorbike not found"),
        (status = 409, description = "Motorbike already has an open connection")
    )
)]
pub async fn connect(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(motorbike_id): Path<i64>,
) -> AppResult<ApiResponse<BluetoothConnection>> {
    let connection = state
        .services
        .bluetooth()
        .connect(current_user.id, motorbike_id)
        .await
        .context(format!(
            "user {} connecting to motorbike {}",
            current_user.id, motorbike_id
        ))?;

    Ok(ApiResponse::with_message(connection, "Motorbike unlocked"))
}

/// End the pairing and lock the motorbike
#[utoipa::path(
    post,
    path = "/api/v1/bluetooth/disconnect/{motorbike_id}",
    tag = "Bluetooth",
    security(("bearer_auth" = [])),
    params(
        ("motorbike_id" = i64, Path, description = "Motorbike ID")
    ),
    responses(
        (status = 200, description = "Disconnected, motorbike locked", body = BluetoothConnection),
        (status = 400, description = "Already disconnected"),
        (status = 403, description = "Connection belongs to another user"),
        (status = 404, description = "No connection for this motorbike")
    )
)]
pub async fn disconnect(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(motorbike_id): Path<i64>,
) -> AppResult<ApiResponse<BluetoothConnection>> {
    let connection = state
        .services
        .bluetooth()
        .disconnect(current_user.id, motorbike_id)
        .await
        .context(format!(
            "user {} disconnecting from motorbike {}",
            current_user.id, motorbike_id
        ))?;

    Ok(ApiResponse::with_message(connection, "Motorbike locked"))
}

#[utoipa::path(
    get,
    path = "/api/v1/bluetooth/me",
    tag = "Bluetooth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own connections", body = Vec<BluetoothConnection>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_my_connections(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<BluetoothConnection>>> {
    let connections = state
        .services
        .bluetooth()
        .list_for_user(current_user.id)
        .await?;
    Ok(ApiResponse::list(connections))
}

#[utoipa::path(
    get,
    path = "/api/v1/bluetooth",
    tag = "Bluetooth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All connections", body = Vec<BluetoothConnection>),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_connections(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<BluetoothConnection>>> {
    require_admin(&current_user)?;
    let connections = state.services.bluetooth().list().await?;
    Ok(ApiResponse::list(connections))
}

/// Insert a connection record without touching the lock
#[utoipa::path(
    post,
    path = "/api/v1/bluetooth",
    tag = "Bluetooth",
    security(("bearer_auth" = [])),
    request_body = CreateConnectionRequest,
    responses(
        (status = 201, description = "Connection recorded", body = BluetoothConnection),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User or motorbike not found")
    )
)]
pub async fn create_connection(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateConnectionRequest>,
) -> AppResult<Created<BluetoothConnection>> {
    require_admin(&current_user)?;

    let connection = state
        .services
        .bluetooth()
        .create(NewConnection {
            user_id: payload.user_id,
            motorbike_id: payload.motorbike_id,
            connected_at: payload.connected_at.unwrap_or_else(Utc::now),
            disconnected_at: payload.disconnected_at,
        })
        .await?;

    Ok(Created(connection))
}

#[utoipa::path(
    get,
    path = "/api/v1/bluetooth/{id}",
    tag = "Bluetooth",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Connection ID")
    ),
    responses(
        (status = 200, description = "Connection", body = BluetoothConnection),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Connection not found")
    )
)]
pub async fn get_connection(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<BluetoothConnection>> {
    require_admin(&current_user)?;
    let connection = state.services.bluetooth().get(id).await?;
    Ok(ApiResponse::success(connection))
}

#[utoipa::path(
    put,
    path = "/api/v1/bluetooth/{id}",
    tag = "Bluetooth",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Connection ID")
    ),
    request_body = UpdateConnectionRequest,
    responses(
        (status = 200, description = "Connection updated", body = BluetoothConnection),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Connection not found")
    )
)]
pub async fn update_connection(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateConnectionRequest>,
) -> AppResult<ApiResponse<BluetoothConnection>> {
    require_admin(&current_user)?;

    let connection = state
        .services
        .bluetooth()
        .update(
            id,
            ConnectionChanges {
                connected_at: payload.connected_at,
                disconnected_at: payload.disconnected_at,
            },
        )
        .await?;

    Ok(ApiResponse::success(connection))
}

#[utoipa::path(
    delete,
    path = "/api/v1/bluetooth/{id}",
    tag = "Bluetooth",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Connection ID")
    ),
    responses(
        (status = 200, description = "Connection deleted"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Connection not found")
    )
)]
pub async fn delete_connection(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<()>> {
    require_admin(&current_user)?;
    state.services.bluetooth().delete(id).await?;
    Ok(ApiResponse::message("Bluetooth connection deleted"))
}
