//! Motorbike fleet handlers.

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
use crate::domain::{
    LockStatus, Motorbike, MotorbikeChanges, MotorbikePhoto, MotorbikeStatus, NewMotorbike,
};
use crate::errors::AppResult;
use crate::types::{ApiResponse, Created};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMotorbikeRequest {
    #[validate(length(min = 1, max = 255, message = "Model is required"))]
    #[schema(example = "Honda PCX 125")]
    pub model: String,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    #[schema(example = 41.0082)]
    pub location_latitude: f64,
    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    #[schema(example = 28.9784)]
    pub location_longitude: f64,
    /// Defaults to `available`
    pub status: Option<MotorbikeStatus>,
    /// Defaults to `locked`
    pub lock_status: Option<LockStatus>,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Partial update. A `photos` array replaces every stored photo.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateMotorbikeRequest {
    #[validate(length(min = 1, max = 255, message = "Model cannot be empty"))]
    pub model: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub location_latitude: Option<f64>,
    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    pub location_longitude: Option<f64>,
    pub status: Option<MotorbikeStatus>,
    pub lock_status: Option<LockStatus>,
    pub photos: Option<Vec<String>>,
}

pub fn motorbike_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_motorbikes).post(create_motorbike))
        .route("/available", get(list_available))
        .route("/maintenance", get(list_in_maintenance))
        .route("/rented-motorbikes", get(list_rented))
        .route("/motorbike-photos/:id", get(list_photos))
        .route(
            "/:id",
            get(get_motorbike)
                .put(update_motorbike)
                .delete(delete_motorbike),
        )
}

/// List every motorbike
#[utoipa::path(
    get,
    path = "/api/v1/motorbike",
    tag = "Motorbikes",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All motorbikes", body = Vec<Motorbike>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_motorbikes(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<Motorbike>>> {
    let bikes = state.services.motorbikes().list().await?;
    Ok(ApiResponse::list(bikes))
}

/// List motorbikes that can be rented right now
#[utoipa::path(
    get,
    path = "/api/v1/motorbike/available",
    tag = "Motorbikes",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Available motorbikes", body = Vec<Motorbike>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_available(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<Motorbike>>> {
    let bikes = state.services.motorbikes().list_available().await?;
    Ok(ApiResponse::list(bikes))
}

#[utoipa::path(
    get,
    path = "/api/v1/motorbike/maintenance",
    tag = "Motorbikes",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Motorbikes in maintenance", body = Vec<Motorbike>),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_in_maintenance(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<Motorbike>>> {
    require_admin(&current_user)?;
    let bikes = state.services.motorbikes().list_in_maintenance().await?;
    Ok(ApiResponse::list(bikes))
}

#[utoipa::path(
    get,
    path = "/api/v1/motorbike/rented-motorbikes",
    tag = "Motorbikes",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Motorbikes currently rented", body = Vec<Motorbike>),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_rented(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<Motorbike>>> {
    require_admin(&current_user)?;
    let bikes = state.services.motorbikes().list_rented().await?;
    Ok(ApiResponse::list(bikes))
}

#[utoipa::path(
    get,
    path = "/api/v1/motorbike/motorbike-photos/{id}",
    tag = "Motorbikes",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Motorbike ID")
    ),
    responses(
        (status = 200, description = "Photos of the motorbike", body = Vec<MotorbikePhoto>),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Motorbike not found")
    )
)]
pub async fn list_photos(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Vec<MotorbikePhoto>>> {
    require_admin(&current_user)?;
    let photos = state.services.motorbikes().photos(id).await?;
    Ok(ApiResponse::list(photos))
}

/// Get one motorbike with its photos
#[utoipa::path(
    get,
    path = "/api/v1/motorbike/{id}",
    tag = "Motorbikes",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Motorbike ID")
    ),
    responses(
        (status = 200, description = "Motorbike", body = Motorbike),
        (status = 404, description = "Motorbike not found")
    )
)]
pub async fn get_motorbike(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Motorbike>> {
    let bike = state.services.motorbikes().get(id).await?;
    Ok(ApiResponse::success(bike))
}

/// Add a motorbike to the fleet (admin only)
#[utoipa::path(
    post,
    path = "/api/v1/motorbike",
    tag = "Motorbikes",
    security(("bearer_auth" = [])),
    request_body = CreateMotorbikeRequest,
    responses(
        (status = 201, description = "Motorbike created", body = Motorbike),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn create_motorbike(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateMotorbikeRequest>,
) -> AppResult<Created<Motorbike>> {
    require_admin(&current_user)?;

    let bike = state
        .services
        .motorbikes()
        .create(NewMotorbike {
            model: payload.model,
            location_latitude: payload.location_latitude,
            location_longitude: payload.location_longitude,
            status: payload.status.unwrap_or(MotorbikeStatus::Available),
            lock_status: payload.lock_status.unwrap_or(LockStatus::Locked),
            photo_urls: payload.photos,
        })
        .await?;

    Ok(Created(bike))
}

#[utoipa::path(
    put,
    path = "/api/v1/motorbike/{id}",
    tag = "Motorbikes",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Motorbike ID")
    ),
    request_body = UpdateMotorbikeRequest,
    responses(
        (status = 200, description = "Motorbike updated", body = Motorbike),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Motorbike not found")
    )
)]
pub async fn update_motorbike(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateMotorbikeRequest>,
) -> AppResult<ApiResponse<Motorbike>> {
    require_admin(&current_user)?;

    let bike = state
        .services
        .motorbikes()
        .update(
            id,
            MotorbikeChanges {
                model: payload.model,
                location_latitude: payload.location_latitude,
                location_longitude: payload.location_longitude,
                status: payload.status,
                lock_status: payload.lock_status,
                photo_urls: payload.photos,
            },
        )
        .await?;

    Ok(ApiResponse::with_message(bike, "Motorbike updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/motorbike/{id}",
    tag = "Motorbikes",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Motorbike ID")
    ),
    responses(
        (status = 200, description = "Motorbike deleted"),
        (status = 400, description = "Motorbike is rented"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Motorbike not found")
    )
)]
pub async fn delete_motorbike(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<()>> {
    require_admin(&current_user)?;
    state.services.motorbikes().delete(id).await?;
    Ok(ApiResponse::message("Motorbike deleted"))
}
