//! Ride handlers.

use axum::{
    extract::{Extension, Path, State},
    routing::{get, put},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::AppState;
use crate::domain::{Ride, RideChanges};
use crate::errors::{AppResult, ResultExt};
use crate::types::{ApiResponse, Created};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StartRideRequest {
    #[validate(range(min = 1, message = "Invalid motorbike id"))]
    #[schema(example = 3)]
    pub motorbike_id: i64,
}

/// Administrative correction of a ride
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRideRequest {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[validate(range(min = 0, message = "Duration cannot be negative"))]
    pub duration_seconds: Option<i64>,
    #[validate(range(min = 0.0, message = "Cost cannot be negative"))]
    pub cost: Option<f64>,
}

pub fn ride_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rides).post(start_ride))
        .route("/me", get(list_my_rides))
        .route("/finish/:id", put(finish_ride))
        .route("/user/:user_id", get(list_user_rides))
        .route("/bike/:motorbike_id", get(list_motorbike_rides))
        .route("/:id", get(get_ride).put(update_ride).delete(delete_ride))
}

/// Rent a motorbike
#[utoipa::path(
    post,
    path = "/api/v1/rides",
    tag = "Rides",
    security(("bearer_auth" = [])),
    request_body = StartRideRequest,
    responses(
        (status = 201, description = "Ride started", body = Ride),
        (status = 400, description = "Motorbike is not available"),
        (status = 404, description = "Motorbike not found"),
        (status = 409, description = "User already has an active ride")
    )
)]
pub async fn start_ride(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<StartRideRequest>,
) -> AppResult<Created<Ride>> {
    let ride = state
        .services
        .rides()
        .start_ride(current_user.id, payload.motorbike_id)
        .await
        .context(format!(
            "user {} starting a ride on motorbike {}",
            current_user.id, payload.motorbike_id
        ))?;

    Ok(Created(ride))
}

/// End an own ride; the motorbike must be locked first
#[utoipa::path(
    put,
    path = "/api/v1/rides/finish/{id}",
    tag = "Rides",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Ride ID")
    ),
    responses(
        (status = 200, description = "Ride finished and priced", body = Ride),
        (status = 400, description = "Already finished or motorbike unlocked"),
        (status = 403, description = "Ride belongs to another user"),
        (status = 404, description = "Ride not found")
    )
)]
pub async fn finish_ride(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Ride>> {
    let ride = state
        .services
        .rides()
        .finish_ride(id, current_user.id)
        .await
        .context(format!("user {} finishing ride {}", current_user.id, id))?;

    Ok(ApiResponse::with_message(ride, "Ride finished"))
}

/// Rides of the current user
#[utoipa::path(
    get,
    path = "/api/v1/rides/me",
    tag = "Rides",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own rides", body = Vec<Ride>),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_my_rides(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<Ride>>> {
    let rides = state.services.rides().list_for_user(current_user.id).await?;
    Ok(ApiResponse::list(rides))
}

#[utoipa::path(
    get,
    path = "/api/v1/rides",
    tag = "Rides",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All rides", body = Vec<Ride>),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_rides(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<Ride>>> {
    require_admin(&current_user)?;
    let rides = state.services.rides().list().await?;
    Ok(ApiResponse::list(rides))
}

#[utoipa::path(
    get,
    path = "/api/v1/rides/user/{user_id}",
    tag = "Rides",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Rides of the user", body = Vec<Ride>),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_user_rides(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<ApiResponse<Vec<Ride>>> {
    require_admin(&current_user)?;
    let rides = state.services.rides().list_for_user(user_id).await?;
    Ok(ApiResponse::list(rides))
}

#[utoipa::path(
    get,
    path = "/api/v1/rides/bike/{motorbike_id}",
    tag = "Rides",
    security(("bearer_auth" = [])),
    params(
        ("motorbike_id" = i64, Path, description = "Motorbike ID")
    ),
    responses(
        (status = 200, description = "Rides of the motorbike, newest first", body = Vec<Ride>),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_motorbike_rides(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(motorbike_id): Path<i64>,
) -> AppResult<ApiResponse<Vec<Ride>>> {
    require_admin(&current_user)?;
    let rides = state
        .services
        .rides()
        .list_for_motorbike(motorbike_id)
        .await?;
    Ok(ApiResponse::list(rides))
}

#[utoipa::path(
    get,
    path = "/api/v1/rides/{id}",
    tag = "Rides",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Ride ID")
    ),
    responses(
        (status = 200, description = "Ride", body = Ride),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Ride not found")
    )
)]
pub async fn get_ride(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Ride>> {
    require_admin(&current_user)?;
    let ride = state.services.rides().get(id).await?;
    Ok(ApiResponse::success(ride))
}

#[utoipa::path(
    put,
    path = "/api/v1/rides/{id}",
    tag = "Rides",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Ride ID")
    ),
    request_body = UpdateRideRequest,
    responses(
        (status = 200, description = "Ride updated", body = Ride),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Ride not found")
    )
)]
pub async fn update_ride(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(payload): ValidatedJson<UpdateRideRequest>,
) -> AppResult<ApiResponse<Ride>> {
    require_admin(&current_user)?;

    let ride = state
        .services
        .rides()
        .update(
            id,
            RideChanges {
                start_time: payload.start_time,
                end_time: payload.end_time,
                duration_seconds: payload.duration_seconds,
                cost: payload.cost,
            },
        )
        .await?;

    Ok(ApiResponse::with_message(ride, "Ride updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/rides/{id}",
    tag = "Rides",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Ride ID")
    ),
    responses(
        (status = 200, description = "Ride deleted"),
        (status = 400, description = "Ride is still active"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Ride not found")
    )
)]
pub async fn delete_ride(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<()>> {
    require_admin(&current_user)?;
    state.services.rides().delete(id).await?;
    Ok(ApiResponse::message("Ride deleted"))
}
