//! Ride lifecycle: start, finish and administrative corrections.
//!
//! A user holds at most one unfinished ride. Starting rents the motorbike,
//! finishing prices the ride and makes the motorbike available again; the
//! motorbike has to be locked over Bluetooth before the ride can end.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::domain::{Fare, NewRide, Ride, RideChanges};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait RideService: Send + Sync {
    async fn start_ride(&self, user_id: i64, motorbike_id: i64) -> AppResult<Ride>;

    async fn finish_ride(&self, ride_id: i64, user_id: i64) -> AppResult<Ride>;

    async fn get(&self, id: i64) -> AppResult<Ride>;

    async fn list(&self) -> AppResult<Vec<Ride>>;

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Ride>>;

    async fn list_for_motorbike(&self, motorbike_id: i64) -> AppResult<Vec<Ride>>;

    async fn update(&self, id: i64, changes: RideChanges) -> AppResult<Ride>;

    /// Only finished rides can be deleted
    async fn delete(&self, id: i64) -> AppResult<()>;
}

pub struct RideManager<U: UnitOfWork> {
    uow: Arc<U>,
    fare: Fare,
}

impl<U: UnitOfWork> RideManager<U> {
    pub fn new(uow: Arc<U>, fare: Fare) -> Self {
        Self { uow, fare }
    }
}

#[async_trait]
impl<U: UnitOfWork> RideService for RideManager<U> {
    async fn start_ride(&self, user_id: i64, motorbike_id: i64) -> AppResult<Ride> {
        if let Some(active) = self.uow.rides().find_active_by_user(user_id).await? {
            tracing::warn!(user_id, ride_id = active.id, "Second ride refused");
            return Err(AppError::conflict("Active ride"));
        }

        let bike = self
            .uow
            .motorbikes()
            .find_by_id(motorbike_id)
            .await?
            .ok_or_not_found("Motorbike")?;
        if !bike.is_available() {
            return Err(AppError::bad_request(format!(
                "Motorbike is {}",
                bike.status
            )));
        }

        let ride = self
            .uow
            .rides()
            .start(NewRide {
                user_id,
                motorbike_id,
                start_time: Utc::now(),
            })
            .await?;

        tracing::info!(ride_id = ride.id, user_id, motorbike_id, "Ride started");
        Ok(ride)
    }

    async fn finish_ride(&self, ride_id: i64, user_id: i64) -> AppResult<Ride> {
        let ride = self.get(ride_id).await?;
        ride.ensure_finishable_by(user_id)?;

        let bike = self
            .uow
            .motorbikes()
            .find_by_id(ride.motorbike_id)
            .await?
            .ok_or_not_found("Motorbike")?;
        if !bike.is_locked() {
            return Err(AppError::bad_request(
                "Lock the motorbike before finishing the ride",
            ));
        }

        let completion = ride.complete(Utc::now(), &self.fare);
        let finished = self.uow.rides().finish(ride_id, completion).await?;

        tracing::info!(
            ride_id,
            user_id,
            duration_seconds = completion.duration_seconds,
            cost = completion.cost,
            "Ride finished"
        );
        Ok(finished)
    }

    async fn get(&self, id: i64) -> AppResult<Ride> {
        self.uow.rides().find_by_id(id).await?.ok_or_not_found("Ride")
    }

    async fn list(&self) -> AppResult<Vec<Ride>> {
        self.uow.rides().list().await
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Ride>> {
        self.uow.rides().list_by_user(user_id).await
    }

    async fn list_for_motorbike(&self, motorbike_id: i64) -> AppResult<Vec<Ride>> {
        self.uow.rides().list_by_motorbike(motorbike_id).await
    }

    async fn update(&self, id: i64, changes: RideChanges) -> AppResult<Ride> {
        if changes.duration_seconds.is_some_and(|d| d < 0) {
            return Err(AppError::validation("Duration cannot be negative"));
        }
        if changes.cost.is_some_and(|c| c < 0.0) {
            return Err(AppError::validation("Cost cannot be negative"));
        }

        let ride = self.get(id).await?;
        let start = changes.start_time.unwrap_or(ride.start_time);
        if let Some(end) = changes.end_time.or(ride.end_time) {
            if end < start {
                return Err(AppError::validation("End time must be after start time"));
            }
        }

        self.uow.rides().update(id, changes).await
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let ride = self.get(id).await?;
        if !ride.is_finished() {
            return Err(AppError::bad_request("Cannot delete an active ride"));
        }
        self.uow.rides().delete(id).await
    }
}
