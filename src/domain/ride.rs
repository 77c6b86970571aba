//! Ride entity and fare computation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::{AppError, AppResult};

/// A rental session. Finished once `end_time` is set.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Ride {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = 7)]
    pub user_id: i64,
    #[schema(example = 3)]
    pub motorbike_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[schema(example = 754)]
    pub duration_seconds: Option<i64>,
    #[schema(example = 46.0)]
    pub cost: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    /// Ownership and state checks that must pass before a ride can end.
    pub fn ensure_finishable_by(&self, user_id: i64) -> AppResult<()> {
        if self.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        if self.is_finished() {
            return Err(AppError::bad_request("Ride already finished"));
        }
        Ok(())
    }

    /// Close the ride at `now` and price it.
    pub fn complete(&self, now: DateTime<Utc>, fare: &Fare) -> RideCompletion {
        let duration_seconds = (now - self.start_time).num_seconds().max(0);
        RideCompletion {
            end_time: now,
            duration_seconds,
            cost: fare.cost(duration_seconds),
        }
    }
}

/// Pricing: a flat base fare plus a rate per completed minute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fare {
    pub base_fare: f64,
    pub per_minute_rate: f64,
}

impl Fare {
    pub fn new(base_fare: f64, per_minute_rate: f64) -> Self {
        Self {
            base_fare,
            per_minute_rate,
        }
    }

    pub fn cost(&self, duration_seconds: i64) -> f64 {
        let whole_minutes = duration_seconds.max(0) / 60;
        whole_minutes as f64 * self.per_minute_rate + self.base_fare
    }
}

/// Values written when a ride ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RideCompletion {
    pub end_time: DateTime<Utc>,
    pub duration_seconds: i64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRide {
    pub user_id: i64,
    pub motorbike_id: i64,
    pub start_time: DateTime<Utc>,
}

/// Administrative correction of a ride record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RideChanges {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub cost: Option<f64>,
}
