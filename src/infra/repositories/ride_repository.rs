//! Ride repository. Starting and finishing a ride also moves the
//! motorbike between `available` and `rented` in the same transaction.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

use super::entities::{motorbike, ride, user};
use crate::domain::{MotorbikeStatus, NewRide, Ride, RideChanges, RideCompletion};
use crate::errors::{AppError, AppResult, OptionExt, ResultExt};
use crate::infra::unit_of_work::run_in_transaction;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Ride>>;

    async fn list(&self) -> AppResult<Vec<Ride>>;

    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<Ride>>;

    async fn list_by_motorbike(&self, motorbike_id: i64) -> AppResult<Vec<Ride>>;

    /// The user's unfinished ride, if any
    async fn find_active_by_user(&self, user_id: i64) -> AppResult<Option<Ride>>;

    /// Insert the ride and mark its motorbike rented
    async fn start(&self, ride: NewRide) -> AppResult<Ride>;

    /// Close the ride and release its motorbike
    async fn finish(&self, id: i64, completion: RideCompletion) -> AppResult<Ride>;

    async fn update(&self, id: i64, changes: RideChanges) -> AppResult<Ride>;

    async fn delete(&self, id: i64) -> AppResult<()>;
}

pub struct RideStore {
    db: DatabaseConnection,
}

impl RideStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn list_where(&self, filter: Option<sea_orm::Condition>) -> AppResult<Vec<Ride>> {
        let mut query = ride::Entity::find();
        if let Some(filter) = filter {
            query = query.filter(filter);
        }

        let models = query
            .order_by_desc(ride::Column::StartTime)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Ride::from).collect())
    }
}

/// Move a motorbike from `from` to `to`. Fails if it is no longer in `from`,
/// which catches a concurrent rental of the same bike.
pub(super) async fn transition_motorbike<C: ConnectionTrait>(
    conn: &C,
    motorbike_id: i64,
    from: MotorbikeStatus,
    to: MotorbikeStatus,
) -> AppResult<()> {
    let result = motorbike::Entity::update_many()
        .col_expr(motorbike::Column::Status, Expr::value(to.as_str()))
        .col_expr(motorbike::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(motorbike::Column::Id.eq(motorbike_id))
        .filter(motorbike::Column::Status.eq(from.as_str()))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::bad_request(format!(
            "Motorbike is not {}",
            from.as_str()
        )));
    }
    Ok(())
}

/// The partial unique index on unfinished rides reports a second active
/// ride as a unique violation.
fn active_ride_violation(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::conflict("Active ride"),
        _ => AppError::from(err),
    }
}

#[async_trait]
impl RideRepository for RideStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Ride>> {
        let result = ride::Entity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Ride::from))
    }

    async fn list(&self) -> AppResult<Vec<Ride>> {
        self.list_where(None).await
    }

    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<Ride>> {
        self.list_where(Some(
            sea_orm::Condition::all().add(ride::Column::UserId.eq(user_id)),
        ))
        .await
    }

    async fn list_by_motorbike(&self, motorbike_id: i64) -> AppResult<Vec<Ride>> {
        self.list_where(Some(
            sea_orm::Condition::all().add(ride::Column::MotorbikeId.eq(motorbike_id)),
        ))
        .await
    }

    async fn find_active_by_user(&self, user_id: i64) -> AppResult<Option<Ride>> {
        let result = ride::Entity::find()
            .filter(ride::Column::UserId.eq(user_id))
            .filter(ride::Column::EndTime.is_null())
            .one(&self.db)
            .await?;

        Ok(result.map(Ride::from))
    }

    async fn start(&self, new: NewRide) -> AppResult<Ride> {
        let motorbike_id = new.motorbike_id;
        run_in_transaction(&self.db, move |txn| {
            Box::pin(async move {
                // Row lock on the rider serializes their concurrent starts
                user::Entity::find_by_id(new.user_id)
                    .lock_exclusive()
                    .one(txn)
                    .await?
                    .ok_or_not_found("User")?;

                let active = ride::Entity::find()
                    .filter(ride::Column::UserId.eq(new.user_id))
                    .filter(ride::Column::EndTime.is_null())
                    .one(txn)
                    .await?;
                if active.is_some() {
                    return Err(AppError::conflict("Active ride"));
                }

                transition_motorbike(
                    txn,
                    new.motorbike_id,
                    MotorbikeStatus::Available,
                    MotorbikeStatus::Rented,
                )
                .await?;

                let now = Utc::now();
                let model = ride::ActiveModel {
                    user_id: Set(new.user_id),
                    motorbike_id: Set(new.motorbike_id),
                    start_time: Set(new.start_time),
                    end_time: Set(None),
                    duration_seconds: Set(None),
                    cost: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(active_ride_violation)?;

                Ok(Ride::from(model))
            })
        })
        .await
        .context(format!("renting motorbike {motorbike_id}"))
    }

    async fn finish(&self, id: i64, completion: RideCompletion) -> AppResult<Ride> {
        run_in_transaction(&self.db, move |txn| {
            Box::pin(async move {
                let current = ride::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_not_found("Ride")?;
                if current.end_time.is_some() {
                    return Err(AppError::bad_request("Ride already finished"));
                }

                let motorbike_id = current.motorbike_id;
                let mut active: ride::ActiveModel = current.into();
                active.end_time = Set(Some(completion.end_time));
                active.duration_seconds = Set(Some(completion.duration_seconds));
                active.cost = Set(Some(completion.cost));
                active.updated_at = Set(Utc::now());
                let model = active.update(txn).await?;

                transition_motorbike(
                    txn,
                    motorbike_id,
                    MotorbikeStatus::Rented,
                    MotorbikeStatus::Available,
                )
                .await?;

                Ok(Ride::from(model))
            })
        })
        .await
        .context(format!("releasing motorbike of ride {id}"))
    }

    async fn update(&self, id: i64, changes: RideChanges) -> AppResult<Ride> {
        let current = ride::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Ride")?;

        let mut active: ride::ActiveModel = current.into();
        if let Some(start_time) = changes.start_time {
            active.start_time = Set(start_time);
        }
        if let Some(end_time) = changes.end_time {
            active.end_time = Set(Some(end_time));
        }
        if let Some(duration) = changes.duration_seconds {
            active.duration_seconds = Set(Some(duration));
        }
        if let Some(cost) = changes.cost {
            active.cost = Set(Some(cost));
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await?;
        Ok(Ride::from(model))
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let result = ride::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::not_found("Ride"));
        }
        Ok(())
    }
}
