//! Bluetooth connection repository. Opening and closing a connection
//! flips the motorbike lock in the same transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use super::entities::{bluetooth_connection as connection, motorbike};
use crate::domain::{BluetoothConnection, ConnectionChanges, LockStatus, NewConnection};
use crate::errors::{AppError, AppResult, OptionExt, ResultExt};
use crate::infra::unit_of_work::run_in_transaction;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait BluetoothRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<BluetoothConnection>>;

    async fn list(&self) -> AppResult<Vec<BluetoothConnection>>;

    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<BluetoothConnection>>;

    /// Most recent connection made to the motorbike
    async fn latest_for_motorbike(&self, motorbike_id: i64)
        -> AppResult<Option<BluetoothConnection>>;

    /// Open a connection and unlock the motorbike
    async fn open(
        &self,
        user_id: i64,
        motorbike_id: i64,
        at: DateTime<Utc>,
    ) -> AppResult<BluetoothConnection>;

    /// Close a connection and lock the motorbike
    async fn close(&self, id: i64, at: DateTime<Utc>) -> AppResult<BluetoothConnection>;

    /// Insert a raw record without touching the motorbike
    async fn create(&self, connection: NewConnection) -> AppResult<BluetoothConnection>;

    async fn update(&self, id: i64, changes: ConnectionChanges) -> AppResult<BluetoothConnection>;

    async fn delete(&self, id: i64) -> AppResult<()>;
}

pub struct BluetoothStore {
    db: DatabaseConnection,
}

impl BluetoothStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn set_lock<C: ConnectionTrait>(conn: &C, motorbike_id: i64, lock: LockStatus) -> AppResult<()> {
    let result = motorbike::Entity::update_many()
        .col_expr(motorbike::Column::LockStatus, Expr::value(lock.as_str()))
        .col_expr(motorbike::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(motorbike::Column::Id.eq(motorbike_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Motorbike"));
    }
    Ok(())
}

#[async_trait]
impl BluetoothRepository for BluetoothStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<BluetoothConnection>> {
        let result = connection::Entity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(BluetoothConnection::from))
    }

    async fn list(&self) -> AppResult<Vec<BluetoothConnection>> {
        let models = connection::Entity::find()
            .order_by_desc(connection::Column::ConnectedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(BluetoothConnection::from).collect())
    }

    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<BluetoothConnection>> {
        let models = connection::Entity::find()
            .filter(connection::Column::UserId.eq(user_id))
            .order_by_desc(connection::Column::ConnectedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(BluetoothConnection::from).collect())
    }

    async fn latest_for_motorbike(
        &self,
        motorbike_id: i64,
    ) -> AppResult<Option<BluetoothConnection>> {
        let result = connection::Entity::find()
            .filter(connection::Column::MotorbikeId.eq(motorbike_id))
            .order_by_desc(connection::Column::ConnectedAt)
            .order_by_desc(connection::Column::Id)
            .one(&self.db)
            .await?;

        Ok(result.map(BluetoothConnection::from))
    }

    async fn open(
        &self,
        user_id: i64,
        motorbike_id: i64,
        at: DateTime<Utc>,
    ) -> AppResult<BluetoothConnection> {
        run_in_transaction(&self.db, move |txn| {
            Box::pin(async move {
                let model = connection::ActiveModel {
                    user_id: Set(user_id),
                    motorbike_id: Set(motorbike_id),
                    connected_at: Set(at),
                    disconnected_at: Set(None),
                    created_at: Set(at),
                    updated_at: Set(at),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                set_lock(txn, motorbike_id, LockStatus::Unlocked).await?;
                Ok(BluetoothConnection::from(model))
            })
        })
        .await
        .context(format!("unlocking motorbike {motorbike_id}"))
    }

    async fn close(&self, id: i64, at: DateTime<Utc>) -> AppResult<BluetoothConnection> {
        run_in_transaction(&self.db, move |txn| {
            Box::pin(async move {
                let current = connection::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_not_found("Bluetooth connection")?;
                if current.disconnected_at.is_some() {
                    return Err(AppError::bad_request("Bluetooth already disconnected"));
                }

                let motorbike_id = current.motorbike_id;
                let mut active: connection::ActiveModel = current.into();
                active.disconnected_at = Set(Some(at));
                active.updated_at = Set(at);
                let model = active.update(txn).await?;

                set_lock(txn, motorbike_id, LockStatus::Locked).await?;
                Ok(BluetoothConnection::from(model))
            })
        })
        .await
        .context(format!("locking motorbike for connection {id}"))
    }

    async fn create(&self, new: NewConnection) -> AppResult<BluetoothConnection> {
        let now = Utc::now();
        let model = connection::ActiveModel {
            user_id: Set(new.user_id),
            motorbike_id: Set(new.motorbike_id),
            connected_at: Set(new.connected_at),
            disconnected_at: Set(new.disconnected_at),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(BluetoothConnection::from(model))
    }

    async fn update(&self, id: i64, changes: ConnectionChanges) -> AppResult<BluetoothConnection> {
        let current = connection::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_not_found("Bluetooth connection")?;

        let mut active: connection::ActiveModel = current.into();
        if let Some(connected_at) = changes.connected_at {
            active.connected_at = Set(connected_at);
        }
        if let Some(disconnected_at) = changes.disconnected_at {
            active.disconnected_at = Set(Some(disconnected_at));
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await?;
        Ok(BluetoothConnection::from(model))
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let result = connection::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::not_found("Bluetooth connection"));
        }
        Ok(())
    }
}
