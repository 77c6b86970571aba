//! Simulated Bluetooth lock control.
//!
//! Connecting unlocks the motorbike, disconnecting locks it again. Only the
//! rider with an active ride on a motorbike may connect to it, and a
//! motorbike holds at most one open connection.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::domain::{BluetoothConnection, ConnectionChanges, NewConnection};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait BluetoothService: Send + Sync {
    async fn connect(&self, user_id: i64, motorbike_id: i64) -> AppResult<BluetoothConnection>;

    async fn disconnect(&self, user_id: i64, motorbike_id: i64)
        -> AppResult<BluetoothConnection>;

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<BluetoothConnection>>;

    /// Insert a raw record; the motorbike lock is left alone
    async fn create(&self, input: NewConnection) -> AppResult<BluetoothConnection>;

    async fn get(&self, id: i64) -> AppResult<BluetoothConnection>;

    async fn list(&self) -> AppResult<Vec<BluetoothConnection>>;

    async fn update(&self, id: i64, changes: ConnectionChanges)
        -> AppResult<BluetoothConnection>;

    async fn delete(&self, id: i64) -> AppResult<()>;
}

pub struct BluetoothManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> BluetoothManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> BluetoothService for BluetoothManager<U> {
    async fn connect(&self, user_id: i64, motorbike_id: i64) -> AppResult<BluetoothConnection> {
        self.uow
            .motorbikes()
            .find_by_id(motorbike_id)
            .await?
            .ok_or_not_found("Motorbike")?;

        let riding_it = self
            .uow
            .rides()
            .find_active_by_user(user_id)
            .await?
            .is_some_and(|ride| ride.motorbike_id == motorbike_id);
        if !riding_it {
            tracing::warn!(user_id, motorbike_id, "Connect refused: no active ride");
            return Err(AppError::bad_request(
                "No active ride on this motorbike",
            ));
        }

        let connections = self.uow.connections();
        if connections
            .latest_for_motorbike(motorbike_id)
            .await?
            .is_some_and(|c| c.is_open())
        {
            return Err(AppError::conflict("Bluetooth connection"));
        }

        let connection = connections.open(user_id, motorbike_id, Utc::now()).await?;
        tracing::info!(user_id, motorbike_id, "Motorbike unlocked");
        Ok(connection)
    }

    async fn disconnect(
        &self,
        user_id: i64,
        motorbike_id: i64,
    ) -> AppResult<BluetoothConnection> {
        let connections = self.uow.connections();
        let latest = connections
            .latest_for_motorbike(motorbike_id)
            .await?
            .ok_or_not_found("Bluetooth connection")?;

        if latest.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        if !latest.is_open() {
            return Err(AppError::bad_request("Bluetooth already disconnected"));
        }

        let connection = connections.close(latest.id, Utc::now()).await?;
        tracing::info!(user_id, motorbike_id, "Motorbike locked");
        Ok(connection)
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<BluetoothConnection>> {
        self.uow.connections().list_by_user(user_id).await
    }

    async fn create(&self, input: NewConnection) -> AppResult<BluetoothConnection> {
        self.uow
            .users()
            .find_by_id(input.user_id)
            .await?
            .ok_or_not_found("User")?;
        self.uow
            .motorbikes()
            .find_by_id(input.motorbike_id)
            .await?
            .ok_or_not_found("Motorbike")?;

        if input
            .disconnected_at
            .is_some_and(|end| end < input.connected_at)
        {
            return Err(AppError::validation(
                "Disconnect time must be after connect time",
            ));
        }

        self.uow.connections().create(input).await
    }

    async fn get(&self, id: i64) -> AppResult<BluetoothConnection> {
        self.uow
            .connections()
            .find_by_id(id)
            .await?
            .ok_or_not_found("Bluetooth connection")
    }

    async fn list(&self) -> AppResult<Vec<BluetoothConnection>> {
        self.uow.connections().list().await
    }

    async fn update(
        &self,
        id: i64,
        changes: ConnectionChanges,
    ) -> AppResult<BluetoothConnection> {
        self.uow.connections().update(id, changes).await
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        self.uow.connections().delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    use crate::domain::{LockStatus, Motorbike, MotorbikeStatus, Ride};
    use crate::infra::{
        MockBluetoothRepository, MockMotorbikeRepository, MockPersistence, MockRideRepository,
    };

    fn connection(user_id: i64, open: bool) -> BluetoothConnection {
        let now = Utc::now();
        BluetoothConnection {
            id: 1,
            user_id,
            motorbike_id: 3,
            connected_at: now - Duration::minutes(5),
            disconnected_at: (!open).then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    fn bikes() -> MockMotorbikeRepository {
        let mut repo = MockMotorbikeRepository::new();
        repo.expect_find_by_id().returning(|id| {
            let now = Utc::now();
            Ok(Some(Motorbike {
                id,
                model: "Vespa".into(),
                location_latitude: 0.0,
                location_longitude: 0.0,
                status: MotorbikeStatus::Rented,
                lock_status: LockStatus::Locked,
                photos: vec![],
                created_at: now,
                updated_at: now,
            }))
        });
        repo
    }

    fn rides_on(motorbike_id: i64) -> MockRideRepository {
        let mut repo = MockRideRepository::new();
        repo.expect_find_active_by_user().returning(move |user_id| {
            let now = Utc::now();
            Ok(Some(Ride {
                id: 10,
                user_id,
                motorbike_id,
                start_time: now,
                end_time: None,
                duration_seconds: None,
                cost: None,
                created_at: now,
                updated_at: now,
            }))
        });
        repo
    }

    fn service(
        rides: MockRideRepository,
        connections: MockBluetoothRepository,
    ) -> BluetoothManager<MockPersistence> {
        BluetoothManager::new(Arc::new(
            MockPersistence::new()
                .with_motorbikes(bikes())
                .with_rides(rides)
                .with_connections(connections),
        ))
    }

    #[tokio::test]
    async fn test_connect_requires_ride_on_that_motorbike() {
        let result = service(rides_on(4), MockBluetoothRepository::new())
            .connect(7, 3)
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_connect_refuses_second_open_connection() {
        let mut connections = MockBluetoothRepository::new();
        connections
            .expect_latest_for_motorbike()
            .returning(|_| Ok(Some(connection(7, true))));
        connections.expect_open().never();

        let result = service(rides_on(3), connections).connect(7, 3).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_connect_unlocks() {
        let mut connections = MockBluetoothRepository::new();
        connections
            .expect_latest_for_motorbike()
            .returning(|_| Ok(Some(connection(7, false))));
        connections
            .expect_open()
            .withf(|user_id, motorbike_id, _| *user_id == 7 && *motorbike_id == 3)
            .times(1)
            .returning(|user_id, _, _| Ok(connection(user_id, true)));

        let opened = service(rides_on(3), connections).connect(7, 3).await.unwrap();
        assert!(opened.is_open());
    }

    #[tokio::test]
    async fn test_disconnect_twice_fails() {
        let mut connections = MockBluetoothRepository::new();
        connections
            .expect_latest_for_motorbike()
            .returning(|_| Ok(Some(connection(7, false))));
        connections.expect_close().never();

        let result = service(rides_on(3), connections).disconnect(7, 3).await;
        assert!(
            matches!(result, Err(AppError::BadRequest(ref m)) if m == "Bluetooth already disconnected")
        );
    }

    #[tokio::test]
    async fn test_disconnect_other_users_connection_is_forbidden() {
        let mut connections = MockBluetoothRepository::new();
        connections
            .expect_latest_for_motorbike()
            .returning(|_| Ok(Some(connection(8, true))));

        let result = service(rides_on(3), connections).disconnect(7, 3).await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_disconnect_without_any_connection() {
        let mut connections = MockBluetoothRepository::new();
        connections
            .expect_latest_for_motorbike()
            .returning(|_| Ok(None));

        let result = service(rides_on(3), connections).disconnect(7, 3).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_disconnect_locks() {
        let mut connections = MockBluetoothRepository::new();
        connections
            .expect_latest_for_motorbike()
            .returning(|_| Ok(Some(connection(7, true))));
        connections
            .expect_close()
            .withf(|id, _| *id == 1)
            .times(1)
            .returning(|_, _| Ok(connection(7, false)));

        let closed = service(rides_on(3), connections).disconnect(7, 3).await.unwrap();
        assert!(!closed.is_open());
    }
}
