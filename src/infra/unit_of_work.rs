//! Unit of Work pattern implementation.
//!
//! Centralizes access to every repository so services depend on a single
//! abstraction. Multi-row state changes (a ride and its motorbike, a
//! connection and the lock) go through [`run_in_transaction`].

use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::repositories::{
    AuthRepository, AuthStore, BluetoothRepository, BluetoothStore, MotorbikeRepository,
    MotorbikeStore, RideRepository, RideStore, UserRepository, UserStore,
};
use crate::errors::{AppError, AppResult};

/// Unit of Work trait for dependency injection.
pub trait UnitOfWork: Send + Sync + 'static {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn motorbikes(&self) -> Arc<dyn MotorbikeRepository>;

    fn rides(&self) -> Arc<dyn RideRepository>;

    fn connections(&self) -> Arc<dyn BluetoothRepository>;

    fn auth(&self) -> Arc<dyn AuthRepository>;
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    users: Arc<UserStore>,
    motorbikes: Arc<MotorbikeStore>,
    rides: Arc<RideStore>,
    connections: Arc<BluetoothStore>,
    auth: Arc<AuthStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: Arc::new(UserStore::new(db.clone())),
            motorbikes: Arc::new(MotorbikeStore::new(db.clone())),
            rides: Arc::new(RideStore::new(db.clone())),
            connections: Arc::new(BluetoothStore::new(db.clone())),
            auth: Arc::new(AuthStore::new(db)),
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn motorbikes(&self) -> Arc<dyn MotorbikeRepository> {
        self.motorbikes.clone()
    }

    fn rides(&self) -> Arc<dyn RideRepository> {
        self.rides.clone()
    }

    fn connections(&self) -> Arc<dyn BluetoothRepository> {
        self.connections.clone()
    }

    fn auth(&self) -> Arc<dyn AuthRepository> {
        self.auth.clone()
    }
}

/// Run `f` inside a ReadCommitted transaction.
///
/// Commits when `f` succeeds, rolls back when it fails.
pub(crate) async fn run_in_transaction<F, T>(db: &DatabaseConnection, f: F) -> AppResult<T>
where
    F: for<'a> FnOnce(
            &'a DatabaseTransaction,
        ) -> Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>
        + Send,
    T: Send,
{
    let txn = db
        .begin_with_config(
            Some(IsolationLevel::ReadCommitted),
            Some(AccessMode::ReadWrite),
        )
        .await
        .map_err(AppError::from)?;

    match f(&txn).await {
        Ok(result) => {
            txn.commit().await.map_err(AppError::from)?;
            Ok(result)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!("Transaction rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockPersistence;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use super::*;
    use crate::infra::repositories::{
        MockAuthRepository, MockBluetoothRepository, MockMotorbikeRepository, MockRideRepository,
        MockUserRepository,
    };

    /// Unit of work over mockall repositories. Repositories that a test
    /// does not configure panic on first use.
    pub struct MockPersistence {
        users: Arc<MockUserRepository>,
        motorbikes: Arc<MockMotorbikeRepository>,
        rides: Arc<MockRideRepository>,
        connections: Arc<MockBluetoothRepository>,
        auth: Arc<MockAuthRepository>,
    }

    impl Default for MockPersistence {
        fn default() -> Self {
            Self {
                users: Arc::new(MockUserRepository::new()),
                motorbikes: Arc::new(MockMotorbikeRepository::new()),
                rides: Arc::new(MockRideRepository::new()),
                connections: Arc::new(MockBluetoothRepository::new()),
                auth: Arc::new(MockAuthRepository::new()),
            }
        }
    }

    impl MockPersistence {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_users(mut self, repo: MockUserRepository) -> Self {
            self.users = Arc::new(repo);
            self
        }

        pub fn with_motorbikes(mut self, repo: MockMotorbikeRepository) -> Self {
            self.motorbikes = Arc::new(repo);
            self
        }

        pub fn with_rides(mut self, repo: MockRideRepository) -> Self {
            self.rides = Arc::new(repo);
            self
        }

        pub fn with_connections(mut self, repo: MockBluetoothRepository) -> Self {
            self.connections = Arc::new(repo);
            self
        }

        pub fn with_auth(mut self, repo: MockAuthRepository) -> Self {
            self.auth = Arc::new(repo);
            self
        }
    }

    impl UnitOfWork for MockPersistence {
        fn users(&self) -> Arc<dyn UserRepository> {
            self.users.clone()
        }

        fn motorbikes(&self) -> Arc<dyn MotorbikeRepository> {
            self.motorbikes.clone()
        }

        fn rides(&self) -> Arc<dyn RideRepository> {
            self.rides.clone()
        }

        fn connections(&self) -> Arc<dyn BluetoothRepository> {
            self.connections.clone()
        }

        fn auth(&self) -> Arc<dyn AuthRepository> {
            self.auth.clone()
        }
    }
}
