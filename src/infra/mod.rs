//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connections, migrations and repositories
//! - Caching and rate-limit counters (Redis)
//! - Unit of Work for repository access and transactions

pub mod cache;
pub mod db;
pub mod repositories;
pub mod unit_of_work;

pub use cache::{Cache, CacheStore, RateLimitStatus, RedisStore};
pub use db::{Database, MigrationState, Migrator};
pub use repositories::{
    AuthRepository, BluetoothRepository, MotorbikeRepository, RideRepository, UserRepository,
};
pub use unit_of_work::{Persistence, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockAuthRepository, MockBluetoothRepository, MockMotorbikeRepository, MockRideRepository,
    MockUserRepository,
};
#[cfg(any(test, feature = "test-utils"))]
pub use unit_of_work::MockPersistence;
