//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over data persistence,
//! following the Repository pattern for clean separation of concerns.

mod auth_repository;
mod bluetooth_repository;
pub(crate) mod entities;
mod motorbike_repository;
mod ride_repository;
mod user_repository;

pub use auth_repository::{AuthRepository, AuthStore};
pub use bluetooth_repository::{BluetoothRepository, BluetoothStore};
pub use motorbike_repository::{MotorbikeRepository, MotorbikeStore};
pub use ride_repository::{RideRepository, RideStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use auth_repository::MockAuthRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use bluetooth_repository::MockBluetoothRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use motorbike_repository::MockMotorbikeRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use ride_repository::MockRideRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
