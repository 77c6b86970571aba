//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion and reach repositories through the Unit of Work.

mod auth_service;
mod bluetooth_service;
pub mod container;
mod motorbike_service;
mod ride_service;
mod user_service;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{AuthService, Authenticator, Claims, PasswordResetTicket, TokenPair};
pub use bluetooth_service::{BluetoothManager, BluetoothService};
pub use motorbike_service::{FleetManager, MotorbikeService};
pub use ride_service::{RideManager, RideService};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
