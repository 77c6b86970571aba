//! Domain layer - Core business entities and logic
//!
//! Plain data types and the rules that only depend on them: password
//! hashing, ride pricing, account and session validity.

pub mod bluetooth;
pub mod motorbike;
pub mod password;
pub mod ride;
pub mod session;
pub mod user;

pub use bluetooth::{BluetoothConnection, ConnectionChanges, NewConnection};
pub use motorbike::{
    validate_photo_urls, LockStatus, Motorbike, MotorbikeChanges, MotorbikePhoto,
    MotorbikeStatus, NewMotorbike,
};
pub use password::Password;
pub use ride::{Fare, NewRide, Ride, RideChanges, RideCompletion};
pub use session::{CleanupReport, ClientInfo, IssuedToken, NewSession, Session};
pub use user::{
    validate_phone, CreateUser, NewUser, UpdateProfile, UpdateUser, User, UserChanges,
    UserResponse, UserRole, UserStatus,
};
