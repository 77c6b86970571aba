//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain models.

pub mod bluetooth_connection;
pub mod motorbike;
pub mod motorbike_photo;
pub mod ride;
pub mod session;
pub mod token;
pub mod token_blacklist;
pub mod user;
