//! HTTP request handlers.

pub mod auth_handler;
pub mod bluetooth_handler;
pub mod motorbike_handler;
pub mod ride_handler;
pub mod user_handler;

pub use auth_handler::auth_routes;
pub use bluetooth_handler::bluetooth_routes;
pub use motorbike_handler::motorbike_routes;
pub use ride_handler::ride_routes;
pub use user_handler::user_routes;
