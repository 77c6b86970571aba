//! OpenAPI documentation configuration.
//!
//! Served through Swagger UI at `/swagger-ui`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    auth_handler, bluetooth_handler, motorbike_handler, ride_handler, user_handler,
};
use crate::domain::{
    BluetoothConnection, LockStatus, Motorbike, MotorbikePhoto, MotorbikeStatus, Ride,
    UserResponse, UserRole, UserStatus,
};
use crate::services::{PasswordResetTicket, TokenPair};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Motorbike Rental API",
        version = "0.1.0",
        description = "Rent motorbikes, unlock them over Bluetooth and pay per minute"
    ),
    servers(
        (url = "http://localhost:3005", description = "Local development server")
    ),
    paths(
        auth_handler::register,
        auth_handler::login,
        auth_handler::refresh,
        auth_handler::logout,
        auth_handler::forgot_password,
        auth_handler::reset_password,
        user_handler::get_current_user,
        user_handler::update_current_user,
        user_handler::list_users,
        user_handler::create_user,
        user_handler::get_user,
        user_handler::update_user,
        user_handler::delete_user,
        motorbike_handler::list_motorbikes,
        motorbike_handler::list_available,
        motorbike_handler::list_in_maintenance,
        motorbike_handler::list_rented,
        motorbike_handler::list_photos,
        motorbike_handler::get_motorbike,
        motorbike_handler::create_motorbike,
        motorbike_handler::update_motorbike,
        motorbike_handler::delete_motorbike,
        ride_handler::start_ride,
        ride_handler::finish_ride,
        ride_handler::list_my_rides,
        ride_handler::list_rides,
        ride_handler::list_user_rides,
        ride_handler::list_motorbike_rides,
        ride_handler::get_ride,
        ride_handler::update_ride,
        ride_handler::delete_ride,
        bluetooth_handler::connect,
        bluetooth_handler::disconnect,
        bluetooth_handler::list_my_connections,
        bluetooth_handler::list_connections,
        bluetooth_handler::create_connection,
        bluetooth_handler::get_connection,
        bluetooth_handler::update_connection,
        bluetooth_handler::delete_connection,
    ),
    components(
        schemas(
            UserRole,
            UserStatus,
            UserResponse,
            MotorbikeStatus,
            LockStatus,
            Motorbike,
            MotorbikePhoto,
            Ride,
            BluetoothConnection,
            TokenPair,
            PasswordResetTicket,
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            auth_handler::RefreshRequest,
            auth_handler::LogoutRequest,
            auth_handler::ForgotPasswordRequest,
            auth_handler::ResetPasswordRequest,
            user_handler::CreateUserRequest,
            user_handler::UpdateUserRequest,
            user_handler::UpdateProfileRequest,
            motorbike_handler::CreateMotorbikeRequest,
            motorbike_handler::UpdateMotorbikeRequest,
            ride_handler::StartRideRequest,
            ride_handler::UpdateRideRequest,
            bluetooth_handler::CreateConnectionRequest,
            bluetooth_handler::UpdateConnectionRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and token lifecycle"),
        (name = "Users", description = "Profiles and account administration"),
        (name = "Motorbikes", description = "Fleet management"),
        (name = "Rides", description = "Renting and returning motorbikes"),
        (name = "Bluetooth", description = "Lock control")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token obtained from /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}
