//! Service Container - Centralized service access.
//!
//! Holds every application service behind its trait so handlers and CLI
//! commands depend on abstractions only.

use std::sync::Arc;

use super::{
    AuthService, Authenticator, BluetoothManager, BluetoothService, FleetManager,
    MotorbikeService, RideManager, RideService, UserManager, UserService,
};
use crate::config::Config;
use crate::domain::Fare;
use crate::infra::Persistence;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn motorbikes(&self) -> Arc<dyn MotorbikeService>;

    fn rides(&self) -> Arc<dyn RideService>;

    fn bluetooth(&self) -> Arc<dyn BluetoothService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    motorbike_service: Arc<dyn MotorbikeService>,
    ride_service: Arc<dyn RideService>,
    bluetooth_service: Arc<dyn BluetoothService>,
}

impl Services {
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        user_service: Arc<dyn UserService>,
        motorbike_service: Arc<dyn MotorbikeService>,
        ride_service: Arc<dyn RideService>,
        bluetooth_service: Arc<dyn BluetoothService>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            motorbike_service,
            ride_service,
            bluetooth_service,
        }
    }

    /// Create service container from database connection and config
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: Config) -> Self {
        let uow = Arc::new(Persistence::new(db));
        let fare = Fare::new(config.ride_base_fare, config.ride_per_minute_rate);

        Self {
            auth_service: Arc::new(Authenticator::new(uow.clone(), config)),
            user_service: Arc::new(UserManager::new(uow.clone())),
            motorbike_service: Arc::new(FleetManager::new(uow.clone())),
            ride_service: Arc::new(RideManager::new(uow.clone(), fare)),
            bluetooth_service: Arc::new(BluetoothManager::new(uow)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn motorbikes(&self) -> Arc<dyn MotorbikeService> {
        self.motorbike_service.clone()
    }

    fn rides(&self) -> Arc<dyn RideService> {
        self.ride_service.clone()
    }

    fn bluetooth(&self) -> Arc<dyn BluetoothService> {
        self.bluetooth_service.clone()
    }
}
