//! Simulated Bluetooth pairing between a rider and a motorbike lock.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// One pairing; open while `disconnected_at` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BluetoothConnection {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = 7)]
    pub user_id: i64,
    #[schema(example = 3)]
    pub motorbike_id: i64,
    pub connected_at: DateTime<Utc>,
    pub disconnected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BluetoothConnection {
    pub fn is_open(&self) -> bool {
        self.disconnected_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewConnection {
    pub user_id: i64,
    pub motorbike_id: i64,
    pub connected_at: DateTime<Utc>,
    pub disconnected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionChanges {
    pub connected_at: Option<DateTime<Utc>>,
    pub disconnected_at: Option<DateTime<Utc>>,
}
