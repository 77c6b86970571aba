//! Motorbike fleet entities.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{
    LOCK_STATUS_LOCKED, LOCK_STATUS_UNLOCKED, MAX_PHOTO_URL_LENGTH, MOTORBIKE_STATUS_AVAILABLE,
    MOTORBIKE_STATUS_MAINTENANCE, MOTORBIKE_STATUS_RENTED,
};
use crate::errors::{AppError, AppResult};

static PHOTO_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("photo url regex is valid")
});

/// Availability of a motorbike for renting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MotorbikeStatus {
    Available,
    Maintenance,
    Rented,
}

impl MotorbikeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotorbikeStatus::Available => MOTORBIKE_STATUS_AVAILABLE,
            MotorbikeStatus::Maintenance => MOTORBIKE_STATUS_MAINTENANCE,
            MotorbikeStatus::Rented => MOTORBIKE_STATUS_RENTED,
        }
    }
}

impl From<&str> for MotorbikeStatus {
    /// Unknown values are treated as out of service.
    fn from(s: &str) -> Self {
        match s {
            MOTORBIKE_STATUS_AVAILABLE => MotorbikeStatus::Available,
            MOTORBIKE_STATUS_RENTED => MotorbikeStatus::Rented,
            _ => MotorbikeStatus::Maintenance,
        }
    }
}

impl std::fmt::Display for MotorbikeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical lock state, toggled over Bluetooth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LockStatus {
    Locked,
    Unlocked,
}

impl LockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockStatus::Locked => LOCK_STATUS_LOCKED,
            LockStatus::Unlocked => LOCK_STATUS_UNLOCKED,
        }
    }
}

impl From<&str> for LockStatus {
    fn from(s: &str) -> Self {
        match s {
            LOCK_STATUS_UNLOCKED => LockStatus::Unlocked,
            _ => LockStatus::Locked,
        }
    }
}

impl std::fmt::Display for LockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MotorbikePhoto {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = 1)]
    pub motorbike_id: i64,
    #[schema(example = "https://cdn.example.com/bikes/1.jpg")]
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
}

/// Motorbike with its photos.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Motorbike {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Honda PCX 125")]
    pub model: String,
    #[schema(example = 41.0082)]
    pub location_latitude: f64,
    #[schema(example = 28.9784)]
    pub location_longitude: f64,
    pub status: MotorbikeStatus,
    pub lock_status: LockStatus,
    pub photos: Vec<MotorbikePhoto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Motorbike {
    pub fn is_available(&self) -> bool {
        self.status == MotorbikeStatus::Available
    }

    pub fn is_locked(&self) -> bool {
        self.lock_status == LockStatus::Locked
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMotorbike {
    pub model: String,
    pub location_latitude: f64,
    pub location_longitude: f64,
    pub status: MotorbikeStatus,
    pub lock_status: LockStatus,
    pub photo_urls: Vec<String>,
}

/// Partial update. `photo_urls: Some(..)` replaces the whole photo set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotorbikeChanges {
    pub model: Option<String>,
    pub location_latitude: Option<f64>,
    pub location_longitude: Option<f64>,
    pub status: Option<MotorbikeStatus>,
    pub lock_status: Option<LockStatus>,
    pub photo_urls: Option<Vec<String>>,
}

/// Every photo must be an http(s) URL that fits the column.
pub fn validate_photo_urls(urls: &[String]) -> AppResult<()> {
    for url in urls {
        if url.len() > MAX_PHOTO_URL_LENGTH || !PHOTO_URL_REGEX.is_match(url) {
            return Err(AppError::validation(format!("Invalid photo URL: {}", url)));
        }
    }
    Ok(())
}
