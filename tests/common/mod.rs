//! Shared fixtures for the HTTP integration tests.
//!
//! The router is wired with hand-written service stubs, an in-memory cache
//! store and a sea-orm mock connection, so no Postgres or Redis is needed.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use sea_orm::{DatabaseBackend, MockDatabase};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use motorbike_rental::api::{create_router, AppState};
use motorbike_rental::config::Config;
use motorbike_rental::domain::{
    BluetoothConnection, CleanupReport, ClientInfo, ConnectionChanges, CreateUser, LockStatus,
    Motorbike, MotorbikeChanges, MotorbikePhoto, MotorbikeStatus, NewConnection, NewMotorbike,
    Ride, RideChanges, UpdateProfile, UpdateUser, User, UserResponse, UserRole, UserStatus,
};
use motorbike_rental::errors::{AppError, AppResult};
use motorbike_rental::infra::{Cache, CacheStore, Database};
use motorbike_rental::services::{
    AuthService, BluetoothService, Claims, MotorbikeService, PasswordResetTicket, RideService,
    Services, TokenPair, UserService,
};

pub const RIDER_TOKEN: &str = "rider-token";
pub const OTHER_RIDER_TOKEN: &str = "other-rider-token";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const REVOKED_TOKEN: &str = "revoked-token";

pub const RIDER_ID: i64 = 7;
pub const OTHER_RIDER_ID: i64 = 8;
pub const ADMIN_ID: i64 = 1;

/// Motorbike id that is rented by someone else
pub const RENTED_BIKE: i64 = 2;
/// Ride owned by `RIDER_ID` and still running
pub const ACTIVE_RIDE: i64 = 10;
/// Ride owned by `RIDER_ID` that has already ended
pub const FINISHED_RIDE: i64 = 11;

// =============================================================================
// Fixtures
// =============================================================================

pub fn user(id: i64, role: UserRole) -> User {
    let now = Utc::now();
    User {
        id,
        email: format!("user{}@example.com", id),
        password_hash: "hashed".to_string(),
        first_name: "Test".to_string(),
        last_name: "Rider".to_string(),
        phone: None,
        role,
        status: UserStatus::Active,
        last_login: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn motorbike(id: i64, status: MotorbikeStatus) -> Motorbike {
    let now = Utc::now();
    Motorbike {
        id,
        model: "Honda PCX 125".to_string(),
        location_latitude: 41.0082,
        location_longitude: 28.9784,
        status,
        lock_status: LockStatus::Locked,
        photos: vec![],
        created_at: now,
        updated_at: now,
    }
}

pub fn ride(id: i64, user_id: i64, motorbike_id: i64, finished: bool) -> Ride {
    let now = Utc::now();
    let start_time = now - Duration::seconds(754);
    Ride {
        id,
        user_id,
        motorbike_id,
        start_time,
        end_time: finished.then_some(now),
        duration_seconds: finished.then_some(754),
        cost: finished.then_some(46.0),
        created_at: start_time,
        updated_at: now,
    }
}

fn connection(user_id: i64, motorbike_id: i64, open: bool) -> BluetoothConnection {
    let now = Utc::now();
    BluetoothConnection {
        id: 1,
        user_id,
        motorbike_id,
        connected_at: now,
        disconnected_at: (!open).then_some(now),
        created_at: now,
        updated_at: now,
    }
}

fn claims(user_id: i64, role: UserRole) -> Claims {
    let now = Utc::now().timestamp();
    Claims {
        sub: user_id,
        email: format!("user{}@example.com", user_id),
        role: role.to_string(),
        status: UserStatus::Active.to_string(),
        purpose: "access".to_string(),
        jti: format!("jti-{}", user_id),
        iat: now,
        exp: now + 3600,
    }
}

// =============================================================================
// Service stubs
// =============================================================================

pub struct StubAuth;

#[async_trait]
impl AuthService for StubAuth {
    async fn register(&self, input: CreateUser) -> AppResult<User> {
        if input.email == "taken@example.com" {
            return Err(AppError::conflict("User with this email"));
        }
        let mut created = user(42, input.role);
        created.email = input.email;
        Ok(created)
    }

    async fn login(
        &self,
        email: String,
        password: String,
        _client: ClientInfo,
    ) -> AppResult<TokenPair> {
        if password != "secret123" {
            return Err(AppError::InvalidCredentials);
        }
        let mut account = user(RIDER_ID, UserRole::User);
        account.email = email;
        Ok(TokenPair {
            access_token: RIDER_TOKEN.to_string(),
            refresh_token: "refresh".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 54_000,
            user: UserResponse::from(account),
        })
    }

    async fn refresh(&self, _refresh_token: &str, _client: ClientInfo) -> AppResult<TokenPair> {
        Err(AppError::SessionInvalid)
    }

    async fn logout(&self, _access_token: &str, _refresh_token: Option<String>) -> AppResult<()> {
        Ok(())
    }

    async fn forgot_password(&self, _email: &str) -> AppResult<PasswordResetTicket> {
        Ok(PasswordResetTicket {
            reset_token: "reset".to_string(),
            expires_in: 3600,
        })
    }

    async fn reset_password(&self, _token: &str, _new_password: &str) -> AppResult<()> {
        Ok(())
    }

    async fn validate_token(&self, token: &str) -> AppResult<Claims> {
        match token {
            RIDER_TOKEN => Ok(claims(RIDER_ID, UserRole::User)),
            OTHER_RIDER_TOKEN => Ok(claims(OTHER_RIDER_ID, UserRole::User)),
            ADMIN_TOKEN => Ok(claims(ADMIN_ID, UserRole::Admin)),
            REVOKED_TOKEN => Err(AppError::TokenRevoked),
            _ => Err(AppError::Unauthorized),
        }
    }

    async fn cleanup_expired(&self) -> AppResult<CleanupReport> {
        Ok(CleanupReport::default())
    }
}

/// Counts lookups so tests can tell cache hits from service calls.
#[derive(Default)]
pub struct StubUsers {
    pub lookups: Mutex<u32>,
}

impl StubUsers {
    pub fn lookups(&self) -> u32 {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl UserService for StubUsers {
    async fn create_user(&self, input: CreateUser) -> AppResult<User> {
        let mut created = user(43, input.role);
        created.email = input.email;
        Ok(created)
    }

    async fn get_user(&self, id: i64) -> AppResult<User> {
        *self.lookups.lock().unwrap() += 1;
        match id {
            ADMIN_ID => Ok(user(ADMIN_ID, UserRole::Admin)),
            RIDER_ID | OTHER_RIDER_ID => Ok(user(id, UserRole::User)),
            _ => Err(AppError::not_found("User")),
        }
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        *self.lookups.lock().unwrap() += 1;
        Ok(vec![
            user(ADMIN_ID, UserRole::Admin),
            user(RIDER_ID, UserRole::User),
        ])
    }

    async fn update_user(&self, id: i64, input: UpdateUser) -> AppResult<User> {
        let mut updated = self.get_user(id).await?;
        if let Some(first_name) = input.first_name {
            updated.first_name = first_name;
        }
        Ok(updated)
    }

    async fn update_profile(&self, id: i64, input: UpdateProfile) -> AppResult<User> {
        if input.new_password.is_some() && input.current_password.is_none() {
            return Err(AppError::bad_request("Current password is required"));
        }
        let mut updated = user(id, UserRole::User);
        if let Some(first_name) = input.first_name {
            updated.first_name = first_name;
        }
        Ok(updated)
    }

    async fn delete_user(&self, id: i64) -> AppResult<()> {
        self.get_user(id).await.map(|_| ())
    }
}

pub struct StubMotorbikes;

#[async_trait]
impl MotorbikeService for StubMotorbikes {
    async fn create(&self, input: NewMotorbike) -> AppResult<Motorbike> {
        let mut bike = motorbike(5, input.status);
        bike.model = input.model;
        Ok(bike)
    }

    async fn get(&self, id: i64) -> AppResult<Motorbike> {
        match id {
            1 => Ok(motorbike(1, MotorbikeStatus::Available)),
            RENTED_BIKE => Ok(motorbike(RENTED_BIKE, MotorbikeStatus::Rented)),
            _ => Err(AppError::not_found("Motorbike")),
        }
    }

    async fn list(&self) -> AppResult<Vec<Motorbike>> {
        Ok(vec![
            motorbike(1, MotorbikeStatus::Available),
            motorbike(RENTED_BIKE, MotorbikeStatus::Rented),
        ])
    }

    async fn list_available(&self) -> AppResult<Vec<Motorbike>> {
        Ok(vec![motorbike(1, MotorbikeStatus::Available)])
    }

    async fn list_in_maintenance(&self) -> AppResult<Vec<Motorbike>> {
        Ok(vec![])
    }

    async fn list_rented(&self) -> AppResult<Vec<Motorbike>> {
        Ok(vec![motorbike(RENTED_BIKE, MotorbikeStatus::Rented)])
    }

    async fn update(&self, id: i64, _changes: MotorbikeChanges) -> AppResult<Motorbike> {
        self.get(id).await
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        if id == RENTED_BIKE {
            return Err(AppError::bad_request("Cannot delete a rented motorbike"));
        }
        self.get(id).await.map(|_| ())
    }

    async fn photos(&self, id: i64) -> AppResult<Vec<MotorbikePhoto>> {
        self.get(id).await.map(|bike| bike.photos)
    }
}

/// Ride stub: the rider may hold one active ride at a time.
#[derive(Default)]
pub struct StubRides {
    active: Mutex<HashMap<i64, i64>>,
}

#[async_trait]
impl RideService for StubRides {
    async fn start_ride(&self, user_id: i64, motorbike_id: i64) -> AppResult<Ride> {
        let mut active = self.active.lock().unwrap();
        if active.contains_key(&user_id) {
            return Err(AppError::conflict("Active ride"));
        }
        match motorbike_id {
            1 => {
                active.insert(user_id, motorbike_id);
                Ok(ride(ACTIVE_RIDE, user_id, motorbike_id, false))
            }
            RENTED_BIKE => Err(AppError::bad_request("Motorbike is rented")),
            _ => Err(AppError::not_found("Motorbike")),
        }
    }

    async fn finish_ride(&self, ride_id: i64, user_id: i64) -> AppResult<Ride> {
        match ride_id {
            ACTIVE_RIDE if user_id != RIDER_ID => Err(AppError::Forbidden),
            ACTIVE_RIDE => {
                self.active.lock().unwrap().remove(&user_id);
                Ok(ride(ACTIVE_RIDE, user_id, 1, true))
            }
            FINISHED_RIDE => Err(AppError::bad_request("Ride already finished")),
            _ => Err(AppError::not_found("Ride")),
        }
    }

    async fn get(&self, id: i64) -> AppResult<Ride> {
        match id {
            ACTIVE_RIDE => Ok(ride(ACTIVE_RIDE, RIDER_ID, 1, false)),
            FINISHED_RIDE => Ok(ride(FINISHED_RIDE, RIDER_ID, 1, true)),
            _ => Err(AppError::not_found("Ride")),
        }
    }

    async fn list(&self) -> AppResult<Vec<Ride>> {
        Ok(vec![
            ride(ACTIVE_RIDE, RIDER_ID, 1, false),
            ride(FINISHED_RIDE, RIDER_ID, 1, true),
        ])
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<Ride>> {
        Ok(vec![ride(FINISHED_RIDE, user_id, 1, true)])
    }

    async fn list_for_motorbike(&self, motorbike_id: i64) -> AppResult<Vec<Ride>> {
        Ok(vec![ride(FINISHED_RIDE, RIDER_ID, motorbike_id, true)])
    }

    async fn update(&self, id: i64, _changes: RideChanges) -> AppResult<Ride> {
        self.get(id).await
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let ride = self.get(id).await?;
        if !ride.is_finished() {
            return Err(AppError::bad_request("Cannot delete an active ride"));
        }
        Ok(())
    }
}

/// Bluetooth stub: one connection slot per motorbike.
#[derive(Default)]
pub struct StubBluetooth {
    open: Mutex<HashMap<i64, i64>>,
}

#[async_trait]
impl BluetoothService for StubBluetooth {
    async fn connect(&self, user_id: i64, motorbike_id: i64) -> AppResult<BluetoothConnection> {
        let mut open = self.open.lock().unwrap();
        if open.contains_key(&motorbike_id) {
            return Err(AppError::conflict("Bluetooth connection"));
        }
        open.insert(motorbike_id, user_id);
        Ok(connection(user_id, motorbike_id, true))
    }

    async fn disconnect(
        &self,
        user_id: i64,
        motorbike_id: i64,
    ) -> AppResult<BluetoothConnection> {
        let mut open = self.open.lock().unwrap();
        match open.get(&motorbike_id) {
            Some(owner) if *owner != user_id => Err(AppError::Forbidden),
            Some(_) => {
                open.remove(&motorbike_id);
                Ok(connection(user_id, motorbike_id, false))
            }
            None => Err(AppError::bad_request("Bluetooth already disconnected")),
        }
    }

    async fn list_for_user(&self, user_id: i64) -> AppResult<Vec<BluetoothConnection>> {
        Ok(vec![connection(user_id, 1, false)])
    }

    async fn create(&self, input: NewConnection) -> AppResult<BluetoothConnection> {
        Ok(connection(
            input.user_id,
            input.motorbike_id,
            input.disconnected_at.is_none(),
        ))
    }

    async fn get(&self, id: i64) -> AppResult<BluetoothConnection> {
        if id == 1 {
            Ok(connection(RIDER_ID, 1, false))
        } else {
            Err(AppError::not_found("Bluetooth connection"))
        }
    }

    async fn list(&self) -> AppResult<Vec<BluetoothConnection>> {
        Ok(vec![connection(RIDER_ID, 1, false)])
    }

    async fn update(
        &self,
        id: i64,
        _changes: ConnectionChanges,
    ) -> AppResult<BluetoothConnection> {
        self.get(id).await
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        self.get(id).await.map(|_| ())
    }
}

// =============================================================================
// In-memory cache store
// =============================================================================

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set_ex(&self, key: &str, value: String, _ttl_seconds: u64) -> AppResult<()> {
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn incr_window(&self, key: &str, window_seconds: u64) -> AppResult<(u64, u64)> {
        let mut entries = self.entries.lock().unwrap();
        let count = entries
            .get(key)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        entries.insert(key.to_string(), count.to_string());
        Ok((count, window_seconds))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

// =============================================================================
// App harness
// =============================================================================

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub users: Arc<StubUsers>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_rate_limit(1_000)
    }

    pub fn with_rate_limit(requests: u64) -> Self {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        Self::build(Database::from_connection(db), requests)
    }

    pub fn with_database(database: Database) -> Self {
        Self::build(database, 1_000)
    }

    fn build(database: Database, requests: u64) -> Self {
        let mut config = Config::new(
            "integration-test-secret-at-least-32-chars",
            "integration-refresh-secret-at-least-32-chars",
        );
        config.rate_limit_requests = requests;
        config.rate_limit_window_seconds = 30;

        let store = Arc::new(MemoryStore::default());
        let users = Arc::new(StubUsers::default());
        let cache = Arc::new(Cache::new(store.clone(), 60));

        let services = Services::new(
            Arc::new(StubAuth),
            users.clone(),
            Arc::new(StubMotorbikes),
            Arc::new(StubRides::default()),
            Arc::new(StubBluetooth::default()),
        );

        let state = AppState::new(Arc::new(services), cache, Arc::new(database), config);

        Self {
            router: create_router(state),
            store,
            users,
        }
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty).
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::GET, path, token, None)).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::POST, path, token, Some(body))).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request(Method::PUT, path, token, Some(body))).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request(Method::DELETE, path, token, None)).await
    }
}

pub fn request(
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header("X-Forwarded-For", "203.0.113.7");

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
