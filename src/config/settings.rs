//! Application settings loaded from environment variables.

use std::env;
use std::str::FromStr;

use super::constants::{
    DEFAULT_CACHE_TTL_SECONDS, DEFAULT_CLEANUP_INTERVAL_SECONDS, DEFAULT_CORS_ALLOWED_ORIGINS,
    DEFAULT_DATABASE_URL, DEFAULT_JWT_EXPIRATION_HOURS, DEFAULT_JWT_REFRESH_EXPIRATION_DAYS,
    DEFAULT_REDIS_URL, DEFAULT_RIDE_BASE_FARE, DEFAULT_RIDE_PER_MINUTE_RATE, DEFAULT_SERVER_HOST,
    DEFAULT_SERVER_PORT, MIN_JWT_SECRET_LENGTH, RATE_LIMIT_REQUESTS, RATE_LIMIT_WINDOW_SECONDS,
};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    jwt_secret: String,
    jwt_refresh_secret: String,
    pub jwt_expiration_hours: i64,
    pub jwt_refresh_expiration_days: i64,
    pub server_host: String,
    pub server_port: u16,
    pub rate_limit_requests: u64,
    pub rate_limit_window_seconds: u64,
    pub ride_base_fare: f64,
    pub ride_per_minute_rate: f64,
    pub user_cache_ttl_seconds: u64,
    pub cleanup_interval_seconds: u64,
    pub cors_allowed_origins: Vec<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_refresh_secret", &"[REDACTED]")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("jwt_refresh_expiration_days", &self.jwt_refresh_expiration_days)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("rate_limit_requests", &self.rate_limit_requests)
            .field("rate_limit_window_seconds", &self.rate_limit_window_seconds)
            .field("ride_base_fare", &self.ride_base_fare)
            .field("ride_per_minute_rate", &self.ride_per_minute_rate)
            .field("user_cache_ttl_seconds", &self.user_cache_ttl_seconds)
            .field("cleanup_interval_seconds", &self.cleanup_interval_seconds)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}

impl Config {
    /// Build a configuration with the given signing secrets and defaults
    /// for everything else.
    pub fn new(jwt_secret: impl Into<String>, jwt_refresh_secret: impl Into<String>) -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            redis_url: DEFAULT_REDIS_URL.to_string(),
            jwt_secret: jwt_secret.into(),
            jwt_refresh_secret: jwt_refresh_secret.into(),
            jwt_expiration_hours: DEFAULT_JWT_EXPIRATION_HOURS,
            jwt_refresh_expiration_days: DEFAULT_JWT_REFRESH_EXPIRATION_DAYS,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            rate_limit_requests: RATE_LIMIT_REQUESTS,
            rate_limit_window_seconds: RATE_LIMIT_WINDOW_SECONDS,
            ride_base_fare: DEFAULT_RIDE_BASE_FARE,
            ride_per_minute_rate: DEFAULT_RIDE_PER_MINUTE_RATE,
            user_cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            cleanup_interval_seconds: DEFAULT_CLEANUP_INTERVAL_SECONDS,
            cors_allowed_origins: parse_origins(DEFAULT_CORS_ALLOWED_ORIGINS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if a JWT secret is missing in release builds or shorter than
    /// the minimum length.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = secret_from_env("JWT_SECRET", "dev-secret-key-minimum-32-chars!!");
        let jwt_refresh_secret = secret_from_env(
            "JWT_REFRESH_SECRET",
            "dev-refresh-secret-minimum-32-chars",
        );

        let defaults = Self::new(jwt_secret, jwt_refresh_secret);

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            jwt_expiration_hours: parse_env("JWT_EXPIRATION_HOURS", defaults.jwt_expiration_hours),
            jwt_refresh_expiration_days: parse_env(
                "JWT_REFRESH_EXPIRATION_DAYS",
                defaults.jwt_refresh_expiration_days,
            ),
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_env("SERVER_PORT", defaults.server_port),
            rate_limit_requests: parse_env("RATE_LIMIT_REQUESTS", defaults.rate_limit_requests),
            rate_limit_window_seconds: parse_env(
                "RATE_LIMIT_WINDOW_SECONDS",
                defaults.rate_limit_window_seconds,
            ),
            ride_base_fare: parse_env("RIDE_BASE_FARE", defaults.ride_base_fare),
            ride_per_minute_rate: parse_env("RIDE_PER_MINUTE_RATE", defaults.ride_per_minute_rate),
            user_cache_ttl_seconds: parse_env(
                "USER_CACHE_TTL_SECONDS",
                defaults.user_cache_ttl_seconds,
            ),
            cleanup_interval_seconds: parse_env(
                "CLEANUP_INTERVAL_SECONDS",
                defaults.cleanup_interval_seconds,
            ),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or(defaults.cors_allowed_origins),
            ..defaults
        }
    }

    /// Get JWT secret bytes for access/reset token signing.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Get JWT secret bytes for refresh token signing.
    pub fn jwt_refresh_secret_bytes(&self) -> &[u8] {
        self.jwt_refresh_secret.as_bytes()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn secret_from_env(key: &str, dev_default: &str) -> String {
    let secret = env::var(key).unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            tracing::warn!("{} not set, using insecure default for development", key);
            dev_default.to_string()
        } else {
            panic!("{} environment variable must be set in production", key);
        }
    });

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        panic!(
            "{} must be at least {} characters long",
            key, MIN_JWT_SECRET_LENGTH
        );
    }

    secret
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
