//! Authentication bookkeeping: issued tokens, refresh sessions, revocations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Where a request came from; stored on the session it opens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub user_agent: String,
    pub client_ip: String,
}

/// Record of a token pair handed out at login or refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    pub user_id: i64,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// A refresh session. Rotated on every refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub refresh_token: String,
    pub user_agent: String,
    pub client_ip: String,
    pub is_blocked: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Usable for refresh: not blocked and not past its expiry.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_blocked && self.expires_at > now
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub user_id: i64,
    pub refresh_token: String,
    pub client: ClientInfo,
    pub expires_at: DateTime<Utc>,
}

/// Rows removed by an expired-data sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CleanupReport {
    pub tokens: u64,
    pub sessions: u64,
    pub blacklisted_tokens: u64,
}

impl CleanupReport {
    pub fn total(&self) -> u64 {
        self.tokens + self.sessions + self.blacklisted_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(is_blocked: bool, expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            id: 1,
            user_id: 1,
            refresh_token: "r".into(),
            user_agent: "test".into(),
            client_ip: "127.0.0.1".into(),
            is_blocked,
            expires_at: now + expires_in,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_session_validity() {
        let now = Utc::now();
        assert!(session(false, Duration::hours(1)).is_valid_at(now));
        assert!(!session(true, Duration::hours(1)).is_valid_at(now));
        assert!(!session(false, Duration::hours(-1)).is_valid_at(now));
    }
}
