//! API middleware.

mod auth;
mod rate_limit;

pub use auth::{auth_middleware, require_admin, AccessToken, CurrentUser};
pub use rate_limit::{rate_limit_middleware, RateLimitError};
