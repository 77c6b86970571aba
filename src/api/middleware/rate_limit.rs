//! Rate limiting middleware using Redis cache.
//!
//! Fixed window per client IP and request path. Limit and window come from
//! the configuration.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::api::extractors::client_ip;
use crate::api::AppState;

/// Rate limit error response
#[derive(Debug)]
pub struct RateLimitError {
    pub limit: u64,
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert("Retry-After", HeaderValue::from(self.retry_after));
        headers.insert("X-RateLimit-Limit", HeaderValue::from(self.limit));
        headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));

        let body = json!({
            "success": false,
            "error": {
                "code": "RATE_LIMITED",
                "message": "Too many requests. Please try again later.",
            }
        });

        (StatusCode::TOO_MANY_REQUESTS, headers, Json(body)).into_response()
    }
}

/// Count the request and reject it once the window is exhausted.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    let limit = state.config.rate_limit_requests;
    let window = state.config.rate_limit_window_seconds;

    let client = client_ip(request.headers(), request.extensions());
    let key = format!("{}:{}", client, request.uri().path());

    let status = match state.cache.check_rate_limit(&key, limit, window).await {
        Ok(status) => status,
        Err(e) => {
            // Fail closed so an unavailable Redis cannot disable the limiter
            tracing::error!(error = %e, "Rate limit check failed - denying request");
            return Err(RateLimitError {
                limit,
                retry_after: window,
            });
        }
    };

    if !status.allowed() {
        tracing::warn!(client = %client, key = %key, count = status.count, "Rate limit exceeded");
        return Err(RateLimitError {
            limit,
            retry_after: status.reset_after,
        });
    }

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(status.remaining()));

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_error_response() {
        let response = RateLimitError {
            limit: 10,
            retry_after: 30,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["Retry-After"], "30");
        assert_eq!(response.headers()["X-RateLimit-Remaining"], "0");
    }
}
