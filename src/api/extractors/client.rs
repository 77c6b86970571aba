//! Caller metadata: user agent and best-effort client IP.

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, Extensions, HeaderMap},
};
use axum_extra::headers::{HeaderMapExt, UserAgent};
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::domain::ClientInfo;

/// Client IP: first `X-Forwarded-For` hop, then `X-Real-IP`, then the
/// socket peer address.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> String {
    if let Some(ip) = headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return ip.to_string();
    }

    if let Some(real_ip) = headers.get("X-Real-IP").and_then(|h| h.to_str().ok()) {
        return real_ip.trim().to_string();
    }

    if let Some(ConnectInfo(addr)) = extensions.get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    "unknown".to_string()
}

/// Extracts [`ClientInfo`] for session bookkeeping. Never rejects.
pub struct Client(pub ClientInfo);

#[async_trait]
impl<S> FromRequestParts<S> for Client
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .typed_get::<UserAgent>()
            .map(|ua| ua.as_str().to_string())
            .unwrap_or_default();

        Ok(Client(ClientInfo {
            user_agent,
            client_ip: client_ip(&parts.headers, &parts.extensions),
        }))
    }
}
