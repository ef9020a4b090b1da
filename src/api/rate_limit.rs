//! Rate-limit middleware for the global and chat-send limiters.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::app_state::AppState;
use crate::domain::SlidingWindowLimiter;
use crate::error::GatewayError;

const ANONYMOUS: &str = "anonymous";

/// Identifies the caller: first `X-Forwarded-For` hop, else the peer IP,
/// else one shared anonymous bucket.
#[must_use]
pub fn caller_key(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(hop) = forwarded {
        return hop.to_string();
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| ANONYMOUS.to_string(), |ConnectInfo(addr)| addr.ip().to_string())
}

async fn enforce(
    limiter: &SlidingWindowLimiter,
    scope: &'static str,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let key = caller_key(&request);
    if let Err(retry_after) = limiter.check(&key).await {
        tracing::warn!(caller = %key, scope, "rate limit exceeded");
        return Err(GatewayError::RateLimited {
            retry_after_ms: u64::try_from(retry_after.as_millis()).unwrap_or(u64::MAX),
        });
    }
    Ok(next.run(request).await)
}

/// Applies the global per-caller limit.
///
/// # Errors
///
/// Returns [`GatewayError::RateLimited`] when the caller is over quota.
pub async fn global_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    enforce(&state.global_limiter, "global", request, next).await
}

/// Applies the stricter chat-send limit.
///
/// # Errors
///
/// Returns [`GatewayError::RateLimited`] when the caller is over quota.
pub async fn chat_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    enforce(&state.chat_limiter, "chat", request, next).await
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::body::Body;

    use super::*;

    #[test]
    fn forwarded_for_takes_first_hop() {
        let request = axum::http::Request::builder()
            .header("x-forwarded-for", " 203.0.113.7 , 10.0.0.1")
            .body(Body::empty());
        let Ok(request) = request else {
            panic!("request build");
        };
        assert_eq!(caller_key(&request), "203.0.113.7");
    }

    #[test]
    fn falls_back_to_peer_then_anonymous() {
        let Ok(mut request) = axum::http::Request::builder().body(Body::empty()) else {
            panic!("request build");
        };
        assert_eq!(caller_key(&request), ANONYMOUS);

        let peer: SocketAddr = ([192, 0, 2, 1], 4000).into();
        request.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(caller_key(&request), "192.0.2.1");
    }
}
