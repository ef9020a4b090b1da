//! REST API layer: route handlers, DTOs, rate limiting, and router composition.
//!
//! Resource endpoints are mounted under `/api`; `/health` and the OpenAPI
//! document live at the root.

pub mod doc;
pub mod dto;
pub mod handlers;
pub mod rate_limit;

use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::http::HeaderValue;
use axum::{BoxError, Router};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::config::GatewayConfig;
use crate::error::GatewayError;

pub use doc::ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router(state: &AppState) -> Router<AppState> {
    let router = Router::new()
        .nest("/api", handlers::routes(state))
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    #[cfg(not(feature = "swagger-ui"))]
    let router = router.route(
        "/api-docs/openapi.json",
        axum::routing::get(|| async { axum::Json(ApiDoc::openapi()) }),
    );

    router
}

/// CORS allow-list from `CORS_ORIGINS`; permissive when empty.
fn cors_layer(config: &GatewayConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let layer = CorsLayer::new().allow_headers(Any).allow_methods(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}

/// Maps a failure of the timeout middleware to a JSON error body.
fn timeout_error(timeout: Duration, err: &BoxError) -> GatewayError {
    if err.is::<tower::timeout::error::Elapsed>() {
        GatewayError::RequestTimeout(timeout)
    } else {
        GatewayError::Internal(err.to_string())
    }
}

/// Builds the router with middleware and state applied, ready to serve.
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let timeout = state.config.request_timeout;
    build_router(&state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                    timeout_error(timeout, &err)
                }))
                .layer(TimeoutLayer::new(timeout)),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::RateLimitSettings;
    use crate::persistence::SqlitePersistence;
    use crate::service::relay::ReplyBackend;
    use crate::service::relay::stub::StubBackend;

    async fn app_with(config: GatewayConfig, backend: StubBackend) -> Router {
        let Ok(store) = SqlitePersistence::in_memory().await else {
            panic!("in-memory store");
        };
        let backend: Arc<dyn ReplyBackend> = Arc::new(backend);
        build_app(AppState::new(config, store, backend))
    }

    async fn app() -> Router {
        app_with(GatewayConfig::default(), StubBackend::replying("gm, anon")).await
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
        caller: &str,
    ) -> (StatusCode, Value, Option<String>) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", caller);
        let request = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string())),
            None => builder.body(Body::empty()),
        };
        let Ok(request) = request else {
            panic!("request build");
        };
        let Ok(response) = app.clone().oneshot(request).await else {
            panic!("router call");
        };
        let status = response.status();
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read");
        };
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json, retry_after)
    }

    #[tokio::test]
    async fn session_chat_history_delete_flow() {
        let app = app().await;

        let (status, created, _) = send(&app, Method::POST, "/api/agent/session", Some(json!({})), "1.1.1.1").await;
        assert_eq!(status, StatusCode::OK);
        let Some(session_id) = created["sessionId"].as_str().map(str::to_string) else {
            panic!("sessionId missing: {created}");
        };
        assert!(created["createdAt"].is_string());

        let (status, reply, _) = send(
            &app,
            Method::POST,
            "/api/agent/chat",
            Some(json!({ "message": "hello", "sessionId": session_id })),
            "1.1.1.1",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["sessionId"], session_id.as_str());
        assert_eq!(reply["response"]["content"], "gm, anon");
        assert!(reply["response"]["timestamp"].is_string());

        let history_uri = format!("/api/agent/session/{session_id}/history");
        let (status, history, _) = send(&app, Method::GET, &history_uri, None, "1.1.1.1").await;
        assert_eq!(status, StatusCode::OK);
        let Some(entries) = history["history"].as_array() else {
            panic!("history missing: {history}");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["role"], "user");
        assert_eq!(entries[0]["content"], "hello");
        assert_eq!(entries[1]["role"], "assistant");

        let delete_uri = format!("/api/agent/session/{session_id}");
        let (status, deleted, _) = send(&app, Method::DELETE, &delete_uri, None, "1.1.1.1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["success"], true);

        let (status, _, _) = send(&app, Method::GET, &history_uri, None, "1.1.1.1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, _) = send(&app, Method::DELETE, &delete_uri, None, "1.1.1.1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chat_validates_message() {
        let app = app().await;
        let (status, body, _) =
            send(&app, Method::POST, "/api/agent/chat", Some(json!({ "message": "  " })), "2.2.2.2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "message is required");

        let long = "x".repeat(8001);
        let (status, _, _) =
            send(&app, Method::POST, "/api/agent/chat", Some(json!({ "message": long })), "2.2.2.2").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_json_is_a_json_400() {
        let app = app().await;
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/waitlist/join")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"));
        let Ok(request) = request else {
            panic!("request build");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router call");
        };
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read");
        };
        let Ok(body) = serde_json::from_slice::<Value>(&bytes) else {
            panic!("error body is not JSON");
        };
        assert_eq!(body["code"], 1001);
    }

    #[tokio::test]
    async fn upstream_failure_is_friendly_and_keeps_user_message() {
        let app = app_with(GatewayConfig::default(), StubBackend::failing()).await;
        let (status, created, _) = send(&app, Method::POST, "/api/agent/session", None, "3.3.3.3").await;
        assert_eq!(status, StatusCode::OK);
        let Some(session_id) = created["sessionId"].as_str().map(str::to_string) else {
            panic!("sessionId missing");
        };

        let (status, body, _) = send(
            &app,
            Method::POST,
            "/api/agent/chat",
            Some(json!({ "message": "ping", "sessionId": session_id })),
            "3.3.3.3",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "The assistant is temporarily unavailable");
        assert!(body["tip"].is_string());
        assert!(!body.to_string().contains("stub offline"));

        let uri = format!("/api/agent/session/{session_id}/history");
        let (_, history, _) = send(&app, Method::GET, &uri, None, "3.3.3.3").await;
        let Some(entries) = history["history"].as_array() else {
            panic!("history missing");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["content"], "ping");
    }

    #[tokio::test]
    async fn waitlist_join_conflict_and_count() {
        let app = app().await;
        let join = json!({
            "walletAddress": "0xfeed",
            "name": "Ada",
            "email": "ada@example.com",
            "reason": "early access"
        });

        let (status, before, _) = send(&app, Method::GET, "/api/waitlist/count", None, "4.4.4.4").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(before["count"], 0);

        let (status, entry, _) = send(&app, Method::POST, "/api/waitlist/join", Some(join.clone()), "4.4.4.4").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(entry["walletAddress"], "0xfeed");
        assert_eq!(entry["status"], "pending");

        let (status, conflict, _) = send(&app, Method::POST, "/api/waitlist/join", Some(join), "4.4.4.4").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(conflict["error"], "Wallet address already registered");

        let (_, after, _) = send(&app, Method::GET, "/api/waitlist/count", None, "4.4.4.4").await;
        assert_eq!(after["count"], 1);

        let (status, check, _) =
            send(&app, Method::GET, "/api/waitlist/check?walletAddress=0xfeed", None, "4.4.4.4").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(check["exists"], true);

        let (status, missing, _) =
            send(&app, Method::POST, "/api/waitlist/join", Some(json!({ "walletAddress": "0x1" })), "4.4.4.4").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(missing["error"], "name is required");
    }

    #[tokio::test]
    async fn admin_status_update() {
        let app = app().await;
        let join = json!({ "walletAddress": "0xadm", "name": "Bob", "email": "bob@example.com" });
        let (_, entry, _) = send(&app, Method::POST, "/api/waitlist/join", Some(join), "5.5.5.5").await;
        let Some(id) = entry["id"].as_i64() else {
            panic!("id missing: {entry}");
        };
        let uri = format!("/api/admin/waitlist/{id}/status");

        let (status, _, _) = send(&app, Method::PUT, &uri, Some(json!({ "status": "vip" })), "5.5.5.5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, updated, _) =
            send(&app, Method::PUT, &uri, Some(json!({ "status": "approved" })), "5.5.5.5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "approved");

        let (status, _, _) = send(
            &app,
            Method::PUT,
            "/api/admin/waitlist/999/status",
            Some(json!({ "status": "rejected" })),
            "5.5.5.5",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, listed, _) =
            send(&app, Method::GET, "/api/admin/waitlist?status=approved&limit=10", None, "5.5.5.5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["entries"].as_array().map(Vec::len), Some(1));

        let (status, _, _) = send(&app, Method::GET, "/api/admin/waitlist?status=vip", None, "5.5.5.5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn profile_defaults_and_upsert() {
        let app = app().await;
        let (status, empty, _) =
            send(&app, Method::GET, "/api/users/profile?walletAddress=0xme", None, "6.6.6.6").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(empty["walletAddress"], "0xme");
        assert!(empty["username"].is_null());

        let (status, saved, _) = send(
            &app,
            Method::POST,
            "/api/users/profile",
            Some(json!({ "walletAddress": "0xme", "username": "me" })),
            "6.6.6.6",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["username"], "me");

        let (status, _, _) = send(&app, Method::GET, "/api/users/profile", None, "6.6.6.6").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, tx, _) = send(
            &app,
            Method::POST,
            "/api/users/transactions",
            Some(json!({ "walletAddress": "0xme", "type": "swap", "amount": 2.5, "symbol": "SOL" })),
            "6.6.6.6",
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(tx["status"], "completed");

        let (status, list, _) =
            send(&app, Method::GET, "/api/users/transactions?walletAddress=0xme&limit=5", None, "6.6.6.6").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["transactions"][0]["type"], "swap");
    }

    #[tokio::test]
    async fn chat_rate_limit_rejects_excess_per_caller() {
        let config = GatewayConfig {
            chat_rate_limit: RateLimitSettings {
                window: Duration::from_secs(60),
                max_requests: 2,
            },
            ..GatewayConfig::default()
        };
        let app = app_with(config, StubBackend::replying("ok")).await;
        let body = json!({ "message": "hi" });

        for _ in 0..2 {
            let (status, _, _) = send(&app, Method::POST, "/api/agent/chat", Some(body.clone()), "7.7.7.7").await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, limited, retry_after) =
            send(&app, Method::POST, "/api/agent/chat", Some(body.clone()), "7.7.7.7").await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited["code"], 429);
        assert!(retry_after.is_some());

        // Other callers and other routes are unaffected.
        let (status, _, _) = send(&app, Method::POST, "/api/agent/chat", Some(body), "8.8.8.8").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _, _) = send(&app, Method::GET, "/api/waitlist/count", None, "7.7.7.7").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn global_rate_limit_covers_api_but_not_health() {
        let config = GatewayConfig {
            global_rate_limit: RateLimitSettings {
                window: Duration::from_secs(900),
                max_requests: 2,
            },
            ..GatewayConfig::default()
        };
        let app = app_with(config, StubBackend::replying("ok")).await;

        for _ in 0..2 {
            let (status, _, _) = send(&app, Method::GET, "/api/waitlist/count", None, "10.0.0.1").await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, limited, retry_after) =
            send(&app, Method::GET, "/api/waitlist/count", None, "10.0.0.1").await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited["code"], 429);
        assert!(limited["error"].is_string());
        assert!(retry_after.is_some_and(|v| v.parse::<u64>().is_ok_and(|secs| secs >= 1)));

        let (status, health, _) = send(&app, Method::GET, "/health", None, "10.0.0.1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "healthy");
    }

    #[tokio::test]
    async fn request_timeout_answers_with_json_body() {
        let mut config = GatewayConfig {
            request_timeout: Duration::from_millis(100),
            ..GatewayConfig::default()
        };
        config.relay.timeout = Duration::from_secs(5);
        let app = app_with(config, StubBackend::slow(Duration::from_secs(2))).await;

        let (status, body, _) = send(
            &app,
            Method::POST,
            "/api/agent/chat",
            Some(json!({ "message": "are you there?" })),
            "11.0.0.1",
        )
        .await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["error"], "Request timed out");
        assert_eq!(body["code"], 3003);
    }

    #[tokio::test]
    async fn health_and_status_report() {
        let app = app().await;
        let (status, health, _) = send(&app, Method::GET, "/health", None, "9.9.9.9").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["database"], "ok");

        let (status, agent, _) = send(&app, Method::GET, "/api/agent/status", None, "9.9.9.9").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(agent["backend"], "stub");
        assert_eq!(agent["available"], true);
        assert_eq!(agent["historyLimit"], 12);

        let (status, doc, _) = send(&app, Method::GET, "/api-docs/openapi.json", None, "9.9.9.9").await;
        assert_eq!(status, StatusCode::OK);
        assert!(doc["paths"]["/api/agent/chat"].is_object());
    }
}
