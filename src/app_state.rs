//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::domain::SlidingWindowLimiter;
use crate::persistence::SqlitePersistence;
use crate::service::relay::ReplyBackend;
use crate::service::{AgentRelay, SessionService, UserService, WaitlistService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<GatewayConfig>,
    /// Store handle, used directly for health pings.
    pub store: SqlitePersistence,
    /// Sessions and message history.
    pub sessions: Arc<SessionService>,
    /// Chat relay to the reply backend.
    pub relay: Arc<AgentRelay>,
    /// Profiles and transactions.
    pub users: Arc<UserService>,
    /// Waitlist registrations.
    pub waitlist: Arc<WaitlistService>,
    /// Limiter applied to every `/api` request.
    pub global_limiter: Arc<SlidingWindowLimiter>,
    /// Stricter limiter on the chat-send route.
    pub chat_limiter: Arc<SlidingWindowLimiter>,
}

impl AppState {
    /// Wires the service layer on top of `store` and `backend`.
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        store: SqlitePersistence,
        backend: Arc<dyn ReplyBackend>,
    ) -> Self {
        let sessions = Arc::new(SessionService::new(store.clone()));
        let relay = Arc::new(AgentRelay::new(
            Arc::clone(&sessions),
            backend,
            &config.relay,
        ));
        Self {
            global_limiter: Arc::new(SlidingWindowLimiter::new(config.global_rate_limit)),
            chat_limiter: Arc::new(SlidingWindowLimiter::new(config.chat_rate_limit)),
            users: Arc::new(UserService::new(store.clone())),
            waitlist: Arc::new(WaitlistService::new(store.clone())),
            sessions,
            relay,
            store,
            config: Arc::new(config),
        }
    }
}
