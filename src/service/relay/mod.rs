//! Agent relay: resolves the session, records the turn and obtains a reply.
//!
//! One chat turn moves through
//! `received -> session-resolved -> user appended -> reply obtained -> assistant appended`.
//! A failure while obtaining the reply ends the turn with
//! [`GatewayError::UpstreamUnavailable`]; the user message stays persisted.

pub mod backend;
pub mod hosted;
pub mod process;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

pub use backend::{ChatTurn, ReplyBackend, TurnRole, UpstreamError};
pub use hosted::HostedBackend;
pub use process::ProcessBackend;

use super::SessionService;
use crate::config::{RelayBackendKind, RelayConfig};
use crate::domain::{Message, Role, SessionId};
use crate::error::GatewayError;

/// Outcome of a successful chat turn.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Session the turn was recorded in (new if one had to be created).
    pub session_id: SessionId,
    /// Assistant reply text.
    pub content: String,
    /// Time the reply was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Builds the reply backend selected by configuration.
///
/// # Errors
///
/// Returns a [`GatewayError::Internal`] if the hosted backend's HTTP client
/// cannot be created.
pub async fn build_backend(config: &RelayConfig) -> Result<Arc<dyn ReplyBackend>, GatewayError> {
    let backend: Arc<dyn ReplyBackend> = match config.backend {
        RelayBackendKind::Hosted => Arc::new(
            HostedBackend::new(config).map_err(|e| GatewayError::Internal(e.to_string()))?,
        ),
        RelayBackendKind::Process => Arc::new(ProcessBackend::probe(config).await),
    };
    tracing::info!(
        backend = backend.name(),
        available = backend.is_available(),
        "agent relay backend selected"
    );
    Ok(backend)
}

/// Builds the context forwarded upstream: the system prompt (if any), the
/// most recent `limit` prior turns, then the new user turn.
#[must_use]
pub fn bound_history(
    system_prompt: &str,
    prior: &[Message],
    limit: usize,
    message: &str,
) -> Vec<ChatTurn> {
    let skip = prior.len().saturating_sub(limit);
    let mut context = Vec::with_capacity(prior.len() - skip + 2);
    if !system_prompt.trim().is_empty() {
        context.push(ChatTurn::system(system_prompt));
    }
    context.extend(prior.iter().skip(skip).map(|m| match m.role {
        Role::User => ChatTurn::user(m.content.as_str()),
        Role::Assistant => ChatTurn::assistant(m.content.as_str()),
    }));
    context.push(ChatTurn::user(message));
    context
}

/// Forwards chat turns to the configured [`ReplyBackend`].
#[derive(Debug)]
pub struct AgentRelay {
    sessions: Arc<SessionService>,
    backend: Arc<dyn ReplyBackend>,
    system_prompt: String,
    history_limit: usize,
    timeout: Duration,
}

impl AgentRelay {
    /// Creates a relay over `sessions` using `backend`.
    #[must_use]
    pub fn new(
        sessions: Arc<SessionService>,
        backend: Arc<dyn ReplyBackend>,
        config: &RelayConfig,
    ) -> Self {
        Self {
            sessions,
            backend,
            system_prompt: config.system_prompt.clone(),
            history_limit: config.history_limit,
            timeout: config.timeout,
        }
    }

    /// Name of the active backend.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Whether the active backend can produce replies.
    #[must_use]
    pub fn backend_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Runs one chat turn.
    ///
    /// A missing or unknown `session_id` starts a new session carrying
    /// `metadata`.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::UpstreamUnavailable`] if no reply was obtained
    ///   (the user message is kept).
    /// - [`GatewayError::Storage`] on database failure.
    pub async fn chat(
        &self,
        message: &str,
        session_id: Option<&SessionId>,
        metadata: serde_json::Value,
    ) -> Result<ChatReply, GatewayError> {
        let session_id = self.resolve_session(session_id, metadata).await?;
        let prior = self.sessions.get_messages(&session_id).await?;
        self.sessions
            .add_message(&session_id, Role::User, message)
            .await?;

        let context = bound_history(&self.system_prompt, &prior, self.history_limit, message);
        let reply = match self.obtain_reply(&context).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    backend = self.backend.name(),
                    error = %e,
                    "agent reply failed"
                );
                return Err(GatewayError::UpstreamUnavailable(e.to_string()));
            }
        };

        let stored = self
            .sessions
            .add_message(&session_id, Role::Assistant, &reply)
            .await?;
        Ok(ChatReply {
            session_id,
            content: stored.content,
            timestamp: stored.created_at,
        })
    }

    async fn resolve_session(
        &self,
        requested: Option<&SessionId>,
        metadata: serde_json::Value,
    ) -> Result<SessionId, GatewayError> {
        if let Some(id) = requested {
            if self.sessions.get_session(id).await?.is_some() {
                return Ok(id.clone());
            }
            tracing::debug!(session_id = %id, "unknown session; starting a new one");
        }
        Ok(self.sessions.create_session(metadata).await?.id)
    }

    async fn obtain_reply(&self, context: &[ChatTurn]) -> Result<String, UpstreamError> {
        let reply = tokio::time::timeout(self.timeout, self.backend.reply(context))
            .await
            .map_err(|_| UpstreamError::Timeout(self.timeout))??;
        if reply.trim().is_empty() {
            return Err(UpstreamError::EmptyReply);
        }
        Ok(reply)
    }
}


#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::stub::StubBackend;
    use super::*;
    use crate::persistence::SqlitePersistence;

    async fn make_relay(backend: Arc<StubBackend>, config: &RelayConfig) -> (AgentRelay, Arc<SessionService>) {
        let Ok(store) = SqlitePersistence::in_memory().await else {
            panic!("in-memory store");
        };
        let sessions = Arc::new(SessionService::new(store));
        let backend: Arc<dyn ReplyBackend> = backend;
        (AgentRelay::new(Arc::clone(&sessions), backend, config), sessions)
    }

    #[tokio::test]
    async fn chat_without_session_creates_one_and_records_both_turns() {
        let stub = Arc::new(StubBackend::replying("gm"));
        let (relay, sessions) = make_relay(Arc::clone(&stub), &RelayConfig::default()).await;

        let Ok(reply) = relay
            .chat("hello", None, serde_json::json!({ "userAgent": "t" }))
            .await
        else {
            panic!("chat failed");
        };
        assert_eq!(reply.content, "gm");

        let Ok(Some(session)) = sessions.get_session(&reply.session_id).await else {
            panic!("session should exist");
        };
        assert_eq!(session.metadata["userAgent"], "t");

        let Ok(history) = sessions.get_messages(&reply.session_id).await else {
            panic!("history");
        };
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "hello");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].created_at, reply.timestamp);
    }

    #[tokio::test]
    async fn unknown_session_id_gets_a_fresh_session() {
        let stub = Arc::new(StubBackend::replying("ok"));
        let (relay, _) = make_relay(stub, &RelayConfig::default()).await;
        let ghost = SessionId::from("not-a-session");
        let Ok(reply) = relay.chat("hi", Some(&ghost), serde_json::json!({})).await else {
            panic!("chat failed");
        };
        assert_ne!(reply.session_id, ghost);
    }

    #[tokio::test]
    async fn forwarded_context_is_bounded() {
        let stub = Arc::new(StubBackend::replying("ok"));
        let config = RelayConfig::default();
        let (relay, sessions) = make_relay(Arc::clone(&stub), &config).await;
        let Ok(session) = sessions.create_session(serde_json::json!({})).await else {
            panic!("session");
        };
        for i in 0..30 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            let Ok(_) = sessions.add_message(&session.id, role, &format!("turn {i}")).await else {
                panic!("seed {i}");
            };
        }

        let Ok(_) = relay.chat("newest", Some(&session.id), serde_json::json!({})).await else {
            panic!("chat failed");
        };

        let seen = stub.seen.lock().await;
        let Some(context) = seen.first() else {
            panic!("backend not called");
        };
        assert_eq!(context.len(), 1 + config.history_limit + 1);
        assert_eq!(context[0].role, TurnRole::System);
        assert_eq!(context[1].content, "turn 18");
        assert_eq!(context[12].content, "turn 29");
        let Some(last) = context.last() else {
            panic!("empty context");
        };
        assert_eq!(last.role, TurnRole::User);
        assert_eq!(last.content, "newest");
    }

    #[tokio::test]
    async fn upstream_failure_keeps_the_user_message() {
        let stub = Arc::new(StubBackend::failing());
        let (relay, sessions) = make_relay(stub, &RelayConfig::default()).await;
        let Ok(session) = sessions.create_session(serde_json::json!({})).await else {
            panic!("session");
        };

        let result = relay.chat("are you there?", Some(&session.id), serde_json::json!({})).await;
        assert!(matches!(result, Err(GatewayError::UpstreamUnavailable(_))));

        let Ok(history) = sessions.get_messages(&session.id).await else {
            panic!("history");
        };
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "are you there?");
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let stub = Arc::new(StubBackend::slow(Duration::from_secs(5)));
        let config = RelayConfig {
            timeout: Duration::from_millis(50),
            ..RelayConfig::default()
        };
        let (relay, _) = make_relay(stub, &config).await;
        let result = relay.chat("hi", None, serde_json::json!({})).await;
        assert!(matches!(result, Err(GatewayError::UpstreamUnavailable(_))));
    }

    #[test]
    fn bounding_without_system_prompt() {
        let context = bound_history("  ", &[], 12, "only");
        assert_eq!(context, vec![ChatTurn::user("only")]);
    }
}
