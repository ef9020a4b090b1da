//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Every key has a default so the service
//! starts with an empty environment.

use std::net::SocketAddr;
use std::time::Duration;

/// Headroom kept between the relay timeout and the HTTP request timeout.
pub const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

/// Which reply-producing backend the agent relay talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayBackendKind {
    /// Hosted chat-completion HTTP API.
    Hosted,
    /// External script run through an interpreter subprocess.
    Process,
}

impl RelayBackendKind {
    /// Parses the `AGENT_BACKEND` value. Unknown values select [`Self::Hosted`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "process" | "script" | "subprocess" => Self::Process,
            _ => Self::Hosted,
        }
    }

    /// Short name used in logs and the status endpoint.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hosted => "hosted",
            Self::Process => "process",
        }
    }
}

/// Sliding-window limit: at most `max_requests` per `window` per caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    /// Length of the sliding window.
    pub window: Duration,
    /// Requests allowed inside one window.
    pub max_requests: u32,
}

/// Settings for the agent relay and both of its backends.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Selected backend.
    pub backend: RelayBackendKind,
    /// System prompt placed at the head of every forwarded context.
    pub system_prompt: String,
    /// Number of most recent prior turns forwarded with each message.
    pub history_limit: usize,
    /// Upper bound on one reply (subprocess run or HTTP call).
    pub timeout: Duration,
    /// Chat-completion endpoint of the hosted API.
    pub api_url: String,
    /// API key for the hosted API. `None` makes every hosted reply a soft failure.
    pub api_key: Option<String>,
    /// Model name sent to the hosted API.
    pub model: String,
    /// Token budget per hosted reply.
    pub max_tokens: u32,
    /// Sampling temperature per hosted reply.
    pub temperature: f32,
    /// Script executed by the process backend.
    pub script_path: String,
    /// Preferred interpreter for the script.
    pub interpreter: String,
    /// Interpreter used when the preferred one is not installed.
    pub fallback_interpreter: String,
    /// Maximum number of concurrently running agent subprocesses.
    pub max_concurrent_spawns: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            backend: RelayBackendKind::Hosted,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            history_limit: 12,
            timeout: Duration::from_secs(30),
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            script_path: "agent/index.ts".to_string(),
            interpreter: "bun".to_string(),
            fallback_interpreter: "node".to_string(),
            max_concurrent_spawns: 4,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a crypto market assistant. Answer questions about \
     tokens, market sentiment and trading concepts concisely. You do not give financial advice.";

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3001`).
    pub listen_addr: SocketAddr,

    /// SQLite database file, or `:memory:` for an ephemeral store.
    pub db_path: String,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Fail startup instead of degrading to an in-memory store when the
    /// database file cannot be opened.
    pub strict_storage: bool,

    /// Tracing filter used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Emit logs as newline-delimited JSON.
    pub log_json: bool,

    /// Include internal error text in 500 responses.
    pub expose_error_details: bool,

    /// Allowed CORS origins. Empty means permissive.
    pub cors_origins: Vec<String>,

    /// Per-request timeout applied by the HTTP layer.
    pub request_timeout: Duration,

    /// Limit applied to every `/api` route.
    pub global_rate_limit: RateLimitSettings,

    /// Stricter limit applied to the chat-send route.
    pub chat_rate_limit: RateLimitSettings,

    /// Agent relay settings.
    pub relay: RelayConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            db_path: "./data/cryptochat.db".to_string(),
            database_max_connections: 5,
            strict_storage: false,
            log_level: "info".to_string(),
            log_json: false,
            expose_error_details: false,
            cors_origins: Vec::new(),
            request_timeout: Duration::from_secs(60),
            global_rate_limit: RateLimitSettings {
                window: Duration::from_secs(15 * 60),
                max_requests: 100,
            },
            chat_rate_limit: RateLimitSettings {
                window: Duration::from_secs(60),
                max_requests: 10,
            },
            relay: RelayConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`], or `PORT` is set but is not a valid port.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let mut listen_addr: SocketAddr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };
        if let Ok(port) = std::env::var("PORT") {
            listen_addr.set_port(port.trim().parse()?);
        }

        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let relay_defaults = defaults.relay;
        let relay = RelayConfig {
            backend: std::env::var("AGENT_BACKEND")
                .map(|v| RelayBackendKind::parse(&v))
                .unwrap_or(relay_defaults.backend),
            system_prompt: env_or("AGENT_SYSTEM_PROMPT", relay_defaults.system_prompt),
            history_limit: parse_env("AGENT_HISTORY_LIMIT", relay_defaults.history_limit),
            timeout: Duration::from_secs(parse_env("AGENT_TIMEOUT_SECS", 30)),
            api_url: env_or("LLM_API_URL", relay_defaults.api_url),
            api_key: std::env::var("LLM_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            model: env_or("LLM_MODEL", relay_defaults.model),
            max_tokens: parse_env("LLM_MAX_TOKENS", relay_defaults.max_tokens),
            temperature: parse_env("LLM_TEMPERATURE", relay_defaults.temperature),
            script_path: env_or("AGENT_SCRIPT", relay_defaults.script_path),
            interpreter: env_or("AGENT_INTERPRETER", relay_defaults.interpreter),
            fallback_interpreter: env_or(
                "AGENT_FALLBACK_INTERPRETER",
                relay_defaults.fallback_interpreter,
            ),
            max_concurrent_spawns: parse_env(
                "AGENT_MAX_CONCURRENT_SPAWNS",
                relay_defaults.max_concurrent_spawns,
            )
            .max(1),
        };

        let mut config = Self {
            listen_addr,
            db_path: env_or("DB_PATH", defaults.db_path),
            database_max_connections: parse_env(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            strict_storage: parse_env_bool("STRICT_STORAGE", defaults.strict_storage),
            log_level: env_or("LOG_LEVEL", defaults.log_level),
            log_json: parse_env_bool("LOG_JSON", defaults.log_json),
            expose_error_details: parse_env_bool(
                "EXPOSE_ERROR_DETAILS",
                defaults.expose_error_details,
            ),
            cors_origins,
            request_timeout: Duration::from_secs(parse_env("REQUEST_TIMEOUT_SECS", 60)),
            global_rate_limit: RateLimitSettings {
                window: Duration::from_secs(parse_env("RATE_LIMIT_WINDOW_SECS", 15 * 60)),
                max_requests: parse_env("RATE_LIMIT_MAX", 100),
            },
            chat_rate_limit: RateLimitSettings {
                window: Duration::from_secs(parse_env("CHAT_RATE_LIMIT_WINDOW_SECS", 60)),
                max_requests: parse_env("CHAT_RATE_LIMIT_MAX", 10),
            },
            relay,
        };
        config.ensure_request_outlasts_relay();
        Ok(config)
    }

    /// Raises `request_timeout` to at least `relay.timeout` plus
    /// [`REQUEST_TIMEOUT_MARGIN`], so a slow backend surfaces as the relay's
    /// upstream error rather than a cut-off request.
    ///
    /// Returns `true` when the timeout was raised.
    pub fn ensure_request_outlasts_relay(&mut self) -> bool {
        let floor = self.relay.timeout.saturating_add(REQUEST_TIMEOUT_MARGIN);
        if self.request_timeout >= floor {
            return false;
        }
        tracing::warn!(
            configured = ?self.request_timeout,
            relay_timeout = ?self.relay.timeout,
            raised_to = ?floor,
            "REQUEST_TIMEOUT_SECS is shorter than the agent timeout; raising it"
        );
        self.request_timeout = floor;
        true
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable as a boolean. Accepts `"true"`, `"1"`,
/// `"false"`, `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1" | "yes") => true,
        Some("false" | "0" | "no") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_parses_known_names() {
        assert_eq!(RelayBackendKind::parse("process"), RelayBackendKind::Process);
        assert_eq!(RelayBackendKind::parse(" Script "), RelayBackendKind::Process);
        assert_eq!(RelayBackendKind::parse("hosted"), RelayBackendKind::Hosted);
        assert_eq!(RelayBackendKind::parse("whatever"), RelayBackendKind::Hosted);
    }

    #[test]
    fn defaults_match_documented_limits() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.global_rate_limit.max_requests, 100);
        assert_eq!(cfg.global_rate_limit.window, Duration::from_secs(900));
        assert_eq!(cfg.chat_rate_limit.max_requests, 10);
        assert_eq!(cfg.chat_rate_limit.window, Duration::from_secs(60));
        assert_eq!(cfg.relay.history_limit, 12);
        assert!(cfg.relay.api_key.is_none());
        assert!(!cfg.expose_error_details);
        assert!(cfg.request_timeout >= cfg.relay.timeout + REQUEST_TIMEOUT_MARGIN);
    }

    #[test]
    fn short_request_timeout_is_raised_above_relay_timeout() {
        let mut cfg = GatewayConfig {
            request_timeout: Duration::from_secs(10),
            ..GatewayConfig::default()
        };
        cfg.relay.timeout = Duration::from_secs(30);
        assert!(cfg.ensure_request_outlasts_relay());
        assert_eq!(cfg.request_timeout, Duration::from_secs(35));

        assert!(!cfg.ensure_request_outlasts_relay());
        assert_eq!(cfg.request_timeout, Duration::from_secs(35));
    }
}
