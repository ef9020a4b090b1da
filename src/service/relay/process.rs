//! External-process backend: runs an agent script through an interpreter.
//!
//! The interpreter is chosen once at startup by probing the preferred one
//! and then the fallback. Each reply runs `<interpreter> <script> <message>`,
//! reads stdout as the reply and keeps stderr for diagnostics only.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Semaphore;

use super::backend::{ChatTurn, ReplyBackend, TurnRole, UpstreamError};
use crate::config::RelayConfig;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_STDERR_CHARS: usize = 500;

/// Agent-script backend with a bounded number of concurrent subprocesses.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    interpreter: Option<String>,
    script_path: String,
    permits: Arc<Semaphore>,
}

impl ProcessBackend {
    /// Probes the configured interpreters and builds the backend.
    ///
    /// If neither interpreter can be started the backend is still built but
    /// reports itself unavailable and fails every reply.
    pub async fn probe(config: &RelayConfig) -> Self {
        let mut interpreter = None;
        for candidate in [&config.interpreter, &config.fallback_interpreter] {
            if interpreter_available(candidate).await {
                interpreter = Some(candidate.clone());
                break;
            }
            tracing::warn!(interpreter = %candidate, "agent interpreter not available");
        }

        match &interpreter {
            Some(found) => {
                tracing::info!(interpreter = %found, script = %config.script_path, "agent process backend ready");
            }
            None => tracing::error!("no agent interpreter available; chat replies will fail"),
        }

        Self::with_interpreter(
            interpreter,
            config.script_path.clone(),
            config.max_concurrent_spawns,
        )
    }

    /// Builds the backend with an already resolved interpreter.
    #[must_use]
    pub fn with_interpreter(
        interpreter: Option<String>,
        script_path: String,
        max_concurrent_spawns: usize,
    ) -> Self {
        Self {
            interpreter,
            script_path,
            permits: Arc::new(Semaphore::new(max_concurrent_spawns.max(1))),
        }
    }

    /// Interpreter selected by the startup probe.
    #[must_use]
    pub fn interpreter(&self) -> Option<&str> {
        self.interpreter.as_deref()
    }
}

/// Returns `true` if `program` can be started at all. Its exit status is
/// irrelevant; only "not found"-type spawn failures count as unavailable.
async fn interpreter_available(program: &str) -> bool {
    let probe = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status();
    match tokio::time::timeout(PROBE_TIMEOUT, probe).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            tracing::debug!(program, error = %e, "interpreter probe failed");
            false
        }
        Err(_) => {
            tracing::debug!(program, "interpreter probe timed out");
            false
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[async_trait]
impl ReplyBackend for ProcessBackend {
    fn name(&self) -> &'static str {
        "process"
    }

    fn is_available(&self) -> bool {
        self.interpreter.is_some()
    }

    async fn reply(&self, context: &[ChatTurn]) -> Result<String, UpstreamError> {
        let Some(interpreter) = self.interpreter.as_deref() else {
            return Err(UpstreamError::InterpreterUnavailable);
        };
        let message = context
            .iter()
            .rev()
            .find(|t| t.role == TurnRole::User)
            .map(|t| t.content.as_str())
            .unwrap_or_default();

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| UpstreamError::Spawn(e.to_string()))?;

        let output = Command::new(interpreter)
            .arg(&self.script_path)
            .arg(message)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| UpstreamError::Spawn(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            tracing::debug!(stderr = %truncate(stderr.trim(), MAX_STDERR_CHARS), "agent process stderr");
        }

        if output.status.success() {
            return if stdout.is_empty() {
                Err(UpstreamError::EmptyReply)
            } else {
                Ok(stdout)
            };
        }

        if stdout.is_empty() {
            Err(UpstreamError::ProcessFailed {
                code: output.status.code(),
                stderr: truncate(stderr.trim(), MAX_STDERR_CHARS),
            })
        } else {
            tracing::warn!(
                code = ?output.status.code(),
                "agent process failed after producing output; returning partial reply"
            );
            Ok(stdout)
        }
    }
}
