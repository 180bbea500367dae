//! Advisor client.
//!
//! Frames the user's question with a fixed instruction, hands it to the
//! backend command, and returns the trimmed standard output as the reply.

pub mod backend;

pub use backend::{BackendError, CommandBackend};

use crate::config::Config;
use tracing::{debug, warn};

/// Stateless question/answer client. Every call re-invokes the backend.
#[derive(Debug, Clone)]
pub struct AdvisorClient {
    instruction: String,
    backend: CommandBackend,
}

impl AdvisorClient {
    pub fn new(instruction: impl Into<String>, backend: CommandBackend) -> Self {
        Self {
            instruction: instruction.into(),
            backend,
        }
    }

    /// Build a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.advisor.instruction.clone(),
            CommandBackend::from(&config.backend),
        )
    }

    pub fn backend(&self) -> &CommandBackend {
        &self.backend
    }

    /// Full prompt passed to the backend for `user_text`.
    pub fn build_prompt(&self, user_text: &str) -> String {
        format!("{}\n{}", self.instruction, user_text)
    }

    /// Ask a question, surfacing every backend failure.
    pub async fn try_ask(&self, user_text: &str) -> Result<String, BackendError> {
        let prompt = self.build_prompt(user_text);
        debug!(
            "Asking {} ({} prompt bytes)",
            self.backend.model,
            prompt.len()
        );

        let invocation = self.backend.invoke(&prompt).await?;
        if !invocation.status.success() {
            return Err(BackendError::Exit {
                program: self.backend.program().to_string(),
                status: invocation.status,
                stdout: invocation.stdout,
                stderr: invocation.stderr,
            });
        }

        Ok(invocation.stdout.trim().to_string())
    }

    /// Ask a question, never failing.
    ///
    /// Backend failures are logged and whatever stdout was captured (possibly
    /// nothing) is returned as the reply.
    pub async fn ask(&self, user_text: &str) -> String {
        match self.try_ask(user_text).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Backend failed: {}", e);
                e.captured_stdout().trim().to_string()
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    const INSTRUCTION: &str = "You are a helpful job and career advisor. Answer the following:";

    fn stub(script: &str) -> AdvisorClient {
        AdvisorClient::new(
            INSTRUCTION,
            CommandBackend::new(
                "sh",
                vec!["-c".to_string(), script.to_string(), "stub".to_string()],
                "deepseek-coder",
                None,
            ),
        )
    }

    #[tokio::test]
    async fn test_reply_is_trimmed() {
        let advisor = stub(r"printf '  Hi there!  \n'");
        assert_eq!(advisor.ask("Hello").await, "Hi there!");
    }

    #[tokio::test]
    async fn test_empty_question_does_not_fail() {
        let advisor = stub("printf ''");
        assert_eq!(advisor.ask("").await, "");
        assert_eq!(advisor.try_ask("").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_every_call_reinvokes_backend() {
        let dir = tempfile::tempdir().unwrap();
        let counter = dir.path().join("calls");
        let script = format!("echo call >> '{}'; printf R", counter.display());
        let advisor = stub(&script);

        assert_eq!(advisor.ask("same").await, "R");
        assert_eq!(advisor.ask("same").await, "R");

        let calls = std::fs::read_to_string(&counter).unwrap();
        assert_eq!(calls.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_prompt_framing() {
        let advisor = stub(r#"printf '%s' "$2""#);
        let reply = advisor.ask("Which certifications help a DBA?").await;
        assert_eq!(
            reply,
            format!("{INSTRUCTION}\nWhich certifications help a DBA?")
        );
        assert_eq!(reply, advisor.build_prompt("Which certifications help a DBA?"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_swallowed_by_ask() {
        let advisor = stub("printf ' half an answer '; exit 1");
        assert_eq!(advisor.ask("q").await, "half an answer");
    }

    #[tokio::test]
    async fn test_non_zero_exit_surfaced_by_try_ask() {
        let advisor = stub("echo 'model not found' >&2; exit 1");
        let err = advisor.try_ask("q").await.unwrap_err();
        match err {
            BackendError::Exit { status, stderr, .. } => {
                assert_eq!(status.code(), Some(1));
                assert_eq!(stderr.trim(), "model not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_backend() {
        let advisor = AdvisorClient::new(
            INSTRUCTION,
            CommandBackend::new("careerchat-no-such-binary", vec![], "m", None),
        );
        assert_eq!(advisor.ask("q").await, "");
        assert!(matches!(
            advisor.try_ask("q").await,
            Err(BackendError::Spawn { .. })
        ));
    }
}
