//! External process backend.
//!
//! Each question spawns one process, waits for it to exit, and captures its
//! output. The child is configured with `kill_on_drop`, so a timed out or
//! abandoned invocation never outlives the call.

use crate::config::BackendConfig;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Failures while running the backend command.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed waiting for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` timed out after {}s", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
    #[error("`{program}` exited with {status}: {}", stderr.trim())]
    Exit {
        program: String,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
}

impl BackendError {
    /// Whatever the backend wrote to stdout before failing.
    pub fn captured_stdout(&self) -> &str {
        match self {
            BackendError::Exit { stdout, .. } => stdout,
            _ => "",
        }
    }
}

/// Output of a finished backend process.
#[derive(Debug)]
pub struct Invocation {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Runs `<program> <args...> <model> <prompt>` as a child process.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
    pub model: String,
    timeout: Option<Duration>,
}

impl CommandBackend {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            model: model.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Spawn the backend with `prompt` as its final argument and wait for it.
    ///
    /// A non-zero exit is not an error at this level; see [`Invocation::status`].
    pub async fn invoke(&self, prompt: &str) -> Result<Invocation, BackendError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(&self.model)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BackendError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        debug!("Spawned {} (pid {:?})", self.program, child.id());

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| BackendError::TimedOut {
                    program: self.program.clone(),
                    timeout,
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|source| BackendError::Wait {
            program: self.program.clone(),
            source,
        })?;

        Ok(Invocation {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl From<&BackendConfig> for CommandBackend {
    fn from(config: &BackendConfig) -> Self {
        Self::new(
            config.command.clone(),
            config.args.clone(),
            config.model.clone(),
            config.timeout(),
        )
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandBackend {
        CommandBackend::new(
            "sh",
            vec!["-c".to_string(), script.to_string(), "stub".to_string()],
            "test-model",
            None,
        )
    }

    #[tokio::test]
    async fn test_model_precedes_prompt() {
        let backend = sh(r#"printf '%s|%s' "$1" "$2""#);
        let out = backend.invoke("the prompt").await.unwrap();
        assert!(out.status.success());
        assert_eq!(out.stdout, "test-model|the prompt");
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_reported_in_status() {
        let backend = sh("printf partial; echo oops >&2; exit 3");
        let out = backend.invoke("x").await.unwrap();
        assert_eq!(out.status.code(), Some(3));
        assert_eq!(out.stdout, "partial");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let backend = CommandBackend::new("careerchat-no-such-binary", vec![], "m", None);
        let err = backend.invoke("x").await.unwrap_err();
        assert!(matches!(err, BackendError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let mut backend = sh("sleep 5");
        backend.timeout = Some(Duration::from_millis(100));
        let started = std::time::Instant::now();
        let err = backend.invoke("x").await.unwrap_err();
        assert!(matches!(err, BackendError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_from_config() {
        let backend = CommandBackend::from(&BackendConfig::default());
        assert_eq!(backend.program(), "ollama");
        assert_eq!(backend.args, vec!["run"]);
        assert_eq!(backend.model, "deepseek-coder");
        assert!(backend.timeout.is_none());
    }
}
