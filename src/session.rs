//! Chat session state.
//!
//! A session owns the transcript for one run of the chat and knows where
//! transcripts are exported. It is created when the chat starts and dropped
//! when it ends.

use crate::advisor::{AdvisorClient, BackendError};
use crate::transcript::{ExportError, Role, Transcript};
use std::path::PathBuf;
use tracing::debug;

pub struct ChatSession {
    transcript: Transcript,
    export_dir: PathBuf,
}

impl ChatSession {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            transcript: Transcript::new(),
            export_dir: export_dir.into(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Record a question from the user.
    pub fn record_user(&mut self, text: impl Into<String>) {
        self.transcript.append(Role::User, text);
    }

    /// Answer the latest user message and record the reply.
    ///
    /// Returns `None` when nothing has been asked yet.
    pub async fn complete_turn(&mut self, advisor: &AdvisorClient) -> Option<&str> {
        let question = self.transcript.last_user_message()?.content().to_string();
        let reply = advisor.ask(&question).await;
        Some(self.record_reply(reply))
    }

    /// Like [`complete_turn`](Self::complete_turn), but backend failures are
    /// returned and nothing is recorded for them.
    pub async fn try_complete_turn(
        &mut self,
        advisor: &AdvisorClient,
    ) -> Result<Option<&str>, BackendError> {
        let Some(question) = self.transcript.last_user_message() else {
            return Ok(None);
        };
        let question = question.content().to_string();
        let reply = advisor.try_ask(&question).await?;
        Ok(Some(self.record_reply(reply)))
    }

    fn record_reply(&mut self, reply: String) -> &str {
        debug!("Recording {} reply ({} bytes)", Role::Assistant, reply.len());
        self.transcript.append(Role::Assistant, reply);
        self.transcript
            .messages()
            .last()
            .map(|m| m.content())
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Export the transcript into the session's export directory.
    pub fn export(&self) -> Result<PathBuf, ExportError> {
        self.transcript.export(&self.export_dir)
    }
}
