//! Transcript storage and plain-text export.
//!
//! A transcript is the ordered list of messages exchanged during one chat
//! session. It can be dumped to a `chat_<YYYYMMDD_HHMMSS>.txt` file.

use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Label used in exported transcripts.
    pub fn export_label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Bot",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Errors raised while writing a transcript to disk.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write transcript to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Ordered, append-only message history for one session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message. Content is not validated; empty text is kept as-is.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
    }

    /// Drop every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Most recent message written by the user, if any.
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    /// Render the transcript in export format: one `"<Role>: <content>\n\n"`
    /// block per message.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for message in &self.messages {
            out.push_str(message.role.export_label());
            out.push_str(": ");
            out.push_str(&message.content);
            out.push_str("\n\n");
        }
        out
    }

    /// Write the rendered transcript to an explicit path.
    pub fn write_to(&self, path: &Path) -> Result<(), ExportError> {
        std::fs::write(path, self.render()).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Export into `dir` under a timestamped file name and return the path.
    pub fn export(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let path = dir.join(export_file_name(&Local::now()));
        self.write_to(&path)?;
        tracing::info!(
            "Exported {} messages to {}",
            self.messages.len(),
            path.display()
        );
        Ok(path)
    }
}

/// File name for a transcript exported at `at`.
pub fn export_file_name(at: &DateTime<Local>) -> String {
    format!("chat_{}.txt", at.format("%Y%m%d_%H%M%S"))
}
