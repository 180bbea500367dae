//! Configuration management for careerchat.
//!
//! Configuration is loaded from `~/.config/careerchat/config.toml` unless an
//! explicit path is given on the command line.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// External inference command.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Prompt framing and error reporting.
    #[serde(default)]
    pub advisor: AdvisorConfig,
    /// Transcript export settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// The local LLM command invoked once per question.
///
/// The process is run as `<command> <args...> <model> <prompt>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Program to execute (default: ollama).
    #[serde(default = "default_command")]
    pub command: String,
    /// Arguments placed before the model name (default: ["run"]).
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Model identifier (default: deepseek-coder).
    #[serde(default = "default_model")]
    pub model: String,
    /// Kill the backend after this many seconds. Unset waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
            model: default_model(),
            timeout_secs: None,
        }
    }
}

fn default_command() -> String {
    "ollama".to_string()
}

fn default_args() -> Vec<String> {
    vec!["run".to_string()]
}

fn default_model() -> String {
    "deepseek-coder".to_string()
}

impl BackendConfig {
    /// Timeout as a duration. Zero is treated as no timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Human-readable command line without the prompt.
    pub fn command_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 2);
        parts.push(self.command.as_str());
        parts.extend(self.args.iter().map(String::as_str));
        parts.push(self.model.as_str());
        parts.join(" ")
    }
}

/// How questions are framed and how failures reach the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Instruction prepended to every question.
    #[serde(default = "default_instruction")]
    pub instruction: String,
    /// Show backend failures instead of rendering an empty reply.
    #[serde(default)]
    pub surface_errors: bool,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            instruction: default_instruction(),
            surface_errors: false,
        }
    }
}

fn default_instruction() -> String {
    "You are a helpful job and career advisor. Answer the following:".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory for saved transcripts. Unset means the working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl ExportConfig {
    /// Resolve the export directory.
    pub fn resolve_dir(&self) -> PathBuf {
        match &self.dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

/// Command-line overrides applied on top of the loaded file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Get the config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("careerchat"))
            .context("Could not determine config directory")
    }

    /// Get the default config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the log file path used by the interactive chat.
    pub fn log_path() -> Result<PathBuf> {
        dirs::cache_dir()
            .map(|p| p.join("careerchat").join("careerchat.log"))
            .context("Could not determine cache directory")
    }

    /// Load configuration from `path`, using defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply command-line overrides.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(model) = overrides.model {
            self.backend.model = model;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.backend.timeout_secs = Some(secs);
        }
    }
}
