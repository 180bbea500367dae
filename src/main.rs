//! careerchat - a terminal career advisor.
//!
//! Forwards each question to a locally installed LLM command (by default
//! `ollama run deepseek-coder`) and shows the reply in a chat transcript.

mod advisor;
mod client;
mod config;
mod session;
mod transcript;

use advisor::AdvisorClient;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{Config, Overrides};
use session::ChatSession;
use std::path::{Path, PathBuf};
use std::process::Command as ProcessCommand;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "careerchat")]
#[command(author, version, about = "A terminal career advisor backed by a local LLM")]
#[command(long_about = "Ask about job roles, career paths, or skills.\n\nRuns an interactive chat by default; use --pipe for a single answer on stdout.")]
struct Cli {
    /// Question to ask (pre-fills the chat input, or is answered directly with --pipe)
    #[arg(value_name = "QUERY")]
    query: Option<String>,

    /// No TUI, just print the answer (for scripting)
    #[arg(long)]
    pipe: bool,

    /// With --pipe, also save the exchange as a chat_<timestamp>.txt file
    #[arg(long, requires = "pipe")]
    save: bool,

    /// Override model
    #[arg(short = 'm', long, value_name = "MODEL")]
    model: Option<String>,

    /// Kill the backend if it runs longer than this many seconds
    #[arg(short = 't', long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Use an alternate config file
    #[arg(short = 'c', long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open configuration file in $EDITOR
    Config,
    /// Show the resolved backend and export settings
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    let overrides = Overrides {
        model: cli.model,
        timeout_secs: cli.timeout,
    };

    match cli.command {
        Some(Commands::Config) => handle_config(&config_path),
        Some(Commands::Status) => {
            handle_status(&config_path, &load_config(&config_path, overrides)?)
        }
        None => {
            let config = load_config(&config_path, overrides)?;
            if cli.pipe {
                init_logging(LogTarget::Stderr)?;
                let query = cli
                    .query
                    .ok_or_else(|| anyhow::anyhow!("Query required in --pipe mode"))?;
                handle_pipe(&config, query, cli.save).await
            } else {
                init_logging(LogTarget::File(Config::log_path()?))?;
                handle_chat(config, cli.query).await
            }
        }
    }
}

/// Load the config file and apply command-line overrides.
fn load_config(path: &Path, overrides: Overrides) -> Result<Config> {
    let mut config = Config::load_from(path)?;
    config.apply(overrides);
    Ok(config)
}

enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Initialize tracing. The interactive chat owns the terminal, so it logs to a file.
fn init_logging(target: LogTarget) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("careerchat=info".parse()?);

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory: {}", parent.display())
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
    }
    Ok(())
}

/// Answer a single question and print the reply to stdout.
async fn handle_pipe(config: &Config, query: String, save: bool) -> Result<()> {
    let advisor = AdvisorClient::from_config(config);
    let mut session = ChatSession::new(config.export.resolve_dir());

    session.record_user(query);
    let reply = if config.advisor.surface_errors {
        session.try_complete_turn(&advisor).await?
    } else {
        session.complete_turn(&advisor).await
    }
    .unwrap_or_default()
    .to_string();
    println!("{}", reply);

    if save {
        let path = session.export().context("Failed to save chat")?;
        eprintln!("Saved as {}", path.display());
    }
    Ok(())
}

/// Run the interactive chat for one session.
async fn handle_chat(config: Config, initial_query: Option<String>) -> Result<()> {
    let advisor = AdvisorClient::from_config(&config);
    info!(
        "Starting chat with `{}` (model: {}, timeout: {:?})",
        advisor.backend().program(),
        advisor.backend().model,
        config.backend.timeout()
    );

    let surface_errors = config.advisor.surface_errors;
    let export_dir = config.export.resolve_dir();
    let runtime = tokio::runtime::Handle::current();

    tokio::task::spawn_blocking(move || {
        let mut session = ChatSession::new(export_dir);
        let result = client::run_chat(
            &mut session,
            &advisor,
            surface_errors,
            initial_query,
            &runtime,
        );
        info!("Chat ended with {} messages", session.transcript().len());
        result
    })
    .await
    .context("Chat session panicked")?
}

/// Handle the config command.
fn handle_config(config_path: &Path) -> Result<()> {
    // Create default config if it doesn't exist
    if !config_path.exists() {
        Config::default().save_to(config_path)?;
        println!("Created default config at {}", config_path.display());
    }

    // Open in editor
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = ProcessCommand::new(&editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        eprintln!("Editor exited with non-zero status");
    }

    Ok(())
}

/// Handle the status command.
/// Shows the configuration the chat would run with, overrides included.
fn handle_status(config_path: &Path, config: &Config) -> Result<()> {
    let source = if config_path.exists() {
        config_path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", config_path.display())
    };

    println!("Config: {}", source);
    println!("Backend: {} <prompt>", config.backend.command_line());
    println!("Model: {}", config.backend.model);
    match config.backend.timeout() {
        Some(timeout) => println!("Timeout: {}s", timeout.as_secs()),
        None => println!("Timeout: none"),
    }
    println!("Surface errors: {}", config.advisor.surface_errors);
    println!("Export dir: {}", config.export.resolve_dir().display());
    Ok(())
}
