//! Presentation layer for careerchat.
//!
//! The client:
//! - Renders the chat transcript and a single-line input
//! - Forwards each question to the advisor and shows the reply
//! - Offers clearing and saving the transcript

pub mod tui;

pub use tui::run_chat;
