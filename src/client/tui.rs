//! Interactive chat screen.
//!
//! Renders the transcript above a single-line input. The backend call blocks
//! the loop, so the screen is redrawn with a "Thinking…" status first.

use crate::advisor::AdvisorClient;
use crate::session::ChatSession;
use crate::transcript::{Message, Role, Transcript};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use tokio::runtime::Handle;
use tracing::{error, info};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

const PLACEHOLDER: &str = "Ask me about jobs, roles, or skills...";
const WELCOME: &str = "Ask about any job role, career path, or skills.";
const HINTS: &str = "Enter send · Ctrl+L clear · Ctrl+S save · Esc quit";

/// Status line content.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Status {
    Hints,
    Thinking,
    Info(String),
    Error(String),
}

/// Run the chat until the user quits.
///
/// Must be called off the async runtime's worker threads (e.g. inside
/// `spawn_blocking`), since backend calls are driven with `runtime.block_on`.
pub fn run_chat(
    session: &mut ChatSession,
    advisor: &AdvisorClient,
    surface_errors: bool,
    initial_input: Option<String>,
    runtime: &Handle,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut chat = ChatLoop::new(session, advisor, surface_errors, runtime, initial_input);
    let result = chat.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result
}

/// What the loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Continue,
    /// A question was recorded and is waiting for the advisor.
    Ask,
    Quit,
}

struct ChatLoop<'a> {
    session: &'a mut ChatSession,
    advisor: &'a AdvisorClient,
    surface_errors: bool,
    runtime: &'a Handle,
    input: Input,
    status: Status,
}

impl<'a> ChatLoop<'a> {
    fn new(
        session: &'a mut ChatSession,
        advisor: &'a AdvisorClient,
        surface_errors: bool,
        runtime: &'a Handle,
        initial_input: Option<String>,
    ) -> Self {
        Self {
            session,
            advisor,
            surface_errors,
            runtime,
            input: Input::default().with_value(initial_input.unwrap_or_default()),
            status: Status::Hints,
        }
    }

    fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.draw(terminal)?;

            let Event::Key(key) = event::read()? else {
                continue;
            };
            match self.handle_key(key) {
                Action::Continue => {}
                Action::Ask => {
                    // Show the question and "Thinking…" before blocking.
                    self.draw(terminal)?;
                    self.answer();
                }
                Action::Quit => return Ok(()),
            }
        }
    }

    fn draw<B: Backend>(&self, terminal: &mut Terminal<B>) -> Result<()> {
        terminal.draw(|frame| {
            draw_ui(frame, self.session.transcript(), &self.input, &self.status)
        })?;
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        // Only handle key press events (not release)
        if key.kind != KeyEventKind::Press {
            return Action::Continue;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => Action::Quit,
            KeyCode::Char('c') if ctrl => Action::Quit,
            KeyCode::Char('l') if ctrl => {
                self.session.clear();
                self.status = Status::Info("Chat cleared".to_string());
                Action::Continue
            }
            KeyCode::Char('s') if ctrl => {
                self.save();
                Action::Continue
            }
            KeyCode::Enter => self.submit(),
            _ => {
                self.input.handle_event(&Event::Key(key));
                Action::Continue
            }
        }
    }

    /// Record the typed question. Blank input is never sent.
    fn submit(&mut self) -> Action {
        let text = self.input.value().to_string();
        if text.trim().is_empty() {
            return Action::Continue;
        }
        self.input = Input::default();
        self.session.record_user(text);
        self.status = Status::Thinking;
        Action::Ask
    }

    /// Block on the advisor for the latest question.
    fn answer(&mut self) {
        if self.surface_errors {
            let outcome = self
                .runtime
                .block_on(self.session.try_complete_turn(self.advisor))
                .map(|_| ());
            self.status = match outcome {
                Ok(()) => Status::Hints,
                Err(e) => Status::Error(e.to_string()),
            };
        } else {
            self.runtime.block_on(self.session.complete_turn(self.advisor));
            self.status = Status::Hints;
        }
    }

    fn save(&mut self) {
        self.status = match self.session.export() {
            Ok(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                info!("Saved transcript as {}", path.display());
                Status::Info(format!("Saved as {}", name))
            }
            Err(e) => {
                error!("Export failed: {}", e);
                Status::Error(e.to_string())
            }
        };
    }
}

/// Draw the chat screen.
fn draw_ui(frame: &mut Frame, transcript: &Transcript, input: &Input, status: &Status) {
    let [transcript_area, input_area, status_area] = split_screen(frame.area());

    // Transcript
    let block = Block::default()
        .title(" Career Advisor ")
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(transcript_area);
    frame.render_widget(block, transcript_area);

    let lines = if transcript.is_empty() {
        vec![Line::from(Span::styled(WELCOME, Style::default().fg(Color::DarkGray)))]
    } else {
        transcript_lines(transcript.messages())
    };
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    let scroll = bottom_scroll(&paragraph, inner.width, inner.height);
    frame.render_widget(paragraph.scroll((scroll, 0)), inner);

    // Input
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(input_area);
    frame.render_widget(block, input_area);

    if inner.width > 0 {
        let input_width = inner.width as usize;
        let value = input.value();
        let cursor_pos = input.visual_cursor();

        // Scroll the input if cursor is beyond visible area
        let scroll = (cursor_pos + 1).saturating_sub(input_width);

        let input_line = if value.is_empty() {
            Line::from(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
        } else {
            let visible: String = value.chars().skip(scroll).take(input_width).collect();
            Line::from(Span::styled(visible, Style::default().fg(Color::White)))
        };
        frame.render_widget(Paragraph::new(input_line), inner);
        let cursor_x = cursor_pos.saturating_sub(scroll) as u16;
        frame.set_cursor_position((inner.x + cursor_x, inner.y));
    }

    // Status
    frame.render_widget(Paragraph::new(status_line(status)), status_area);
}

/// Transcript pane, input box, one-line status.
fn split_screen(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

fn transcript_lines(messages: &[Message]) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    for message in messages {
        let (label, color) = match message.role() {
            Role::User => ("You", Color::Green),
            Role::Assistant => ("Advisor", Color::Cyan),
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        for text in message.content().lines() {
            lines.push(Line::from(text));
        }
        lines.push(Line::default());
    }
    lines
}

/// Scroll offset that keeps the last rendered row visible.
fn bottom_scroll(paragraph: &Paragraph, width: u16, height: u16) -> u16 {
    paragraph
        .line_count(width)
        .saturating_sub(height as usize)
        .try_into()
        .unwrap_or(u16::MAX)
}

fn status_line(status: &Status) -> Line<'_> {
    match status {
        Status::Hints => Line::from(Span::styled(HINTS, Style::default().fg(Color::DarkGray))),
        Status::Thinking => Line::from(Span::styled(
            "Thinking…",
            Style::default().fg(Color::Yellow),
        )),
        Status::Info(text) => Line::from(Span::styled(
            text.as_str(),
            Style::default().fg(Color::Green),
        )),
        Status::Error(text) => Line::from(Span::styled(
            format!("Error: {}", text),
            Style::default().fg(Color::Red),
        )),
    }
}
