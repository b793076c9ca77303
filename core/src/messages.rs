//! Messages
//!
//! Everything that flows through a session's single queue: terminal input,
//! timer ticks, follow-up command results and orchestrator commands.
//!
//! # Architecture
//!
//! ```text
//! terminal events ─┐
//! timers ──────────┼──► unbounded queue ──► Container::update ──► current view
//! Cmd results ─────┤
//! Shell::send ─────┘
//! ```
//!
//! Messages are processed one at a time in arrival order. Orchestrator
//! commands (`SetView`, `SetNotice`, ...) are consumed by the container;
//! everything else may reach the current view by reference.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::render_state::RenderState;
use crate::theme::NoticeLevel;
use crate::view::BoxedView;

/// A message delivered to the container (and usually on to the current view)
pub enum Msg {
    // === Input ===
    /// A key press
    Key(KeyEvent),
    /// Raw terminal size change
    Resize { width: u16, height: u16 },

    // === Derived by the container ===
    /// New render state, forwarded to the current view after a resize
    Render(RenderState),
    /// Content area only; what form views receive instead of `Render`
    ContentResize { width: u16, height: u16 },
    /// Periodic tick driving promotion and animations
    Tick(Instant),

    // === Orchestrator commands ===
    /// Replace the current view with the queued or previous one
    ReplaceView,
    /// A form asks its owner to submit
    Submit,
    /// End the session
    Quit,
    /// Show an error view
    Error(Arc<anyhow::Error>),
    /// Progress text for the loading view
    Status(String),
    /// Install a view now (or queue it when not ready)
    SetView(BoxedView),
    /// Queue a view without showing it
    SetNextView(BoxedView),
    /// Replace the footer notice
    SetNotice { text: String, level: NoticeLevel },
    /// Replace the application state key/value shown in the header
    SetState { key: String, val: String },
}

impl Msg {
    /// Wrap any error into an `Error` message
    pub fn error(err: impl Into<anyhow::Error>) -> Self {
        Msg::Error(Arc::new(err.into()))
    }

    pub fn status(text: impl Into<String>) -> Self {
        Msg::Status(text.into())
    }

    pub fn notice(text: impl Into<String>, level: NoticeLevel) -> Self {
        Msg::SetNotice {
            text: text.into(),
            level,
        }
    }

    pub fn state(key: impl Into<String>, val: impl Into<String>) -> Self {
        Msg::SetState {
            key: key.into(),
            val: val.into(),
        }
    }

    /// Name of the key for `Key` messages, `None` otherwise
    pub fn key_name(&self) -> Option<String> {
        match self {
            Msg::Key(key) => Some(key_name(key)),
            _ => None,
        }
    }
}

impl fmt::Debug for Msg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Msg::Key(key) => write!(f, "Key({})", key_name(key)),
            Msg::Resize { width, height } => write!(f, "Resize({width}x{height})"),
            Msg::Render(state) => write!(f, "Render({}x{})", state.width, state.height),
            Msg::ContentResize { width, height } => {
                write!(f, "ContentResize({width}x{height})")
            }
            Msg::Tick(_) => write!(f, "Tick"),
            Msg::ReplaceView => write!(f, "ReplaceView"),
            Msg::Submit => write!(f, "Submit"),
            Msg::Quit => write!(f, "Quit"),
            Msg::Error(err) => write!(f, "Error({err})"),
            Msg::Status(text) => write!(f, "Status({text:?})"),
            Msg::SetView(view) => write!(f, "SetView({})", view.type_tag()),
            Msg::SetNextView(view) => write!(f, "SetNextView({})", view.type_tag()),
            Msg::SetNotice { text, level } => write!(f, "SetNotice({level}: {text:?})"),
            Msg::SetState { key, val } => write!(f, "SetState({key}={val})"),
        }
    }
}

/// Canonical name of a key press: `"q"`, `"ctrl+c"`, `"esc"`, `"up"`, ...
pub fn key_name(key: &KeyEvent) -> String {
    let base = match key.code {
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::BackTab => "shift+tab".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::PageUp => "pgup".to_string(),
        KeyCode::PageDown => "pgdown".to_string(),
        KeyCode::Home => "home".to_string(),
        KeyCode::End => "end".to_string(),
        KeyCode::Delete => "delete".to_string(),
        KeyCode::F(n) => format!("f{n}"),
        _ => "unknown".to_string(),
    };

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        format!("ctrl+{base}")
    } else if key.modifiers.contains(KeyModifiers::ALT) {
        format!("alt+{base}")
    } else {
        base
    }
}
