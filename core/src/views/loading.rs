use std::sync::Arc;

use ratatui::text::{Line, Span, Text};

use crate::application::DEFAULT_LOADING_MESSAGE;
use crate::command::Cmd;
use crate::messages::Msg;
use crate::theme::Theme;
use crate::view::{View, LOADING_TAG};

/// Spinner plus a one-line status message.
///
/// The spinner advances on every `Tick`; `Status` replaces the message.
pub struct LoadingView {
    theme: Arc<Theme>,
    message: String,
    step: usize,
}

impl LoadingView {
    pub fn new(message: impl Into<String>, theme: Arc<Theme>) -> Self {
        Self {
            theme,
            message: message.into(),
            step: 0,
        }
    }

    pub fn message(&self) -> &str {
        if self.message.is_empty() {
            DEFAULT_LOADING_MESSAGE
        } else {
            &self.message
        }
    }
}

impl View for LoadingView {
    fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        match msg {
            Msg::Tick(_) => self.step = self.step.wrapping_add(1),
            Msg::Status(text) => self.message = text.clone(),
            _ => {}
        }
        None
    }

    fn render(&self) -> Text<'static> {
        Text::from(vec![
            Line::default(),
            Line::default(),
            Line::from(vec![
                Span::raw(" "),
                self.theme.render_spinner(self.step),
                Span::raw(" "),
                self.theme.render_info(self.message().to_string()),
            ]),
            Line::default(),
            Line::default(),
        ])
    }

    fn type_tag(&self) -> &str {
        LOADING_TAG
    }
}
