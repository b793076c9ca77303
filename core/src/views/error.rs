use std::sync::Arc;

use ratatui::text::Text;

use crate::command::Cmd;
use crate::messages::Msg;
use crate::theme::Theme;
use crate::view::{View, ERROR_TAG};

const BANNER: &str = "!! encountered error !!";

/// Shows an error, one wrapped cause per line.
///
/// The error view never quits on its own; `q` / `ctrl+c` handled by the
/// container always get out of it.
pub struct ErrorView {
    theme: Arc<Theme>,
    message: String,
}

impl ErrorView {
    pub fn new(err: &anyhow::Error, theme: Arc<Theme>) -> Self {
        // alternate formatting includes the whole context chain
        Self::from_message(format!("{err:#}"), theme)
    }

    pub fn from_message(message: impl Into<String>, theme: Arc<Theme>) -> Self {
        Self {
            theme,
            message: message.into(),
        }
    }

    /// Banner, blank line, then one line per wrapped part
    pub fn error_lines(&self) -> Vec<String> {
        let mut parts: Vec<&str> = self.message.split(':').collect();
        if parts.len() == 1 {
            parts = self.message.split(" - ").collect();
        }
        let mut lines = vec![BANNER.to_string(), String::new()];
        lines.extend(parts.into_iter().map(|part| part.trim().to_string()));
        lines
    }
}

impl View for ErrorView {
    fn update(&mut self, _msg: &Msg) -> Option<Cmd> {
        None
    }

    fn render(&self) -> Text<'static> {
        self.theme.render_error(&self.error_lines().join("\n"))
    }

    fn type_tag(&self) -> &str {
        ERROR_TAG
    }
}
