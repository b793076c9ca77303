use std::sync::Arc;

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};

use crate::command::Cmd;
use crate::messages::Msg;
use crate::render_state::RenderState;
use crate::theme::Theme;
use crate::view::View;

/// Scrollable, word-wrapped document with light markdown styling.
///
/// Understands `#` headings, `>` quotes, `-`/`*` bullets and fenced code
/// blocks; everything else is wrapped body text. Scroll with the arrow
/// keys, `j`/`k`, page up/down, `g`/`G`.
pub struct DocumentView {
    content: String,
    theme: Arc<Theme>,
    width: u16,
    height: u16,
    offset: usize,
}

impl DocumentView {
    pub fn new(state: &RenderState, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            theme: state.theme.clone(),
            width: state.content_width,
            height: state.content_height,
            offset: 0,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Wrap width: a little narrower than the content area
    fn wrap_width(&self) -> usize {
        let width = usize::from(self.width) * 95 / 100;
        width.max(10)
    }

    fn visible_lines(&self) -> usize {
        usize::from(self.height).max(1)
    }

    /// All lines of the document at the current width
    fn layout(&self) -> Vec<Line<'static>> {
        let palette = &self.theme.palette;
        let body = Style::default().fg(palette.body);
        let heading = Style::default()
            .fg(palette.primary)
            .add_modifier(Modifier::BOLD);
        let quote = Style::default()
            .fg(palette.secondary)
            .add_modifier(Modifier::ITALIC);
        let code = Style::default().fg(palette.tertiary);

        let width = self.wrap_width();
        let mut lines = Vec::new();
        let mut in_code = false;

        for raw in self.content.lines() {
            let trimmed = raw.trim_start();
            if trimmed.starts_with("```") {
                in_code = !in_code;
                continue;
            }
            if in_code {
                lines.push(Line::styled(format!("  {raw}"), code));
                continue;
            }

            if trimmed.starts_with('#') {
                let text = trimmed.trim_start_matches('#').trim();
                push_wrapped(&mut lines, text, width, "", heading);
            } else if let Some(text) = trimmed.strip_prefix('>') {
                push_wrapped(&mut lines, text.trim(), width, "│ ", quote);
            } else if let Some(text) = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
            {
                push_wrapped(&mut lines, text, width, "• ", body);
            } else if trimmed.is_empty() {
                lines.push(Line::default());
            } else {
                push_wrapped(&mut lines, raw, width, "", body);
            }
        }
        lines
    }

    fn max_offset(&self) -> usize {
        self.layout().len().saturating_sub(self.visible_lines())
    }

    fn scroll_by(&mut self, delta: isize) {
        let max = self.max_offset();
        self.offset = self.offset.saturating_add_signed(delta).min(max);
    }
}

fn push_wrapped(
    lines: &mut Vec<Line<'static>>,
    text: &str,
    width: usize,
    marker: &str,
    style: Style,
) {
    let indent = " ".repeat(marker.chars().count());
    let options = textwrap::Options::new(width)
        .initial_indent(marker)
        .subsequent_indent(&indent);
    for piece in textwrap::wrap(text, options) {
        lines.push(Line::from(Span::styled(piece.into_owned(), style)));
    }
}

impl View for DocumentView {
    fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        match msg {
            Msg::Render(state) => {
                self.width = state.content_width;
                self.height = state.content_height;
                self.offset = self.offset.min(self.max_offset());
            }
            Msg::Key(_) => {
                let page = self.visible_lines() as isize;
                match msg.key_name().as_deref() {
                    Some("up") | Some("k") => self.scroll_by(-1),
                    Some("down") | Some("j") => self.scroll_by(1),
                    Some("pgup") => self.scroll_by(-page),
                    Some("pgdown") | Some("space") => self.scroll_by(page),
                    Some("home") | Some("g") => self.offset = 0,
                    Some("end") | Some("G") => self.offset = self.max_offset(),
                    _ => {}
                }
            }
            _ => {}
        }
        None
    }

    fn render(&self) -> Text<'static> {
        let lines: Vec<Line<'static>> = self
            .layout()
            .into_iter()
            .skip(self.offset)
            .take(self.visible_lines())
            .collect();
        Text::from(lines)
    }

    fn wants_footer(&self) -> bool {
        true
    }

    fn type_tag(&self) -> &str {
        "document"
    }
}
