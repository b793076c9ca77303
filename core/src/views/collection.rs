use std::sync::Arc;

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};

use crate::command::Cmd;
use crate::messages::Msg;
use crate::render_state::RenderState;
use crate::theme::Theme;
use crate::view::View;

use super::ErrorView;

/// Called with the chosen item; may return a follow-up command
pub type SelectFn = Box<dyn FnMut(&CollectionItem) -> anyhow::Result<Option<Cmd>> + Send>;

type KeyFn = Box<dyn FnMut() -> anyhow::Result<Option<Cmd>> + Send>;

/// One row of a collection
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectionItem {
    pub id: String,
    pub header: String,
    pub sub_header: String,
    pub desc: String,
}

impl CollectionItem {
    pub fn new(id: impl Into<String>, header: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_sub_header(mut self, sub_header: impl Into<String>) -> Self {
        self.sub_header = sub_header.into();
        self
    }

    #[must_use]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }
}

struct KeyBinding {
    key: String,
    label: String,
    callback: KeyFn,
}

/// Selectable list of items, sorted by header.
///
/// `up`/`k` and `down`/`j` move the cursor, `enter` calls the selection
/// callback. Extra key bindings can be attached with [`CollectionView::with_key`].
/// A failing callback replaces the list with an error view.
pub struct CollectionView {
    theme: Arc<Theme>,
    items: Vec<CollectionItem>,
    singular: String,
    plural: String,
    cursor: usize,
    height: u16,
    on_select: Option<SelectFn>,
    bindings: Vec<KeyBinding>,
    err: Option<ErrorView>,
}

impl CollectionView {
    pub fn new(state: &RenderState, mut items: Vec<CollectionItem>) -> Self {
        items.sort_by(|a, b| a.header.cmp(&b.header));
        Self {
            theme: state.theme.clone(),
            items,
            singular: "item".to_string(),
            plural: "items".to_string(),
            cursor: 0,
            height: state.content_height,
            on_select: None,
            bindings: Vec::new(),
            err: None,
        }
    }

    /// Nouns used in the status line ("1 workspace", "3 workspaces")
    #[must_use]
    pub fn with_item_names(mut self, singular: impl Into<String>, plural: impl Into<String>) -> Self {
        self.singular = singular.into();
        self.plural = plural.into();
        self
    }

    #[must_use]
    pub fn on_select(
        mut self,
        f: impl FnMut(&CollectionItem) -> anyhow::Result<Option<Cmd>> + Send + 'static,
    ) -> Self {
        self.on_select = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_key(
        mut self,
        key: impl Into<String>,
        label: impl Into<String>,
        f: impl FnMut() -> anyhow::Result<Option<Cmd>> + Send + 'static,
    ) -> Self {
        self.bindings.push(KeyBinding {
            key: key.into(),
            label: label.into(),
            callback: Box::new(f),
        });
        self
    }

    pub fn items(&self) -> &[CollectionItem] {
        &self.items
    }

    pub fn selected(&self) -> Option<&CollectionItem> {
        self.items.get(self.cursor)
    }

    /// Rows available for items below the status line
    fn page_size(&self) -> usize {
        usize::from(self.height).saturating_sub(2).max(1)
    }

    fn first_visible(&self) -> usize {
        let page = self.page_size();
        if self.cursor < page {
            0
        } else {
            self.cursor + 1 - page
        }
    }

    fn fail(&mut self, err: anyhow::Error) -> Option<Cmd> {
        tracing::warn!("collection callback failed: {:#}", err);
        self.err = Some(ErrorView::new(&err, self.theme.clone()));
        None
    }

    fn select(&mut self) -> Option<Cmd> {
        let item = self.items.get(self.cursor)?.clone();
        let on_select = self.on_select.as_mut()?;
        match on_select(&item) {
            Ok(cmd) => cmd,
            Err(err) => self.fail(err),
        }
    }

    fn handle_key(&mut self, name: &str) -> Option<Cmd> {
        match name {
            "up" | "k" => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            "down" | "j" => {
                if self.cursor + 1 < self.items.len() {
                    self.cursor += 1;
                }
                None
            }
            "enter" => self.select(),
            other => {
                let binding = self.bindings.iter_mut().find(|b| b.key == other)?;
                match (binding.callback)() {
                    Ok(cmd) => cmd,
                    Err(err) => self.fail(err),
                }
            }
        }
    }
}

impl View for CollectionView {
    fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        if let Some(err) = self.err.as_mut() {
            return err.update(msg);
        }
        match msg {
            Msg::Render(state) => {
                self.height = state.content_height;
                None
            }
            Msg::Key(_) => {
                let name = msg.key_name()?;
                self.handle_key(&name)
            }
            _ => None,
        }
    }

    fn render(&self) -> Text<'static> {
        if let Some(err) = &self.err {
            return err.render();
        }

        let palette = &self.theme.palette;
        let noun = if self.items.len() == 1 {
            &self.singular
        } else {
            &self.plural
        };
        let mut lines = vec![
            Line::styled(
                format!(" {} {}", self.items.len(), noun),
                Style::default().fg(palette.gray),
            ),
            Line::default(),
        ];
        if self.items.is_empty() {
            lines.push(Line::styled(" no data", Style::default().fg(palette.gray)));
            return Text::from(lines);
        }

        for (index, item) in self
            .items
            .iter()
            .enumerate()
            .skip(self.first_visible())
            .take(self.page_size())
        {
            let selected = index == self.cursor;
            let (marker, header_style) = if selected {
                (
                    "> ",
                    Style::default()
                        .fg(palette.primary)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                ("  ", Style::default().fg(palette.body))
            };
            let mut spans = vec![
                Span::styled(marker, Style::default().fg(palette.primary)),
                Span::styled(item.header.clone(), header_style),
            ];
            if !item.sub_header.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", item.sub_header),
                    Style::default().fg(palette.tertiary),
                ));
            }
            lines.push(Line::from(spans));
        }
        Text::from(lines)
    }

    fn wants_footer(&self) -> bool {
        self.err.is_none()
    }

    fn help_text(&self) -> String {
        let mut help = String::new();
        if self.on_select.is_some() {
            help.push_str("[ enter: select ]");
        }
        let extended: Vec<String> = self
            .bindings
            .iter()
            .filter(|b| !b.key.is_empty() && !b.label.is_empty())
            .map(|b| format!("[ {}: {} ]", b.key, b.label))
            .collect();
        if !extended.is_empty() {
            if !help.is_empty() {
                help.push(' ');
            }
            help.push_str(&extended.join(" "));
        }
        help
    }

    fn type_tag(&self) -> &str {
        "collection"
    }
}
