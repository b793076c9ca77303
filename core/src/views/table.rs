use std::sync::Arc;

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::command::Cmd;
use crate::messages::Msg;
use crate::render_state::RenderState;
use crate::theme::Theme;
use crate::view::View;

/// Called with the visible index and cells of the chosen row
pub type RowSelectFn = Box<dyn FnMut(usize, &[String]) -> anyhow::Result<Option<Cmd>> + Send>;

/// Called whenever the cursor lands on another row
pub type RowHoverFn = Box<dyn FnMut(usize, &[String]) + Send>;

/// Narrowest a mini table is ever drawn
const MINI_MIN_WIDTH: usize = 40;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TableMode {
    /// The whole content width
    #[default]
    Full,
    /// Centered, bordered, 80% of the content width
    Mini,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableColumn {
    pub title: String,
    /// Share of the table width; the last column takes whatever is left
    pub percentage: u16,
}

impl TableColumn {
    pub fn new(title: impl Into<String>, percentage: u16) -> Self {
        Self {
            title: title.into(),
            percentage,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableRow {
    pub cells: Vec<String>,
    pub children: Vec<TableRow>,
    pub expanded: bool,
}

impl TableRow {
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<TableRow>) -> Self {
        self.children = children;
        self
    }
}

/// A row as shown: a top-level row, or one child of an expanded row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Visible {
    parent: usize,
    child: Option<usize>,
}

fn cells_of<'a>(rows: &'a [TableRow], row: Visible) -> &'a [String] {
    let parent = &rows[row.parent];
    match row.child {
        Some(child) => &parent.children[child].cells,
        None => &parent.cells,
    }
}

/// Column table with expandable rows.
///
/// `up`/`k` and `down`/`j` move the cursor, `enter` selects, `space`/`tab`
/// expand or collapse the row under the cursor. Only one row is expanded at
/// a time. A failing selection callback is reported as an error message.
pub struct TableView {
    theme: Arc<Theme>,
    columns: Vec<TableColumn>,
    rows: Vec<TableRow>,
    mode: TableMode,
    width: u16,
    cursor: usize,
    visible: Vec<Visible>,
    on_select: Option<RowSelectFn>,
    on_hover: Option<RowHoverFn>,
}

impl TableView {
    pub fn new(
        state: &RenderState,
        columns: Vec<TableColumn>,
        rows: Vec<TableRow>,
        mode: TableMode,
    ) -> Self {
        let mut table = Self {
            theme: state.theme.clone(),
            columns,
            rows,
            mode,
            width: state.content_width,
            cursor: 0,
            visible: Vec::new(),
            on_select: None,
            on_hover: None,
        };
        table.rebuild();
        table
    }

    #[must_use]
    pub fn on_select(
        mut self,
        f: impl FnMut(usize, &[String]) -> anyhow::Result<Option<Cmd>> + Send + 'static,
    ) -> Self {
        self.on_select = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_hover(mut self, f: impl FnMut(usize, &[String]) + Send + 'static) -> Self {
        self.on_hover = Some(Box::new(f));
        self
    }

    /// Replace the rows and put the cursor back on top
    pub fn set_rows(&mut self, rows: Vec<TableRow>) {
        self.rows = rows;
        self.cursor = 0;
        self.rebuild();
    }

    pub fn selected(&self) -> Option<&[String]> {
        let row = *self.visible.get(self.cursor)?;
        Some(cells_of(&self.rows, row))
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rows currently shown, children of the expanded row included
    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    fn rebuild(&mut self) {
        self.visible.clear();
        for (parent, row) in self.rows.iter().enumerate() {
            self.visible.push(Visible {
                parent,
                child: None,
            });
            if row.expanded {
                self.visible.extend((0..row.children.len()).map(|child| Visible {
                    parent,
                    child: Some(child),
                }));
            }
        }
        self.cursor = self.cursor.min(self.visible.len().saturating_sub(1));
    }

    fn toggle(&mut self) {
        let Some(row) = self.visible.get(self.cursor).copied() else {
            return;
        };
        if row.child.is_some() || self.rows[row.parent].children.is_empty() {
            return;
        }
        for (index, other) in self.rows.iter_mut().enumerate() {
            if index == row.parent {
                other.expanded = !other.expanded;
            } else {
                other.expanded = false;
            }
        }
        // every row above is collapsed now
        self.cursor = row.parent;
        self.rebuild();
    }

    fn move_to(&mut self, cursor: usize) {
        if cursor == self.cursor || cursor >= self.visible.len() {
            return;
        }
        self.cursor = cursor;
        let row = self.visible[cursor];
        if let Some(hover) = self.on_hover.as_mut() {
            hover(cursor, cells_of(&self.rows, row));
        }
    }

    fn select(&mut self) -> Option<Cmd> {
        let row = *self.visible.get(self.cursor)?;
        let on_select = self.on_select.as_mut()?;
        match on_select(self.cursor, cells_of(&self.rows, row)) {
            Ok(cmd) => cmd,
            Err(err) => {
                tracing::warn!("table selection failed: {:#}", err);
                Some(Cmd::msg(Msg::error(err)))
            }
        }
    }

    fn table_width(&self) -> usize {
        let content = usize::from(self.width);
        match self.mode {
            TableMode::Full => content,
            TableMode::Mini => (content * 8 / 10).max(MINI_MIN_WIDTH),
        }
    }

    fn column_widths(&self, total: usize) -> Vec<usize> {
        let mut used = 0;
        let last = self.columns.len().saturating_sub(1);
        self.columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                if index == last {
                    total.saturating_sub(used)
                } else {
                    let width = total * usize::from(column.percentage) / 100;
                    used += width;
                    width
                }
            })
            .collect()
    }

    fn render_line(&self, cells: Vec<String>, widths: &[usize], style: Style) -> Line<'static> {
        let mut spans = Vec::with_capacity(widths.len() * 2);
        for (index, (cell, width)) in cells.iter().zip(widths).enumerate() {
            if index > 0 {
                spans.push(Span::raw("│"));
            }
            spans.push(Span::styled(fit(cell, width.saturating_sub(1)), style));
        }
        Line::from(spans)
    }

    fn render_rows(&self, widths: &[usize]) -> Vec<Line<'static>> {
        let palette = &self.theme.palette;
        let header = Style::default()
            .fg(palette.secondary)
            .bg(palette.primary)
            .add_modifier(Modifier::BOLD);
        let titles = self.columns.iter().map(|c| c.title.clone()).collect();
        let mut lines = vec![self.render_line(titles, widths, header)];

        for (index, row) in self.visible.iter().enumerate() {
            let style = if index == self.cursor {
                Style::default().fg(palette.white).bg(palette.emphasis)
            } else if row.child.is_some() {
                Style::default().fg(palette.tertiary)
            } else {
                self.theme.body_style()
            };

            let mut cells = cells_of(&self.rows, *row).to_vec();
            if let Some(first) = cells.first_mut() {
                let parent = &self.rows[row.parent];
                if row.child.is_some() {
                    *first = format!("  • {first}");
                } else if !parent.children.is_empty() {
                    let marker = if parent.expanded { "▶" } else { "▷" };
                    *first = format!("{marker} {first}");
                }
            }
            lines.push(self.render_line(cells, widths, style));
        }
        lines
    }

    /// Centered inside a rounded border with one cell of padding
    fn frame_mini(&self, rows: Vec<Line<'static>>, table_width: usize) -> Vec<Line<'static>> {
        let margin = " ".repeat(usize::from(self.width).saturating_sub(table_width) / 2);
        let border = Style::default().fg(self.theme.palette.border);
        let inner = table_width.saturating_sub(1) + 2;
        let edge = |left: &str, right: &str| {
            Line::from(vec![
                Span::raw(margin.clone()),
                Span::styled(format!("{left}{}{right}", "─".repeat(inner)), border),
            ])
        };
        let padded = |mut spans: Vec<Span<'static>>| {
            let used: usize = spans.iter().map(|s| s.content.width()).sum();
            let mut line = vec![Span::raw(margin.clone()), Span::styled("│ ", border)];
            line.append(&mut spans);
            line.push(Span::raw(" ".repeat(inner.saturating_sub(used + 2))));
            line.push(Span::styled(" │", border));
            Line::from(line)
        };

        let mut lines = vec![edge("╭", "╮"), padded(Vec::new())];
        lines.extend(rows.into_iter().map(|row| padded(row.spans)));
        lines.push(padded(Vec::new()));
        lines.push(edge("╰", "╯"));
        lines
    }
}

/// Truncate with an ellipsis and pad to exactly `width` columns
fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    if text.width() > width {
        let budget = if width > 3 { width - 3 } else { width };
        let mut used = 0;
        for c in text.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > budget {
                break;
            }
            used += w;
            out.push(c);
        }
        if width > 3 {
            out.push_str("...");
        }
    } else {
        out.push_str(text);
    }
    let pad = width.saturating_sub(out.width());
    out.push_str(&" ".repeat(pad));
    out
}

impl View for TableView {
    fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        match msg {
            Msg::Render(state) => {
                self.width = state.content_width;
                None
            }
            Msg::Key(_) => match msg.key_name()?.as_str() {
                "up" | "k" => {
                    self.move_to(self.cursor.saturating_sub(1));
                    None
                }
                "down" | "j" => {
                    self.move_to(self.cursor + 1);
                    None
                }
                "enter" => self.select(),
                "space" | "tab" => {
                    self.toggle();
                    None
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn render(&self) -> Text<'static> {
        if self.visible.is_empty() || self.columns.is_empty() {
            return Text::from("No data");
        }
        let table_width = self.table_width();
        let rows = self.render_rows(&self.column_widths(table_width));
        match self.mode {
            TableMode::Full => Text::from(rows),
            TableMode::Mini => Text::from(self.frame_mini(rows, table_width)),
        }
    }

    fn wants_footer(&self) -> bool {
        true
    }

    fn help_text(&self) -> String {
        "↑/↓: navigate • enter: select • space/tab: expand/collapse".to_string()
    }

    fn type_tag(&self) -> &str {
        "table"
    }
}
