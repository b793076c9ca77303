use std::collections::BTreeMap;
use std::sync::Arc;

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use regex::Regex;

use crate::command::Cmd;
use crate::messages::Msg;
use crate::render_state::RenderState;
use crate::theme::Theme;
use crate::view::{View, FORM_TAG};

use super::ErrorView;

/// Field values by key. Confirm fields hold `"true"` / `"false"`.
pub type FormValues = BTreeMap<String, String>;

/// Called once all fields are valid; may return a follow-up command
pub type SubmitFn = Box<dyn FnMut(&FormValues) -> anyhow::Result<Option<Cmd>> + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Text input echoed as `*`
    Masked,
    /// Free text; `alt+enter` or `ctrl+j` starts a new line
    Multiline,
    /// Yes/no toggle
    Confirm,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub key: String,
    pub kind: FieldKind,
    pub title: String,
    pub description: String,
    pub placeholder: String,
    pub default: String,
    pub required: bool,
    /// Regular expression the value must match
    pub validation: Option<String>,

    value: String,
    confirmed: bool,
}

impl Field {
    pub fn new(key: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            kind,
            title: String::new(),
            description: String::new(),
            placeholder: String::new(),
            default: String::new(),
            required: false,
            validation: None,
            value: String::new(),
            confirmed: false,
        }
    }

    pub fn text(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Text)
    }

    pub fn masked(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Masked)
    }

    pub fn multiline(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Multiline)
    }

    pub fn confirm(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Confirm)
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    #[must_use]
    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Require the value to match `expr`
    #[must_use]
    pub fn validation(mut self, expr: impl Into<String>) -> Self {
        self.validation = Some(expr.into());
        self
    }

    /// Set from text; confirm fields accept `y`, `yes` and booleans
    pub fn set(&mut self, val: &str) {
        match self.kind {
            FieldKind::Confirm => {
                let val = val.trim().to_ascii_lowercase();
                self.confirmed = val == "y" || val == "yes" || val == "true";
            }
            FieldKind::Text | FieldKind::Masked | FieldKind::Multiline => {
                self.value = val.to_string();
            }
        }
    }

    /// Entered value, falling back to the default
    pub fn value(&self) -> String {
        match self.kind {
            FieldKind::Confirm => {
                let default = self.default.trim().eq_ignore_ascii_case("true");
                (self.confirmed || default).to_string()
            }
            FieldKind::Text | FieldKind::Masked | FieldKind::Multiline => {
                if self.value.is_empty() {
                    self.default.clone()
                } else {
                    self.value.clone()
                }
            }
        }
    }

    /// # Errors
    ///
    /// Fails when a required text field has no value and no default, or when
    /// the value does not match the validation expression.
    pub fn validate(&self) -> anyhow::Result<()> {
        let value = self.value();
        if self.required && self.kind != FieldKind::Confirm && value.is_empty() {
            anyhow::bail!("required field with key '{}' not set", self.key);
        }
        if let Some(expr) = self.validation.as_deref().filter(|e| !e.is_empty()) {
            let re = Regex::new(expr).map_err(|e| {
                anyhow::anyhow!(
                    "unable to compile validation regex for field with key '{}': {e}",
                    self.key
                )
            })?;
            if !re.is_match(&value) {
                anyhow::bail!("validation ({expr}) failed for field with key '{}'", self.key);
            }
        }
        Ok(())
    }

    fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.key
        } else {
            &self.title
        }
    }
}

/// Interactive form. Tagged `form`, so it receives every key while current.
///
/// `enter`/`tab`/`down` validate the focused field and move on; on the last
/// field the form submits. `shift+tab`/`up` go back. `esc` and `ctrl+c`
/// abort with `Quit`. A completed form asks the container to `ReplaceView`.
pub struct FormView {
    theme: Arc<Theme>,
    fields: Vec<Field>,
    focus: usize,
    width: u16,
    field_error: Option<String>,
    on_submit: Option<SubmitFn>,
    completed: bool,
    err: Option<ErrorView>,
}

impl FormView {
    /// # Errors
    ///
    /// Fails when no fields are given or a field has no key.
    pub fn new(state: &RenderState, fields: Vec<Field>) -> anyhow::Result<Self> {
        if fields.is_empty() {
            anyhow::bail!("no fields provided");
        }
        if let Some(field) = fields.iter().find(|f| f.key.is_empty()) {
            anyhow::bail!("field '{}' is missing a key", field.title);
        }
        Ok(Self {
            theme: state.theme.clone(),
            fields,
            focus: 0,
            width: state.content_width,
            field_error: None,
            on_submit: None,
            completed: false,
            err: None,
        })
    }

    #[must_use]
    pub fn on_submit(
        mut self,
        f: impl FnMut(&FormValues) -> anyhow::Result<Option<Cmd>> + Send + 'static,
    ) -> Self {
        self.on_submit = Some(Box::new(f));
        self
    }

    pub fn values(&self) -> FormValues {
        self.fields
            .iter()
            .map(|f| (f.key.clone(), f.value()))
            .collect()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    fn focused(&mut self) -> &mut Field {
        &mut self.fields[self.focus]
    }

    fn advance(&mut self) -> Option<Cmd> {
        if let Err(err) = self.fields[self.focus].validate() {
            self.field_error = Some(err.to_string());
            return None;
        }
        self.field_error = None;
        if self.focus + 1 < self.fields.len() {
            self.focus += 1;
            None
        } else {
            self.submit()
        }
    }

    fn submit(&mut self) -> Option<Cmd> {
        for (index, field) in self.fields.iter().enumerate() {
            if let Err(err) = field.validate() {
                self.focus = index;
                self.field_error = Some(err.to_string());
                return None;
            }
        }

        let values = self.values();
        let follow_up = match self.on_submit.as_mut().map(|f| f(&values)) {
            Some(Err(err)) => {
                tracing::warn!("form submission failed: {:#}", err);
                self.err = Some(ErrorView::new(&err, self.theme.clone()));
                return None;
            }
            Some(Ok(cmd)) => cmd,
            None => None,
        };
        self.completed = true;
        tracing::debug!(fields = values.len(), "form completed");
        Cmd::batch([follow_up, Some(Cmd::msg(Msg::ReplaceView))])
    }

    fn handle_key(&mut self, name: &str) -> Option<Cmd> {
        match name {
            "esc" | "ctrl+c" => return Some(Cmd::msg(Msg::Quit)),
            "enter" | "tab" | "down" => return self.advance(),
            "shift+tab" | "up" => {
                self.field_error = None;
                self.focus = self.focus.saturating_sub(1);
                return None;
            }
            _ => {}
        }

        let field = self.focused();
        match field.kind {
            FieldKind::Confirm => match name {
                "y" => field.confirmed = true,
                "n" => field.confirmed = false,
                "left" | "right" | "space" => field.confirmed = !field.confirmed,
                _ => {}
            },
            FieldKind::Text | FieldKind::Masked | FieldKind::Multiline => match name {
                "backspace" => {
                    field.value.pop();
                }
                "space" => field.value.push(' '),
                "alt+enter" | "ctrl+j" if field.kind == FieldKind::Multiline => {
                    field.value.push('\n');
                }
                other => {
                    let mut chars = other.chars();
                    if let (Some(c), None) = (chars.next(), chars.next()) {
                        field.value.push(c);
                    }
                }
            },
        }
        None
    }

    fn render_field(&self, index: usize, field: &Field, lines: &mut Vec<Line<'static>>) {
        let palette = &self.theme.palette;
        let focused = index == self.focus;
        let bar = if focused { "┃ " } else { "  " };
        let bar_style = Style::default().fg(palette.primary);

        let mut title = vec![
            Span::styled(bar, bar_style),
            Span::styled(
                field.label().to_string(),
                Style::default()
                    .fg(if focused { palette.primary } else { palette.body })
                    .add_modifier(Modifier::BOLD),
            ),
        ];
        if field.required {
            title.push(Span::styled(" *", Style::default().fg(palette.error)));
        }
        lines.push(Line::from(title));

        if !field.description.is_empty() {
            // wrapped to the content width, minus the focus bar
            let width = usize::from(self.width).saturating_sub(2).max(10);
            for line in textwrap::wrap(&field.description, width) {
                lines.push(Line::from(vec![
                    Span::styled(bar, bar_style),
                    Span::styled(line.into_owned(), Style::default().fg(palette.gray)),
                ]));
            }
        }

        let rows: Vec<Vec<Span<'static>>> = match field.kind {
            FieldKind::Confirm => {
                let on = field.confirmed || field.value() == "true";
                let chosen = Style::default()
                    .fg(palette.black)
                    .bg(palette.secondary)
                    .add_modifier(Modifier::BOLD);
                let other = Style::default().fg(palette.gray);
                vec![vec![
                    Span::styled(" Yes ", if on { chosen } else { other }),
                    Span::raw("  "),
                    Span::styled(" No ", if on { other } else { chosen }),
                ]]
            }
            FieldKind::Text | FieldKind::Masked | FieldKind::Multiline => {
                let prompt_style = Style::default().fg(palette.secondary);
                if field.value.is_empty() {
                    let hint = if field.placeholder.is_empty() {
                        &field.default
                    } else {
                        &field.placeholder
                    };
                    vec![vec![
                        Span::styled("> ", prompt_style),
                        Span::styled(hint.clone(), Style::default().fg(palette.gray)),
                    ]]
                } else if field.kind == FieldKind::Masked {
                    vec![vec![
                        Span::styled("> ", prompt_style),
                        Span::styled(
                            "*".repeat(field.value.chars().count()),
                            Style::default().fg(palette.body),
                        ),
                    ]]
                } else {
                    // split on '\n' so a trailing newline shows an empty row
                    field
                        .value
                        .split('\n')
                        .enumerate()
                        .map(|(row, text)| {
                            let prompt = if row == 0 { "> " } else { "  " };
                            vec![
                                Span::styled(prompt, prompt_style),
                                Span::styled(text.to_string(), self.theme.body_style()),
                            ]
                        })
                        .collect()
                }
            }
        };
        for row in rows {
            let mut input_line = vec![Span::styled(bar, bar_style)];
            input_line.extend(row);
            lines.push(Line::from(input_line));
        }

        if focused {
            if let Some(err) = &self.field_error {
                lines.push(Line::from(vec![
                    Span::styled(bar, bar_style),
                    Span::styled(format!("* {err}"), Style::default().fg(palette.error)),
                ]));
            }
        }
    }
}

impl View for FormView {
    fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        if let Some(err) = self.err.as_mut() {
            // the container hands every key to forms, so the error needs its own exit
            return match msg.key_name().as_deref() {
                Some("esc") | Some("q") | Some("ctrl+c") => Some(Cmd::msg(Msg::Quit)),
                _ => err.update(msg),
            };
        }

        match msg {
            Msg::ContentResize { width, .. } => {
                self.width = *width;
                None
            }
            Msg::Submit => self.submit(),
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
        let mut lines = Vec::new();
        for (index, field) in self.fields.iter().enumerate() {
            if index > 0 {
                lines.push(Line::default());
            }
            self.render_field(index, field, &mut lines);
        }
        lines.push(Line::default());
        lines.push(Line::styled(
            "enter: next • shift+tab: back • esc: cancel",
            Style::default().fg(self.theme.palette.gray),
        ));
        Text::from(lines)
    }

    fn type_tag(&self) -> &str {
        FORM_TAG
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::Mutex;

    fn state() -> RenderState {
        RenderState::new(80, 40, Arc::new(Theme::default()))
    }

    fn key(code: KeyCode) -> Msg {
        Msg::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(form: &mut FormView, text: &str) {
        for c in text.chars() {
            form.update(&key(KeyCode::Char(c)));
        }
    }

    fn emits(cmd: Option<Cmd>, wanted: fn(&Msg) -> bool) -> bool {
        let Some(cmd) = cmd else { return false };
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        cmd.flatten().into_iter().any(|c| match c {
            Cmd::Task(fut) => rt.block_on(fut).as_ref().is_some_and(wanted),
            _ => false,
        })
    }

    fn fields() -> Vec<Field> {
        vec![
            Field::text("name").title("Name").required(),
            Field::masked("token").title("Token"),
            Field::confirm("save").title("Save?").default_value("true"),
        ]
    }

    #[test]
    fn test_rejects_empty_form() {
        assert!(FormView::new(&state(), vec![]).is_err());
        assert!(FormView::new(&state(), vec![Field::text("")]).is_err());
    }

    #[test]
    fn test_required_field_blocks_advance() {
        let mut form = FormView::new(&state(), fields()).unwrap();
        let cmd = form.update(&key(KeyCode::Enter));
        assert!(cmd.is_none());
        let rendered: Vec<String> = form
            .render()
            .lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert!(rendered
            .iter()
            .any(|l| l.contains("required field with key 'name' not set")));
    }

    #[test]
    fn test_fill_and_submit() {
        let seen = Arc::new(Mutex::new(FormValues::new()));
        let sink = seen.clone();
        let mut form = FormView::new(&state(), fields()).unwrap().on_submit(move |values| {
            *sink.lock().unwrap() = values.clone();
            Ok(None)
        });

        type_text(&mut form, "ana");
        form.update(&key(KeyCode::Enter));
        type_text(&mut form, "s3cret");
        assert!(form
            .render()
            .lines
            .iter()
            .any(|l| l.spans.iter().any(|s| s.content == "******")));
        form.update(&key(KeyCode::Tab));
        form.update(&key(KeyCode::Char('n')));
        let cmd = form.update(&key(KeyCode::Enter));

        assert!(form.is_completed());
        assert!(emits(cmd, |m| matches!(m, Msg::ReplaceView)));
        let values = seen.lock().unwrap().clone();
        assert_eq!(values.get("name").map(String::as_str), Some("ana"));
        assert_eq!(values.get("token").map(String::as_str), Some("s3cret"));
        // default "true" wins over an explicit "n", as with any default
        assert_eq!(values.get("save").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_backspace_edits_value() {
        let mut form = FormView::new(&state(), fields()).unwrap();
        type_text(&mut form, "abc");
        form.update(&key(KeyCode::Backspace));
        assert_eq!(form.values().get("name").map(String::as_str), Some("ab"));
    }

    #[test]
    fn test_escape_aborts_with_quit() {
        let mut form = FormView::new(&state(), fields()).unwrap();
        assert!(emits(form.update(&key(KeyCode::Esc)), |m| matches!(m, Msg::Quit)));
        assert!(!form.is_completed());
    }

    #[test]
    fn test_submit_message_validates_everything() {
        let mut form = FormView::new(&state(), fields()).unwrap();
        assert!(form.update(&Msg::Submit).is_none());
        assert!(!form.is_completed());

        form.fields[0].set("bob");
        assert!(emits(form.update(&Msg::Submit), |m| matches!(m, Msg::ReplaceView)));
    }

    #[test]
    fn test_failing_callback_shows_error_and_can_quit() {
        let mut form = FormView::new(&state(), vec![Field::text("x")])
            .unwrap()
            .on_submit(|_| Err(anyhow::anyhow!("rejected")));

        assert!(form.update(&key(KeyCode::Enter)).is_none());
        assert!(!form.is_completed());
        assert!(emits(form.update(&key(KeyCode::Char('q'))), |m| matches!(m, Msg::Quit)));
    }

    #[test]
    fn test_content_resize_rewraps_descriptions() {
        let long = "one two three four five six seven eight nine ten eleven twelve";
        let mut form =
            FormView::new(&state(), vec![Field::text("x").description(long)]).unwrap();
        let before = form.render().lines.len();

        form.update(&Msg::ContentResize { width: 22, height: 20 });

        assert_eq!(form.width(), 22);
        assert!(form.render().lines.len() > before);
    }

    #[test]
    fn test_validation_expression() {
        let mut field = Field::text("port").validation(r"^\d+$");
        field.set("80a");
        let err = field.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            r"validation (^\d+$) failed for field with key 'port'"
        );

        field.set("8080");
        assert!(field.validate().is_ok());
    }

    #[test]
    fn test_validation_applies_to_default() {
        let field = Field::text("env").default_value("prod").validation("^(dev|staging)$");
        assert!(field.validate().is_err());
    }

    #[test]
    fn test_invalid_expression_is_reported() {
        let field = Field::text("name").validation("([a-z");
        let err = field.validate().unwrap_err().to_string();
        assert!(err.starts_with("unable to compile validation regex for field with key 'name'"));
    }

    #[test]
    fn test_validation_blocks_advance() {
        let mut form = FormView::new(
            &state(),
            vec![Field::text("port").validation(r"^\d+$"), Field::text("host")],
        )
        .unwrap();
        type_text(&mut form, "http");
        form.update(&key(KeyCode::Enter));
        assert_eq!(form.focus, 0);

        for _ in 0..4 {
            form.update(&key(KeyCode::Backspace));
        }
        type_text(&mut form, "443");
        form.update(&key(KeyCode::Enter));
        assert_eq!(form.focus, 1);
    }

    #[test]
    fn test_multiline_newlines() {
        let mut form =
            FormView::new(&state(), vec![Field::multiline("notes"), Field::text("next")]).unwrap();
        type_text(&mut form, "one");
        form.update(&Msg::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT)));
        type_text(&mut form, "two");

        assert_eq!(form.values().get("notes").map(String::as_str), Some("one\ntwo"));
        let rendered: Vec<String> = form
            .render()
            .lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert!(rendered.iter().any(|l| l == "┃ > one"));
        assert!(rendered.iter().any(|l| l == "┃   two"));

        // plain enter still moves to the next field
        form.update(&key(KeyCode::Enter));
        assert_eq!(form.focus, 1);
    }

    #[test]
    fn test_confirm_parsing() {
        let mut field = Field::confirm("ok");
        field.set("YES");
        assert_eq!(field.value(), "true");
        field.set("nope");
        assert_eq!(field.value(), "false");
    }
}
