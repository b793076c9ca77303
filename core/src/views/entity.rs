use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ratatui::text::Text;

use crate::command::Cmd;
use crate::messages::Msg;
use crate::render_state::RenderState;
use crate::theme::Theme;
use crate::view::View;

use super::{DocumentView, ErrorView};

type KeyFn = Box<dyn FnMut() -> anyhow::Result<Option<Cmd>> + Send>;

/// Something that can describe itself in every entity format
pub trait Entity: Send + 'static {
    fn yaml(&self) -> anyhow::Result<String>;

    fn json(&self) -> anyhow::Result<String>;

    /// Markdown description
    fn markdown(&self) -> String;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EntityFormat {
    #[default]
    Document,
    Yaml,
    Json,
}

impl FromStr for EntityFormat {
    type Err = std::convert::Infallible;

    /// Unknown names fall back to the document format
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Self::Yaml,
            "json" => Self::Json,
            _ => Self::Document,
        })
    }
}

impl fmt::Display for EntityFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "md"),
            Self::Yaml => write!(f, "yaml"),
            Self::Json => write!(f, "json"),
        }
    }
}

struct KeyBinding {
    key: String,
    label: String,
    callback: KeyFn,
}

/// One entity, shown as a scrollable document in the chosen format.
///
/// `d`/`-` switch to the document, `y` to YAML and `j` to JSON; switching
/// goes back to the top. Arrow keys scroll. Extra key bindings can be
/// attached with [`EntityView::with_key`]. A failing callback or
/// serialization replaces the view with an error view.
pub struct EntityView {
    entity: Box<dyn Entity>,
    format: EntityFormat,
    state: RenderState,
    document: DocumentView,
    bindings: Vec<KeyBinding>,
    err: Option<ErrorView>,
}

impl EntityView {
    pub fn new(state: &RenderState, entity: impl Entity, format: EntityFormat) -> Self {
        let mut view = Self {
            entity: Box::new(entity),
            format,
            state: state.clone(),
            document: DocumentView::new(state, ""),
            bindings: Vec::new(),
            err: None,
        };
        view.reload();
        view
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

    pub fn format(&self) -> EntityFormat {
        self.format
    }

    fn theme(&self) -> Arc<Theme> {
        self.state.theme.clone()
    }

    fn content(&self) -> anyhow::Result<String> {
        let content = match self.format {
            EntityFormat::Yaml => format!("```yaml\n{}\n```", self.entity.yaml()?),
            EntityFormat::Json => format!("```json\n{}\n```", self.entity.json()?),
            EntityFormat::Document => self.entity.markdown(),
        };
        if content.trim().is_empty() {
            return Ok("no data".to_string());
        }
        Ok(content)
    }

    /// Lay the entity out again in the current format, scrolled to the top
    fn reload(&mut self) {
        match self.content() {
            Ok(content) => self.document = DocumentView::new(&self.state, content),
            Err(err) => self.fail(err),
        }
    }

    fn switch(&mut self, format: EntityFormat) {
        if self.format != format {
            tracing::debug!(%format, "switching entity format");
            self.format = format;
            self.reload();
        }
    }

    fn fail(&mut self, err: anyhow::Error) {
        tracing::warn!("entity view failed: {:#}", err);
        self.err = Some(ErrorView::new(&err, self.theme()));
    }

    fn handle_key(&mut self, msg: &Msg, name: &str) -> Option<Cmd> {
        match name {
            "d" | "-" => self.switch(EntityFormat::Document),
            "y" => self.switch(EntityFormat::Yaml),
            "j" => self.switch(EntityFormat::Json),
            "up" | "down" | "pgup" | "pgdown" | "home" | "end" => {
                return self.document.update(msg);
            }
            other => {
                let binding = self.bindings.iter_mut().find(|b| b.key == other)?;
                return match (binding.callback)() {
                    Ok(cmd) => cmd,
                    Err(err) => {
                        self.fail(err);
                        None
                    }
                };
            }
        }
        None
    }
}

impl View for EntityView {
    fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        if let Some(err) = self.err.as_mut() {
            return err.update(msg);
        }
        match msg {
            Msg::Render(state) => {
                self.state = state.clone();
                self.document.update(msg)
            }
            Msg::Key(_) => {
                let name = msg.key_name()?;
                self.handle_key(msg, &name)
            }
            _ => None,
        }
    }

    fn render(&self) -> Text<'static> {
        match &self.err {
            Some(err) => err.render(),
            None => self.document.render(),
        }
    }

    fn wants_footer(&self) -> bool {
        self.err.is_none()
    }

    fn help_text(&self) -> String {
        let formats = "[ d: docs ] [ y: yaml ] [ j: json ]";
        let extended: Vec<String> = self
            .bindings
            .iter()
            .filter(|b| !b.key.is_empty() && !b.label.is_empty())
            .map(|b| format!("[ {}: {} ]", b.key, b.label))
            .collect();
        if extended.is_empty() {
            formats.to_string()
        } else {
            format!("{} • {formats}", extended.join(" "))
        }
    }

    fn type_tag(&self) -> &str {
        "entity"
    }
}
