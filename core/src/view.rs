//! View Contract
//!
//! Every screen the shell can show implements [`View`]. The orchestrator only
//! ever looks at a view through this trait, and only special-cases a view by
//! its [`type_tag`](View::type_tag).

use ratatui::text::Text;

use crate::command::Cmd;
use crate::messages::Msg;

/// Tag of the built-in loading view
pub const LOADING_TAG: &str = "loading";

/// Tag shared by every form view; forms get exclusive keyboard input
pub const FORM_TAG: &str = "form";

/// Tag of the chrome-less frame view
pub const FRAME_TAG: &str = "frame";

/// Tag of the built-in error view
pub const ERROR_TAG: &str = "error";

/// A screen managed by the container.
///
/// A view is owned by exactly one container slot at a time. It is
/// initialised once, when it first becomes current, and dropped when it is
/// superseded.
pub trait View: Send + 'static {
    /// Called once when the view first becomes current
    fn init(&mut self) -> Option<Cmd> {
        None
    }

    /// React to one message. Must not block.
    fn update(&mut self, msg: &Msg) -> Option<Cmd>;

    /// Current text of the view
    fn render(&self) -> Text<'static>;

    /// Whether the container should draw the key legend below this view
    fn wants_footer(&self) -> bool {
        false
    }

    /// Extra help shown in the footer when help is toggled on
    fn help_text(&self) -> String {
        String::new()
    }

    /// Stable identity used for every comparison between views
    fn type_tag(&self) -> &str;
}

/// Owned, type-erased view
pub type BoxedView = Box<dyn View>;

impl std::fmt::Debug for dyn View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View").field("tag", &self.type_tag()).finish()
    }
}
