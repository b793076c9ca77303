use ratatui::text::Text;

use crate::command::Cmd;
use crate::messages::Msg;
use crate::view::{View, FRAME_TAG};

/// Chrome-less wrapper: the container draws the inner view's text as is,
/// without header or footer.
pub struct FrameView {
    inner: Box<dyn View>,
}

impl FrameView {
    pub fn new(inner: impl View) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    pub fn boxed(inner: Box<dyn View>) -> Self {
        Self { inner }
    }
}

impl View for FrameView {
    fn init(&mut self) -> Option<Cmd> {
        self.inner.init()
    }

    fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        self.inner.update(msg)
    }

    fn render(&self) -> Text<'static> {
        self.inner.render()
    }

    fn type_tag(&self) -> &str {
        FRAME_TAG
    }
}
