//! Render State
//!
//! Immutable snapshot of the terminal geometry and the active theme. A new
//! snapshot replaces the old one wholesale on every resize.

use std::sync::Arc;

use crate::theme::{Theme, FOOTER_HEIGHT, HEADER_HEIGHT};

/// Terminal geometry plus the usable content area and theme
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderState {
    /// Full terminal width
    pub width: u16,
    /// Full terminal height
    pub height: u16,
    /// Width available to the view
    pub content_width: u16,
    /// Height left after the header and footer are reserved
    pub content_height: u16,
    pub theme: Arc<Theme>,
}

impl RenderState {
    pub fn new(width: u16, height: u16, theme: Arc<Theme>) -> Self {
        Self {
            width,
            height,
            content_width: width,
            content_height: height.saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT),
            theme,
        }
    }

    /// Snapshot with no geometry yet
    pub fn without_size(theme: Arc<Theme>) -> Self {
        Self::new(0, 0, theme)
    }

    /// True once every dimension is positive
    pub fn size_set(&self) -> bool {
        self.width > 0 && self.height > 0 && self.content_width > 0 && self.content_height > 0
    }
}
