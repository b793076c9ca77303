//! Theme and Colors
//!
//! Named palettes plus the handful of rendering helpers the orchestrator and
//! the built-in views ask for: header banner, footer chrome, notices, errors
//! and the loading spinner.
//!
//! Themes are plain values. A session holds one behind an `Arc` inside its
//! [`RenderState`](crate::RenderState); nothing here is process-global.

use std::fmt;
use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

/// Lines reserved above the view for the header banner
pub const HEADER_HEIGHT: u16 = 3;

/// Lines reserved below the view for the footer chrome
pub const FOOTER_HEIGHT: u16 = 2;

/// Name of the theme used when nothing else is configured
pub const DEFAULT_THEME: &str = "everforest";

const THEME_NAMES: &[&str] = &["everforest", "dark", "dracula", "light", "tokyo-night"];

const fn hex(rgb: u32) -> Color {
    Color::Rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

// ============================================================================
// Palette
// ============================================================================

/// The colors a theme is built from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    /// Regular body text
    pub body: Color,
    /// Emphasised text
    pub emphasis: Color,
    /// Borders and rules
    pub border: Color,
    /// Application name, headings
    pub primary: Color,
    /// State key/value, spinner
    pub secondary: Color,
    /// Secondary accents (list status lines)
    pub tertiary: Color,
    /// Success notices
    pub success: Color,
    /// Warning notices
    pub warning: Color,
    /// Error notices and the error view
    pub error: Color,
    /// Info notices, loading message
    pub info: Color,
    pub white: Color,
    pub gray: Color,
    pub black: Color,
}

impl Default for Palette {
    /// Everforest, see <https://gogh-co.github.io/Gogh/>
    fn default() -> Self {
        Self {
            body: hex(0xD3C6AA),
            emphasis: hex(0xE67E80),
            border: hex(0x5C6A72),
            primary: hex(0x7FBBB3),
            secondary: hex(0x83C092),
            tertiary: hex(0xD699B6),
            success: hex(0x8DA101),
            warning: hex(0xDFA000),
            error: hex(0xF85552),
            info: hex(0x3A94C5),
            white: hex(0xDFDDC8),
            gray: hex(0x5C6A72),
            black: hex(0x343F44),
        }
    }
}

// ============================================================================
// Spinner
// ============================================================================

/// Frames of the loading spinner
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Spinner {
    pub frames: &'static [&'static str],
}

impl Spinner {
    /// Three dots with a travelling bullet
    pub const POINTS: Spinner = Spinner {
        frames: &["∙∙∙", "●∙∙", "∙●∙", "∙∙●"],
    };

    /// Frame for the given animation step (wraps around)
    pub fn frame(&self, step: usize) -> &'static str {
        if self.frames.is_empty() {
            return "";
        }
        self.frames[step % self.frames.len()]
    }
}

// ============================================================================
// Notice levels
// ============================================================================

/// Severity of a footer notice
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    #[default]
    Notice,
    Info,
    Warning,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Notice => write!(f, "notice"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// ============================================================================
// Theme
// ============================================================================

/// A named palette and the rendering helpers built on it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Theme {
    pub name: String,
    pub palette: Palette,
    pub spinner: Spinner,
}

impl Default for Theme {
    fn default() -> Self {
        Self::everforest()
    }
}

impl Theme {
    /// Build a theme from a palette
    pub fn new(name: impl Into<String>, palette: Palette) -> Self {
        Self {
            name: name.into(),
            palette,
            spinner: Spinner::POINTS,
        }
    }

    pub fn everforest() -> Self {
        Self::new("everforest", Palette::default())
    }

    /// Colors from glamour's dark style
    pub fn dark() -> Self {
        Self::new(
            "dark",
            Palette {
                body: Color::Indexed(252),
                border: Color::Indexed(240),
                emphasis: Color::Indexed(30),
                primary: Color::Indexed(39),
                secondary: Color::Indexed(228),
                tertiary: Color::Indexed(63),
                info: Color::Indexed(39),
                ..Palette::default()
            },
        )
    }

    pub fn dracula() -> Self {
        Self::new(
            "dracula",
            Palette {
                body: hex(0xF8F8F2),
                border: hex(0x6272A4),
                emphasis: hex(0xF1FA8C),
                primary: hex(0xBD93F9),
                secondary: hex(0x8BE9FD),
                tertiary: hex(0xFFB86C),
                info: hex(0xBD93F9),
                ..Palette::default()
            },
        )
    }

    pub fn light() -> Self {
        Self::new(
            "light",
            Palette {
                body: hex(0xFFFFFF),
                border: hex(0xE1E4E8),
                emphasis: hex(0x0366D6),
                primary: hex(0x24292E),
                secondary: hex(0x586069),
                tertiary: hex(0x6A737D),
                info: hex(0x0366D6),
                ..Palette::default()
            },
        )
    }

    pub fn tokyo_night() -> Self {
        Self::new(
            "tokyo-night",
            Palette {
                body: hex(0xA9B1D6),
                border: hex(0x565F89),
                emphasis: hex(0x7AA2F7),
                primary: hex(0xBB9AF7),
                secondary: hex(0x7AA2F7),
                tertiary: hex(0x2AC3DE),
                info: hex(0xBB9AF7),
                ..Palette::default()
            },
        )
    }

    /// Look a built-in theme up by name
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "everforest" => Some(Self::everforest()),
            "dark" => Some(Self::dark()),
            "dracula" => Some(Self::dracula()),
            "light" => Some(Self::light()),
            "tokyo-night" | "tokyonight" => Some(Self::tokyo_night()),
            _ => None,
        }
    }

    /// Names accepted by [`Theme::by_name`]
    pub fn names() -> &'static [&'static str] {
        THEME_NAMES
    }

    // ------------------------------------------------------------------------
    // Text helpers
    // ------------------------------------------------------------------------

    pub fn render_info(&self, text: impl Into<String>) -> Span<'static> {
        Span::styled(text.into(), Style::default().fg(self.palette.info))
    }

    pub fn body_style(&self) -> Style {
        Style::default().fg(self.palette.body)
    }

    /// Multi-line error text in the error color
    pub fn render_error(&self, text: &str) -> Text<'static> {
        let style = Style::default().fg(self.palette.error);
        Text::from(
            text.lines()
                .map(|line| Line::styled(line.to_string(), style))
                .collect::<Vec<_>>(),
        )
    }

    /// Style a notice by level; an empty notice renders as an empty span
    pub fn render_notice(&self, text: &str, level: NoticeLevel) -> Span<'static> {
        if text.is_empty() {
            return Span::default();
        }
        let color = match level {
            NoticeLevel::Success => self.palette.success,
            NoticeLevel::Info => self.palette.info,
            NoticeLevel::Warning => self.palette.warning,
            NoticeLevel::Error => self.palette.error,
            NoticeLevel::Notice => self.palette.gray,
        };
        Span::styled(text.to_string(), Style::default().fg(color))
    }

    /// Spinner frame for an animation step
    pub fn render_spinner(&self, step: usize) -> Span<'static> {
        Span::styled(
            self.spinner.frame(step),
            Style::default().fg(self.palette.secondary),
        )
    }

    // ------------------------------------------------------------------------
    // Chrome
    // ------------------------------------------------------------------------

    /// Header banner: boxed application name, state key/value, trailing rule.
    ///
    /// Always [`HEADER_HEIGHT`] lines tall unless `width` is zero, in which
    /// case a single-line short header is produced.
    pub fn render_header(
        &self,
        app_name: &str,
        state_key: &str,
        state_val: &str,
        width: u16,
    ) -> Text<'static> {
        if width == 0 {
            return self.render_short_header(app_name, state_key, state_val);
        }

        let border = Style::default().fg(self.palette.border);
        let title = format!(" {app_name} ");
        let title_width = title.width();
        let box_rule = "─".repeat(title_width);

        let mut middle = vec![
            Span::styled("│", border),
            Span::styled(
                title,
                Style::default()
                    .fg(self.palette.primary)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("│", border),
        ];

        let mut used = title_width + 2;
        if !state_key.is_empty() {
            let ctx = Style::default()
                .fg(self.palette.secondary)
                .add_modifier(Modifier::ITALIC);
            let key = format!(" {state_key}:");
            let val = format!(" {state_val} ");
            used += key.width() + val.width();
            middle.push(Span::styled(key, ctx.add_modifier(Modifier::BOLD)));
            middle.push(Span::styled(val, ctx));
        }
        let remaining = usize::from(width).saturating_sub(used);
        if remaining > 0 {
            middle.push(Span::styled("─".repeat(remaining), border));
        }

        Text::from(vec![
            Line::styled(format!("╭{box_rule}╮"), border),
            Line::from(middle),
            Line::styled(format!("╰{box_rule}╯"), border),
        ])
    }

    fn render_short_header(&self, app_name: &str, state_key: &str, state_val: &str) -> Text<'static> {
        let style = Style::default()
            .fg(self.palette.primary)
            .add_modifier(Modifier::BOLD | Modifier::ITALIC);
        Text::from(Line::styled(
            format!("<!-- {app_name} {state_key}({state_val}) --!>"),
            style,
        ))
    }

    /// Footer chrome: a rule followed by the given line in the muted color.
    ///
    /// Spans that carry their own foreground (rendered notices) keep it.
    pub fn render_footer(&self, content: Line<'static>, width: u16) -> Text<'static> {
        let rule = Line::styled(
            "─".repeat(usize::from(width)),
            Style::default().fg(self.palette.border),
        );
        let muted = Style::default().fg(self.palette.gray);
        let spans: Vec<Span<'static>> = content
            .spans
            .into_iter()
            .map(|span| {
                if span.style.fg.is_some() {
                    span
                } else {
                    let style = muted.patch(span.style);
                    span.style(style)
                }
            })
            .collect();
        Text::from(vec![rule, Line::from(spans)])
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::by_name(s).ok_or_else(|| {
            format!(
                "unknown theme '{s}' (expected one of: {})",
                THEME_NAMES.join(", ")
            )
        })
    }
}
