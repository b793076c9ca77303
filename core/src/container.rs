//! View-Lifecycle Orchestrator
//!
//! The [`Container`] decides which view is visible and how control passes
//! between views inside one terminal session.
//!
//! # Architecture
//!
//! ```text
//!              SetView (not ready)
//!   caller ───────────────────────────► next
//!                                        │ promotion: first geometry,
//!                                        │ tick while loading, ReplaceView
//!                                        ▼
//!   previous ◄── switching away ─── current ──► rendered with chrome
//!       │                                ▲
//!       └────────── esc / backspace ─────┘
//! ```
//!
//! - Nothing but a loading view is shown before the session is ready
//!   (started and a positive geometry).
//! - `previous` is only written when switching away from a view that is
//!   neither `loading` nor `form`.
//! - While a form is current it receives every key; the container applies
//!   no navigation.
//! - Once started, `current` is never empty.
//!
//! All mutation happens on the loop task. Outside callers go through the
//! message queue; before the loop starts they may touch the container
//! directly.

use std::time::Duration;

use ratatui::text::{Line, Span, Text};
use tokio::sync::watch;

use crate::application::Application;
use crate::command::Cmd;
use crate::config::DEFAULT_TICK_INTERVAL;
use crate::error::ProgramError;
use crate::messages::Msg;
use crate::program::{Model, TerminalControl};
use crate::render_state::RenderState;
use crate::theme::NoticeLevel;
use crate::view::{BoxedView, View, FORM_TAG, FRAME_TAG, LOADING_TAG};
use crate::views::{ErrorView, LoadingView};

const LEGEND_HELP_SHOWN: &str = "[ q: quit ] [ h: hide help ] [ ↑/↓: navigate ]";
const LEGEND_BACK: &str = " [ esc: back ]";
const LEGEND_HELP_HIDDEN: &str = "[ q: quit ] [ h: show help ]";
const LEGEND_DEFAULT: &str = "[ q: quit ] [ ↑/↓: navigate ]";
const SEPARATOR: &str = " ● ";

/// Read-only picture of the container, published after every step
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub ready: bool,
    pub render_state: RenderState,
    pub current: Option<String>,
    pub previous: Option<String>,
    pub next: Option<String>,
    pub show_help: bool,
}

/// Type tags of the view triple
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewTags {
    pub current: Option<String>,
    pub previous: Option<String>,
    pub next: Option<String>,
}

impl From<&Snapshot> for ViewTags {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            current: snapshot.current.clone(),
            previous: snapshot.previous.clone(),
            next: snapshot.next.clone(),
        }
    }
}

pub struct Container {
    // === Application ===
    app: Application,
    /// Rendered footer notice, replaced wholesale
    footer_notice: Span<'static>,

    // === Geometry ===
    render: RenderState,
    started: bool,

    // === View triple ===
    current: Option<BoxedView>,
    previous: Option<BoxedView>,
    next: Option<BoxedView>,

    // === Chrome ===
    show_help: bool,
    tick_interval: Duration,

    observer: watch::Sender<Snapshot>,
}

impl Container {
    pub fn new(app: Application, render: RenderState) -> Self {
        let footer_notice = render.theme.render_notice(&app.notice, NoticeLevel::Notice);
        let (observer, _) = watch::channel(Snapshot {
            ready: false,
            render_state: render.clone(),
            current: None,
            previous: None,
            next: None,
            show_help: false,
        });
        Self {
            app,
            footer_notice,
            render,
            started: false,
            current: None,
            previous: None,
            next: None,
            show_help: false,
            tick_interval: DEFAULT_TICK_INTERVAL,
            observer,
        }
    }

    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Started and a positive geometry is known
    pub fn is_ready(&self) -> bool {
        self.started && self.render.size_set()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn current_view(&self) -> Option<&dyn View> {
        self.current.as_deref()
    }

    pub fn previous_view(&self) -> Option<&dyn View> {
        self.previous.as_deref()
    }

    pub fn next_view(&self) -> Option<&dyn View> {
        self.next.as_deref()
    }

    pub fn view_tags(&self) -> ViewTags {
        ViewTags {
            current: self.current.as_ref().map(|v| v.type_tag().to_string()),
            previous: self.previous.as_ref().map(|v| v.type_tag().to_string()),
            next: self.next.as_ref().map(|v| v.type_tag().to_string()),
        }
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render
    }

    pub fn application(&self) -> &Application {
        &self.app
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn notice(&self) -> &Span<'static> {
        &self.footer_notice
    }

    /// Receiver of the snapshot published after every step
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.observer.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        let tags = self.view_tags();
        Snapshot {
            ready: self.is_ready(),
            render_state: self.render.clone(),
            current: tags.current,
            previous: tags.previous,
            next: tags.next,
            show_help: self.show_help,
        }
    }

    fn publish(&self) {
        self.observer.send_replace(self.snapshot());
    }

    // ------------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------------

    /// Show `view`, or queue it while the session is not ready.
    ///
    /// A suspended terminal is resumed first; if that fails the error view is
    /// shown instead and the session stays alive.
    pub fn set_view(&mut self, view: BoxedView, term: &mut dyn TerminalControl) -> Option<Cmd> {
        if !self.started {
            self.set_next_view(view);
            return None;
        }
        if term.is_suspended() {
            if let Err(err) = term.resume() {
                tracing::warn!("Failed to resume terminal for {}: {}", view.type_tag(), err);
                let err = anyhow::Error::new(err).context("unable to resume program");
                return self.handle_error(&err);
            }
        }
        self.place(view)
    }

    /// Queue a view to be shown once the current loading view is done
    pub fn set_next_view(&mut self, view: BoxedView) {
        tracing::debug!(tag = view.type_tag(), "queued next view");
        self.next = Some(view);
    }

    /// Replace the current view with an error view
    pub fn handle_error(&mut self, err: &anyhow::Error) -> Option<Cmd> {
        tracing::warn!("showing error view: {:#}", err);
        let view = ErrorView::new(err, self.render.theme.clone());
        self.place(Box::new(view))
    }

    pub fn set_notice(&mut self, text: &str, level: NoticeLevel) {
        self.footer_notice = self.render.theme.render_notice(text, level);
    }

    pub fn set_state(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.app.state_key = key.into();
        self.app.state_val = val.into();
    }

    /// Queue when not ready, otherwise install
    fn place(&mut self, view: BoxedView) -> Option<Cmd> {
        if !self.is_ready() {
            self.set_next_view(view);
            return None;
        }
        self.install(view)
    }

    /// Make `view` current, remembering the outgoing view when switching
    /// away from something that is neither loading nor a form
    fn install(&mut self, mut view: BoxedView) -> Option<Cmd> {
        let switching = self.current.as_ref().is_some_and(|current| {
            current.type_tag() != view.type_tag()
                && current.type_tag() != LOADING_TAG
                && current.type_tag() != FORM_TAG
        });

        tracing::debug!(
            from = ?self.current.as_ref().map(|v| v.type_tag().to_string()),
            to = view.type_tag(),
            switching,
            "installing view"
        );

        let init = view.init();
        let geometry_msg = self.geometry_msg(view.type_tag());
        let geometry = view.update(&geometry_msg);
        let outgoing = self.current.replace(view);
        if switching {
            self.previous = outgoing;
        }
        Cmd::batch([init, geometry])
    }

    fn promote_next(&mut self) -> Option<Cmd> {
        let next = self.next.take()?;
        self.install(next)
    }

    fn loading_view(&self) -> BoxedView {
        Box::new(LoadingView::new(
            self.app.loading_message.clone(),
            self.render.theme.clone(),
        ))
    }

    /// What a view of the given tag receives when geometry changes
    fn geometry_msg(&self, tag: &str) -> Msg {
        if tag == FORM_TAG {
            Msg::ContentResize {
                width: self.render.content_width,
                height: self.render.content_height,
            }
        } else {
            Msg::Render(self.render.clone())
        }
    }

    fn current_tag(&self) -> &str {
        self.current.as_ref().map_or("", |v| v.type_tag())
    }

    fn forward(&mut self, msg: &Msg) -> Option<Cmd> {
        self.current.as_mut().and_then(|view| view.update(msg))
    }

    /// Give the current view its last message, then end the session
    fn quit(&mut self) -> Option<Cmd> {
        let last = self.forward(&Msg::Quit);
        Cmd::batch([last, Some(Cmd::Quit)])
    }

    // ------------------------------------------------------------------------
    // Message handling
    // ------------------------------------------------------------------------

    fn handle_key(&mut self, msg: &Msg) -> Option<Cmd> {
        if self.current_tag() == FORM_TAG {
            return self.forward(msg);
        }

        match msg.key_name().as_deref() {
            Some("ctrl+c") | Some("q") => self.quit(),
            Some("esc") | Some("backspace") => match self.previous.take() {
                None => self.quit(),
                Some(mut previous) => {
                    tracing::debug!(to = previous.type_tag(), "navigating back");
                    let geometry_msg = self.geometry_msg(previous.type_tag());
                    let cmd = previous.update(&geometry_msg);
                    self.current = Some(previous);
                    cmd
                }
            },
            Some("h") if self.current.as_ref().is_some_and(|v| v.wants_footer()) => {
                self.show_help = !self.show_help;
                None
            }
            _ => self.forward(msg),
        }
    }

    fn handle_resize(&mut self, width: u16, height: u16) -> Option<Cmd> {
        let was_ready = self.is_ready();
        self.render = RenderState::new(width, height, self.render.theme.clone());

        if !was_ready && self.is_ready() && self.next.is_some() {
            // promotion already delivers the geometry
            return self.promote_next();
        }
        let msg = self.geometry_msg(self.current_tag());
        self.forward(&msg)
    }

    fn handle_replace(&mut self) -> Option<Cmd> {
        if let Some(next) = self.next.take() {
            return self.place(next);
        }
        if let Some(previous) = self.previous.take() {
            return self.place(previous);
        }
        if self.current_tag() == FORM_TAG {
            return Some(Cmd::Quit);
        }
        let loading = self.loading_view();
        self.place(loading)
    }

    fn handle_tick(&mut self, msg: &Msg) -> Option<Cmd> {
        let promoted = if self.is_ready() && self.current_tag() == LOADING_TAG && self.next.is_some()
        {
            self.promote_next()
        } else {
            None
        };
        let forwarded = self.forward(msg);
        Cmd::batch([promoted, forwarded, Some(Cmd::tick(self.tick_interval))])
    }

    fn step(&mut self, msg: Msg, term: &mut dyn TerminalControl) -> Option<Cmd> {
        match msg {
            Msg::Quit => self.quit(),
            Msg::Key(_) => self.handle_key(&msg),
            Msg::Resize { width, height } => self.handle_resize(width, height),
            Msg::Tick(_) => self.handle_tick(&msg),
            Msg::ReplaceView => self.handle_replace(),
            Msg::SetView(view) => self.set_view(view, term),
            Msg::SetNextView(view) => {
                self.set_next_view(view);
                None
            }
            Msg::SetNotice { text, level } => {
                self.set_notice(&text, level);
                None
            }
            Msg::SetState { key, val } => {
                self.set_state(key, val);
                None
            }
            Msg::Error(err) => self.handle_error(&err),
            other => self.forward(&other),
        }
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Compose the current view with header and footer chrome
    pub fn render(&self) -> Text<'static> {
        let Some(current) = self.current.as_deref() else {
            return Text::default();
        };
        let tag = current.type_tag();

        if !self.is_ready() && tag != LOADING_TAG {
            return Text::default();
        }
        if tag == FRAME_TAG {
            return current.render();
        }

        let theme = &self.render.theme;
        let mut lines = theme
            .render_header(
                &self.app.name,
                &self.app.state_key,
                &self.app.state_val,
                self.render.width,
            )
            .lines;
        lines.extend(current.render().lines);
        if let Some(footer) = self.footer_line(current) {
            lines.extend(theme.render_footer(footer, self.render.width).lines);
        }
        Text::from(lines)
    }

    fn footer_line(&self, current: &dyn View) -> Option<Line<'static>> {
        let tag = current.type_tag();
        if tag == LOADING_TAG || tag == FORM_TAG {
            return None;
        }

        let notice = self.footer_notice.clone();
        let has_notice = !notice.content.is_empty();
        let help = current.help_text();

        if !current.wants_footer() {
            return Some(Line::from(notice));
        }

        if self.show_help {
            let mut legend = LEGEND_HELP_SHOWN.to_string();
            if self.previous.is_some() {
                legend.push_str(LEGEND_BACK);
            }
            return Some(Line::from(format!("{legend}{SEPARATOR}{help}")));
        }

        if !help.is_empty() {
            if has_notice {
                return Some(Line::from(vec![
                    Span::raw(format!("{LEGEND_HELP_HIDDEN}{SEPARATOR}{help}{SEPARATOR}")),
                    notice,
                ]));
            }
            return Some(Line::from(LEGEND_HELP_HIDDEN));
        }

        if has_notice {
            return Some(Line::from(vec![
                Span::raw(format!("{LEGEND_DEFAULT}{SEPARATOR}")),
                notice,
            ]));
        }
        Some(Line::from(LEGEND_DEFAULT))
    }
}

impl Model for Container {
    fn init(&mut self, term: &mut dyn TerminalControl) -> Option<Cmd> {
        self.started = true;
        if let Err(e) = term.set_title(&self.app.name) {
            tracing::warn!("Failed to set window title: {}", e);
        }

        let loading = if self.current.is_none() {
            let mut view = self.loading_view();
            let cmd = view.init();
            self.current = Some(view);
            cmd
        } else {
            None
        };
        let promoted = if self.is_ready() {
            self.promote_next()
        } else {
            None
        };

        self.publish();
        Cmd::batch([loading, promoted, Some(Cmd::tick(self.tick_interval))])
    }

    fn update(&mut self, msg: Msg, term: &mut dyn TerminalControl) -> Option<Cmd> {
        let cmd = self.step(msg, term);
        self.publish();
        cmd
    }

    fn view(&self) -> Text<'static> {
        self.render()
    }

    fn fail(&mut self, err: &ProgramError) {
        let err = anyhow::anyhow!("{err}");
        // forced: the loop is going down, readiness no longer matters
        self.current = Some(Box::new(ErrorView::new(&err, self.render.theme.clone())));
        self.publish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    // ========================================================================
    // Fixtures
    // ========================================================================

    #[derive(Default)]
    struct FakeTerm {
        suspended: bool,
        fail_resume: bool,
        title: Option<String>,
    }

    impl TerminalControl for FakeTerm {
        fn is_suspended(&self) -> bool {
            self.suspended
        }

        fn suspend(&mut self) -> Result<(), ProgramError> {
            self.suspended = true;
            Ok(())
        }

        fn resume(&mut self) -> Result<(), ProgramError> {
            if self.fail_resume {
                return Err(ProgramError::Terminal(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "tty gone",
                )));
            }
            self.suspended = false;
            Ok(())
        }

        fn set_title(&mut self, title: &str) -> Result<(), ProgramError> {
            self.title = Some(title.to_string());
            Ok(())
        }
    }

    type Log = Arc<Mutex<Vec<String>>>;

    /// A view that records what it receives
    struct Recorder {
        tag: &'static str,
        body: &'static str,
        footer: bool,
        help: &'static str,
        farewell: bool,
        log: Log,
    }

    impl Recorder {
        fn new(tag: &'static str, log: &Log) -> Self {
            Self {
                tag,
                body: "body",
                footer: false,
                help: "",
                farewell: false,
                log: log.clone(),
            }
        }

        fn with_footer(mut self, help: &'static str) -> Self {
            self.footer = true;
            self.help = help;
            self
        }

        /// Answer `Quit` with a command of its own
        fn with_farewell(mut self) -> Self {
            self.farewell = true;
            self
        }

        fn boxed(self) -> BoxedView {
            Box::new(self)
        }
    }

    impl View for Recorder {
        fn init(&mut self) -> Option<Cmd> {
            self.log.lock().unwrap().push(format!("{}:init", self.tag));
            None
        }

        fn update(&mut self, msg: &Msg) -> Option<Cmd> {
            let entry = match msg {
                Msg::Key(_) => format!("key {}", msg.key_name().unwrap_or_default()),
                Msg::Render(_) => "render".to_string(),
                Msg::ContentResize { width, height } => format!("content {width}x{height}"),
                Msg::Quit => "quit".to_string(),
                Msg::Tick(_) => return None,
                other => format!("{other:?}"),
            };
            self.log.lock().unwrap().push(format!("{}:{entry}", self.tag));
            if self.farewell && matches!(msg, Msg::Quit) {
                return Some(Cmd::msg(Msg::status("bye")));
            }
            None
        }

        fn render(&self) -> Text<'static> {
            Text::from(self.body)
        }

        fn wants_footer(&self) -> bool {
            self.footer
        }

        fn help_text(&self) -> String {
            self.help.to_string()
        }

        fn type_tag(&self) -> &str {
            self.tag
        }
    }

    fn log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    fn container() -> Container {
        Container::new(
            Application::new("demo"),
            RenderState::without_size(Arc::new(Theme::default())),
        )
    }

    /// Started and sized 80x40
    fn ready_container(term: &mut FakeTerm) -> Container {
        let mut c = container();
        c.init(term);
        c.update(Msg::Resize { width: 80, height: 40 }, term);
        assert!(c.is_ready());
        c
    }

    fn key(code: KeyCode) -> Msg {
        Msg::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Msg {
        Msg::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn has_quit(cmd: Option<Cmd>) -> bool {
        cmd.map(|c| c.flatten().iter().any(|c| matches!(c, Cmd::Quit)))
            .unwrap_or(false)
    }

    fn tags(c: &Container) -> (Option<String>, Option<String>, Option<String>) {
        let t = c.view_tags();
        (t.current, t.previous, t.next)
    }

    fn s(tag: &str) -> Option<String> {
        Some(tag.to_string())
    }

    fn plain(text: &Text<'_>) -> Vec<String> {
        text.lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    // ========================================================================
    // Readiness
    // ========================================================================

    #[test]
    fn test_set_view_before_start_only_queues() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = container();

        c.set_view(Recorder::new("a", &log).boxed(), &mut term);

        assert_eq!(tags(&c), (None, None, s("a")));
        assert!(entries(&log).is_empty());
        assert_eq!(c.render(), Text::default());
    }

    #[test]
    fn test_readiness_gate() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = container();
        c.set_view(Recorder::new("a", &log).boxed(), &mut term);

        c.init(&mut term);
        assert!(!c.is_ready());
        assert_eq!(tags(&c), (s("loading"), None, s("a")));
        assert_eq!(term.title.as_deref(), Some("demo"));
        assert!(entries(&log).is_empty());

        // a zero-height geometry is not a usable one
        c.update(Msg::Resize { width: 80, height: 0 }, &mut term);
        assert!(!c.is_ready());
        assert_eq!(tags(&c), (s("loading"), None, s("a")));

        c.update(Msg::Resize { width: 80, height: 40 }, &mut term);
        assert!(c.is_ready());
        assert_eq!(tags(&c), (s("a"), None, None));
        assert_eq!(entries(&log), vec!["a:init", "a:render"]);
    }

    #[test]
    fn test_initial_size_promotes_on_init() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = Container::new(
            Application::new("demo"),
            RenderState::new(80, 40, Arc::new(Theme::default())),
        );
        c.set_next_view(Recorder::new("a", &log).boxed());

        c.init(&mut term);

        assert!(c.is_ready());
        assert_eq!(tags(&c), (s("a"), None, None));
        assert_eq!(entries(&log), vec!["a:init", "a:render"]);
    }

    #[test]
    fn test_only_loading_renders_before_ready() {
        let mut term = FakeTerm::default();
        let mut c = container();
        c.init(&mut term);

        let lines = plain(&c.render());
        assert!(lines[0].starts_with("<!-- demo"));
        assert!(lines.iter().any(|l| l.contains("loading...")));
    }

    // ========================================================================
    // History
    // ========================================================================

    #[test]
    fn test_history_invariant() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);

        // loading -> a: loading is never remembered
        c.set_view(Recorder::new("a", &log).boxed(), &mut term);
        assert_eq!(tags(&c), (s("a"), None, None));

        // a -> b
        c.set_view(Recorder::new("b", &log).boxed(), &mut term);
        assert_eq!(tags(&c), (s("b"), s("a"), None));

        // same tag: b is replaced, history untouched
        c.set_view(Recorder::new("b", &log).boxed(), &mut term);
        assert_eq!(tags(&c), (s("b"), s("a"), None));

        // b -> form
        c.set_view(Recorder::new(FORM_TAG, &log).boxed(), &mut term);
        assert_eq!(tags(&c), (s("form"), s("b"), None));

        // form -> c: forms are never remembered
        c.set_view(Recorder::new("c", &log).boxed(), &mut term);
        assert_eq!(tags(&c), (s("c"), s("b"), None));
    }

    #[test]
    fn test_back_then_quit() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.set_view(Recorder::new("a", &log).boxed(), &mut term);
        c.set_view(Recorder::new("b", &log).boxed(), &mut term);
        log.lock().unwrap().clear();

        let cmd = c.update(key(KeyCode::Esc), &mut term);
        assert!(!has_quit(cmd));
        assert_eq!(tags(&c), (s("a"), None, None));
        // restored, not re-initialised
        assert_eq!(entries(&log), vec!["a:render"]);

        let cmd = c.update(key(KeyCode::Backspace), &mut term);
        assert!(has_quit(cmd));
        assert_eq!(entries(&log), vec!["a:render", "a:quit"]);
    }

    #[test]
    fn test_quit_keys_notify_view() {
        for msg in [key(KeyCode::Char('q')), ctrl('c'), Msg::Quit] {
            let log = log();
            let mut term = FakeTerm::default();
            let mut c = ready_container(&mut term);
            c.set_view(Recorder::new("a", &log).boxed(), &mut term);

            assert!(has_quit(c.update(msg, &mut term)));
            assert_eq!(entries(&log).last().map(String::as_str), Some("a:quit"));
        }
    }

    #[test]
    fn test_quit_keeps_view_command() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.set_view(Recorder::new("a", &log).with_farewell().boxed(), &mut term);

        let cmds = c.update(Msg::Quit, &mut term).map(Cmd::flatten).unwrap_or_default();

        assert_eq!(cmds.len(), 2);
        assert!(matches!(cmds[0], Cmd::Task(_)));
        assert!(matches!(cmds[1], Cmd::Quit));
    }

    // ========================================================================
    // Promotion and replacement
    // ========================================================================

    #[test]
    fn test_tick_promotes_next_over_loading() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.update(Msg::SetNextView(Recorder::new("a", &log).boxed()), &mut term);
        assert_eq!(tags(&c), (s("loading"), None, s("a")));

        let cmd = c.update(Msg::Tick(Instant::now()), &mut term);
        assert!(cmd.is_some(), "tick must be re-armed");
        assert_eq!(tags(&c), (s("a"), None, None));
    }

    #[test]
    fn test_tick_does_not_promote_over_other_views() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.set_view(Recorder::new("a", &log).boxed(), &mut term);
        c.set_next_view(Recorder::new("b", &log).boxed());

        c.update(Msg::Tick(Instant::now()), &mut term);
        assert_eq!(tags(&c), (s("a"), None, s("b")));
    }

    #[test]
    fn test_no_double_loading() {
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);

        c.update(Msg::ReplaceView, &mut term);
        c.update(Msg::ReplaceView, &mut term);

        assert_eq!(tags(&c), (s("loading"), None, None));
    }

    #[test]
    fn test_repeated_loading_keeps_previous() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.set_view(Recorder::new("a", &log).boxed(), &mut term);

        c.set_view(Recorder::new(LOADING_TAG, &log).boxed(), &mut term);
        c.set_view(Recorder::new(LOADING_TAG, &log).boxed(), &mut term);

        assert_eq!(tags(&c), (s("loading"), s("a"), None));
    }

    #[test]
    fn test_replace_prefers_next_then_previous() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.set_view(Recorder::new("a", &log).boxed(), &mut term);
        c.set_view(Recorder::new("b", &log).boxed(), &mut term);
        c.set_next_view(Recorder::new("n", &log).boxed());

        c.update(Msg::ReplaceView, &mut term);
        assert_eq!(tags(&c), (s("n"), s("b"), None));

        c.update(Msg::ReplaceView, &mut term);
        assert_eq!(tags(&c), (s("b"), s("n"), None));
    }

    #[test]
    fn test_replace_from_lone_form_quits() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.set_view(Recorder::new(FORM_TAG, &log).boxed(), &mut term);

        assert!(has_quit(c.update(Msg::ReplaceView, &mut term)));
    }

    // ========================================================================
    // Keys
    // ========================================================================

    #[test]
    fn test_form_receives_every_key() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.set_view(Recorder::new("a", &log).boxed(), &mut term);
        c.set_view(Recorder::new(FORM_TAG, &log).boxed(), &mut term);
        log.lock().unwrap().clear();

        for msg in [key(KeyCode::Char('q')), key(KeyCode::Esc), key(KeyCode::Char('h')), ctrl('c')] {
            assert!(!has_quit(c.update(msg, &mut term)));
        }
        assert_eq!(tags(&c), (s("form"), s("a"), None));
        assert_eq!(
            entries(&log),
            vec!["form:key q", "form:key esc", "form:key h", "form:key ctrl+c"]
        );
    }

    #[test]
    fn test_help_toggle_only_with_footer() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);

        c.set_view(Recorder::new("plain", &log).boxed(), &mut term);
        c.update(key(KeyCode::Char('h')), &mut term);
        assert!(!c.show_help());
        assert_eq!(entries(&log).last().map(String::as_str), Some("plain:key h"));

        c.set_view(Recorder::new("list", &log).with_footer("enter: select").boxed(), &mut term);
        log.lock().unwrap().clear();
        c.update(key(KeyCode::Char('h')), &mut term);
        assert!(c.show_help());
        assert!(entries(&log).is_empty(), "toggle key is consumed");
        c.update(key(KeyCode::Char('h')), &mut term);
        assert!(!c.show_help());
    }

    #[test]
    fn test_resize_forwards_content_size_to_forms() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.set_view(Recorder::new(FORM_TAG, &log).boxed(), &mut term);
        log.lock().unwrap().clear();

        c.update(Msg::Resize { width: 100, height: 30 }, &mut term);

        assert_eq!(entries(&log), vec!["form:content 100x25"]);
        assert_eq!(c.render_state().content_height, 25);
    }

    // ========================================================================
    // Errors and terminal handoff
    // ========================================================================

    #[test]
    fn test_resume_before_switching() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        term.suspended = true;

        c.set_view(Recorder::new("a", &log).boxed(), &mut term);

        assert!(!term.suspended);
        assert_eq!(tags(&c), (s("a"), None, None));
    }

    #[test]
    fn test_resume_failure_shows_error_view() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.set_view(Recorder::new("a", &log).boxed(), &mut term);
        term.suspended = true;
        term.fail_resume = true;

        let cmd = c.set_view(Recorder::new("b", &log).boxed(), &mut term);

        assert!(!has_quit(cmd));
        assert_eq!(tags(&c), (s("error"), s("a"), None));
        let lines = plain(&c.render());
        assert!(lines.iter().any(|l| l == "unable to resume program"));
    }

    #[test]
    fn test_error_message_is_quittable() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.set_view(Recorder::new("a", &log).boxed(), &mut term);

        assert!(!has_quit(c.update(Msg::error(anyhow::anyhow!("boom")), &mut term)));
        assert_eq!(tags(&c), (s("error"), s("a"), None));
        assert!(!has_quit(c.update(Msg::Tick(Instant::now()), &mut term)));
        assert!(has_quit(c.update(key(KeyCode::Char('q')), &mut term)));
    }

    #[test]
    fn test_fail_forces_error_view() {
        let mut term = FakeTerm::default();
        let mut c = container();
        c.init(&mut term);

        c.fail(&ProgramError::Closed);
        assert_eq!(tags(&c).0, s("error"));
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    #[test]
    fn test_render_is_idempotent() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.set_view(Recorder::new("a", &log).with_footer("x").boxed(), &mut term);

        assert_eq!(c.render(), c.render());
    }

    #[test]
    fn test_frame_bypasses_chrome() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.set_view(Recorder::new(FRAME_TAG, &log).boxed(), &mut term);

        assert_eq!(c.render(), Text::from("body"));
    }

    #[test]
    fn test_layout_header_body_footer() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.set_view(Recorder::new("a", &log).with_footer("").boxed(), &mut term);

        let lines = plain(&c.render());
        assert_eq!(lines.len(), 3 + 1 + 2);
        assert!(lines[1].contains(" demo "));
        assert_eq!(lines[3], "body");
        assert_eq!(lines[4], "─".repeat(80));
        assert_eq!(lines[5], "[ q: quit ] [ ↑/↓: navigate ]");
    }

    #[test]
    fn test_loading_and_form_have_no_footer() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        assert_eq!(plain(&c.render()).len(), 3 + 5);

        c.set_view(Recorder::new(FORM_TAG, &log).boxed(), &mut term);
        assert_eq!(plain(&c.render()).len(), 3 + 1);
    }

    fn footer(c: &Container) -> String {
        plain(&c.render()).last().cloned().unwrap_or_default()
    }

    #[test]
    fn test_footer_notice_only_without_legend() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.set_view(Recorder::new("a", &log).boxed(), &mut term);
        c.update(Msg::notice("saved", NoticeLevel::Success), &mut term);

        assert_eq!(footer(&c), "saved");
    }

    #[test]
    fn test_footer_compositions() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.set_view(Recorder::new("a", &log).with_footer("").boxed(), &mut term);

        c.update(Msg::notice("synced", NoticeLevel::Info), &mut term);
        assert_eq!(footer(&c), "[ q: quit ] [ ↑/↓: navigate ] ● synced");

        c.set_view(Recorder::new("b", &log).with_footer("enter: open").boxed(), &mut term);
        assert_eq!(footer(&c), "[ q: quit ] [ h: show help ] ● enter: open ● synced");

        c.update(Msg::notice("", NoticeLevel::Info), &mut term);
        assert_eq!(footer(&c), "[ q: quit ] [ h: show help ]");

        c.update(key(KeyCode::Char('h')), &mut term);
        assert_eq!(
            footer(&c),
            "[ q: quit ] [ h: hide help ] [ ↑/↓: navigate ] [ esc: back ] ● enter: open"
        );
    }

    #[test]
    fn test_set_state_shows_in_header() {
        let mut term = FakeTerm::default();
        let mut c = ready_container(&mut term);
        c.update(Msg::state("workspace", "dev"), &mut term);

        let lines = plain(&c.render());
        assert!(lines[1].contains(" workspace: dev "));
    }

    #[test]
    fn test_snapshot_published() {
        let log = log();
        let mut term = FakeTerm::default();
        let mut c = container();
        let rx = c.subscribe();
        c.init(&mut term);
        c.update(Msg::Resize { width: 80, height: 40 }, &mut term);
        c.update(Msg::SetView(Recorder::new("a", &log).boxed()), &mut term);

        let snapshot = rx.borrow().clone();
        assert!(snapshot.ready);
        assert_eq!(snapshot.current, s("a"));
        assert_eq!(snapshot.render_state.width, 80);
    }
}
