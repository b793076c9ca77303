//! Public Facade
//!
//! [`ShellBuilder`] wires an [`Application`] descriptor, a theme and a
//! terminal surface into a [`Shell`]: a [`Container`] driven by a
//! [`Program`].
//!
//! Before `start` the shell talks to the container directly; afterwards
//! every call becomes a message on the session queue, and read-only queries
//! are answered from the snapshot the container publishes after each step.

use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::application::Application;
use crate::config::{ShellConfig, DEFAULT_READY_TIMEOUT, DEFAULT_TICK_INTERVAL};
use crate::container::{Container, Snapshot, ViewTags};
use crate::error::{ProgramError, ShellError};
use crate::messages::Msg;
use crate::program::{Exit, InputSource, Program, ProgramHandle};
use crate::render_state::RenderState;
use crate::surface::{CrosstermSurface, Surface};
use crate::theme::{NoticeLevel, Theme};
use crate::view::BoxedView;

/// What a finished session hands back
pub type ShellExit<S> = Exit<Container, S>;

/// Cleanup run after the terminal has been restored
pub type Finalizer = Box<dyn FnOnce() + Send>;

// ============================================================================
// Builder
// ============================================================================

pub struct ShellBuilder {
    application: Option<Application>,
    initial_size: Option<(u16, u16)>,
    input: Option<InputSource>,
    theme: Option<Theme>,
    tick_interval: Duration,
    ready_timeout: Duration,
    alt_screen: bool,
}

impl Default for ShellBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellBuilder {
    pub fn new() -> Self {
        Self {
            application: None,
            initial_size: None,
            input: None,
            theme: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
            ready_timeout: DEFAULT_READY_TIMEOUT,
            alt_screen: true,
        }
    }

    /// Start from a resolved configuration
    ///
    /// # Errors
    ///
    /// Returns a config error when the configured theme is unknown.
    pub fn from_config(config: &ShellConfig) -> Result<Self, ShellError> {
        let theme = config.resolve_theme()?;
        Ok(Self::new()
            .application(
                Application::new(config.app_name.clone())
                    .with_loading_message(config.loading_message.clone()),
            )
            .theme(theme)
            .tick_interval(config.tick_interval)
            .ready_timeout(config.ready_timeout)
            .alt_screen(config.alt_screen))
    }

    #[must_use]
    pub fn application(mut self, application: Application) -> Self {
        self.application = Some(application);
        self
    }

    /// Geometry to assume before the terminal reports its own
    #[must_use]
    pub fn initial_size(mut self, width: u16, height: u16) -> Self {
        self.initial_size = Some((width, height));
        self
    }

    #[must_use]
    pub fn input(mut self, input: InputSource) -> Self {
        self.input = Some(input);
        self
    }

    #[must_use]
    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    #[must_use]
    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    #[must_use]
    pub fn ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    #[must_use]
    pub fn alt_screen(mut self, enabled: bool) -> Self {
        self.alt_screen = enabled;
        self
    }

    /// Build a shell on the given surface
    ///
    /// # Errors
    ///
    /// `MissingApplication` when no descriptor was provided.
    pub fn build_with<S: Surface>(self, surface: S) -> Result<Shell<S>, ShellError> {
        let application = self.application.ok_or(ShellError::MissingApplication)?;
        let theme = Arc::new(self.theme.unwrap_or_default());
        let render = match self.initial_size {
            Some((width, height)) => RenderState::new(width, height, theme),
            None => RenderState::without_size(theme),
        };

        tracing::debug!(
            app = %application.name,
            theme = %render.theme.name,
            tick_ms = self.tick_interval.as_millis() as u64,
            "building shell"
        );

        let container = Container::new(application, render).with_tick_interval(self.tick_interval);
        let snapshots = container.subscribe();
        let input = self.input.unwrap_or(InputSource::Terminal);

        Ok(Shell {
            program: Program::new(container, surface, input),
            snapshots,
            ready_timeout: self.ready_timeout,
        })
    }

    /// Build a shell on stdout
    ///
    /// # Errors
    ///
    /// `MissingApplication`, or a terminal error if stdout cannot be used.
    pub fn build(self) -> Result<Shell<CrosstermSurface<Stdout>>, ShellError> {
        let surface = CrosstermSurface::stdout(self.alt_screen).map_err(ProgramError::from)?;
        self.build_with(surface)
    }
}

// ============================================================================
// Shell
// ============================================================================

/// One terminal session
pub struct Shell<S: Surface> {
    program: Program<Container, S>,
    snapshots: watch::Receiver<Snapshot>,
    ready_timeout: Duration,
}

impl<S: Surface> Shell<S> {
    pub fn builder() -> ShellBuilder {
        ShellBuilder::new()
    }

    /// Spawn the loop and wait until the session is ready
    ///
    /// # Errors
    ///
    /// `AlreadyStarted` on a second call, `ReadyTimeout` if no usable
    /// geometry arrives in time (the session is cancelled in that case), or
    /// the error that ended the loop before it became ready.
    pub async fn start(&mut self) -> Result<(), ShellError> {
        self.program.start()?;
        tracing::info!("shell started");

        let snapshots = &mut self.snapshots;
        let program = &mut self.program;
        let ready = tokio::time::timeout(self.ready_timeout, async move {
            let became_ready = tokio::select! {
                ready = snapshots.wait_for(|snapshot| snapshot.ready) => ready.is_ok(),
                () = program.stopped() => false,
            };
            if !became_ready {
                program.stopped().await;
            }
            became_ready
        })
        .await;

        match ready {
            Ok(true) => Ok(()),
            Ok(false) => {
                let err = self.program.take_failure().unwrap_or(ProgramError::Closed);
                tracing::warn!("session ended before it was ready: {}", err);
                Err(err.into())
            }
            Err(_) => {
                tracing::warn!("shell not ready after {:?}", self.ready_timeout);
                self.program.cancel();
                Err(ShellError::ReadyTimeout(self.ready_timeout))
            }
        }
    }

    /// Resolve once the session ends (quit, cancel or fatal error)
    ///
    /// # Errors
    ///
    /// Whatever ended the loop, or `NotStarted`.
    pub async fn wait_for_exit(self) -> Result<ShellExit<S>, ShellError> {
        Ok(self.program.wait().await?)
    }

    /// Quit the session, wait for the terminal to be restored, then run the
    /// finalizers in order
    ///
    /// # Errors
    ///
    /// Same as [`Shell::wait_for_exit`]. Finalizers run either way.
    pub async fn shutdown(self, finalizers: Vec<Finalizer>) -> Result<ShellExit<S>, ShellError> {
        let result = match self.program.send(Msg::Quit, Duration::ZERO) {
            Ok(()) => self.wait_for_exit().await,
            Err(err) => Err(err.into()),
        };
        for finalize in finalizers {
            finalize();
        }
        result
    }

    pub fn is_started(&self) -> bool {
        self.program.is_started()
    }

    pub fn is_ready(&self) -> bool {
        match self.program.model() {
            Some(container) => container.is_ready(),
            None => self.snapshots.borrow().ready,
        }
    }

    /// The container, until the loop is started
    pub fn container(&self) -> Option<&Container> {
        self.program.model()
    }

    /// Show a view (queued until the session is ready)
    ///
    /// # Errors
    ///
    /// `Closed` once the session has ended.
    pub fn set_view(&mut self, view: BoxedView) -> Result<(), ShellError> {
        match self.program.model_mut() {
            Some(container) => {
                container.set_next_view(view);
                Ok(())
            }
            None => Ok(self.program.send(Msg::SetView(view), Duration::ZERO)?),
        }
    }

    pub fn set_next_view(&mut self, view: BoxedView) -> Result<(), ShellError> {
        match self.program.model_mut() {
            Some(container) => {
                container.set_next_view(view);
                Ok(())
            }
            None => Ok(self.program.send(Msg::SetNextView(view), Duration::ZERO)?),
        }
    }

    pub fn set_notice(&mut self, text: &str, level: NoticeLevel) -> Result<(), ShellError> {
        match self.program.model_mut() {
            Some(container) => {
                container.set_notice(text, level);
                Ok(())
            }
            None => Ok(self.program.send(Msg::notice(text, level), Duration::ZERO)?),
        }
    }

    pub fn set_state(&mut self, key: &str, val: &str) -> Result<(), ShellError> {
        match self.program.model_mut() {
            Some(container) => {
                container.set_state(key, val);
                Ok(())
            }
            None => Ok(self.program.send(Msg::state(key, val), Duration::ZERO)?),
        }
    }

    /// Type tags of the current, previous and next views
    pub fn views(&self) -> ViewTags {
        match self.program.model() {
            Some(container) => container.view_tags(),
            None => ViewTags::from(&*self.snapshots.borrow()),
        }
    }

    pub fn render_state(&self) -> RenderState {
        match self.program.model() {
            Some(container) => container.render_state().clone(),
            None => self.snapshots.borrow().render_state.clone(),
        }
    }

    /// Inject a message, optionally after a delay
    ///
    /// # Errors
    ///
    /// `NotStarted` before `start`, `Closed` after the session ended.
    pub fn send(&self, msg: Msg, delay: Duration) -> Result<(), ShellError> {
        Ok(self.program.send(msg, delay)?)
    }

    /// Release the terminal to the outer shell
    pub fn suspend(&self) -> Result<(), ShellError> {
        Ok(self.program.suspend()?)
    }

    /// Take the terminal back; a no-op when not suspended
    pub fn resume(&self) -> Result<(), ShellError> {
        Ok(self.program.resume()?)
    }

    pub fn handle(&self) -> ProgramHandle {
        self.program.handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::HeadlessSurface;
    use crate::views::LoadingView;

    fn headless() -> HeadlessSurface {
        HeadlessSurface::new(80, 40).unwrap()
    }

    #[test]
    fn test_missing_application() {
        let result = ShellBuilder::new().build_with(headless());
        assert!(matches!(result, Err(ShellError::MissingApplication)));
    }

    #[test]
    fn test_from_config_rejects_unknown_theme() {
        let mut config = ShellConfig::default();
        config.theme = "neon".to_string();
        assert!(matches!(
            ShellBuilder::from_config(&config),
            Err(ShellError::Config(_))
        ));
    }

    #[test]
    fn test_calls_before_start_reach_container() {
        let mut shell = ShellBuilder::new()
            .application(Application::new("demo"))
            .initial_size(80, 40)
            .input(InputSource::Disabled)
            .build_with(headless())
            .unwrap();
        let theme = shell.render_state().theme.clone();

        shell
            .set_view(Box::new(LoadingView::new("x", theme)))
            .unwrap();
        shell.set_state("ws", "dev").unwrap();

        assert!(!shell.is_started());
        assert!(!shell.is_ready());
        assert_eq!(shell.views().next.as_deref(), Some("loading"));
        assert_eq!(shell.render_state().content_height, 35);
        assert_eq!(
            shell.container().map(|c| c.application().state_val.clone()),
            Some("dev".to_string())
        );
        assert!(matches!(
            shell.send(Msg::Quit, Duration::ZERO),
            Err(ShellError::Program(ProgramError::NotStarted))
        ));
    }
}
