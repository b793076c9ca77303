//! Event Loop Wrapper
//!
//! [`Program`] owns the terminal surface and runs the single render/update
//! loop of a session on its own tokio task.
//!
//! # Architecture
//!
//! ```text
//!   input stream ──┐
//!   Cmd tasks ─────┤            ┌─────────────┐        ┌─────────┐
//!   timers ────────┼──► queue ──► Model::update ├──draw──► Surface │
//!   ProgramHandle ─┘            └─────────────┘        └─────────┘
//!                        ▲
//!                cancel (watch)
//! ```
//!
//! Exactly one message is handled at a time. Follow-up [`Cmd`]s are spawned
//! and report back through the same queue. While suspended the loop neither
//! polls input nor draws; queued messages are still processed.

use std::io;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use ratatui::text::Text;
use ratatui::widgets::Paragraph;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::command::Cmd;
use crate::error::ProgramError;
use crate::messages::Msg;
use crate::surface::Surface;

// ============================================================================
// Model / terminal seams
// ============================================================================

/// Terminal operations available to a model while it handles a message
pub trait TerminalControl {
    fn is_suspended(&self) -> bool;

    /// Hand the terminal back to the shell
    fn suspend(&mut self) -> Result<(), ProgramError>;

    /// Take the terminal again; a no-op when not suspended
    fn resume(&mut self) -> Result<(), ProgramError>;

    fn set_title(&mut self, title: &str) -> Result<(), ProgramError>;
}

/// The state machine driven by the loop
pub trait Model: Send + 'static {
    fn init(&mut self, term: &mut dyn TerminalControl) -> Option<Cmd>;

    fn update(&mut self, msg: Msg, term: &mut dyn TerminalControl) -> Option<Cmd>;

    fn view(&self) -> Text<'static>;

    /// Called once with a loop-fatal error, before the final draw attempt
    fn fail(&mut self, _err: &ProgramError) {}
}

/// Where key and resize events come from
pub enum InputSource {
    /// The real terminal, via crossterm's `EventStream`
    Terminal,
    /// Scripted events
    Channel(mpsc::UnboundedReceiver<Event>),
    /// No input at all (geometry comes from the surface only)
    Disabled,
}

impl InputSource {
    /// A scripted source and the sender that feeds it
    pub fn channel() -> (mpsc::UnboundedSender<Event>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::Channel(rx))
    }

    fn into_stream(self) -> BoxStream<'static, io::Result<Event>> {
        match self {
            Self::Terminal => EventStream::new().boxed(),
            Self::Channel(rx) => UnboundedReceiverStream::new(rx).map(Ok).boxed(),
            Self::Disabled => stream::pending().boxed(),
        }
    }
}

/// What a finished loop hands back
pub struct Exit<M, S> {
    pub model: M,
    pub surface: S,
    /// The last text drawn
    pub last_frame: Text<'static>,
}

enum Envelope {
    Msg(Msg),
    Suspend,
    Resume,
}

// ============================================================================
// Handle
// ============================================================================

/// Cloneable sender side of a program
#[derive(Clone)]
pub struct ProgramHandle {
    tx: mpsc::UnboundedSender<Envelope>,
    cancel: Arc<watch::Sender<bool>>,
    /// Runtime the loop was started on; set once by `start`
    runtime: Arc<OnceLock<Handle>>,
}

impl ProgramHandle {
    /// Inject a message, optionally after `delay` on an independent timer
    ///
    /// # Errors
    ///
    /// `NotStarted` before `start`, `Closed` once the loop has ended.
    pub fn send(&self, msg: Msg, delay: Duration) -> Result<(), ProgramError> {
        let runtime = self.runtime.get().ok_or(ProgramError::NotStarted)?;
        if delay.is_zero() {
            return self.tx.send(Envelope::Msg(msg)).map_err(|_| ProgramError::Closed);
        }
        if self.tx.is_closed() {
            return Err(ProgramError::Closed);
        }
        let tx = self.tx.clone();
        // spawned through the stored handle so callers off the runtime can send too
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Envelope::Msg(msg));
        });
        Ok(())
    }

    pub fn suspend(&self) -> Result<(), ProgramError> {
        self.ensure_started()?;
        self.tx.send(Envelope::Suspend).map_err(|_| ProgramError::Closed)
    }

    pub fn resume(&self) -> Result<(), ProgramError> {
        self.ensure_started()?;
        self.tx.send(Envelope::Resume).map_err(|_| ProgramError::Closed)
    }

    /// Fire the root cancellation signal
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_started(&self) -> bool {
        self.runtime.get().is_some()
    }

    fn ensure_started(&self) -> Result<(), ProgramError> {
        if self.is_started() {
            Ok(())
        } else {
            Err(ProgramError::NotStarted)
        }
    }
}

// ============================================================================
// Program
// ============================================================================

enum Stage<M, S> {
    Idle {
        model: M,
        surface: S,
        input: InputSource,
        rx: mpsc::UnboundedReceiver<Envelope>,
    },
    Running(JoinHandle<Result<Exit<M, S>, ProgramError>>),
    /// Ended, outcome not yet collected
    Done(Result<Exit<M, S>, ProgramError>),
    Finished,
}

/// Owner of one session's loop
pub struct Program<M: Model, S: Surface> {
    stage: Stage<M, S>,
    handle: ProgramHandle,
}

impl<M: Model, S: Surface> Program<M, S> {
    pub fn new(model: M, surface: S, input: InputSource) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (cancel, _) = watch::channel(false);
        Self {
            stage: Stage::Idle {
                model,
                surface,
                input,
                rx,
            },
            handle: ProgramHandle {
                tx,
                cancel: Arc::new(cancel),
                runtime: Arc::new(OnceLock::new()),
            },
        }
    }

    pub fn handle(&self) -> ProgramHandle {
        self.handle.clone()
    }

    /// The model, while the loop has not been started
    pub fn model(&self) -> Option<&M> {
        match &self.stage {
            Stage::Idle { model, .. } => Some(model),
            _ => None,
        }
    }

    /// Mutable access to the model, while the loop has not been started
    pub fn model_mut(&mut self) -> Option<&mut M> {
        match &mut self.stage {
            Stage::Idle { model, .. } => Some(model),
            _ => None,
        }
    }

    pub fn is_started(&self) -> bool {
        self.handle.is_started()
    }

    /// Spawn the loop on the current tokio runtime
    ///
    /// # Errors
    ///
    /// `AlreadyStarted` on every call after the first, `NoRuntime` when
    /// called outside a tokio runtime.
    pub fn start(&mut self) -> Result<(), ProgramError> {
        if !matches!(self.stage, Stage::Idle { .. }) {
            return Err(ProgramError::AlreadyStarted);
        }
        let runtime = Handle::try_current().map_err(|_| ProgramError::NoRuntime)?;
        let Stage::Idle {
            model,
            surface,
            input,
            rx,
        } = std::mem::replace(&mut self.stage, Stage::Finished)
        else {
            return Err(ProgramError::AlreadyStarted);
        };

        let event_loop = EventLoop {
            model,
            surface,
            rx,
            tx: self.handle.tx.clone(),
            cancel: self.handle.cancel.subscribe(),
            suspended: false,
            last_frame: Text::default(),
        };
        self.stage = Stage::Running(runtime.spawn(event_loop.run(input)));
        let _ = self.handle.runtime.set(runtime);
        tracing::debug!("event loop started");
        Ok(())
    }

    pub fn send(&self, msg: Msg, delay: Duration) -> Result<(), ProgramError> {
        self.handle.send(msg, delay)
    }

    pub fn suspend(&self) -> Result<(), ProgramError> {
        self.handle.suspend()
    }

    pub fn resume(&self) -> Result<(), ProgramError> {
        self.handle.resume()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// Wait for the loop to end and take back the model and surface
    ///
    /// # Errors
    ///
    /// `NotStarted` if the loop was never started, otherwise whatever ended
    /// the loop.
    pub async fn wait(mut self) -> Result<Exit<M, S>, ProgramError> {
        match std::mem::replace(&mut self.stage, Stage::Finished) {
            Stage::Running(join) => flatten_join(join.await),
            Stage::Done(outcome) => outcome,
            Stage::Idle { .. } => Err(ProgramError::NotStarted),
            Stage::Finished => Err(ProgramError::Closed),
        }
    }

    /// Resolve once the loop has ended, keeping its outcome for [`Program::wait`].
    /// Returns immediately when the loop is not running.
    pub async fn stopped(&mut self) {
        if let Stage::Running(join) = &mut self.stage {
            let outcome = flatten_join(join.await);
            self.stage = Stage::Done(outcome);
        }
    }

    /// Take the error the loop ended with, if it has ended with one
    pub fn take_failure(&mut self) -> Option<ProgramError> {
        match std::mem::replace(&mut self.stage, Stage::Finished) {
            Stage::Done(Err(err)) => Some(err),
            other => {
                self.stage = other;
                None
            }
        }
    }
}

fn flatten_join<T>(
    joined: Result<Result<T, ProgramError>, tokio::task::JoinError>,
) -> Result<T, ProgramError> {
    joined.map_err(|e| ProgramError::Task(e.to_string()))?
}

impl<M: Model, S: Surface> Drop for Program<M, S> {
    fn drop(&mut self) {
        if matches!(self.stage, Stage::Running(_)) {
            self.handle.cancel();
        }
    }
}

// ============================================================================
// Loop
// ============================================================================

struct EventLoop<M, S> {
    model: M,
    surface: S,
    rx: mpsc::UnboundedReceiver<Envelope>,
    tx: mpsc::UnboundedSender<Envelope>,
    cancel: watch::Receiver<bool>,
    suspended: bool,
    last_frame: Text<'static>,
}

enum Step {
    Msg(Msg),
    Suspend,
    Resume,
    Stop,
    Fatal(ProgramError),
}

/// `TerminalControl` over the loop's surface
struct Controls<'a, S> {
    surface: &'a mut S,
    suspended: &'a mut bool,
}

impl<S: Surface> TerminalControl for Controls<'_, S> {
    fn is_suspended(&self) -> bool {
        *self.suspended
    }

    fn suspend(&mut self) -> Result<(), ProgramError> {
        if self.is_suspended() {
            return Ok(());
        }
        self.surface.release()?;
        *self.suspended = true;
        tracing::debug!("terminal suspended");
        Ok(())
    }

    fn resume(&mut self) -> Result<(), ProgramError> {
        if !self.is_suspended() {
            return Ok(());
        }
        self.surface.acquire()?;
        self.surface.terminal().clear()?;
        *self.suspended = false;
        tracing::debug!("terminal resumed");
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> Result<(), ProgramError> {
        Ok(self.surface.set_title(title)?)
    }
}

impl<M: Model, S: Surface> EventLoop<M, S> {
    async fn run(mut self, input: InputSource) -> Result<Exit<M, S>, ProgramError> {
        let result = self.drive(input).await;

        if let Err(e) = self.surface.release() {
            tracing::warn!("Failed to restore terminal: {}", e);
        }

        match result {
            Ok(()) => {
                tracing::debug!("event loop finished");
                Ok(Exit {
                    model: self.model,
                    surface: self.surface,
                    last_frame: self.last_frame,
                })
            }
            Err(err) => Err(err),
        }
    }

    async fn drive(&mut self, input: InputSource) -> Result<(), ProgramError> {
        if let Err(e) = self.surface.acquire() {
            return Err(self.fail(e.into()));
        }
        let size = match self.surface.terminal().size() {
            Ok(size) => size,
            Err(e) => return Err(self.fail(e.into())),
        };

        let cmd = self.model.init(&mut Controls {
            surface: &mut self.surface,
            suspended: &mut self.suspended,
        });
        if self.dispatch(cmd) {
            return self.finish();
        }
        if self.handle(Msg::Resize {
            width: size.width,
            height: size.height,
        }) {
            return self.finish();
        }
        self.draw_or_fail()?;

        let mut events = input.into_stream();
        let mut input_open = true;

        loop {
            let polling = input_open && !self.suspended;

            let step = tokio::select! {
                biased;

                changed = self.cancel.changed() => {
                    if changed.is_err() || *self.cancel.borrow() {
                        Step::Stop
                    } else {
                        continue;
                    }
                }

                maybe_event = events.next(), if polling => match maybe_event {
                    // Only handle Press events (not Release or Repeat)
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        Step::Msg(Msg::Key(key))
                    }
                    Some(Ok(Event::Resize(width, height))) => {
                        Step::Msg(Msg::Resize { width, height })
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => Step::Fatal(e.into()),
                    None => {
                        tracing::debug!("input stream ended");
                        input_open = false;
                        continue;
                    }
                },

                envelope = self.rx.recv() => match envelope {
                    Some(Envelope::Msg(msg)) => Step::Msg(msg),
                    Some(Envelope::Suspend) => Step::Suspend,
                    Some(Envelope::Resume) => Step::Resume,
                    None => Step::Stop,
                },
            };

            let quit = match step {
                Step::Msg(msg) => self.handle(msg),
                Step::Suspend => self.handoff(true),
                Step::Resume => self.handoff(false),
                Step::Stop => {
                    tracing::debug!("event loop cancelled");
                    return Ok(());
                }
                Step::Fatal(err) => return Err(self.fail(err)),
            };

            if quit {
                return self.finish();
            }
            self.draw_or_fail()?;
        }
    }

    /// Feed one message to the model; true when it asked to quit
    fn handle(&mut self, msg: Msg) -> bool {
        let cmd = self.model.update(
            msg,
            &mut Controls {
                surface: &mut self.surface,
                suspended: &mut self.suspended,
            },
        );
        self.dispatch(cmd)
    }

    /// Suspend or resume on request from outside the loop. A failed handoff
    /// is reported to the model as an error message.
    fn handoff(&mut self, suspend: bool) -> bool {
        let mut term = Controls {
            surface: &mut self.surface,
            suspended: &mut self.suspended,
        };
        let result = if suspend { term.suspend() } else { term.resume() };
        match result {
            Ok(()) => false,
            Err(e) => {
                tracing::warn!("terminal handoff failed: {}", e);
                self.handle(Msg::error(e))
            }
        }
    }

    /// Spawn follow-up tasks; true when a `Quit` was among them
    fn dispatch(&self, cmd: Option<Cmd>) -> bool {
        let Some(cmd) = cmd else {
            return false;
        };
        let mut quit = false;
        for cmd in cmd.flatten() {
            match cmd {
                Cmd::Task(fut) => {
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        if let Some(msg) = fut.await {
                            let _ = tx.send(Envelope::Msg(msg));
                        }
                    });
                }
                Cmd::Quit => quit = true,
                Cmd::Batch(_) => {}
            }
        }
        quit
    }

    fn draw(&mut self) -> Result<(), ProgramError> {
        if self.suspended {
            return Ok(());
        }
        let text = self.model.view();
        let frame_text = text.clone();
        self.surface
            .terminal()
            .draw(|frame| frame.render_widget(Paragraph::new(frame_text), frame.area()))?;
        self.last_frame = text;
        Ok(())
    }

    fn draw_or_fail(&mut self) -> Result<(), ProgramError> {
        match self.draw() {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Final draw after a quit
    fn finish(&mut self) -> Result<(), ProgramError> {
        self.draw_or_fail()
    }

    /// Let the model show the error, try one last draw, hand the error back
    fn fail(&mut self, err: ProgramError) -> ProgramError {
        tracing::error!("event loop failed: {}", err);
        self.model.fail(&err);
        if let Err(e) = self.draw() {
            tracing::warn!("final draw failed: {}", e);
        }
        err
    }
}
