//! Follow-up Commands
//!
//! A [`Cmd`] is work a view or the container asks the loop to run after the
//! current message has been handled. Tasks are spawned on the runtime and
//! report back by sending their resulting message into the session queue;
//! they never touch container state directly.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::messages::Msg;

/// Deferred work returned from `init`/`update`
pub enum Cmd {
    /// A future whose output (if any) is fed back into the queue
    Task(BoxFuture<'static, Option<Msg>>),
    /// Several commands, run independently
    Batch(Vec<Cmd>),
    /// End the session after the current message
    Quit,
}

impl Cmd {
    /// Wrap a future producing an optional message
    pub fn new<F>(fut: F) -> Self
    where
        F: Future<Output = Option<Msg>> + Send + 'static,
    {
        Cmd::Task(fut.boxed())
    }

    /// Deliver a message on the next turn of the loop
    pub fn msg(msg: Msg) -> Self {
        Cmd::Task(futures::future::ready(Some(msg)).boxed())
    }

    /// Deliver a message once `delay` has elapsed (non-blocking timer)
    pub fn after(delay: Duration, msg: Msg) -> Self {
        Cmd::new(async move {
            tokio::time::sleep(delay).await;
            Some(msg)
        })
    }

    /// One `Tick` after `interval`
    pub fn tick(interval: Duration) -> Self {
        Cmd::new(async move {
            tokio::time::sleep(interval).await;
            Some(Msg::Tick(Instant::now()))
        })
    }

    /// Combine optional commands, dropping the empty ones
    pub fn batch(cmds: impl IntoIterator<Item = Option<Cmd>>) -> Option<Cmd> {
        let mut cmds: Vec<Cmd> = cmds.into_iter().flatten().collect();
        match cmds.len() {
            0 => None,
            1 => cmds.pop(),
            _ => Some(Cmd::Batch(cmds)),
        }
    }

    /// Flatten nested batches into a list of leaf commands
    pub fn flatten(self) -> Vec<Cmd> {
        match self {
            Cmd::Batch(cmds) => cmds.into_iter().flat_map(Cmd::flatten).collect(),
            other => vec![other],
        }
    }
}

impl fmt::Debug for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cmd::Task(_) => write!(f, "Task(..)"),
            Cmd::Batch(cmds) => f.debug_tuple("Batch").field(cmds).finish(),
            Cmd::Quit => write!(f, "Quit"),
        }
    }
}
