//! Error Types
//!
//! - [`ProgramError`]: the event loop and its terminal
//! - [`ShellError`]: building and driving a session through [`Shell`](crate::Shell)
//!
//! Configuration errors live next to the loader in [`crate::config`].

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the event loop wrapper
#[derive(Debug, Error)]
pub enum ProgramError {
    /// `start` was called on a running or finished program
    #[error("program already started")]
    AlreadyStarted,

    /// The operation needs a running loop
    #[error("program not started")]
    NotStarted,

    /// `start` was called outside a tokio runtime
    #[error("no tokio runtime to run the event loop on")]
    NoRuntime,

    /// The loop has ended and no longer accepts messages
    #[error("program channel closed")]
    Closed,

    /// Raw mode, alternate screen, drawing or input failed
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    /// The loop task panicked or was aborted
    #[error("event loop task failed: {0}")]
    Task(String),
}

/// Errors raised by the public shell facade
#[derive(Debug, Error)]
pub enum ShellError {
    /// The builder was finished without an application descriptor
    #[error("no application descriptor provided")]
    MissingApplication,

    /// No usable geometry arrived in time
    #[error("terminal size not received within {0:?}")]
    ReadyTimeout(Duration),

    #[error(transparent)]
    Program(#[from] ProgramError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
