//! Stagehand - view-lifecycle orchestration for terminal applications
//!
//! Hosts a full-screen terminal session and decides which view is visible,
//! how control passes between views, and what chrome surrounds them.
//!
//! # Architecture
//!
//! - **Shell**: public facade; builds the session and forwards calls
//! - **Program**: async event loop owning the terminal surface
//! - **Container**: the model; view triple, history and key routing
//! - **View**: the contract every screen implements
//! - **Views**: loading, error, frame, document, collection, entity, table and form
//! - **Theme**: palettes and header/footer chrome
//!
//! ## Message Flow
//!
//! ```text
//! Terminal Events ─┐
//!                  ├─> Msg queue -> Container::update -> View::update -> Cmd
//! Shell calls ─────┘                                                    │
//!        ▲                                                              │
//!        └──────────────── spawned tasks deliver follow-up Msg ◄────────┘
//! ```

pub mod application;
pub mod command;
pub mod config;
pub mod container;
pub mod error;
pub mod messages;
pub mod program;
pub mod render_state;
pub mod shell;
pub mod surface;
pub mod theme;
pub mod view;
pub mod views;

pub use application::Application;
pub use command::Cmd;
pub use config::{load_config, load_config_from_path, ConfigOverrides, ShellConfig};
pub use container::{Container, Snapshot, ViewTags};
pub use error::{ProgramError, ShellError};
pub use messages::Msg;
pub use program::{Exit, InputSource, Program, ProgramHandle};
pub use render_state::RenderState;
pub use shell::{Finalizer, Shell, ShellBuilder, ShellExit};
pub use surface::{install_panic_hook, CrosstermSurface, HeadlessSurface, Surface};
pub use theme::{NoticeLevel, Theme};
pub use view::{BoxedView, View};
