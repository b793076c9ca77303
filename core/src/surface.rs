//! Terminal Surfaces
//!
//! A [`Surface`] is the terminal a session draws on. The event loop owns it
//! for the whole session and hands it off only through `release` (suspend)
//! and `acquire` (resume).
//!
//! - [`CrosstermSurface`]: a real terminal over any writer (usually stdout)
//! - [`HeadlessSurface`]: an in-memory buffer for tests and snapshots

use std::io::{self, Stdout, Write};
use std::panic;

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::backend::{Backend, CrosstermBackend, TestBackend};
use ratatui::buffer::Buffer;
use ratatui::Terminal;

/// A terminal the event loop can take and give back
pub trait Surface: Send + 'static {
    type Backend: Backend + Send;

    fn terminal(&mut self) -> &mut Terminal<Self::Backend>;

    /// Take exclusive control: raw mode, alternate screen, hidden cursor.
    /// Acquiring an already acquired surface is a no-op.
    fn acquire(&mut self) -> io::Result<()>;

    /// Give control back to the shell. Releasing twice is a no-op.
    fn release(&mut self) -> io::Result<()>;

    fn set_title(&mut self, _title: &str) -> io::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Crossterm
// ============================================================================

/// A real terminal driven through crossterm
pub struct CrosstermSurface<W: Write + Send + 'static = Stdout> {
    terminal: Terminal<CrosstermBackend<W>>,
    alt_screen: bool,
    active: bool,
}

impl CrosstermSurface<Stdout> {
    pub fn stdout(alt_screen: bool) -> io::Result<Self> {
        Self::new(io::stdout(), alt_screen)
    }
}

impl<W: Write + Send + 'static> CrosstermSurface<W> {
    pub fn new(writer: W, alt_screen: bool) -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new(CrosstermBackend::new(writer))?,
            alt_screen,
            active: false,
        })
    }
}

impl<W: Write + Send + 'static> Surface for CrosstermSurface<W> {
    type Backend = CrosstermBackend<W>;

    fn terminal(&mut self) -> &mut Terminal<Self::Backend> {
        &mut self.terminal
    }

    fn acquire(&mut self) -> io::Result<()> {
        if self.active {
            return Ok(());
        }
        enable_raw_mode()?;
        if self.alt_screen {
            execute!(self.terminal.backend_mut(), EnterAlternateScreen)?;
        }
        execute!(self.terminal.backend_mut(), Hide)?;
        self.terminal.clear()?;
        self.active = true;
        Ok(())
    }

    fn release(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        disable_raw_mode()?;
        if self.alt_screen {
            execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        }
        execute!(self.terminal.backend_mut(), Show)?;
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> io::Result<()> {
        execute!(self.terminal.backend_mut(), SetTitle(title))
    }
}

// ============================================================================
// Headless
// ============================================================================

/// In-memory surface backed by ratatui's `TestBackend`
pub struct HeadlessSurface {
    terminal: Terminal<TestBackend>,
    active: bool,
    title: Option<String>,
    /// Number of times the surface was acquired
    pub acquisitions: usize,
    /// Number of times the surface was released
    pub releases: usize,
}

impl HeadlessSurface {
    pub fn new(width: u16, height: u16) -> io::Result<Self> {
        Ok(Self {
            terminal: Terminal::new(TestBackend::new(width, height))?,
            active: false,
            title: None,
            acquisitions: 0,
            releases: 0,
        })
    }

    /// What is currently on the "screen"
    pub fn buffer(&self) -> &Buffer {
        self.terminal.backend().buffer()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Surface for HeadlessSurface {
    type Backend = TestBackend;

    fn terminal(&mut self) -> &mut Terminal<Self::Backend> {
        &mut self.terminal
    }

    fn acquire(&mut self) -> io::Result<()> {
        if !self.active {
            self.active = true;
            self.acquisitions += 1;
        }
        Ok(())
    }

    fn release(&mut self) -> io::Result<()> {
        if self.active {
            self.active = false;
            self.releases += 1;
        }
        Ok(())
    }

    fn set_title(&mut self, title: &str) -> io::Result<()> {
        self.title = Some(title.to_string());
        Ok(())
    }
}

/// Restore the terminal before the default panic output is printed
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        original_hook(panic_info);
    }));
}
