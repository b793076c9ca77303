//! Stagehand Demo - one session per built-in view
//!
//! # Usage
//!
//! ```bash
//! # Chrome-less frame (default)
//! stagehand-demo
//!
//! # Any other built-in view
//! stagehand-demo --view collection
//! stagehand-demo --view table-mini
//!
//! # Different palette, faster spinner
//! stagehand-demo --view loading --theme dracula --tick-ms 100
//!
//! # Verbose logging (written to the log file, the terminal is taken)
//! STAGEHAND_LOG_FILTER=debug stagehand-demo --log-file /tmp/stagehand.log
//! ```

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ratatui::text::Text;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stagehand::config::default_config_path;
use stagehand::views::{
    CollectionItem, CollectionView, DocumentView, Entity, EntityFormat, EntityView, ErrorView,
    Field, FormView, FrameView, LoadingView, TableColumn, TableMode, TableRow, TableView,
};
use stagehand::{
    install_panic_hook, load_config_from_path, BoxedView, Cmd, ConfigOverrides, CrosstermSurface,
    Msg, NoticeLevel, ProgramHandle, Shell, ShellBuilder, ShellConfig, View,
};

const DOCUMENT: &str = "# Hmmm...

> To be, or not to be, that is the question.
> William Shakespeare

Scroll with the arrow keys or `j`/`k`, press `h` for help.

- `esc` goes back
- `q` quits";

/// Sample application exercising every built-in stagehand view
#[derive(Parser, Debug)]
#[command(name = "stagehand-demo")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Which view to show
    #[arg(short = 'v', long, value_enum, default_value_t = DemoView::Frame)]
    view: DemoView,

    /// Configuration file path
    #[arg(short = 'c', long, env = "STAGEHAND_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Theme name (everforest, dark, dracula, light, tokyo-night)
    #[arg(short = 't', long)]
    theme: Option<String>,

    /// Tick interval in milliseconds
    #[arg(long, value_name = "MS")]
    tick_ms: Option<u64>,

    /// Draw on the main screen instead of the alternate screen
    #[arg(long)]
    no_alt_screen: bool,

    /// Log file path
    #[arg(short = 'l', long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DemoView {
    Frame,
    Loading,
    Error,
    Document,
    Collection,
    Entity,
    Table,
    TableMini,
    Form,
}

impl DemoView {
    fn name(self) -> &'static str {
        match self {
            Self::Frame => "frame",
            Self::Loading => "loading",
            Self::Error => "error",
            Self::Document => "document",
            Self::Collection => "collection",
            Self::Entity => "entity",
            Self::Table => "table",
            Self::TableMini => "table-mini",
            Self::Form => "form",
        }
    }
}

/// Plain text, no key handling
struct Echo(String);

impl View for Echo {
    fn update(&mut self, _msg: &Msg) -> Option<Cmd> {
        None
    }

    fn render(&self) -> Text<'static> {
        if self.0.is_empty() {
            return Text::from("Hello, World!");
        }
        Text::from(self.0.clone())
    }

    fn type_tag(&self) -> &str {
        "echo"
    }
}

#[derive(Serialize)]
struct Author {
    name: String,
    nationality: String,
    works: Vec<String>,
}

impl Entity for Author {
    fn yaml(&self) -> anyhow::Result<String> {
        let mut out = format!("name: {}\nnationality: {}\nworks:\n", self.name, self.nationality);
        for work in &self.works {
            out.push_str(&format!("  - {work}\n"));
        }
        Ok(out)
    }

    fn json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn markdown(&self) -> String {
        let works: Vec<String> = self.works.iter().map(|w| format!("- {w}")).collect();
        format!(
            "# {}\n\n> {} author\n\n{}",
            self.name,
            self.nationality,
            works.join("\n")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = resolve_config(&args)?;
    init_logging(&config)?;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        anyhow::bail!("stagehand-demo requires a terminal (TTY)");
    }
    install_panic_hook();

    let mut shell = ShellBuilder::from_config(&config)?.build()?;
    shell.set_state("view", args.view.name())?;
    shell.set_notice("press q to quit", NoticeLevel::Notice)?;

    info!(view = args.view.name(), theme = %config.theme, "starting demo");
    shell.start().await?;

    let view = build_view(args.view, &shell)?;
    shell.set_view(view)?;

    let exit = shell.wait_for_exit().await?;
    info!(
        current = ?exit.model.view_tags().current,
        "session ended"
    );
    Ok(())
}

/// File, then environment, then command line
fn resolve_config(args: &Args) -> Result<ShellConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;

    let mut overrides = ConfigOverrides::new();
    if let Some(theme) = &args.theme {
        overrides = overrides.with_theme(theme.clone());
    }
    if let Some(ms) = args.tick_ms {
        overrides = overrides.with_tick_interval_ms(ms);
    }
    if args.no_alt_screen {
        overrides = overrides.with_alt_screen(false);
    }
    if let Some(path) = &args.log_file {
        overrides = overrides.with_log_file(path.clone());
    }
    overrides
        .apply(&mut config)
        .context("Invalid command line option")?;

    Ok(config)
}

/// Log to a file; stdout belongs to the session
fn init_logging(config: &ShellConfig) -> Result<()> {
    let path = config
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("stagehand-demo.log"));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {path:?}"))?;

    let filter = match &config.log_filter {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("Invalid log filter: {directives}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(filter)
        .init();
    Ok(())
}

fn build_view(kind: DemoView, shell: &Shell<CrosstermSurface>) -> Result<BoxedView> {
    let state = shell.render_state();
    let theme = state.theme.clone();

    let view: BoxedView = match kind {
        DemoView::Frame => Box::new(FrameView::new(Echo(
            "You are currently viewing a rendered frame. Use the --view flag to switch to a \
             different view."
                .to_string(),
        ))),
        DemoView::Loading => Box::new(LoadingView::new("waiting for the paint to dry...", theme)),
        DemoView::Error => Box::new(ErrorView::new(
            &anyhow::anyhow!("something went wrong - please try again"),
            theme,
        )),
        DemoView::Document => Box::new(DocumentView::new(&state, DOCUMENT)),
        DemoView::Collection => {
            let handle = shell.handle();
            let refresh = shell.handle();
            Box::new(
                CollectionView::new(
                    &state,
                    vec![
                        CollectionItem::new("william", "William Shakespeare")
                            .with_sub_header("English Playwright"),
                        CollectionItem::new("jane", "Jane Austen")
                            .with_sub_header("English Novelist"),
                        CollectionItem::new("mark", "Mark Twain")
                            .with_sub_header("American Author"),
                    ],
                )
                .with_item_names("author", "authors")
                .on_select(move |item| {
                    notify(&handle, format!("Selected: {}", item.header))?;
                    Ok(None)
                })
                .with_key("r", "refresh", move || {
                    notify(&refresh, "Nothing new".to_string())?;
                    Ok(None)
                }),
            )
        }
        DemoView::Entity => {
            let author = Author {
                name: "Jane Austen".to_string(),
                nationality: "English".to_string(),
                works: vec![
                    "Sense and Sensibility".to_string(),
                    "Pride and Prejudice".to_string(),
                    "Emma".to_string(),
                ],
            };
            let handle = shell.handle();
            Box::new(
                EntityView::new(&state, author, EntityFormat::Document).with_key(
                    "s",
                    "star",
                    move || {
                        notify(&handle, "Starred".to_string())?;
                        Ok(None)
                    },
                ),
            )
        }
        DemoView::Table => {
            let handle = shell.handle();
            let hover = shell.handle();
            Box::new(
                TableView::new(
                    &state,
                    vec![
                        TableColumn::new("Workspace", 40),
                        TableColumn::new("Description", 35),
                        TableColumn::new("Status", 25),
                    ],
                    vec![
                        TableRow::new(["flow-workspace", "Main development workspace", "Active"])
                            .with_children(vec![
                                TableRow::new(["docs", "Documentation namespace", "5 exec"]),
                                TableRow::new(["api", "API services namespace", "12 exec"]),
                                TableRow::new(["frontend", "UI components", "8 exec"]),
                            ]),
                        TableRow::new(["home-lab", "Infrastructure automation", "Inactive"])
                            .with_children(vec![
                                TableRow::new(["k8s", "Kubernetes deployments", "15 exec"]),
                                TableRow::new(["monitoring", "Observability stack", "6 exec"]),
                            ]),
                        TableRow::new(["personal-tools", "Personal utility scripts", "Active"]),
                    ],
                    TableMode::Full,
                )
                .on_select(move |_, cells| {
                    notify(&handle, format!("Selected: {}", first_cell(cells)))?;
                    Ok(None)
                })
                .on_hover(move |_, cells| {
                    let current = Msg::state("current", first_cell(cells));
                    if let Err(err) = hover.send(current, Duration::ZERO) {
                        tracing::debug!("hover update dropped: {}", err);
                    }
                }),
            )
        }
        DemoView::TableMini => {
            let handle = shell.handle();
            let table = TableView::new(
                &state,
                vec![TableColumn::new("Available Executables", 100)],
                ["build app", "test unit", "deploy staging", "deploy production"]
                    .into_iter()
                    .map(|name| TableRow::new([name]))
                    .collect(),
                TableMode::Mini,
            )
            .on_select(move |_, cells| {
                notify(&handle, format!("Executing: {}", first_cell(cells)))?;
                Ok(None)
            });
            Box::new(FrameView::new(table))
        }
        DemoView::Form => {
            let handle = shell.handle();
            let form = FormView::new(
                &state,
                vec![
                    Field::text("author").title("Favorite Author").required(),
                    Field::text("color")
                        .title("Favorite Color")
                        .default_value("pink")
                        .description("hint: it's pink"),
                    Field::confirm("confirm").title("Ready to submit?"),
                ],
            )?
            .on_submit(move |values| {
                let thanks = Echo(format!(
                    "Thank you for telling me that your favorite author is {} and your favorite \
                     color is {}!",
                    values.get("author").map_or("", String::as_str),
                    values.get("color").map_or("", String::as_str),
                ));
                // queued ahead of the form's own ReplaceView
                handle.send(
                    Msg::SetNextView(Box::new(FrameView::new(thanks))),
                    Duration::ZERO,
                )?;
                Ok(None)
            });
            Box::new(form)
        }
    };
    Ok(view)
}

fn first_cell(cells: &[String]) -> &str {
    cells.first().map_or("", String::as_str)
}

fn notify(handle: &ProgramHandle, text: String) -> Result<()> {
    handle.send(Msg::notice(text, NoticeLevel::Info), Duration::ZERO)?;
    Ok(())
}
