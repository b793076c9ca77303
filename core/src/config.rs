//! Session Configuration
//!
//! Session defaults loaded from `$XDG_CONFIG_HOME/stagehand/stagehand.toml`.
//!
//! # Configuration Priority
//!
//! Highest first:
//! 1. CLI arguments ([`ConfigOverrides`], applied by the caller)
//! 2. Environment variables (`STAGEHAND_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [app]
//! name = "deploy"
//! loading_message = "fetching state..."
//!
//! [display]
//! theme = "dracula"
//! alt_screen = true
//! tick_interval_ms = 250
//! ready_timeout_ms = 10000
//!
//! [logging]
//! file = "/tmp/stagehand.log"
//! filter = "stagehand=debug"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::{DEFAULT_APP_NAME, DEFAULT_LOADING_MESSAGE};
use crate::theme::{Theme, DEFAULT_THEME};

/// Default tick cadence
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// How long `Shell::start` waits for the first geometry
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Where the winning configuration values came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Cli,
    Env,
    File,
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[app]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppToml {
    /// Application name shown in the header
    pub name: Option<String>,

    /// Initial loading view text
    pub loading_message: Option<String>,
}

/// `[display]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayToml {
    /// Theme name
    pub theme: Option<String>,

    /// Whether to switch to the alternate screen
    pub alt_screen: Option<bool>,

    /// Tick cadence in milliseconds
    pub tick_interval_ms: Option<u64>,

    /// Readiness timeout in milliseconds
    pub ready_timeout_ms: Option<u64>,
}

/// `[logging]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingToml {
    /// Log file path
    pub file: Option<String>,

    /// `EnvFilter` directive
    pub filter: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StagehandToml {
    pub app: AppToml,
    pub display: DisplayToml,
    pub logging: LoggingToml,
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Fully resolved session configuration
#[derive(Clone, Debug)]
pub struct ShellConfig {
    pub app_name: String,
    pub loading_message: String,
    pub theme: String,
    pub alt_screen: bool,
    pub tick_interval: Duration,
    pub ready_timeout: Duration,
    /// Where the host should write its log; the terminal is taken
    pub log_file: Option<PathBuf>,
    pub log_filter: Option<String>,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            loading_message: DEFAULT_LOADING_MESSAGE.to_string(),
            theme: DEFAULT_THEME.to_string(),
            alt_screen: true,
            tick_interval: DEFAULT_TICK_INTERVAL,
            ready_timeout: DEFAULT_READY_TIMEOUT,
            log_file: None,
            log_filter: None,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ShellConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Resolve the configured theme
    ///
    /// # Errors
    ///
    /// Returns a validation error when the name is not a built-in theme.
    pub fn resolve_theme(&self) -> Result<Theme, ConfigError> {
        Theme::by_name(&self.theme).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "unknown theme '{}' (expected one of: {})",
                self.theme,
                Theme::names().join(", ")
            ))
        })
    }

    /// Check the resolved values
    ///
    /// # Errors
    ///
    /// Rejects unknown themes and zero intervals.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolve_theme()?;
        if self.tick_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.ready_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "ready_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// `$XDG_CONFIG_HOME/stagehand/stagehand.toml`
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("stagehand").join("stagehand.toml"))
}

/// Load configuration from the default path, the environment and defaults
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed,
/// or if the resolved values are invalid. A missing file is not an error.
pub fn load_config() -> Result<ShellConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Same as [`load_config`].
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ShellConfig, ConfigError> {
    load_with_env(path, |key| std::env::var(key).ok())
}

fn load_with_env(
    path: Option<PathBuf>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ShellConfig, ConfigError> {
    let mut config = ShellConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: StagehandToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, lookup);
    config.validate()?;

    Ok(config)
}

fn apply_toml_config(config: &mut ShellConfig, toml: &StagehandToml) {
    if let Some(ref name) = toml.app.name {
        if !name.trim().is_empty() {
            config.app_name = name.clone();
        }
    }
    if let Some(ref message) = toml.app.loading_message {
        config.loading_message = message.clone();
    }

    if let Some(ref theme) = toml.display.theme {
        config.theme = theme.clone();
    }
    if let Some(alt) = toml.display.alt_screen {
        config.alt_screen = alt;
    }
    if let Some(ms) = toml.display.tick_interval_ms {
        config.tick_interval = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.display.ready_timeout_ms {
        config.ready_timeout = Duration::from_millis(ms);
    }

    if let Some(ref file) = toml.logging.file {
        config.log_file = Some(PathBuf::from(file));
    }
    if toml.logging.filter.is_some() {
        config.log_filter = toml.logging.filter.clone();
    }
}

/// Environment overrides, read through `lookup` so tests need not touch the
/// process environment
fn apply_env_config(config: &mut ShellConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(theme) = lookup("STAGEHAND_THEME") {
        config.theme = theme;
        config.source = ConfigSource::Env;
    }
    if let Some(tick) = lookup("STAGEHAND_TICK_MS") {
        if let Ok(ms) = tick.parse::<u64>() {
            config.tick_interval = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(file) = lookup("STAGEHAND_LOG_FILE") {
        config.log_file = Some(PathBuf::from(file));
        config.source = ConfigSource::Env;
    }
    if let Some(filter) = lookup("STAGEHAND_LOG_FILTER") {
        config.log_filter = Some(filter);
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Overrides
// =============================================================================

/// Values supplied on the command line
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub app_name: Option<String>,
    pub theme: Option<String>,
    pub tick_interval_ms: Option<u64>,
    pub alt_screen: Option<bool>,
    pub log_file: Option<PathBuf>,
}

impl ConfigOverrides {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_app_name(mut self, name: String) -> Self {
        self.app_name = Some(name);
        self
    }

    #[must_use]
    pub fn with_theme(mut self, theme: String) -> Self {
        self.theme = Some(theme);
        self
    }

    #[must_use]
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn with_alt_screen(mut self, enabled: bool) -> Self {
        self.alt_screen = Some(enabled);
        self
    }

    #[must_use]
    pub fn with_log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    /// Apply overrides, then re-validate
    ///
    /// # Errors
    ///
    /// Returns a validation error if an override produced an invalid value.
    pub fn apply(&self, config: &mut ShellConfig) -> Result<(), ConfigError> {
        if self.app_name.is_some()
            || self.theme.is_some()
            || self.tick_interval_ms.is_some()
            || self.alt_screen.is_some()
            || self.log_file.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref name) = self.app_name {
            config.app_name = name.clone();
        }
        if let Some(ref theme) = self.theme {
            config.theme = theme.clone();
        }
        if let Some(ms) = self.tick_interval_ms {
            config.tick_interval = Duration::from_millis(ms);
        }
        if let Some(alt) = self.alt_screen {
            config.alt_screen = alt;
        }
        if let Some(ref path) = self.log_file {
            config.log_file = Some(path.clone());
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
