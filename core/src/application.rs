//! Application Descriptor
//!
//! Static facts about the program being hosted: its name, the state
//! key/value shown in the header, an initial notice and the loading text.

/// Name used when the descriptor leaves it blank
pub const DEFAULT_APP_NAME: &str = "stagehand";

/// Message shown by the loading view until a status arrives
pub const DEFAULT_LOADING_MESSAGE: &str = "loading...";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Application {
    /// Shown in the header box and used as the window title
    pub name: String,
    /// Header context label, e.g. `workspace`
    pub state_key: String,
    /// Header context value, e.g. `dev`
    pub state_val: String,
    /// Footer notice shown at start
    pub notice: String,
    /// Initial text of the loading view
    pub loading_message: String,
}

impl Default for Application {
    fn default() -> Self {
        Self::new(DEFAULT_APP_NAME)
    }
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: if name.trim().is_empty() {
                DEFAULT_APP_NAME.to_string()
            } else {
                name
            },
            state_key: String::new(),
            state_val: String::new(),
            notice: String::new(),
            loading_message: DEFAULT_LOADING_MESSAGE.to_string(),
        }
    }

    pub fn with_state(mut self, key: impl Into<String>, val: impl Into<String>) -> Self {
        self.state_key = key.into();
        self.state_val = val.into();
        self
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = notice.into();
        self
    }

    pub fn with_loading_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.trim().is_empty() {
            self.loading_message = message;
        }
        self
    }
}
