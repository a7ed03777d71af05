//! Embedded editor launch parameters

use std::fmt;

use crate::core::DEFAULT_EDITOR_PATH;

/// Editor color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DarkMode {
    /// Follow the host's preference.
    #[default]
    Auto,
    /// Always dark.
    On,
    /// Always light.
    Off,
}

impl DarkMode {
    /// Query value understood by the editor.
    pub fn as_param(&self) -> &'static str {
        match self {
            DarkMode::Auto => "auto",
            DarkMode::On => "1",
            DarkMode::Off => "0",
        }
    }
}

/// How the embedded editor is opened.
///
/// The defaults open the editor in JSON protocol mode with save, save-and-exit
/// and exit buttons, and ask it for autosave events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorLaunch {
    /// Path of the editor page.
    pub path: String,
    /// Show a spinner while loading.
    pub spin: bool,
    /// Show the save button.
    pub save_button: bool,
    /// Show the save-and-exit button.
    pub save_and_exit: bool,
    /// Show the exit button.
    pub exit_button: bool,
    /// Color scheme.
    pub dark: DarkMode,
    /// Ask the editor for `autosave` events in the `load` action.
    pub autosave: bool,
}

impl Default for EditorLaunch {
    fn default() -> Self {
        Self {
            path: DEFAULT_EDITOR_PATH.to_string(),
            spin: true,
            save_button: true,
            save_and_exit: true,
            exit_button: true,
            dark: DarkMode::Auto,
            autosave: true,
        }
    }
}

impl EditorLaunch {
    /// Set the editor page path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the color scheme.
    pub fn dark(mut self, dark: DarkMode) -> Self {
        self.dark = dark;
        self
    }

    /// Enable or disable editor autosave events.
    pub fn autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    /// Show or hide the exit button.
    pub fn exit_button(mut self, show: bool) -> Self {
        self.exit_button = show;
        self
    }

    /// Show or hide the save button.
    pub fn save_button(mut self, show: bool) -> Self {
        self.save_button = show;
        self
    }

    /// URL to load in the editor's isolated context.
    pub fn url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EditorLaunch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool| if on { "1" } else { "0" };
        // The editor takes "hide" flags for its buttons.
        write!(
            f,
            "{}?embed=1&proto=json&spin={}&noSaveBtn={}&saveAndExit={}&noExitBtn={}&dark={}",
            self.path,
            flag(self.spin),
            flag(!self.save_button),
            flag(self.save_and_exit),
            flag(!self.exit_button),
            self.dark.as_param(),
        )
    }
}
