//! Autosave configuration.

use std::time::Duration;

use crate::core::{DEFAULT_AUTOSAVE_INTERVAL, DEFAULT_STATUS_CAPACITY};

/// Autosave controller configuration.
#[derive(Debug, Clone)]
pub struct AutoSaveConfig {
    /// Interval between background save attempts.
    pub interval: Duration,

    /// Whether the background timer runs once the controller is started.
    pub enabled: bool,

    /// Treat the initial draft as unsaved.
    pub initially_dirty: bool,

    /// Capacity of the status broadcast stream.
    pub status_capacity: usize,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_AUTOSAVE_INTERVAL,
            enabled: true,
            initially_dirty: false,
            status_capacity: DEFAULT_STATUS_CAPACITY,
        }
    }
}

/// Builder for [`AutoSaveConfig`].
#[derive(Debug)]
pub struct AutoSaveConfigBuilder {
    config: AutoSaveConfig,
}

impl AutoSaveConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: AutoSaveConfig::default(),
        }
    }

    /// Set the autosave interval.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Enable or disable the background timer.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Treat the initial draft as unsaved.
    pub fn initially_dirty(mut self, dirty: bool) -> Self {
        self.config.initially_dirty = dirty;
        self
    }

    /// Set the status stream capacity (at least 1).
    pub fn status_capacity(mut self, capacity: usize) -> Self {
        self.config.status_capacity = capacity.max(1);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> AutoSaveConfig {
        self.config
    }
}

impl Default for AutoSaveConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AutoSaveConfig::default();
        assert_eq!(config.interval, Duration::from_secs(10));
        assert!(config.enabled);
        assert!(!config.initially_dirty);
    }

    #[test]
    fn test_builder() {
        let config = AutoSaveConfigBuilder::new()
            .interval(Duration::from_millis(500))
            .enabled(false)
            .initially_dirty(true)
            .status_capacity(0)
            .build();

        assert_eq!(config.interval, Duration::from_millis(500));
        assert!(!config.enabled);
        assert!(config.initially_dirty);
        assert_eq!(config.status_capacity, 1);
    }
}
