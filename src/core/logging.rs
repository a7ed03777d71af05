//! Logging setup.
//!
//! The library itself only emits `tracing` events; nothing is printed unless
//! the host installs a subscriber. [`init_logging`] installs a
//! `tracing-subscriber` registry for hosts that do not have their own.
//!
//! # Environment Variables
//!
//! - `NOTESYNC_LOG_LEVEL`: log level (trace|debug|info|warn|error|off)
//! - `NOTESYNC_LOG_FORMAT`: output format (compact|pretty|json)
//! - `RUST_LOG`: standard filter directives, used when no level is given
//!
//! # Filtering
//!
//! ```bash
//! # Only the autosave controller, at debug
//! RUST_LOG="notesync::autosave=debug" my-editor
//!
//! # Everything at info, discarded editor messages too
//! RUST_LOG="info,notesync::diagram::channel=trace" my-editor
//! ```

use std::str::FromStr;

use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use super::error::NotesyncError;

/// Environment variable selecting the log level.
pub const LOG_LEVEL_ENV: &str = "NOTESYNC_LOG_LEVEL";

/// Environment variable selecting the log format.
pub const LOG_FORMAT_ENV: &str = "NOTESYNC_LOG_FORMAT";

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact single-line format
    Compact,
    /// Pretty multi-line format with colors
    Pretty,
    /// JSON format for log aggregation
    Json,
}

impl FromStr for LogFormat {
    type Err = NotesyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(NotesyncError::Config(format!("unknown log format: {s}"))),
        }
    }
}

impl LogFormat {
    /// All valid format names
    pub fn variants() -> &'static [&'static str] {
        &["compact", "pretty", "json"]
    }
}

/// Install a global `tracing` subscriber.
///
/// `level` falls back to `NOTESYNC_LOG_LEVEL`, then `RUST_LOG`, then `info`.
/// `format` falls back to `NOTESYNC_LOG_FORMAT`, then `compact`.
///
/// Fails on an unknown format or when a global subscriber is already set.
pub fn init_logging(level: Option<&str>, format: Option<&str>) -> Result<(), NotesyncError> {
    let log_level = level
        .map(str::to_string)
        .or_else(|| std::env::var(LOG_LEVEL_ENV).ok())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    let log_format = format
        .map(str::to_string)
        .or_else(|| std::env::var(LOG_FORMAT_ENV).ok())
        .unwrap_or_else(|| "compact".to_string());

    let format = LogFormat::from_str(&log_format)?;

    let filter = if log_level == "off" {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let installed = match format {
        LogFormat::Compact => Registry::default()
            .with(filter)
            .with(
                fmt::Layer::default()
                    .with_target(false)
                    .with_level(true)
                    .with_span_events(FmtSpan::NONE),
            )
            .try_init(),
        LogFormat::Pretty => Registry::default()
            .with(filter)
            .with(
                fmt::Layer::default()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_span_events(FmtSpan::ACTIVE)
                    .pretty(),
            )
            .try_init(),
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(
                fmt::Layer::default()
                    .with_target(true)
                    .with_span_events(FmtSpan::ACTIVE)
                    .json(),
            )
            .try_init(),
    };

    installed.map_err(|e| NotesyncError::Config(e.to_string()))
}
