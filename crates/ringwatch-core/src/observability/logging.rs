//! Structured Logging
//!
//! Installs a `tracing-subscriber` stack for the analysis pipeline.
//!
//! # Features
//!
//! - JSON structured output for log aggregation
//! - Per-target levels (e.g. `ringwatch_patterns=debug`)
//! - `RUST_LOG` overrides the configured filter
//!
//! # Example
//!
//! ```rust,ignore
//! use ringwatch_core::observability::logging::LogConfig;
//!
//! LogConfig::production().init()?;
//! tracing::info!(accounts = 120, "Graph built");
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level (most verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level
    #[default]
    Info,
    /// Warning level
    Warn,
    /// Error level
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default log level
    pub level: LogLevel,
    /// Enable structured JSON output
    pub structured: bool,
    /// Include caller location
    pub include_location: bool,
    /// Include thread IDs
    pub include_thread_ids: bool,
    /// Per-target log levels
    pub target_levels: BTreeMap<String, LogLevel>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            structured: false,
            include_location: false,
            include_thread_ids: false,
            target_levels: BTreeMap::new(),
        }
    }
}

impl LogConfig {
    /// Development configuration
    pub fn development() -> Self {
        Self {
            level: LogLevel::Debug,
            structured: false,
            include_location: true,
            ..Default::default()
        }
    }

    /// Production configuration
    pub fn production() -> Self {
        Self {
            level: LogLevel::Info,
            structured: true,
            include_thread_ids: true,
            ..Default::default()
        }
    }

    /// Set log level for a specific target
    pub fn with_target_level(mut self, target: impl Into<String>, level: LogLevel) -> Self {
        self.target_levels.insert(target.into(), level);
        self
    }

    /// Filter directives in `EnvFilter` syntax.
    pub fn filter_directives(&self) -> String {
        let mut directives = vec![self.level.to_string()];
        directives.extend(
            self.target_levels
                .iter()
                .map(|(target, level)| format!("{target}={level}")),
        );
        directives.join(",")
    }

    /// Initialize logging. Calling it again after a subscriber is installed
    /// is a no-op.
    pub fn init(&self) -> crate::error::Result<()> {
        use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.filter_directives()))
            .map_err(|e| crate::error::AnalysisError::config(format!("log filter: {e}")))?;

        let subscriber = tracing_subscriber::registry().with(filter);

        if self.structured {
            let layer = fmt::layer()
                .json()
                .with_thread_ids(self.include_thread_ids)
                .with_file(self.include_location)
                .with_line_number(self.include_location);

            subscriber.with(layer).try_init().ok();
        } else {
            let layer = fmt::layer()
                .with_thread_ids(self.include_thread_ids)
                .with_file(self.include_location)
                .with_line_number(self.include_location);

            subscriber.with(layer).try_init().ok();
        }

        Ok(())
    }
}
