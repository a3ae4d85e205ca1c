//! Observability
//!
//! Structured logging for analysis runs. Every pipeline stage logs its
//! counts at `info`, per-kernel detail at `debug`, and budget truncation or
//! non-convergence at `warn`.

pub mod logging;

pub use logging::{LogConfig, LogLevel};
