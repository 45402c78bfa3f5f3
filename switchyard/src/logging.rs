//! Builds a `slog` logger from a `sloggers`-style config, the same way this
//! lineage's service binaries build theirs.

use crate::config::{LogConfig, LogDestination};
use sloggers::terminal::{Destination, TerminalLoggerBuilder};
use sloggers::types::Severity;
use sloggers::Build;

pub fn build(cfg: &LogConfig) -> slog::Logger {
    let mut builder = TerminalLoggerBuilder::new();
    builder.level(severity(&cfg.level));
    builder.destination(match cfg.destination {
        LogDestination::Stdout => Destination::Stdout,
        LogDestination::Stderr => Destination::Stderr,
    });
    builder
        .build()
        .unwrap_or_else(|_| slog::Logger::root(slog::Discard, slog::o!()))
}

fn severity(level: &str) -> Severity {
    match level {
        "trace" => Severity::Trace,
        "debug" => Severity::Debug,
        "warning" | "warn" => Severity::Warning,
        "error" => Severity::Error,
        "critical" => Severity::Critical,
        _ => Severity::Info,
    }
}
