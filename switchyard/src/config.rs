//! Runtime configuration, loaded from TOML via `serdeconv` the same way the
//! rest of this lineage's services configure their logger and network
//! layers.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the local pipe endpoint (a filesystem path on UNIX-like
    /// systems, a pipe name on Windows-like systems).
    pub pipe_name: String,
    /// Ceiling on any single length-prefixed frame, protocol error above it.
    pub max_frame_len: u32,
    /// Capacity of the bounded hand-off queue.
    pub queue_capacity: usize,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub destination: LogDestination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogDestination {
    Stdout,
    Stderr,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            pipe_name: "switchyard".to_string(),
            max_frame_len: crate::codec::DEFAULT_MAX_LEN,
            queue_capacity: 16,
            log: LogConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> LogConfig {
        LogConfig {
            level: "info".to_string(),
            destination: LogDestination::Stderr,
        }
    }
}

impl Default for LogDestination {
    fn default() -> LogDestination {
        LogDestination::Stderr
    }
}

impl Config {
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Config> {
        serdeconv::from_toml_file(path).map_err(config_err)
    }

    pub fn from_toml_str(s: &str) -> Result<Config> {
        serdeconv::from_toml_str(s).map_err(config_err)
    }
}

fn config_err(e: serdeconv::Error) -> Error {
    Error::System(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
}
