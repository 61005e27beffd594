/*!
 * Kernel Configuration
 *
 * Runtime sizing of the kernel tables, defaulting to `core::limits`.
 *
 * Environment overrides:
 * - KERNEL_PIPE_BUFFER_SIZE
 * - KERNEL_MAX_FILEID
 * - KERNEL_MAX_PROC
 * - KERNEL_MAX_PORT
 */

use super::limits::{MAX_FILEID, MAX_PORT, MAX_PROC, MIN_PIPE_BUFFER_SIZE, PIPE_BUFFER_SIZE};
use super::types::{Port, Size};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ConfigError {
    #[error("Cannot parse {var}={value}")]
    #[diagnostic(
        code(config::unparsable),
        help("Environment overrides must be plain unsigned integers.")
    )]
    Unparsable { var: &'static str, value: String },

    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(config::out_of_range))]
    OutOfRange { field: &'static str, reason: String },
}

/// Sizes of every bounded kernel table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct KernelConfig {
    /// Ring size of each pipe channel
    pub pipe_buffer_size: Size,
    /// File-id slots per process
    pub max_fileid: usize,
    /// Process table slots
    pub max_proc: usize,
    /// Highest bindable port
    pub max_port: Port,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            pipe_buffer_size: PIPE_BUFFER_SIZE,
            max_fileid: MAX_FILEID,
            max_proc: MAX_PROC,
            max_port: MAX_PORT,
        }
    }
}

impl KernelConfig {
    /// Defaults overridden by any `KERNEL_*` variables that are set
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = env_override("KERNEL_PIPE_BUFFER_SIZE")? {
            config.pipe_buffer_size = v;
        }
        if let Some(v) = env_override("KERNEL_MAX_FILEID")? {
            config.max_fileid = v;
        }
        if let Some(v) = env_override("KERNEL_MAX_PROC")? {
            config.max_proc = v;
        }
        if let Some(v) = env_override("KERNEL_MAX_PORT")? {
            config.max_port = v;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipe_buffer_size < MIN_PIPE_BUFFER_SIZE {
            return Err(ConfigError::OutOfRange {
                field: "pipe_buffer_size",
                reason: format!(
                    "{} is below the minimum of {}",
                    self.pipe_buffer_size, MIN_PIPE_BUFFER_SIZE
                ),
            });
        }
        if self.max_fileid == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_fileid",
                reason: "a process needs at least one file id".to_string(),
            });
        }
        // pid 0 is reserved, so init needs a second slot
        if self.max_proc < 2 {
            return Err(ConfigError::OutOfRange {
                field: "max_proc",
                reason: format!("{} leaves no slot for init", self.max_proc),
            });
        }
        if self.max_port == 0 {
            return Err(ConfigError::OutOfRange {
                field: "max_port",
                reason: "no port would be bindable".to_string(),
            });
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn with_pipe_buffer_size(mut self, size: Size) -> Self {
        self.pipe_buffer_size = size;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_max_fileid(mut self, max_fileid: usize) -> Self {
        self.max_fileid = max_fileid;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_max_proc(mut self, max_proc: usize) -> Self {
        self.max_proc = max_proc;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_max_port(mut self, max_port: Port) -> Self {
        self.max_port = max_port;
        self
    }
}

fn env_override<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Unparsable { var, value }),
        Err(_) => Ok(None),
    }
}
