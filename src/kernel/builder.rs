/*!
 * Kernel Builder
 * Builder pattern for Kernel construction
 */

use super::Kernel;
use crate::core::config::{ConfigError, KernelConfig};
use tracing::info;

/// Builder for Kernel
#[derive(Debug, Default)]
pub struct KernelBuilder {
    config: KernelConfig,
}

impl KernelBuilder {
    /// Create a builder with the compiled default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_pipe_buffer_size(mut self, size: usize) -> Self {
        self.config = self.config.with_pipe_buffer_size(size);
        self
    }

    pub fn with_max_fileid(mut self, max_fileid: usize) -> Self {
        self.config = self.config.with_max_fileid(max_fileid);
        self
    }

    /// Build the kernel, rejecting an unusable configuration
    pub fn build(self) -> Result<Kernel, ConfigError> {
        self.config.validate()?;
        info!(
            pipe_buffer_size = self.config.pipe_buffer_size,
            max_fileid = self.config.max_fileid,
            max_proc = self.config.max_proc,
            max_port = self.config.max_port,
            "kernel configured"
        );
        Ok(Kernel::new(self.config))
    }
}
