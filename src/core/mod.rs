/*!
 * Core Module
 * Fundamental kernel types, limits, configuration and error taxonomy
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod sync;
pub mod types;

// Re-export for convenience
pub use config::{ConfigError, KernelConfig};
pub use errors::ErrorKind;
pub use types::*;
