/*!
 * Pipe Module
 * Bounded pipe channels with blocking reads/writes and independent half-close
 */

pub mod pipe;
pub mod table;
pub mod types;

// Re-export public API
pub use pipe::PipeControlBlock;
pub use table::PipeTable;
pub use types::{PipeEnd, PipeError, PipeOwner, PipeResult, PipeStats};
