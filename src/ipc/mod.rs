/*!
 * IPC Module
 * Inter-process communication: pipes and stream sockets
 */

pub mod pipe;
pub mod socket;

// Re-export for convenience
pub use pipe::{PipeEnd, PipeError, PipeStats, PipeTable};
pub use socket::{ShutdownMode, SocketError, SocketState, SocketStats, SocketTable};
