/*!
 * System Limits and Constants
 *
 * Compiled defaults for every table and buffer the kernel sizes.
 * `KernelConfig` starts from these and may override them at boot.
 */

use super::types::{Pid, Port, Size};

// =============================================================================
// IPC LIMITS
// =============================================================================

/// Pipe ring size in bytes
/// One slot always stays free, so a pipe holds at most `PIPE_BUFFER_SIZE - 1` bytes
pub const PIPE_BUFFER_SIZE: Size = 8192;

/// Smallest ring that can hold a byte
pub const MIN_PIPE_BUFFER_SIZE: Size = 2;

/// Highest port a socket may bind
pub const MAX_PORT: Port = 1023;

/// Port value of a socket that cannot listen
pub const NOPORT: Port = 0;

// =============================================================================
// PROCESS LIMITS
// =============================================================================

/// File-id table slots per process
pub const MAX_FILEID: usize = 16;

/// Process table slots (pid 0 is never handed out)
pub const MAX_PROC: usize = 65536;

/// Pid of the top-level init process
pub const INIT_PID: Pid = 1;
