/*!
 * Core Types
 * Common identifiers used across the kernel
 */

/// Process ID type
pub type Pid = u32;

/// Thread ID type (opaque handle naming a thread control block)
pub type Tid = u64;

/// Per-process file id (index into the process file-id table)
pub type Fid = u32;

/// Kernel-wide file control block identifier
pub type FcbId = u32;

/// Socket port number
pub type Port = u16;

/// Pipe control block identifier
pub type PipeId = u32;

/// Socket control block identifier
pub type SocketId = u32;

/// Pending connection request identifier
pub type RequestId = u64;

/// Size type for buffer operations
pub type Size = usize;

/// Value a thread or process exits with
pub type ExitValue = i32;
