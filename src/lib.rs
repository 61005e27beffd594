/*!
 * Cooperative Kernel Library
 *
 * IPC and thread lifecycle layer of a small teaching kernel, hosted on OS
 * threads: bounded pipes, a socket rendezvous protocol built on pipes, and
 * thread create/join/detach/exit with process teardown and reparenting.
 */

pub mod core;
pub mod fd;
pub mod ipc;
pub mod kernel;
pub mod monitoring;
pub mod process;
pub mod syscalls;

// Re-exports
pub use crate::core::{ConfigError, ErrorKind, KernelConfig};
pub use crate::core::types::{ExitValue, Fid, Pid, Port, Size, Tid};
pub use ipc::pipe::{PipeEnd, PipeError, PipeStats};
pub use ipc::socket::{ShutdownMode, SocketError, SocketState, SocketStats};
pub use kernel::{BootPhase, Kernel, KernelBuilder, KernelStats};
pub use monitoring::init_tracing;
pub use process::{ProcessError, ProcessInfo, ProcessState, ThreadError, ThreadInfo};
pub use syscalls::{PipePair, SyscallContext, SyscallError, SyscallResult};
