/*!
 * System Calls
 *
 * Every kernel service is a method on `SyscallContext`. Each call takes the
 * kernel lock, runs inside a `syscall` tracing span and returns a
 * `SyscallResult`.
 */

mod context;
mod fd;
mod pipe;
mod process;
mod socket;
mod thread;
pub mod types;

pub(crate) use context::spawn_thread;
pub use context::SyscallContext;
pub use types::{PipePair, SyscallError, SyscallResult};
