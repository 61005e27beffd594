/*!
 * Syscall Context
 *
 * The handle a kernel thread uses to make system calls, and the trampoline
 * every kernel thread starts in. Exiting a thread unwinds its OS thread
 * back to the trampoline with a private marker payload.
 */

use crate::core::types::{ExitValue, Pid, Tid};
use crate::kernel::{Kernel, KernelGuard, KernelState};
use crate::monitoring::SyscallSpan;
use crate::process::lifecycle;
use crate::process::{ThreadError, ThreadResult, ThreadStart};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use tracing::{error, warn};

/// Unwind payload of a thread that called `thread_exit` or `exit`
struct ThreadExited;

/// Per-thread system call interface
///
/// Handed to every task; all kernel services are methods on it.
#[derive(Debug, Clone)]
pub struct SyscallContext {
    pub(super) kernel: Kernel,
    pub(super) pid: Pid,
    pub(super) tid: Tid,
}

impl SyscallContext {
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub(super) fn lock(&self) -> KernelGuard<'_> {
        self.kernel.lock()
    }

    pub(super) fn span(&self, name: &'static str) -> SyscallSpan {
        SyscallSpan::new(name, self.pid, self.tid)
    }

    /// Record the exit under the lock; returns once the kernel is done with it
    pub(super) fn finish(&self, value: ExitValue, whole_process: bool) {
        let mut guard = self.lock();
        if whole_process {
            lifecycle::set_exitval(&mut guard, self.pid, value);
        }
        lifecycle::exit_thread(&mut guard, self.pid, self.tid, value);
    }

    /// Leave the task for good
    pub(super) fn unwind(&self) -> ! {
        panic::resume_unwind(Box::new(ThreadExited))
    }
}

/// Register a thread of `pid` and start its OS thread
pub(crate) fn spawn_thread(
    kernel: &Kernel,
    state: &mut KernelState,
    pid: Pid,
    start: ThreadStart,
) -> ThreadResult<Tid> {
    let tid = lifecycle::register_thread(state, pid, start)?;
    let ctx = SyscallContext {
        kernel: kernel.clone(),
        pid,
        tid,
    };
    let spawned = thread::Builder::new()
        .name(format!("pid{pid}-tid{tid}"))
        .spawn(move || run_thread(ctx));
    if let Err(e) = spawned {
        lifecycle::unregister_thread(state, pid, tid);
        return Err(ThreadError::SpawnFailed(e.to_string()));
    }
    Ok(tid)
}

fn run_thread(ctx: SyscallContext) {
    let start = ctx.lock().threads.take_start(ctx.tid);
    let Some(ThreadStart { task, args, main }) = start else {
        warn!(pid = ctx.pid, tid = ctx.tid, "thread started without a task");
        return;
    };

    let value = match panic::catch_unwind(AssertUnwindSafe(|| task(&ctx, args))) {
        Ok(value) => value,
        Err(payload) if payload.is::<ThreadExited>() => return,
        Err(payload) => {
            error!(
                pid = ctx.pid,
                tid = ctx.tid,
                panic = panic_message(payload.as_ref()),
                "task panicked"
            );
            -1
        }
    };
    ctx.finish(value, main);
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
