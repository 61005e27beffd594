/*!
 * Thread Syscalls
 */

use super::context::{self, SyscallContext};
use super::types::SyscallResult;
use crate::core::types::{ExitValue, Tid};
use crate::process::lifecycle;
use crate::process::{ThreadError, ThreadInfo, ThreadStart};

impl SyscallContext {
    /// Start a new thread in the calling process running `task(args)`
    pub fn create_thread<F>(&self, task: F, args: Vec<u8>) -> SyscallResult<Tid>
    where
        F: FnOnce(&SyscallContext, Vec<u8>) -> ExitValue + Send + 'static,
    {
        let span = self.span("create_thread");
        let start = ThreadStart {
            task: Box::new(task),
            args,
            main: false,
        };
        let result: SyscallResult<_> =
            context::spawn_thread(&self.kernel, &mut self.lock(), self.pid, start).map_err(Into::into);
        span.record_result(&result);
        result
    }

    pub fn thread_self(&self) -> Tid {
        self.tid
    }

    /// Wait for `tid` to exit and return its exit value
    pub fn thread_join(&self, tid: Tid) -> SyscallResult<ExitValue> {
        let span = self.span("thread_join").blocking();
        let result: SyscallResult<_> =
            lifecycle::join(&mut self.lock(), self.pid, self.tid, tid).map_err(Into::into);
        span.record_result(&result);
        result
    }

    pub fn thread_detach(&self, tid: Tid) -> SyscallResult<()> {
        let span = self.span("thread_detach");
        let result: SyscallResult<_> =
            lifecycle::detach(&mut self.lock(), self.pid, tid).map_err(Into::into);
        span.record_result(&result);
        result
    }

    /// Snapshot of a thread of the calling process
    pub fn thread_info(&self, tid: Tid) -> SyscallResult<ThreadInfo> {
        let mut guard = self.lock();
        let tcb = guard
            .threads
            .owned_by(tid, self.pid)
            .ok_or(ThreadError::InvalidTid(tid))?;
        Ok(tcb.info())
    }

    /// Exit the calling thread with `value`; never returns
    ///
    /// If this was the last thread, the process is torn down first.
    pub fn thread_exit(&self, value: ExitValue) -> ! {
        {
            let _span = self.span("thread_exit").blocking();
            self.finish(value, false);
        }
        self.unwind()
    }
}
