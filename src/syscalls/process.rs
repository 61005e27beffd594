/*!
 * Process Syscalls
 */

use super::context::{self, SyscallContext};
use super::types::SyscallResult;
use crate::core::types::{ExitValue, Pid};
use crate::process::lifecycle;
use crate::process::{ProcessError, ProcessInfo, ThreadStart};
use tracing::info;

impl SyscallContext {
    /// Start a child process running `task(args)` in its main thread
    ///
    /// The child inherits every open descriptor of the caller.
    pub fn exec<F>(&self, task: F, args: Vec<u8>) -> SyscallResult<Pid>
    where
        F: FnOnce(&SyscallContext, Vec<u8>) -> ExitValue + Send + 'static,
    {
        let span = self.span("exec");
        let mut guard = self.lock();
        let result: SyscallResult<Pid> =
            match lifecycle::create_process(&mut guard, self.pid, args.clone()) {
                Err(e) => Err(e.into()),
                Ok(child) => {
                    let start = ThreadStart {
                        task: Box::new(task),
                        args,
                        main: true,
                    };
                    match context::spawn_thread(&self.kernel, &mut guard, child, start) {
                        Ok(_) => {
                            info!(parent = self.pid, pid = child, "process started");
                            Ok(child)
                        }
                        Err(e) => {
                            lifecycle::abandon_process(&mut guard, self.pid, child);
                            Err(ProcessError::SpawnFailed(e.to_string()).into())
                        }
                    }
                }
            };
        span.record_result(&result);
        result
    }

    /// Wait for `pid` (or any child) to exit and reap it
    ///
    /// Returns the reaped pid and its exit value.
    pub fn wait_child(&self, pid: Option<Pid>) -> SyscallResult<(Pid, ExitValue)> {
        let span = self.span("wait_child").blocking();
        let result: SyscallResult<_> =
            lifecycle::wait_child(&mut self.lock(), self.pid, pid).map_err(Into::into);
        span.record_result(&result);
        result
    }

    /// Set the process exit value and exit the calling thread
    pub fn exit(&self, value: ExitValue) -> ! {
        {
            let _span = self.span("exit").blocking();
            self.finish(value, true);
        }
        self.unwind()
    }

    pub fn get_pid(&self) -> Pid {
        self.pid
    }

    /// `None` for init
    pub fn get_ppid(&self) -> Option<Pid> {
        self.lock().procs.get(self.pid).and_then(|pcb| pcb.parent)
    }

    pub fn process_info(&self) -> Vec<ProcessInfo> {
        self.lock().procs.info()
    }
}
