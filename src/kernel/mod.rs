/*!
 * Kernel Handle
 *
 * A `Kernel` is a cheaply clonable handle on one kernel instance: its
 * configuration and the state behind the single kernel lock. Kernel threads
 * are OS threads; a thread holds the lock only while inside a system call
 * and gives it up whenever it sleeps on a condition variable.
 */

mod builder;
mod state;

pub use builder::KernelBuilder;
pub use state::{BootPhase, KernelGuard, KernelState, KernelStats};

use crate::core::config::KernelConfig;
use crate::core::limits::INIT_PID;
use crate::core::types::ExitValue;
use crate::process::{ProcessError, ProcessInfo, ProcessResult, ThreadStart};
use crate::syscalls::{self, SyscallContext};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

struct KernelInner {
    state: Mutex<KernelState>,
    config: KernelConfig,
}

#[derive(Clone)]
pub struct Kernel {
    inner: Arc<KernelInner>,
}

impl Kernel {
    pub fn builder() -> KernelBuilder {
        KernelBuilder::new()
    }

    pub(crate) fn new(config: KernelConfig) -> Self {
        Self {
            inner: Arc::new(KernelInner {
                state: Mutex::new(KernelState::new(&config)),
                config,
            }),
        }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.inner.config
    }

    pub(crate) fn lock(&self) -> KernelGuard<'_> {
        self.inner.state.lock()
    }

    /// Start init with `task` and block until init has exited
    ///
    /// Returns init's exit value. A kernel boots once.
    pub fn boot<F>(&self, task: F, args: Vec<u8>) -> ProcessResult<ExitValue>
    where
        F: FnOnce(&SyscallContext, Vec<u8>) -> ExitValue + Send + 'static,
    {
        let mut guard = self.lock();
        if guard.phase != BootPhase::Idle {
            return Err(ProcessError::AlreadyBooted);
        }

        let pid = guard.procs.alloc(None, args.clone())?;
        debug_assert_eq!(pid, INIT_PID);
        let start = ThreadStart {
            task: Box::new(task),
            args,
            main: true,
        };
        if let Err(e) = syscalls::spawn_thread(self, &mut guard, pid, start) {
            guard.procs.release(pid);
            return Err(ProcessError::SpawnFailed(e.to_string()));
        }
        guard.phase = BootPhase::Running;
        info!(pid, "kernel booted");

        while guard.phase != BootPhase::Halted {
            let halted = guard.halted.clone();
            halted.wait(&mut guard);
        }
        Ok(guard.procs.get(INIT_PID).map_or(0, |init| init.exitval))
    }

    pub fn stats(&self) -> KernelStats {
        self.lock().stats()
    }

    /// Snapshot of every process in the table
    pub fn process_info(&self) -> Vec<ProcessInfo> {
        self.lock().procs.info()
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
