/*!
 * Kernel State
 * Every table the kernel owns, guarded as a whole by the kernel lock
 */

use crate::core::config::KernelConfig;
use crate::core::sync::CondVar;
use crate::fd::FileTable;
use crate::ipc::pipe::PipeTable;
use crate::ipc::socket::SocketTable;
use crate::process::{ProcessTable, ThreadTable};
use parking_lot::MutexGuard;
use serde::{Deserialize, Serialize};

/// The kernel lock held by the calling thread
pub type KernelGuard<'a> = MutexGuard<'a, KernelState>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootPhase {
    Idle,
    Running,
    Halted,
}

pub struct KernelState {
    pub(crate) files: FileTable,
    pub(crate) pipes: PipeTable,
    pub(crate) sockets: SocketTable,
    pub(crate) procs: ProcessTable,
    pub(crate) threads: ThreadTable,
    pub(crate) phase: BootPhase,
    /// Broadcast once init has been torn down
    pub(crate) halted: CondVar,
}

impl KernelState {
    pub(crate) fn new(config: &KernelConfig) -> Self {
        Self {
            files: FileTable::new(),
            pipes: PipeTable::new(config.pipe_buffer_size),
            sockets: SocketTable::new(config.max_port),
            procs: ProcessTable::new(config.max_proc, config.max_fileid),
            threads: ThreadTable::new(),
            phase: BootPhase::Idle,
            halted: CondVar::new(),
        }
    }

    pub fn stats(&self) -> KernelStats {
        KernelStats {
            phase: self.phase,
            processes: self.procs.len(),
            threads: self.threads.len(),
            files: self.files.len(),
            pipes: self.pipes.len(),
            sockets: self.sockets.len(),
            pending_requests: self.sockets.pending_requests(),
        }
    }
}

impl AsMut<PipeTable> for KernelState {
    fn as_mut(&mut self) -> &mut PipeTable {
        &mut self.pipes
    }
}

/// Live object counts across the kernel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct KernelStats {
    pub phase: BootPhase,
    pub processes: usize,
    pub threads: usize,
    pub files: usize,
    pub pipes: usize,
    pub sockets: usize,
    pub pending_requests: usize,
}
