/*!
 * Process Control Block
 */

use super::types::{ProcessInfo, ProcessState};
use crate::core::sync::CondVar;
use crate::core::types::{ExitValue, Pid, Tid};
use crate::fd::FidTable;
use std::collections::VecDeque;

#[derive(Debug)]
pub struct ProcessControlBlock {
    pub pid: Pid,
    pub state: ProcessState,
    /// `None` only for init
    pub parent: Option<Pid>,
    /// Every child not yet reaped, zombies included
    pub children: Vec<Pid>,
    /// Children that became zombies, oldest first
    pub exited: VecDeque<Pid>,
    pub child_exit: CondVar,
    pub fidt: FidTable,
    /// Threads that have not exited
    pub thread_count: usize,
    /// Thread control blocks still owned by this process
    pub threads: Vec<Tid>,
    pub exitval: ExitValue,
    pub args: Option<Vec<u8>>,
}

impl ProcessControlBlock {
    pub fn new(pid: Pid, parent: Option<Pid>, max_fileid: usize, args: Vec<u8>) -> Self {
        Self {
            pid,
            state: ProcessState::Alive,
            parent,
            children: Vec::new(),
            exited: VecDeque::new(),
            child_exit: CondVar::new(),
            fidt: FidTable::new(max_fileid),
            thread_count: 0,
            threads: Vec::new(),
            exitval: 0,
            args: Some(args),
        }
    }

    pub fn is_zombie(&self) -> bool {
        self.state == ProcessState::Zombie
    }

    /// Drop `child` from both child lists
    pub fn forget_child(&mut self, child: Pid) {
        self.children.retain(|pid| *pid != child);
        self.exited.retain(|pid| *pid != child);
    }

    pub fn info(&self) -> ProcessInfo {
        ProcessInfo {
            pid: self.pid,
            ppid: self.parent,
            state: self.state,
            threads: self.thread_count,
            children: self.children.len(),
            open_files: self.fidt.open_count(),
            args_len: self.args.as_ref().map_or(0, Vec::len),
            exitval: self.exitval,
        }
    }
}
