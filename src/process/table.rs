/*!
 * Process Table
 *
 * Bounded pid space. Pid 0 is never handed out; fresh pids are used in
 * ascending order before any released pid is recycled, and released pids
 * come back oldest first.
 */

use super::pcb::ProcessControlBlock;
use super::types::{ProcessError, ProcessInfo, ProcessResult};
use crate::core::types::Pid;
use ahash::AHashMap;
use std::collections::VecDeque;

#[derive(Debug)]
pub struct ProcessTable {
    procs: AHashMap<Pid, ProcessControlBlock>,
    recycled: VecDeque<Pid>,
    next_fresh: Pid,
    max_proc: usize,
    max_fileid: usize,
}

impl ProcessTable {
    pub fn new(max_proc: usize, max_fileid: usize) -> Self {
        Self {
            procs: AHashMap::new(),
            recycled: VecDeque::new(),
            next_fresh: 1,
            max_proc,
            max_fileid,
        }
    }

    /// Claim a pid and install a fresh control block for it
    pub fn alloc(&mut self, parent: Option<Pid>, args: Vec<u8>) -> ProcessResult<Pid> {
        let pid = if (self.next_fresh as usize) < self.max_proc {
            let pid = self.next_fresh;
            self.next_fresh += 1;
            pid
        } else {
            self.recycled.pop_front().ok_or(ProcessError::TableFull {
                limit: self.max_proc,
            })?
        };
        self.procs.insert(
            pid,
            ProcessControlBlock::new(pid, parent, self.max_fileid, args),
        );
        Ok(pid)
    }

    pub fn get(&self, pid: Pid) -> Option<&ProcessControlBlock> {
        self.procs.get(&pid)
    }

    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut ProcessControlBlock> {
        self.procs.get_mut(&pid)
    }

    pub fn release(&mut self, pid: Pid) -> Option<ProcessControlBlock> {
        let pcb = self.procs.remove(&pid)?;
        self.recycled.push_back(pid);
        Some(pcb)
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    /// Snapshot of every process still in the table, by pid
    pub fn info(&self) -> Vec<ProcessInfo> {
        let mut infos: Vec<ProcessInfo> = self.procs.values().map(ProcessControlBlock::info).collect();
        infos.sort_by_key(|info| info.pid);
        infos
    }
}
