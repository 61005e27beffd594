/*!
 * Thread Control Blocks
 *
 * One block per kernel thread. A block outlives its thread until it has
 * exited and no joiner is left holding it.
 */

use super::types::Task;
use crate::core::sync::CondVar;
use crate::core::types::{ExitValue, Pid, Tid};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a new thread runs, handed over when its OS thread starts
pub struct ThreadStart {
    pub task: Task,
    pub args: Vec<u8>,
    /// Returning from a main thread's task exits the whole process
    pub main: bool,
}

impl fmt::Debug for ThreadStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadStart")
            .field("args_len", &self.args.len())
            .field("main", &self.main)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct ThreadControlBlock {
    pub tid: Tid,
    pub pid: Pid,
    /// Taken by the thread itself when it starts running
    pub start: Option<ThreadStart>,
    pub exitval: ExitValue,
    pub exited: bool,
    pub detached: bool,
    /// Threads currently blocked in join on this one
    pub refcount: usize,
    pub exit_cv: CondVar,
}

impl ThreadControlBlock {
    pub fn new(tid: Tid, pid: Pid, start: ThreadStart) -> Self {
        Self {
            tid,
            pid,
            start: Some(start),
            exitval: 0,
            exited: false,
            detached: false,
            refcount: 0,
            exit_cv: CondVar::new(),
        }
    }

    /// Exited and nobody is waiting to read the exit value
    pub fn is_reclaimable(&self) -> bool {
        self.exited && self.refcount == 0
    }

    pub fn info(&self) -> ThreadInfo {
        ThreadInfo {
            tid: self.tid,
            pid: self.pid,
            exited: self.exited,
            detached: self.detached,
            joiners: self.refcount,
        }
    }
}

/// Thread snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ThreadInfo {
    pub tid: Tid,
    pub pid: Pid,
    pub exited: bool,
    pub detached: bool,
    pub joiners: usize,
}

#[derive(Debug, Default)]
pub struct ThreadTable {
    threads: AHashMap<Tid, ThreadControlBlock>,
    next_tid: Tid,
}

impl ThreadTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pid: Pid, start: ThreadStart) -> Tid {
        self.next_tid += 1;
        let tid = self.next_tid;
        self.threads
            .insert(tid, ThreadControlBlock::new(tid, pid, start));
        tid
    }

    pub fn get(&self, tid: Tid) -> Option<&ThreadControlBlock> {
        self.threads.get(&tid)
    }

    pub fn get_mut(&mut self, tid: Tid) -> Option<&mut ThreadControlBlock> {
        self.threads.get_mut(&tid)
    }

    /// Block `tid` if it belongs to `pid`
    pub fn owned_by(&mut self, tid: Tid, pid: Pid) -> Option<&mut ThreadControlBlock> {
        self.threads.get_mut(&tid).filter(|tcb| tcb.pid == pid)
    }

    pub fn remove(&mut self, tid: Tid) -> Option<ThreadControlBlock> {
        self.threads.remove(&tid)
    }

    pub fn take_start(&mut self, tid: Tid) -> Option<ThreadStart> {
        self.threads.get_mut(&tid).and_then(|tcb| tcb.start.take())
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}
