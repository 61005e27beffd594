/*!
 * Process Types
 * Common types for process and thread management
 */

use crate::core::errors::ErrorKind;
use crate::core::types::{ExitValue, Pid, Size, Tid};
use crate::syscalls::SyscallContext;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Process operation result
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Thread operation result
pub type ThreadResult<T> = Result<T, ThreadError>;

/// Entry point of a kernel thread
///
/// Receives the thread's system call context and its argument payload.
pub type Task = Box<dyn FnOnce(&SyscallContext, Vec<u8>) -> ExitValue + Send + 'static>;

/// Process errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum ProcessError {
    #[error("Process table full: {limit} slots in use")]
    #[diagnostic(
        code(process::table_full),
        help("Reap exited children with wait_child or raise KERNEL_MAX_PROC.")
    )]
    TableFull { limit: usize },

    #[error("Process not found: {0}")]
    #[diagnostic(code(process::not_found))]
    NotFound(Pid),

    #[error("Process {0} is not a child of the caller")]
    #[diagnostic(code(process::not_child))]
    NotChild(Pid),

    #[error("No children to wait for")]
    #[diagnostic(code(process::no_children))]
    NoChildren,

    #[error("Kernel already booted")]
    #[diagnostic(code(process::already_booted), help("Build a new Kernel to boot again."))]
    AlreadyBooted,

    #[error("Failed to start process: {0}")]
    #[diagnostic(code(process::spawn_failed))]
    SpawnFailed(String),
}

impl ProcessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TableFull { .. } | Self::SpawnFailed(_) => ErrorKind::ResourceExhausted,
            Self::NotFound(_) | Self::NotChild(_) => ErrorKind::InvalidArgument,
            Self::NoChildren | Self::AlreadyBooted => ErrorKind::StateConflict,
        }
    }
}

/// Thread errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum ThreadError {
    #[error("Invalid thread id: {0}")]
    #[diagnostic(
        code(thread::invalid),
        help("Thread ids are only valid inside the process that created them, until reclaimed.")
    )]
    InvalidTid(Tid),

    #[error("Thread {0} cannot join itself")]
    #[diagnostic(code(thread::self_join))]
    SelfJoin(Tid),

    #[error("Thread {0} is detached")]
    #[diagnostic(code(thread::detached), help("A detached thread's exit value is never collected."))]
    Detached(Tid),

    #[error("Thread {0} already exited")]
    #[diagnostic(code(thread::exited))]
    AlreadyExited(Tid),

    #[error("Failed to start thread: {0}")]
    #[diagnostic(code(thread::spawn_failed))]
    SpawnFailed(String),
}

impl ThreadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTid(_) => ErrorKind::InvalidArgument,
            Self::SelfJoin(_) | Self::Detached(_) | Self::AlreadyExited(_) => {
                ErrorKind::StateConflict
            }
            Self::SpawnFailed(_) => ErrorKind::ResourceExhausted,
        }
    }
}

/// Process lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// At least one thread has not exited
    Alive,
    /// All threads exited; waiting for the parent to collect the exit value
    Zombie,
}

/// Process snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessInfo {
    pub pid: Pid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppid: Option<Pid>,
    pub state: ProcessState,
    pub threads: usize,
    pub children: usize,
    pub open_files: usize,
    pub args_len: Size,
    pub exitval: ExitValue,
}
