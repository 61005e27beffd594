/*!
 * Syscall Types
 * Unified error returned by every system call
 */

use crate::core::errors::ErrorKind;
use crate::core::types::Fid;
use crate::fd::FdError;
use crate::ipc::pipe::PipeError;
use crate::ipc::socket::SocketError;
use crate::process::{ProcessError, ThreadError};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// System call result
pub type SyscallResult<T> = Result<T, SyscallError>;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "subsystem", content = "error")]
pub enum SyscallError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Descriptor(#[from] FdError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Pipe(#[from] PipeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Socket(#[from] SocketError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Thread(#[from] ThreadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Process(#[from] ProcessError),
}

impl SyscallError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Descriptor(e) => e.kind(),
            Self::Pipe(e) => e.kind(),
            Self::Socket(e) => e.kind(),
            Self::Thread(e) => e.kind(),
            Self::Process(e) => e.kind(),
        }
    }
}

/// The two file ids of a freshly created pipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipePair {
    pub read: Fid,
    pub write: Fid,
}
