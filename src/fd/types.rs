/*!
 * Descriptor Types
 * Stream kinds a file control block can carry, and descriptor errors
 */

use crate::core::errors::ErrorKind;
use crate::core::types::{Fid, PipeId, Pid, SocketId};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type FdResult<T> = Result<T, FdError>;

/// Stream object behind a file control block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Stream {
    PipeReader(PipeId),
    PipeWriter(PipeId),
    Socket(SocketId),
}

/// Descriptor errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum FdError {
    #[error("Bad file id: {0}")]
    #[diagnostic(code(fd::invalid), help("The file id is out of range or not open."))]
    InvalidFid(Fid),

    #[error("File id table full: requested {requested}, available {available}")]
    #[diagnostic(
        code(fd::table_full),
        help("Close unused descriptors or raise KERNEL_MAX_FILEID.")
    )]
    TableFull { requested: usize, available: usize },

    #[error("File id {0} does not support reading")]
    #[diagnostic(code(fd::not_readable))]
    NotReadable(Fid),

    #[error("File id {0} does not support writing")]
    #[diagnostic(code(fd::not_writable))]
    NotWritable(Fid),

    #[error("File id {0} is not a socket")]
    #[diagnostic(code(fd::not_socket))]
    NotSocket(Fid),

    #[error("File id {0} is not a pipe end")]
    #[diagnostic(code(fd::not_pipe))]
    NotPipe(Fid),

    #[error("Process {0} has no descriptor table")]
    #[diagnostic(code(fd::no_process))]
    NoProcess(Pid),
}

impl FdError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TableFull { .. } => ErrorKind::ResourceExhausted,
            _ => ErrorKind::InvalidArgument,
        }
    }
}
