/*!
 * Pipe Types
 * Common types and errors for pipe channels
 */

use crate::core::errors::ErrorKind;
use crate::core::types::{FcbId, PipeId, Size, SocketId};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipe operation result
pub type PipeResult<T> = Result<T, PipeError>;

/// One direction of a pipe channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipeEnd {
    Read,
    Write,
}

/// Identity holding one end of a pipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum PipeOwner {
    /// A file control block created by the pipe system call
    File(FcbId),
    /// A connected socket peer
    Socket(SocketId),
}

/// Pipe error types
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum PipeError {
    #[error("Pipe not found: {0}")]
    #[diagnostic(code(pipe::not_found))]
    NotFound(PipeId),

    /// The caller's own end is already closed
    #[error("Pipe {0:?} end already closed")]
    #[diagnostic(
        code(pipe::end_closed),
        help("The descriptor or socket half was shut down before this call.")
    )]
    EndClosed(PipeEnd),

    /// The reader vanished while data was still being written
    #[error("Broken pipe: read end closed")]
    #[diagnostic(
        code(pipe::broken),
        help("Bytes already copied before the reader closed are not rolled back.")
    )]
    BrokenPipe,
}

impl PipeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::InvalidArgument,
            Self::EndClosed(_) => ErrorKind::StateConflict,
            Self::BrokenPipe => ErrorKind::PeerGone,
        }
    }
}

/// Pipe statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipeStats {
    pub id: PipeId,
    /// Most bytes the channel can hold at once
    pub capacity: Size,
    pub buffered: Size,
    pub reader: Option<PipeOwner>,
    pub writer: Option<PipeOwner>,
}
