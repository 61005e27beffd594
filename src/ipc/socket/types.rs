/*!
 * Socket Types
 * States, shutdown modes, errors and statistics for rendezvous sockets
 */

use crate::core::errors::ErrorKind;
use crate::core::types::{Port, SocketId};
use crate::fd::FdError;
use crate::ipc::pipe::{PipeEnd, PipeError};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Socket operation result
pub type SocketResult<T> = Result<T, SocketError>;

/// Which half of a connected socket to shut down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownMode {
    Read,
    Write,
    Both,
}

impl ShutdownMode {
    #[inline]
    pub const fn closes_read(self) -> bool {
        matches!(self, Self::Read | Self::Both)
    }

    #[inline]
    pub const fn closes_write(self) -> bool {
        matches!(self, Self::Write | Self::Both)
    }
}

/// Socket state tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocketState {
    /// Just created; may listen or connect
    Unbound,
    /// Owns a port and a queue of pending connection requests
    Listener,
    /// Connected to another peer through a pair of pipes
    Peer,
}

/// Socket error types
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum SocketError {
    #[error("Invalid port: {0}")]
    #[diagnostic(
        code(socket::invalid_port),
        help("Listening and connecting need a port in 1..=max_port; port 0 is unbound.")
    )]
    InvalidPort(Port),

    #[error("Socket not found: {0}")]
    #[diagnostic(code(socket::not_found))]
    NotFound(SocketId),

    #[error("Invalid socket state: expected {expected:?}, found {actual:?}")]
    #[diagnostic(code(socket::invalid_state))]
    InvalidState {
        expected: SocketState,
        actual: SocketState,
    },

    #[error("Socket {0} already has a connect in progress")]
    #[diagnostic(code(socket::busy))]
    Busy(SocketId),

    #[error("Port {0} already has a listener")]
    #[diagnostic(code(socket::port_in_use), help("Close the existing listener first."))]
    PortInUse(Port),

    #[error("No listener on port {0}")]
    #[diagnostic(code(socket::no_listener))]
    NoListener(Port),

    #[error("Listener on port {0} closed")]
    #[diagnostic(code(socket::listener_closed))]
    ListenerClosed(Port),

    #[error("Connection refused")]
    #[diagnostic(
        code(socket::refused),
        help("The connecting socket was closed before the listener admitted it.")
    )]
    Refused,

    #[error("Connect timed out after {elapsed_ms}ms (timeout: {timeout_ms}ms)")]
    #[diagnostic(
        code(socket::timeout),
        help("No accept served the request in time; it has been withdrawn from the queue.")
    )]
    TimedOut { elapsed_ms: u64, timeout_ms: u64 },

    #[error("Socket {0:?} half is shut down")]
    #[diagnostic(code(socket::shutdown))]
    Shutdown(PipeEnd),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Pipe(#[from] PipeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Descriptor(#[from] FdError),
}

impl SocketError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPort(_) | Self::NotFound(_) | Self::NoListener(_) => {
                ErrorKind::InvalidArgument
            }
            Self::InvalidState { .. } | Self::Busy(_) | Self::PortInUse(_) | Self::Shutdown(_) => {
                ErrorKind::StateConflict
            }
            Self::ListenerClosed(_) | Self::Refused | Self::TimedOut { .. } => ErrorKind::PeerGone,
            Self::Pipe(e) => e.kind(),
            Self::Descriptor(e) => e.kind(),
        }
    }
}

/// Socket statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SocketStats {
    pub id: SocketId,
    pub state: SocketState,
    pub port: Port,
    /// Threads currently blocked inside the socket
    pub refcount: usize,
    /// Queued connection requests (listeners only)
    pub pending: usize,
    pub peer: Option<SocketId>,
    pub read_open: bool,
    pub write_open: bool,
}
