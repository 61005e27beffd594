/*!
 * Socket Control Block
 */

use super::types::{SocketState, SocketStats};
use crate::core::sync::CondVar;
use crate::core::types::{FcbId, PipeId, Port, RequestId, SocketId};
use std::collections::VecDeque;

/// Per-state payload of a socket
#[derive(Debug)]
pub enum SocketKind {
    Unbound {
        /// Request this socket has queued on a listener, while connecting
        pending: Option<RequestId>,
    },
    Listener {
        queue: VecDeque<RequestId>,
        req_available: CondVar,
    },
    Peer {
        read_pipe: Option<PipeId>,
        write_pipe: Option<PipeId>,
        peer: Option<SocketId>,
    },
}

#[derive(Debug)]
pub struct SocketControlBlock {
    pub id: SocketId,
    pub port: Port,
    /// Threads blocked inside this socket (accept/connect)
    pub refcount: usize,
    /// Owning descriptor; `None` once closed
    pub fcb: Option<FcbId>,
    pub kind: SocketKind,
}

impl SocketControlBlock {
    pub fn new(id: SocketId, port: Port, fcb: FcbId) -> Self {
        Self {
            id,
            port,
            refcount: 0,
            fcb: Some(fcb),
            kind: SocketKind::Unbound { pending: None },
        }
    }

    pub fn state(&self) -> SocketState {
        match self.kind {
            SocketKind::Unbound { .. } => SocketState::Unbound,
            SocketKind::Listener { .. } => SocketState::Listener,
            SocketKind::Peer { .. } => SocketState::Peer,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.fcb.is_none()
    }

    /// Closed and nobody is blocked inside
    pub fn is_reclaimable(&self) -> bool {
        self.is_closed() && self.refcount == 0
    }

    pub fn stats(&self) -> SocketStats {
        let (pending, peer, read_open, write_open) = match &self.kind {
            SocketKind::Unbound { .. } => (0, None, false, false),
            SocketKind::Listener { queue, .. } => (queue.len(), None, false, false),
            SocketKind::Peer {
                read_pipe,
                write_pipe,
                peer,
            } => (0, *peer, read_pipe.is_some(), write_pipe.is_some()),
        };
        SocketStats {
            id: self.id,
            state: self.state(),
            port: self.port,
            refcount: self.refcount,
            pending,
            peer,
            read_open,
            write_open,
        }
    }
}
