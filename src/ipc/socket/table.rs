/*!
 * Socket Table
 *
 * Arena of socket control blocks and pending connection requests, plus the
 * port table mapping each bound port to its single listener.
 */

use super::request::{ConnectionRequest, RequestState};
use super::socket::{SocketControlBlock, SocketKind};
use super::types::{SocketError, SocketResult, SocketState, SocketStats};
use crate::core::types::{FcbId, Port, RequestId, SocketId};
use ahash::AHashMap;
use tracing::debug;

/// Partial map port -> listener
#[derive(Debug)]
pub struct PortTable {
    slots: Vec<Option<SocketId>>,
}

impl PortTable {
    pub fn new(max_port: Port) -> Self {
        Self {
            slots: vec![None; max_port as usize + 1],
        }
    }

    pub fn max_port(&self) -> Port {
        (self.slots.len() - 1) as Port
    }

    pub fn owner(&self, port: Port) -> Option<SocketId> {
        self.slots.get(port as usize).copied().flatten()
    }

    pub fn bind(&mut self, port: Port, sid: SocketId) -> SocketResult<()> {
        let slot = self
            .slots
            .get_mut(port as usize)
            .ok_or(SocketError::InvalidPort(port))?;
        if slot.is_some() {
            return Err(SocketError::PortInUse(port));
        }
        *slot = Some(sid);
        Ok(())
    }

    /// Clear `port` if `sid` still owns it
    pub fn unbind(&mut self, port: Port, sid: SocketId) {
        if let Some(slot) = self.slots.get_mut(port as usize) {
            if *slot == Some(sid) {
                *slot = None;
            }
        }
    }
}

#[derive(Debug)]
pub struct SocketTable {
    pub(crate) sockets: AHashMap<SocketId, SocketControlBlock>,
    pub(crate) requests: AHashMap<RequestId, ConnectionRequest>,
    pub(crate) ports: PortTable,
    next_socket: SocketId,
    next_request: RequestId,
}

impl SocketTable {
    pub fn new(max_port: Port) -> Self {
        Self {
            sockets: AHashMap::new(),
            requests: AHashMap::new(),
            ports: PortTable::new(max_port),
            next_socket: 0,
            next_request: 0,
        }
    }

    pub fn insert(&mut self, port: Port, fcb: FcbId) -> SocketId {
        self.next_socket = self.next_socket.wrapping_add(1).max(1);
        let id = self.next_socket;
        self.sockets
            .insert(id, SocketControlBlock::new(id, port, fcb));
        id
    }

    pub fn get(&self, sid: SocketId) -> SocketResult<&SocketControlBlock> {
        self.sockets.get(&sid).ok_or(SocketError::NotFound(sid))
    }

    pub fn get_mut(&mut self, sid: SocketId) -> SocketResult<&mut SocketControlBlock> {
        self.sockets.get_mut(&sid).ok_or(SocketError::NotFound(sid))
    }

    pub fn stats(&self, sid: SocketId) -> SocketResult<SocketStats> {
        self.get(sid).map(SocketControlBlock::stats)
    }

    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    /// Queue a request from `peer` on `listener` and wake its acceptors
    ///
    /// The connecting socket is pinned (refcount) until the request is withdrawn.
    pub fn enqueue(&mut self, peer: SocketId, listener: SocketId) -> SocketResult<RequestId> {
        let port = self.get(listener)?.port;
        if !matches!(self.get(peer)?.kind, SocketKind::Unbound { pending: None }) {
            return Err(SocketError::Busy(peer));
        }

        self.next_request = self.next_request.wrapping_add(1);
        let rid = self.next_request;

        let SocketKind::Listener {
            queue,
            req_available,
        } = &mut self.get_mut(listener)?.kind
        else {
            return Err(SocketError::NoListener(port));
        };
        queue.push_back(rid);
        req_available.broadcast();

        let socket = self.get_mut(peer)?;
        socket.refcount += 1;
        socket.kind = SocketKind::Unbound { pending: Some(rid) };

        self.requests
            .insert(rid, ConnectionRequest::new(rid, peer, listener));
        debug!(request_id = rid, peer, listener, "connection request queued");
        Ok(rid)
    }

    /// Admit or refuse a request, waking its connector
    pub fn settle(&mut self, rid: RequestId, state: RequestState) {
        if let Some(request) = self.requests.get_mut(&rid) {
            request.settle(state);
        }
    }

    /// Pull a still-queued request off its listener and refuse it
    pub fn refuse(&mut self, rid: RequestId) {
        self.dequeue(rid);
        self.settle(rid, RequestState::Refused);
    }

    /// Forget a request entirely, wherever it still lingers
    pub fn withdraw(&mut self, rid: RequestId) {
        self.dequeue(rid);
        let Some(request) = self.requests.remove(&rid) else {
            return;
        };
        if let Some(socket) = self.sockets.get_mut(&request.peer) {
            if let SocketKind::Unbound { pending } = &mut socket.kind {
                if *pending == Some(rid) {
                    *pending = None;
                }
            }
        }
    }

    fn dequeue(&mut self, rid: RequestId) {
        let Some(listener) = self.requests.get(&rid).map(|request| request.listener) else {
            return;
        };
        if let Some(SocketKind::Listener { queue, .. }) =
            self.sockets.get_mut(&listener).map(|socket| &mut socket.kind)
        {
            queue.retain(|queued| *queued != rid);
        }
    }

    /// Drop one blocked-thread reference, freeing the block if it was the last
    pub fn release(&mut self, sid: SocketId) {
        if let Some(socket) = self.sockets.get_mut(&sid) {
            debug_assert!(socket.refcount > 0, "socket {sid} released without a holder");
            socket.refcount = socket.refcount.saturating_sub(1);
        }
        self.reclaim(sid);
    }

    /// Free the block once closed with no thread inside
    pub fn reclaim(&mut self, sid: SocketId) {
        if self
            .sockets
            .get(&sid)
            .is_some_and(SocketControlBlock::is_reclaimable)
        {
            self.sockets.remove(&sid);
            debug!(socket_id = sid, "socket freed");
        }
    }

    pub fn expect_state(&self, sid: SocketId, expected: SocketState) -> SocketResult<()> {
        let actual = self.get(sid)?.state();
        if actual == expected {
            Ok(())
        } else {
            Err(SocketError::InvalidState { expected, actual })
        }
    }
}
