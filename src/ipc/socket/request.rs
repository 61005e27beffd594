/*!
 * Connection Request
 * Record a connecting socket parks on a listener's queue
 */

use crate::core::sync::CondVar;
use crate::core::types::{RequestId, SocketId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Admitted,
    Refused,
}

#[derive(Debug)]
pub struct ConnectionRequest {
    pub id: RequestId,
    /// The connecting socket
    pub peer: SocketId,
    pub listener: SocketId,
    pub state: RequestState,
    pub connected_cv: CondVar,
}

impl ConnectionRequest {
    pub fn new(id: RequestId, peer: SocketId, listener: SocketId) -> Self {
        Self {
            id,
            peer,
            listener,
            state: RequestState::Pending,
            connected_cv: CondVar::new(),
        }
    }

    /// Decide the request and wake its (single) connector
    pub fn settle(&mut self, state: RequestState) {
        if self.state != RequestState::Pending {
            return;
        }
        self.state = state;
        self.connected_cv.signal();
    }
}
