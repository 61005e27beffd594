/*!
 * Socket Rendezvous
 *
 * listen/accept/connect pair a connecting socket with a fresh socket on the
 * accepting side and wire them together with two simplex pipes. Once
 * connected, reads and writes go straight to the pipes.
 *
 * A socket is freed only when its descriptor is closed and no thread is
 * blocked inside it; `accept` and `connect` pin their socket through the
 * refcount for the whole time they may sleep.
 */

use super::request::RequestState;
use super::socket::SocketKind;
use super::types::{ShutdownMode, SocketError, SocketResult, SocketState};
use crate::core::limits::NOPORT;
use crate::core::sync::CondVar;
use crate::core::types::{Fid, PipeId, Pid, Port, RequestId, Size, SocketId};
use crate::fd::{ops as fd, Stream};
use crate::ipc::pipe::{self, PipeEnd, PipeOwner};
use crate::kernel::{KernelGuard, KernelState};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub(crate) fn open(state: &mut KernelState, pid: Pid, port: Port) -> SocketResult<Fid> {
    if port > state.sockets.ports.max_port() {
        return Err(SocketError::InvalidPort(port));
    }
    let (fid, fcb) = fd::reserve_one(state, pid)?;
    let sid = state.sockets.insert(port, fcb);
    state.files.install(fcb, Stream::Socket(sid));
    debug!(pid, fid, socket_id = sid, port, "socket opened");
    Ok(fid)
}

pub(crate) fn listen(state: &mut KernelState, pid: Pid, fid: Fid) -> SocketResult<()> {
    let sid = fd::socket_of(state, pid, fid)?;
    let socket = state.sockets.get(sid)?;
    match socket.kind {
        SocketKind::Unbound { pending: None } => {}
        SocketKind::Unbound { pending: Some(_) } => return Err(SocketError::Busy(sid)),
        _ => {
            return Err(SocketError::InvalidState {
                expected: SocketState::Unbound,
                actual: socket.state(),
            })
        }
    }
    let port = socket.port;
    if port == NOPORT {
        return Err(SocketError::InvalidPort(NOPORT));
    }

    state.sockets.ports.bind(port, sid)?;
    state.sockets.get_mut(sid)?.kind = SocketKind::Listener {
        queue: VecDeque::new(),
        req_available: CondVar::new(),
    };
    info!(pid, socket_id = sid, port, "listening");
    Ok(())
}

/// Wait for the oldest connection request and turn it into a connected pair
///
/// Returns the file id of the acceptor's new peer socket.
pub(crate) fn accept(guard: &mut KernelGuard<'_>, pid: Pid, fid: Fid) -> SocketResult<Fid> {
    let lsid = fd::socket_of(guard, pid, fid)?;
    guard.sockets.expect_state(lsid, SocketState::Listener)?;
    let listener = guard.sockets.get_mut(lsid)?;
    listener.refcount += 1;
    let port = listener.port;

    let result = admit_next(guard, pid, lsid, port);
    guard.sockets.release(lsid);
    result
}

fn admit_next(guard: &mut KernelGuard<'_>, pid: Pid, lsid: SocketId, port: Port) -> SocketResult<Fid> {
    loop {
        let rid = next_request(guard, lsid, port)?;
        let state: &mut KernelState = guard;

        let Some(peer_sid) = state.sockets.requests.get(&rid).map(|request| request.peer) else {
            continue;
        };
        let connectable = state.sockets.get(peer_sid).is_ok_and(|socket| {
            !socket.is_closed()
                && matches!(socket.kind, SocketKind::Unbound { pending: Some(p) } if p == rid)
        });
        if !connectable {
            warn!(request_id = rid, peer = peer_sid, "refusing request from a closed socket");
            state.sockets.settle(rid, RequestState::Refused);
            continue;
        }

        let (new_fid, fcb) = match fd::reserve_one(state, pid) {
            Ok(reserved) => reserved,
            Err(e) => {
                // leave the request at the head of the queue for a later accept
                if let Ok(listener) = state.sockets.get_mut(lsid) {
                    if let SocketKind::Listener { queue, .. } = &mut listener.kind {
                        queue.push_front(rid);
                    }
                }
                return Err(e.into());
            }
        };

        let new_sid = state.sockets.insert(port, fcb);
        // connector -> acceptor, and acceptor -> connector
        let inbound = state
            .pipes
            .create(PipeOwner::Socket(new_sid), PipeOwner::Socket(peer_sid));
        let outbound = state
            .pipes
            .create(PipeOwner::Socket(peer_sid), PipeOwner::Socket(new_sid));

        state.sockets.get_mut(new_sid)?.kind = SocketKind::Peer {
            read_pipe: Some(inbound),
            write_pipe: Some(outbound),
            peer: Some(peer_sid),
        };
        state.sockets.get_mut(peer_sid)?.kind = SocketKind::Peer {
            read_pipe: Some(outbound),
            write_pipe: Some(inbound),
            peer: Some(new_sid),
        };
        state.files.install(fcb, Stream::Socket(new_sid));
        state.sockets.settle(rid, RequestState::Admitted);

        info!(
            pid,
            port,
            request_id = rid,
            acceptor = new_sid,
            connector = peer_sid,
            "connection admitted"
        );
        return Ok(new_fid);
    }
}

/// Pop the oldest request, sleeping while the queue is empty
///
/// Fails as soon as the listener no longer owns its port.
fn next_request(guard: &mut KernelGuard<'_>, lsid: SocketId, port: Port) -> SocketResult<RequestId> {
    loop {
        if guard.sockets.ports.owner(port) != Some(lsid) {
            return Err(SocketError::ListenerClosed(port));
        }
        let listener = guard.sockets.get_mut(lsid)?;
        let SocketKind::Listener {
            queue,
            req_available,
        } = &mut listener.kind
        else {
            return Err(SocketError::ListenerClosed(port));
        };
        if let Some(rid) = queue.pop_front() {
            return Ok(rid);
        }
        let req_available = req_available.clone();
        req_available.wait(guard);
    }
}

/// Queue a request on the listener at `port` and sleep until it is decided
///
/// `None` waits without bound. On timeout the request is withdrawn and
/// leaves nothing behind on the listener.
pub(crate) fn connect(
    guard: &mut KernelGuard<'_>,
    pid: Pid,
    fid: Fid,
    port: Port,
    timeout: Option<Duration>,
) -> SocketResult<()> {
    if port == NOPORT || port > guard.sockets.ports.max_port() {
        return Err(SocketError::InvalidPort(port));
    }
    let sid = fd::socket_of(guard, pid, fid)?;
    guard.sockets.expect_state(sid, SocketState::Unbound)?;
    let lsid = guard
        .sockets
        .ports
        .owner(port)
        .ok_or(SocketError::NoListener(port))?;

    let rid = guard.sockets.enqueue(sid, lsid)?;
    let outcome = await_admission(guard, rid, lsid, port, timeout);
    guard.sockets.withdraw(rid);
    guard.sockets.release(sid);

    match &outcome {
        Ok(()) => debug!(pid, socket_id = sid, port, "connected"),
        Err(e) => warn!(pid, socket_id = sid, port, error = %e, "connect failed"),
    }
    outcome
}

fn await_admission(
    guard: &mut KernelGuard<'_>,
    rid: RequestId,
    lsid: SocketId,
    port: Port,
    timeout: Option<Duration>,
) -> SocketResult<()> {
    let started = Instant::now();
    let deadline = timeout.and_then(|t| started.checked_add(t));
    loop {
        let request = guard
            .sockets
            .requests
            .get(&rid)
            .ok_or(SocketError::Refused)?;
        match request.state {
            RequestState::Admitted => return Ok(()),
            RequestState::Refused => return Err(SocketError::Refused),
            RequestState::Pending => {}
        }
        if guard.sockets.ports.owner(port) != Some(lsid) {
            return Err(SocketError::ListenerClosed(port));
        }

        let connected_cv = request.connected_cv.clone();
        match deadline {
            Some(deadline) if Instant::now() >= deadline => {
                return Err(SocketError::TimedOut {
                    elapsed_ms: millis(started.elapsed()),
                    timeout_ms: timeout.map_or(0, millis),
                });
            }
            Some(deadline) => {
                connected_cv.wait_until(guard, deadline);
            }
            None => connected_cv.wait(guard),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

pub(crate) fn shutdown(
    state: &mut KernelState,
    pid: Pid,
    fid: Fid,
    mode: ShutdownMode,
) -> SocketResult<()> {
    let sid = fd::socket_of(state, pid, fid)?;
    let socket = state.sockets.get_mut(sid)?;
    let actual = socket.state();
    let SocketKind::Peer {
        read_pipe,
        write_pipe,
        ..
    } = &mut socket.kind
    else {
        return Err(SocketError::InvalidState {
            expected: SocketState::Peer,
            actual,
        });
    };

    let read_pipe = if mode.closes_read() { read_pipe.take() } else { None };
    let write_pipe = if mode.closes_write() { write_pipe.take() } else { None };
    if let Some(pipe) = read_pipe {
        state.pipes.close_reader(pipe)?;
    }
    if let Some(pipe) = write_pipe {
        state.pipes.close_writer(pipe)?;
    }
    debug!(pid, socket_id = sid, ?mode, "socket shut down");
    Ok(())
}

fn peer_pipe(state: &KernelState, sid: SocketId, end: PipeEnd) -> SocketResult<PipeId> {
    let socket = state.sockets.get(sid)?;
    let SocketKind::Peer {
        read_pipe,
        write_pipe,
        ..
    } = &socket.kind
    else {
        return Err(SocketError::InvalidState {
            expected: SocketState::Peer,
            actual: socket.state(),
        });
    };
    let pipe = match end {
        PipeEnd::Read => *read_pipe,
        PipeEnd::Write => *write_pipe,
    };
    pipe.ok_or(SocketError::Shutdown(end))
}

pub(crate) fn read(guard: &mut KernelGuard<'_>, sid: SocketId, buf: &mut [u8]) -> SocketResult<Size> {
    let pipe = peer_pipe(guard, sid, PipeEnd::Read)?;
    Ok(pipe::table::read(guard, pipe, buf)?)
}

pub(crate) fn write(guard: &mut KernelGuard<'_>, sid: SocketId, buf: &[u8]) -> SocketResult<Size> {
    let pipe = peer_pipe(guard, sid, PipeEnd::Write)?;
    Ok(pipe::table::write(guard, pipe, buf)?)
}

/// Last descriptor for the socket closed
pub(crate) fn close(state: &mut KernelState, sid: SocketId) -> SocketResult<()> {
    let sockets = &mut state.sockets;
    let socket = sockets.get_mut(sid)?;
    socket.fcb = None;
    let port = socket.port;

    match &mut socket.kind {
        SocketKind::Listener {
            queue,
            req_available,
        } => {
            let refused: Vec<RequestId> = queue.drain(..).collect();
            // blocked acceptors notice the vanished port mapping
            req_available.broadcast();
            sockets.ports.unbind(port, sid);
            for rid in refused {
                sockets.settle(rid, RequestState::Refused);
            }
            info!(socket_id = sid, port, "listener closed");
        }
        SocketKind::Unbound { pending } => {
            if let Some(rid) = pending.take() {
                sockets.refuse(rid);
            }
        }
        SocketKind::Peer {
            read_pipe,
            write_pipe,
            peer,
        } => {
            let (read_pipe, write_pipe, partner) = (read_pipe.take(), write_pipe.take(), peer.take());
            if let Some(partner) = partner.and_then(|p| sockets.sockets.get_mut(&p)) {
                if let SocketKind::Peer { peer, .. } = &mut partner.kind {
                    *peer = None;
                }
            }
            if let Some(pipe) = read_pipe {
                if let Err(e) = state.pipes.close_reader(pipe) {
                    warn!(socket_id = sid, pipe_id = pipe, error = %e, "read pipe already gone");
                }
            }
            if let Some(pipe) = write_pipe {
                if let Err(e) = state.pipes.close_writer(pipe) {
                    warn!(socket_id = sid, pipe_id = pipe, error = %e, "write pipe already gone");
                }
            }
        }
    }

    state.sockets.reclaim(sid);
    Ok(())
}
