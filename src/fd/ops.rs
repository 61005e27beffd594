/*!
 * Descriptor Operations
 * Reservation, lookup, inheritance and close over the kernel state
 */

use super::table::FidTable;
use super::types::{FdError, FdResult, Stream};
use crate::core::types::{FcbId, Fid, Pid, SocketId};
use crate::ipc::socket;
use crate::kernel::KernelState;
use tracing::{debug, warn};

/// Reserve `n` file ids and fresh control blocks for `pid`, all or nothing
pub(crate) fn reserve(state: &mut KernelState, pid: Pid, n: usize) -> FdResult<Vec<(Fid, FcbId)>> {
    let pcb = state.procs.get_mut(pid).ok_or(FdError::NoProcess(pid))?;
    let free: Vec<Fid> = pcb.fidt.free_fids().take(n).collect();
    if free.len() < n {
        warn!(pid, requested = n, available = free.len(), "file id table exhausted");
        return Err(FdError::TableFull {
            requested: n,
            available: free.len(),
        });
    }

    Ok(free
        .into_iter()
        .map(|fid| {
            let fcb = state.files.alloc();
            pcb.fidt.set(fid, fcb);
            (fid, fcb)
        })
        .collect())
}

pub(crate) fn reserve_one(state: &mut KernelState, pid: Pid) -> FdResult<(Fid, FcbId)> {
    reserve(state, pid, 1)?
        .pop()
        .ok_or(FdError::TableFull {
            requested: 1,
            available: 0,
        })
}

pub(crate) fn stream_of(state: &KernelState, pid: Pid, fid: Fid) -> FdResult<Stream> {
    let pcb = state.procs.get(pid).ok_or(FdError::NoProcess(pid))?;
    pcb.fidt
        .get(fid)
        .and_then(|fcb| state.files.stream(fcb))
        .ok_or(FdError::InvalidFid(fid))
}

pub(crate) fn socket_of(state: &KernelState, pid: Pid, fid: Fid) -> FdResult<SocketId> {
    match stream_of(state, pid, fid)? {
        Stream::Socket(sid) => Ok(sid),
        _ => Err(FdError::NotSocket(fid)),
    }
}

/// Copy of `parent`'s file id table with every block's refcount raised
pub(crate) fn inherit(state: &mut KernelState, parent: Pid) -> FdResult<FidTable> {
    let fidt = state
        .procs
        .get(parent)
        .map(|pcb| pcb.fidt.clone())
        .ok_or(FdError::NoProcess(parent))?;
    for (_, fcb) in fidt.open() {
        state.files.incref(fcb);
    }
    Ok(fidt)
}

/// Close `fid`; the stream itself closes when its last descriptor does
pub(crate) fn close(state: &mut KernelState, pid: Pid, fid: Fid) -> FdResult<()> {
    let pcb = state.procs.get_mut(pid).ok_or(FdError::NoProcess(pid))?;
    let fcb = pcb.fidt.take(fid).ok_or(FdError::InvalidFid(fid))?;
    debug!(pid, fid, fcb, "file id closed");

    if let Some(stream) = state.files.decref(fcb) {
        close_stream(state, stream);
    }
    Ok(())
}

/// Close every descriptor `pid` still holds
pub(crate) fn close_all(state: &mut KernelState, pid: Pid) {
    let open: Vec<Fid> = match state.procs.get(pid) {
        Some(pcb) => pcb.fidt.open().map(|(fid, _)| fid).collect(),
        None => return,
    };
    for fid in open {
        if let Err(e) = close(state, pid, fid) {
            warn!(pid, fid, error = %e, "failed to close descriptor during teardown");
        }
    }
}

fn close_stream(state: &mut KernelState, stream: Stream) {
    let result = match stream {
        Stream::PipeReader(pipe) => state.pipes.close_reader(pipe).map_err(|e| e.to_string()),
        Stream::PipeWriter(pipe) => state.pipes.close_writer(pipe).map_err(|e| e.to_string()),
        Stream::Socket(sid) => socket::close(state, sid).map_err(|e| e.to_string()),
    };
    // the stream is gone either way; the failure is only worth a log line
    if let Err(e) = result {
        warn!(?stream, error = %e, "stream close failed");
    }
}
