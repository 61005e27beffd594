/*!
 * Thread and Process Lifecycle
 *
 * Join/detach/exit state machine for thread control blocks, and the process
 * teardown that runs when the last thread of a process exits: descriptors
 * close, children move to init, and the parent is told.
 *
 * Everything here runs under the kernel lock. The blocking calls take the
 * guard itself so they can sleep on a condition variable.
 */

use super::thread::ThreadStart;
use super::types::{ProcessError, ProcessResult, ProcessState, ThreadError, ThreadResult};
use crate::core::limits::INIT_PID;
use crate::core::types::{ExitValue, Pid, Tid};
use crate::fd::ops as fd;
use crate::kernel::{BootPhase, KernelGuard, KernelState};
use tracing::{debug, info, warn};

/// Add a runnable thread control block to `pid`
pub(crate) fn register_thread(
    state: &mut KernelState,
    pid: Pid,
    start: ThreadStart,
) -> ThreadResult<Tid> {
    if state.procs.get(pid).is_none() {
        return Err(ThreadError::SpawnFailed(format!("process {pid} is gone")));
    }
    let tid = state.threads.insert(pid, start);
    if let Some(pcb) = state.procs.get_mut(pid) {
        pcb.thread_count += 1;
        pcb.threads.push(tid);
    }
    debug!(pid, tid, "thread created");
    Ok(tid)
}

/// Undo `register_thread` for a thread that never ran
pub(crate) fn unregister_thread(state: &mut KernelState, pid: Pid, tid: Tid) {
    state.threads.remove(tid);
    if let Some(pcb) = state.procs.get_mut(pid) {
        pcb.thread_count = pcb.thread_count.saturating_sub(1);
        pcb.threads.retain(|t| *t != tid);
    }
}

fn reclaim_thread(state: &mut KernelState, tid: Tid) {
    let Some(tcb) = state.threads.remove(tid) else {
        return;
    };
    if let Some(pcb) = state.procs.get_mut(tcb.pid) {
        pcb.threads.retain(|t| *t != tid);
    }
    debug!(pid = tcb.pid, tid, exitval = tcb.exitval, "thread reclaimed");
}

/// Wait for `target` to exit and collect its exit value
///
/// Fails immediately for a detached target, and fails after waking if the
/// target gets detached while we wait. The first joiner to leave after the
/// target exited reclaims its control block.
pub(crate) fn join(
    guard: &mut KernelGuard<'_>,
    pid: Pid,
    caller: Tid,
    target: Tid,
) -> ThreadResult<ExitValue> {
    let tcb = guard
        .threads
        .owned_by(target, pid)
        .ok_or(ThreadError::InvalidTid(target))?;
    if target == caller {
        return Err(ThreadError::SelfJoin(target));
    }
    if tcb.detached {
        return Err(ThreadError::Detached(target));
    }
    tcb.refcount += 1;

    loop {
        // pinned by our refcount, so the block cannot vanish while we sleep
        let Some(tcb) = guard.threads.get(target) else {
            return Err(ThreadError::InvalidTid(target));
        };
        if tcb.exited || tcb.detached {
            break;
        }
        let exit_cv = tcb.exit_cv.clone();
        exit_cv.wait(guard);
    }

    let state: &mut KernelState = guard;
    let Some(tcb) = state.threads.get_mut(target) else {
        return Err(ThreadError::InvalidTid(target));
    };
    tcb.refcount -= 1;
    let result = if tcb.detached {
        Err(ThreadError::Detached(target))
    } else {
        Ok(tcb.exitval)
    };
    if tcb.is_reclaimable() {
        reclaim_thread(state, target);
    }
    result
}

/// Give up the right to join `target`; current joiners are woken and fail
pub(crate) fn detach(state: &mut KernelState, pid: Pid, target: Tid) -> ThreadResult<()> {
    let tcb = state
        .threads
        .owned_by(target, pid)
        .ok_or(ThreadError::InvalidTid(target))?;
    if tcb.exited {
        return Err(ThreadError::AlreadyExited(target));
    }
    tcb.detached = true;
    tcb.exit_cv.broadcast();
    debug!(pid, tid = target, joiners = tcb.refcount, "thread detached");
    Ok(())
}

/// Record `value` as the exit value of the whole process
pub(crate) fn set_exitval(state: &mut KernelState, pid: Pid, value: ExitValue) {
    if let Some(pcb) = state.procs.get_mut(pid) {
        pcb.exitval = value;
    }
}

/// Mark `tid` exited; tears the process down if it was the last thread
pub(crate) fn exit_thread(guard: &mut KernelGuard<'_>, pid: Pid, tid: Tid, value: ExitValue) {
    let state: &mut KernelState = guard;
    let Some(tcb) = state.threads.get_mut(tid) else {
        warn!(pid, tid, "exiting thread has no control block");
        return;
    };
    if tcb.exited {
        return;
    }
    tcb.exitval = value;
    tcb.exited = true;
    tcb.exit_cv.broadcast();
    if tcb.detached && tcb.refcount == 0 {
        reclaim_thread(state, tid);
    }
    debug!(pid, tid, exitval = value, "thread exited");

    let remaining = match state.procs.get_mut(pid) {
        Some(pcb) => {
            pcb.thread_count -= 1;
            pcb.thread_count
        }
        None => return,
    };
    if remaining == 0 {
        teardown(guard, pid);
    }
}

/// Release everything `pid` owns once its last thread is gone
fn teardown(guard: &mut KernelGuard<'_>, pid: Pid) {
    if pid == INIT_PID {
        // init outlives every other process
        while let Ok((child, exitval)) = wait_child(guard, pid, None) {
            debug!(child, exitval, "init reaped process during shutdown");
        }
    }

    let state: &mut KernelState = guard;
    if let Some(pcb) = state.procs.get_mut(pid) {
        pcb.args = None;
    }
    fd::close_all(state, pid);

    let Some(pcb) = state.procs.get_mut(pid) else {
        return;
    };
    let threads = std::mem::take(&mut pcb.threads);
    let children = std::mem::take(&mut pcb.children);
    let exited = std::mem::take(&mut pcb.exited);
    let parent = pcb.parent;
    let exitval = pcb.exitval;
    pcb.state = ProcessState::Zombie;
    for tid in threads {
        state.threads.remove(tid);
    }

    if pid == INIT_PID {
        state.phase = BootPhase::Halted;
        state.halted.broadcast();
        info!(exitval, "init exited, kernel halted");
        return;
    }

    let orphans = children.len();
    for child in &children {
        if let Some(child) = state.procs.get_mut(*child) {
            child.parent = Some(INIT_PID);
        }
    }
    if let Some(init) = state.procs.get_mut(INIT_PID) {
        init.children.extend(children);
        init.exited.extend(exited);
        init.child_exit.broadcast();
    }

    match parent.and_then(|ppid| state.procs.get_mut(ppid)) {
        Some(parent) => {
            parent.exited.push_back(pid);
            parent.child_exit.broadcast();
        }
        None => warn!(pid, "zombie has no parent to collect it"),
    }
    info!(pid, ppid = ?parent, exitval, orphans, "process exited");
}

/// Wait for a child to become a zombie, then reap it
///
/// `None` takes whichever child exited first.
pub(crate) fn wait_child(
    guard: &mut KernelGuard<'_>,
    pid: Pid,
    target: Option<Pid>,
) -> ProcessResult<(Pid, ExitValue)> {
    loop {
        let pcb = guard.procs.get(pid).ok_or(ProcessError::NotFound(pid))?;
        let ready = match target {
            Some(child) => {
                if !pcb.children.contains(&child) {
                    return Err(ProcessError::NotChild(child));
                }
                guard
                    .procs
                    .get(child)
                    .is_some_and(|c| c.is_zombie())
                    .then_some(child)
            }
            None => {
                if pcb.children.is_empty() {
                    return Err(ProcessError::NoChildren);
                }
                pcb.exited.front().copied()
            }
        };
        if let Some(child) = ready {
            return Ok(reap(guard, pid, child));
        }

        let child_exit = pcb.child_exit.clone();
        child_exit.wait(guard);
    }
}

fn reap(state: &mut KernelState, parent: Pid, child: Pid) -> (Pid, ExitValue) {
    if let Some(pcb) = state.procs.get_mut(parent) {
        pcb.forget_child(child);
    }
    let exitval = state.procs.release(child).map_or(0, |pcb| pcb.exitval);
    debug!(parent, child, exitval, "child reaped");
    (child, exitval)
}

/// Create the control block for a child of `parent`, inheriting its
/// descriptors. The caller starts the main thread.
pub(crate) fn create_process(
    state: &mut KernelState,
    parent: Pid,
    args: Vec<u8>,
) -> ProcessResult<Pid> {
    if state.procs.get(parent).is_none() {
        return Err(ProcessError::NotFound(parent));
    }
    let pid = state.procs.alloc(Some(parent), args)?;
    let fidt = match fd::inherit(state, parent) {
        Ok(fidt) => fidt,
        Err(_) => {
            state.procs.release(pid);
            return Err(ProcessError::NotFound(parent));
        }
    };
    if let Some(pcb) = state.procs.get_mut(pid) {
        pcb.fidt = fidt;
    }
    if let Some(pcb) = state.procs.get_mut(parent) {
        pcb.children.push(pid);
    }
    Ok(pid)
}

/// Undo `create_process` for a child whose main thread never started
pub(crate) fn abandon_process(state: &mut KernelState, parent: Pid, pid: Pid) {
    fd::close_all(state, pid);
    if let Some(pcb) = state.procs.get_mut(parent) {
        pcb.forget_child(pid);
    }
    state.procs.release(pid);
}
