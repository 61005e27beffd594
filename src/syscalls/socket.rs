/*!
 * Socket Syscalls
 */

use super::context::SyscallContext;
use super::types::SyscallResult;
use crate::core::types::{Fid, Port};
use crate::fd::ops as fd;
use crate::ipc::socket::{ops, ShutdownMode, SocketStats};
use std::time::Duration;

impl SyscallContext {
    /// Open an unbound socket; port 0 can connect but never listen
    pub fn socket(&self, port: Port) -> SyscallResult<Fid> {
        let span = self.span("socket");
        let result: SyscallResult<_> = ops::open(&mut self.lock(), self.pid, port).map_err(Into::into);
        span.record_result(&result);
        result
    }

    pub fn listen(&self, fid: Fid) -> SyscallResult<()> {
        let span = self.span("listen");
        let result: SyscallResult<_> = ops::listen(&mut self.lock(), self.pid, fid).map_err(Into::into);
        span.record_result(&result);
        result
    }

    /// Block for the oldest connection request; returns the new peer's file id
    pub fn accept(&self, fid: Fid) -> SyscallResult<Fid> {
        let span = self.span("accept").blocking();
        let result: SyscallResult<_> = ops::accept(&mut self.lock(), self.pid, fid).map_err(Into::into);
        span.record_result(&result);
        result
    }

    /// Connect to the listener on `port`, giving up after `timeout` if set
    pub fn connect(&self, fid: Fid, port: Port, timeout: Option<Duration>) -> SyscallResult<()> {
        let span = self.span("connect").blocking();
        let result: SyscallResult<_> = ops::connect(&mut self.lock(), self.pid, fid, port, timeout).map_err(Into::into);
        span.record_result(&result);
        result
    }

    pub fn shutdown(&self, fid: Fid, mode: ShutdownMode) -> SyscallResult<()> {
        let span = self.span("shutdown");
        let result: SyscallResult<_> = ops::shutdown(&mut self.lock(), self.pid, fid, mode).map_err(Into::into);
        span.record_result(&result);
        result
    }

    pub fn socket_stats(&self, fid: Fid) -> SyscallResult<SocketStats> {
        let guard = self.lock();
        let sid = fd::socket_of(&guard, self.pid, fid)?;
        Ok(guard.sockets.stats(sid)?)
    }
}
