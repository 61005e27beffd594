/*!
 * Descriptor Syscalls
 * read/write/close on any file id, dispatched on the stream behind it
 */

use super::context::SyscallContext;
use super::types::SyscallResult;
use crate::core::types::{Fid, Size};
use crate::fd::{ops as fd, FdError, Stream};
use crate::ipc::{pipe, socket};

impl SyscallContext {
    /// Read into `buf`, blocking until it is full or the writer is gone
    ///
    /// Returns 0 at end-of-stream.
    pub fn read(&self, fid: Fid, buf: &mut [u8]) -> SyscallResult<Size> {
        let span = self.span("read").blocking();
        let mut guard = self.lock();
        let result: SyscallResult<_> = match fd::stream_of(&guard, self.pid, fid) {
            Ok(Stream::PipeReader(id)) => pipe::table::read(&mut guard, id, buf).map_err(Into::into),
            Ok(Stream::Socket(sid)) => socket::ops::read(&mut guard, sid, buf).map_err(Into::into),
            Ok(Stream::PipeWriter(_)) => Err(FdError::NotReadable(fid).into()),
            Err(e) => Err(e.into()),
        };
        span.record_result(&result);
        result
    }

    /// Write all of `buf`, blocking while the channel is full
    pub fn write(&self, fid: Fid, buf: &[u8]) -> SyscallResult<Size> {
        let span = self.span("write").blocking();
        let mut guard = self.lock();
        let result: SyscallResult<_> = match fd::stream_of(&guard, self.pid, fid) {
            Ok(Stream::PipeWriter(id)) => pipe::table::write(&mut guard, id, buf).map_err(Into::into),
            Ok(Stream::Socket(sid)) => socket::ops::write(&mut guard, sid, buf).map_err(Into::into),
            Ok(Stream::PipeReader(_)) => Err(FdError::NotWritable(fid).into()),
            Err(e) => Err(e.into()),
        };
        span.record_result(&result);
        result
    }

    pub fn close(&self, fid: Fid) -> SyscallResult<()> {
        let span = self.span("close");
        let result: SyscallResult<_> = fd::close(&mut self.lock(), self.pid, fid).map_err(Into::into);
        span.record_result(&result);
        result
    }
}
