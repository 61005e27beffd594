/*!
 * Pipe Syscalls
 */

use super::context::SyscallContext;
use super::types::{PipePair, SyscallResult};
use crate::core::types::Fid;
use crate::fd::{ops as fd, FdError, Stream};
use crate::ipc::pipe::{PipeOwner, PipeStats};
use tracing::debug;

impl SyscallContext {
    /// Create a pipe and open both of its ends in the calling process
    pub fn pipe(&self) -> SyscallResult<PipePair> {
        let span = self.span("pipe");
        let mut guard = self.lock();
        let result: SyscallResult<_> = fd::reserve(&mut guard, self.pid, 2).map_err(Into::into).map(|reserved| {
            let (read, read_fcb) = reserved[0];
            let (write, write_fcb) = reserved[1];
            let id = guard
                .pipes
                .create(PipeOwner::File(read_fcb), PipeOwner::File(write_fcb));
            guard.files.install(read_fcb, Stream::PipeReader(id));
            guard.files.install(write_fcb, Stream::PipeWriter(id));
            debug!(pid = self.pid, pipe_id = id, read, write, "pipe opened");
            PipePair { read, write }
        });
        span.record_result(&result);
        result
    }

    /// Stats of the pipe behind either end
    pub fn pipe_stats(&self, fid: Fid) -> SyscallResult<PipeStats> {
        let guard = self.lock();
        match fd::stream_of(&guard, self.pid, fid)? {
            Stream::PipeReader(id) | Stream::PipeWriter(id) => Ok(guard.pipes.stats(id)?),
            Stream::Socket(_) => Err(FdError::NotPipe(fid).into()),
        }
    }
}
