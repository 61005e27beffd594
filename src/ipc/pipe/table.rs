/*!
 * Pipe Table
 *
 * Owns every live pipe control block and implements the blocking channel
 * operations. Blocking calls take the kernel lock guard so they can sleep on
 * the pipe's condition variables; they re-resolve the pipe by id after every
 * wake because both halves may have closed (and the block been released)
 * while the caller slept.
 */

use super::pipe::PipeControlBlock;
use super::types::{PipeEnd, PipeError, PipeOwner, PipeResult, PipeStats};
use crate::core::types::{PipeId, Size};
use ahash::AHashMap;
use parking_lot::MutexGuard;
use tracing::debug;

pub struct PipeTable {
    pipes: AHashMap<PipeId, PipeControlBlock>,
    next_id: PipeId,
    ring_size: Size,
}

impl PipeTable {
    pub fn new(ring_size: Size) -> Self {
        Self {
            pipes: AHashMap::new(),
            next_id: 1,
            ring_size,
        }
    }

    pub fn create(&mut self, reader: PipeOwner, writer: PipeOwner) -> PipeId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.pipes
            .insert(id, PipeControlBlock::new(id, self.ring_size, reader, writer));
        debug!(pipe_id = id, ?reader, ?writer, "pipe created");
        id
    }

    pub fn get(&self, id: PipeId) -> PipeResult<&PipeControlBlock> {
        self.pipes.get(&id).ok_or(PipeError::NotFound(id))
    }

    pub fn get_mut(&mut self, id: PipeId) -> PipeResult<&mut PipeControlBlock> {
        self.pipes.get_mut(&id).ok_or(PipeError::NotFound(id))
    }

    pub fn stats(&self, id: PipeId) -> PipeResult<PipeStats> {
        self.get(id).map(PipeControlBlock::stats)
    }

    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }

    /// Close the read half and wake every sleeper on the pipe
    ///
    /// Writers see it gone; a reader still parked on this half sees its own end closed.
    pub fn close_reader(&mut self, id: PipeId) -> PipeResult<()> {
        let pipe = self.get_mut(id)?;
        pipe.reader = None;
        pipe.has_data.broadcast();
        pipe.has_space.broadcast();
        self.release_if_unused(id);
        Ok(())
    }

    /// Close the write half and wake every sleeper on the pipe
    ///
    /// Readers see end-of-stream; a writer still parked on this half sees its own end closed.
    pub fn close_writer(&mut self, id: PipeId) -> PipeResult<()> {
        let pipe = self.get_mut(id)?;
        pipe.writer = None;
        pipe.has_data.broadcast();
        pipe.has_space.broadcast();
        self.release_if_unused(id);
        Ok(())
    }

    fn release_if_unused(&mut self, id: PipeId) {
        if self.pipes.get(&id).is_some_and(PipeControlBlock::is_released) {
            self.pipes.remove(&id);
            debug!(pipe_id = id, "pipe released");
        }
    }
}

impl AsMut<PipeTable> for PipeTable {
    fn as_mut(&mut self) -> &mut PipeTable {
        self
    }
}

#[inline]
fn table<'a, S: AsMut<PipeTable>>(guard: &'a mut MutexGuard<'_, S>) -> &'a mut PipeTable {
    AsMut::<PipeTable>::as_mut(&mut **guard)
}

/// Copy all of `buf` into the channel, sleeping while it is full
///
/// Fails once the reader is gone; bytes copied before that stay in the pipe.
pub fn write<S: AsMut<PipeTable>>(
    guard: &mut MutexGuard<'_, S>,
    id: PipeId,
    buf: &[u8],
) -> PipeResult<Size> {
    let mut written = 0;
    loop {
        // a vanished pipe means our own half was closed under us too
        let Ok(pipe) = table(guard).get_mut(id) else {
            return Err(PipeError::EndClosed(PipeEnd::Write));
        };
        if pipe.writer.is_none() {
            return Err(PipeError::EndClosed(PipeEnd::Write));
        }
        if pipe.reader.is_none() {
            return Err(PipeError::BrokenPipe);
        }
        if written == buf.len() {
            return Ok(written);
        }
        if pipe.is_full() {
            let has_space = pipe.has_space.clone();
            has_space.wait(guard);
            continue;
        }
        written += pipe.push(&buf[written..]);
        pipe.has_data.broadcast();
    }
}

/// Fill `buf` from the channel, sleeping while it is empty and a writer remains
///
/// Returns 0 at end-of-stream. If the writer closes part-way, returns the
/// short count once the buffer has drained.
pub fn read<S: AsMut<PipeTable>>(
    guard: &mut MutexGuard<'_, S>,
    id: PipeId,
    buf: &mut [u8],
) -> PipeResult<Size> {
    let mut copied = 0;
    loop {
        let Ok(pipe) = table(guard).get_mut(id) else {
            return short_read(copied);
        };
        if pipe.reader.is_none() {
            return short_read(copied);
        }
        if copied == buf.len() {
            return Ok(copied);
        }
        if pipe.is_empty() {
            if pipe.writer.is_none() {
                return Ok(copied);
            }
            let has_data = pipe.has_data.clone();
            has_data.wait(guard);
            continue;
        }
        copied += pipe.pop(&mut buf[copied..]);
        pipe.has_space.broadcast();
    }
}

fn short_read(copied: Size) -> PipeResult<Size> {
    if copied > 0 {
        Ok(copied)
    } else {
        Err(PipeError::EndClosed(PipeEnd::Read))
    }
}
