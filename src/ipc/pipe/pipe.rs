/*!
 * Pipe Control Block
 * Bounded byte channel backed by a ringbuf circular buffer
 */

use super::types::{PipeOwner, PipeStats};
use crate::core::sync::CondVar;
use crate::core::types::{PipeId, Size};
use ringbuf::{traits::*, HeapRb};

pub struct PipeControlBlock {
    pub id: PipeId,
    /// Ring buffer for the in-flight bytes, FIFO order
    buffer: HeapRb<u8>,
    /// `None` once the read half is closed
    pub reader: Option<PipeOwner>,
    /// `None` once the write half is closed
    pub writer: Option<PipeOwner>,
    pub has_data: CondVar,
    pub has_space: CondVar,
}

impl std::fmt::Debug for PipeControlBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeControlBlock")
            .field("id", &self.id)
            .field("buffered_bytes", &self.buffer.occupied_len())
            .field("capacity", &self.capacity())
            .field("reader", &self.reader)
            .field("writer", &self.writer)
            .finish()
    }
}

impl PipeControlBlock {
    /// `ring_size` counts the slot a cursor-based ring keeps free, so the
    /// channel holds `ring_size - 1` bytes
    pub fn new(id: PipeId, ring_size: Size, reader: PipeOwner, writer: PipeOwner) -> Self {
        debug_assert!(ring_size >= 2, "pipe ring must hold at least one byte");
        Self {
            id,
            buffer: HeapRb::<u8>::new(ring_size - 1),
            reader: Some(reader),
            writer: Some(writer),
            has_data: CondVar::new(),
            has_space: CondVar::new(),
        }
    }

    pub fn capacity(&self) -> Size {
        self.buffer.capacity().get()
    }

    pub fn buffered(&self) -> Size {
        self.buffer.occupied_len()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Copy as much of `data` as fits, returning the count taken
    pub fn push(&mut self, data: &[u8]) -> Size {
        self.buffer.push_slice(data)
    }

    /// Drain up to `out.len()` bytes, returning the count copied
    pub fn pop(&mut self, out: &mut [u8]) -> Size {
        self.buffer.pop_slice(out)
    }

    /// Both halves closed: storage may go
    pub fn is_released(&self) -> bool {
        self.reader.is_none() && self.writer.is_none()
    }

    pub fn stats(&self) -> PipeStats {
        PipeStats {
            id: self.id,
            capacity: self.capacity(),
            buffered: self.buffered(),
            reader: self.reader,
            writer: self.writer,
        }
    }
}
