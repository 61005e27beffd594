/*!
 * Descriptor Tables
 *
 * `FileTable` is the kernel-wide arena of reference-counted file control
 * blocks; `FidTable` is the per-process map from file id to block. A block is
 * shared by every process that inherited the descriptor and is freed when
 * the last file id naming it closes.
 */

use super::types::Stream;
use crate::core::types::{FcbId, Fid};
use ahash::AHashMap;

#[derive(Debug)]
pub struct FileControlBlock {
    pub refcount: usize,
    /// `None` only between reservation and installation
    pub stream: Option<Stream>,
}

#[derive(Debug, Default)]
pub struct FileTable {
    fcbs: AHashMap<FcbId, FileControlBlock>,
    next_id: FcbId,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh block with one reference and no stream yet
    pub fn alloc(&mut self) -> FcbId {
        self.next_id = self.next_id.wrapping_add(1).max(1);
        let id = self.next_id;
        self.fcbs.insert(
            id,
            FileControlBlock {
                refcount: 1,
                stream: None,
            },
        );
        id
    }

    pub fn install(&mut self, id: FcbId, stream: Stream) {
        if let Some(fcb) = self.fcbs.get_mut(&id) {
            debug_assert!(fcb.stream.is_none(), "fcb {id} installed twice");
            fcb.stream = Some(stream);
        }
    }

    pub fn stream(&self, id: FcbId) -> Option<Stream> {
        self.fcbs.get(&id).and_then(|fcb| fcb.stream)
    }

    pub fn incref(&mut self, id: FcbId) {
        if let Some(fcb) = self.fcbs.get_mut(&id) {
            fcb.refcount += 1;
        }
    }

    /// Drop one reference; yields the stream to close when it was the last
    pub fn decref(&mut self, id: FcbId) -> Option<Stream> {
        let fcb = self.fcbs.get_mut(&id)?;
        fcb.refcount -= 1;
        if fcb.refcount > 0 {
            return None;
        }
        self.fcbs.remove(&id).and_then(|fcb| fcb.stream)
    }

    /// Discard a reserved block that never received a stream
    pub fn remove(&mut self, id: FcbId) {
        self.fcbs.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.fcbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fcbs.is_empty()
    }
}

/// Per-process file id table
#[derive(Debug, Clone)]
pub struct FidTable {
    slots: Vec<Option<FcbId>>,
}

impl FidTable {
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![None; size],
        }
    }

    pub fn get(&self, fid: Fid) -> Option<FcbId> {
        self.slots.get(fid as usize).copied().flatten()
    }

    pub fn set(&mut self, fid: Fid, fcb: FcbId) {
        if let Some(slot) = self.slots.get_mut(fid as usize) {
            *slot = Some(fcb);
        }
    }

    pub fn take(&mut self, fid: Fid) -> Option<FcbId> {
        self.slots.get_mut(fid as usize).and_then(Option::take)
    }

    /// Unused file ids, lowest first
    pub fn free_fids(&self) -> impl Iterator<Item = Fid> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(fid, _)| fid as Fid)
    }

    pub fn open(&self) -> impl Iterator<Item = (Fid, FcbId)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(fid, slot)| slot.map(|fcb| (fid as Fid, fcb)))
    }

    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
