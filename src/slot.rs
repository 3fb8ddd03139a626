//! A single table slot: key, cached hash, probe sequence length, and value.

use crate::key::Key;

/// One slot in the table's backing array.
///
/// Occupancy is determined solely by `key.is_empty()`; there is no separate
/// tombstone state (removal uses backward-shift, not tombstoning).
pub struct Slot<V> {
    pub key: Key,
    pub hash: u32,
    pub psl: u16,
    pub value: Option<V>,
}

impl<V> Slot<V> {
    /// An empty slot.
    pub fn empty() -> Self {
        Slot {
            key: Key::empty(),
            hash: 0,
            psl: 0,
            value: None,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }

    /// Resets this slot to empty, returning the key and value it held.
    ///
    /// Panics if the slot was already empty — callers only ever clear an
    /// occupied slot.
    pub fn take(&mut self) -> (Key, V) {
        debug_assert!(!self.is_empty(), "taking from an already-empty slot");
        let key = self.key.take();
        self.psl = 0;
        self.hash = 0;
        let value = self.value.take().expect("occupied slot always holds a value");
        (key, value)
    }
}
