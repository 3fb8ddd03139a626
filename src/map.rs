//! The Robin Hood open-addressing table core.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{InsertOutcome, MapError};
use crate::hash::halfsiphash;
use crate::iter::{Drain, Iter, Keys, Values};
use crate::key::Key;
use crate::slot::Slot;

/// Draws a fresh 64-bit word from the OS CSPRNG, for initial seeding and
/// for reseeding on every rehash.
fn os_random_u64() -> u64 {
    OsRng.next_u64()
}

/// Default initial/minimum capacity used by [`Map::new`].
pub const DEFAULT_CAPACITY: usize = 16;

/// Caps additive growth at ~1 Mi slots per resize step, trading a little
/// extra rehashing on very large tables for a predictable memory spike.
const EXPAND_LIMIT: usize = 1_048_576;

/// Conceptually `u32::MAX / 2` — refuse to grow past this regardless of
/// how the doubling/additive rule would otherwise compute it.
const CAPACITY_CEILING: usize = (u32::MAX as usize) / 2;

enum InsertNoResize {
    Inserted,
    Duplicate(usize),
}

/// A string-keyed Robin Hood hash map with small-string-optimized keys.
///
/// Keys are arbitrary non-empty byte slices, compared byte-wise. Values are
/// owned by the map and dropped along with it. See the crate root for the
/// full contract.
pub struct Map<V> {
    slots: Box<[Slot<V>]>,
    capacity: usize,
    length: usize,
    min_capacity: usize,
    seed: u64,
}

impl<V> Map<V> {
    /// Creates a map with [`DEFAULT_CAPACITY`] slots, seeded from the OS CSPRNG.
    ///
    /// Panics if the initial allocation fails; use [`Map::try_with_capacity`]
    /// to handle that case instead.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a map with at least `capacity` slots, seeded from the OS CSPRNG.
    ///
    /// Panics on allocation failure; see [`Map::try_with_capacity`].
    pub fn with_capacity(capacity: usize) -> Self {
        Self::try_with_capacity(capacity).expect("Map allocation failed")
    }

    /// Fallible form of [`Map::with_capacity`]. `capacity` also becomes the
    /// map's shrink floor (`min_capacity`): the table never rehashes below it.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, MapError> {
        Self::try_with_seed(capacity, os_random_u64())
    }

    /// Like [`Map::try_with_capacity`], but with a caller-supplied seed
    /// instead of an OS CSPRNG draw. Two maps built with the same seed and
    /// fed the same operations in the same order produce identical cached
    /// hashes — useful for reproducible tests, not for anything adversarial
    /// (every rehash still reseeds from the OS CSPRNG, see [`Map::rehash`]).
    pub fn try_with_seed(capacity: usize, seed: u64) -> Result<Self, MapError> {
        let capacity = capacity.max(1);
        let slots = Self::alloc_slots(capacity)?;
        Ok(Map {
            slots,
            capacity,
            length: 0,
            min_capacity: capacity,
            seed,
        })
    }

    fn alloc_slots(capacity: usize) -> Result<Box<[Slot<V>]>, MapError> {
        let mut slots: Vec<Slot<V>> = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| MapError::OutOfMemory)?;
        slots.resize_with(capacity, Slot::empty);
        Ok(slots.into_boxed_slice())
    }

    /// Number of occupied slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    /// True if the map holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Current slot count. Always `>= min_capacity()`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The floor below which the table will never shrink (set at construction).
    #[inline]
    pub fn min_capacity(&self) -> usize {
        self.min_capacity
    }

    #[inline]
    fn hash_bytes(&self, key: &[u8]) -> u32 {
        halfsiphash(key, self.seed)
    }

    /// Looks up `key`, returning a shared reference to its value if present.
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let index = self.find_index(key)?;
        self.slots[index].value.as_ref()
    }

    /// Looks up `key`, returning an exclusive reference to its value if present.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let index = self.find_index(key)?;
        self.slots[index].value.as_mut()
    }

    /// True if `key` is present.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.find_index(key).is_some()
    }

    fn find_index(&self, key: &[u8]) -> Option<usize> {
        if key.is_empty() || self.length == 0 {
            return None;
        }
        let hash = self.hash_bytes(key);
        let mut i = (hash as usize) % self.capacity;
        let mut psl: u16 = 0;

        loop {
            let slot = &self.slots[i];
            if slot.is_empty() || psl > slot.psl {
                return None;
            }
            if slot.hash == hash && slot.key.as_bytes() == key {
                return Some(i);
            }
            psl += 1;
            i = (i + 1) % self.capacity;
        }
    }

    /// Inserts `value` under `key`.
    ///
    /// Returns `InsertOutcome::Duplicate` (holding the existing value) if the
    /// key was already present — the supplied value is then discarded rather
    /// than replacing it. Fails with `MapError::EmptyKey` for a zero-length
    /// key, or `MapError::OutOfMemory` if a required rehash or the key's heap
    /// allocation fails (the map is left unchanged in that case).
    pub fn insert(&mut self, key: &[u8], value: V) -> Result<InsertOutcome<'_, V>, MapError> {
        if key.is_empty() {
            return Err(MapError::EmptyKey);
        }

        self.grow_if_needed()?;

        let hash = self.hash_bytes(key);
        let stored_key = Key::copy_from(key)?;

        match self.insert_no_resize(stored_key, hash, value) {
            InsertNoResize::Inserted => Ok(InsertOutcome::Inserted),
            InsertNoResize::Duplicate(index) => {
                Ok(InsertOutcome::Duplicate(self.slots[index].value.as_ref().unwrap()))
            }
        }
    }

    /// Core Robin Hood insert. Assumes the caller already grew the table if
    /// needed; allocation-free and infallible.
    fn insert_no_resize(&mut self, key: Key, hash: u32, value: V) -> InsertNoResize {
        let mut entry = Slot {
            key,
            hash,
            psl: 0,
            value: Some(value),
        };
        let mut i = (hash as usize) % self.capacity;

        loop {
            if self.slots[i].is_empty() {
                self.slots[i] = entry;
                self.length += 1;
                self.debug_check_psl(i);
                return InsertNoResize::Inserted;
            }

            if self.slots[i].hash == entry.hash && self.slots[i].key.as_bytes() == entry.key.as_bytes() {
                return InsertNoResize::Duplicate(i);
            }

            if entry.psl > self.slots[i].psl {
                std::mem::swap(&mut entry, &mut self.slots[i]);
                self.debug_check_psl(i);
            }

            entry.psl += 1;
            i = (i + 1) % self.capacity;
        }
    }

    /// Removes `key`, returning its value if present. A shrink attempted
    /// afterward that fails to allocate is logged and otherwise ignored —
    /// the removal itself has already succeeded and must not be unwound.
    pub fn remove(&mut self, key: &[u8]) -> Option<V> {
        let index = self.find_index(key)?;

        let (_removed_key, value) = self.slots[index].take();
        self.length -= 1;
        self.backward_shift(index);

        if self.length > self.min_capacity && Self::should_shrink(self.length, self.capacity) {
            let new_capacity = (self.capacity / 2).max(self.min_capacity);
            if let Err(err) = self.rehash(new_capacity) {
                log::warn!(
                    "shrink rehash to {} slots failed ({:?}); keeping capacity {}",
                    new_capacity,
                    err,
                    self.capacity
                );
            }
        }

        Some(value)
    }

    /// Shifts subsequent displaced entries back to close the gap left at
    /// `empty`, preserving the PSL invariant without tombstones.
    fn backward_shift(&mut self, mut empty: usize) {
        loop {
            let next = (empty + 1) % self.capacity;
            if self.slots[next].is_empty() || self.slots[next].psl == 0 {
                break;
            }
            self.slots[next].psl -= 1;
            self.slots.swap(empty, next);
            self.debug_check_psl(empty);
            empty = next;
        }
    }

    fn should_grow(length: usize, capacity: usize) -> bool {
        // length > capacity * 885/1024, computed in u128 to dodge overflow.
        (length as u128) > ((capacity as u128) * 885) >> 10
    }

    fn should_shrink(length: usize, capacity: usize) -> bool {
        (length as u128) < ((capacity as u128) * 403) >> 10
    }

    fn grow_if_needed(&mut self) -> Result<(), MapError> {
        if !Self::should_grow(self.length, self.capacity) {
            return Ok(());
        }
        let doubled = self.capacity.saturating_mul(2);
        let additive_limit = self.capacity.saturating_add(EXPAND_LIMIT);
        let new_capacity = doubled.min(additive_limit);
        self.rehash(new_capacity)
    }

    /// Reallocates the slot array to `new_capacity`, reseeds, and reinserts
    /// every occupied slot. Leaves the map untouched if allocation fails.
    fn rehash(&mut self, new_capacity: usize) -> Result<(), MapError> {
        if new_capacity > CAPACITY_CEILING {
            return Err(MapError::OutOfMemory);
        }

        let new_slots = Self::alloc_slots(new_capacity)?;

        log::trace!(
            "rehashing map: {} -> {} slots ({} entries)",
            self.capacity,
            new_capacity,
            self.length
        );

        let old_slots = std::mem::replace(&mut self.slots, new_slots);
        self.capacity = new_capacity;
        self.length = 0;
        self.seed ^= os_random_u64();

        for slot in Vec::from(old_slots) {
            if slot.is_empty() {
                continue;
            }
            let Slot { key, hash, value, .. } = slot;
            let value = value.expect("occupied slot always holds a value");
            match self.insert_no_resize(key, hash, value) {
                InsertNoResize::Inserted => {}
                InsertNoResize::Duplicate(_) => {
                    unreachable!("rehash must not encounter a duplicate of an existing key")
                }
            }
        }

        Ok(())
    }

    #[cfg(debug_assertions)]
    fn debug_check_psl(&self, index: usize) {
        let slot = &self.slots[index];
        if slot.is_empty() {
            return;
        }
        let home = (slot.hash as usize) % self.capacity;
        let distance = if index >= home {
            index - home
        } else {
            self.capacity - home + index
        };
        debug_assert_eq!(
            distance,
            slot.psl as usize,
            "PSL invariant violated at slot {index}"
        );
    }

    #[cfg(not(debug_assertions))]
    #[inline(always)]
    fn debug_check_psl(&self, _index: usize) {}

    /// Advances a raw cursor to the next occupied slot's key.
    ///
    /// Returns `(next_cursor, key)`; pass `0` to start, keep passing back the
    /// returned cursor, stop on `None`. See [`Map::keys`] for the
    /// `Iterator`-based alternative.
    pub fn next_key(&self, cursor: usize) -> Option<(usize, &[u8])> {
        self.scan_from(cursor).map(|i| (i + 1, self.slots[i].key.as_bytes()))
    }

    /// Advances a raw cursor to the next occupied slot's value. See [`Map::next_key`].
    pub fn next_value(&self, cursor: usize) -> Option<(usize, &V)> {
        self.scan_from(cursor)
            .map(|i| (i + 1, self.slots[i].value.as_ref().unwrap()))
    }

    /// Advances a raw cursor to the next occupied slot's key and value. See [`Map::next_key`].
    pub fn next_kv(&self, cursor: usize) -> Option<(usize, &[u8], &V)> {
        self.scan_from(cursor).map(|i| {
            (
                i + 1,
                self.slots[i].key.as_bytes(),
                self.slots[i].value.as_ref().unwrap(),
            )
        })
    }

    fn scan_from(&self, cursor: usize) -> Option<usize> {
        (cursor..self.capacity).find(|&i| !self.slots[i].is_empty())
    }

    /// A borrowing iterator over `(key, value)` pairs. Order is unspecified.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(self)
    }

    /// A borrowing iterator over keys. Order is unspecified.
    pub fn keys(&self) -> Keys<'_, V> {
        Keys::new(self)
    }

    /// A borrowing iterator over values. Order is unspecified.
    pub fn values(&self) -> Values<'_, V> {
        Values::new(self)
    }

    /// Removes and returns every entry, leaving the map empty. Entries not
    /// yet yielded when the returned iterator is dropped are discarded.
    pub fn drain(&mut self) -> Drain<'_, V> {
        Drain::new(self)
    }

    pub(crate) fn slot_is_empty(&self, index: usize) -> bool {
        self.slots[index].is_empty()
    }

    pub(crate) fn take_slot(&mut self, index: usize) -> (Key, V) {
        let (key, value) = self.slots[index].take();
        self.length -= 1;
        (key, value)
    }
}

impl<V> Default for Map<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for Map<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (String::from_utf8_lossy(k).into_owned(), v)))
            .finish()
    }
}

impl<'a, V> IntoIterator for &'a Map<V> {
    type Item = (&'a [u8], &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
