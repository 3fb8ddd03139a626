//! Error and outcome types returned by [`crate::Map`]'s mutating operations.

use std::fmt;

/// Failure modes for [`crate::Map::with_capacity`] and [`crate::Map::insert`].
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// Allocating the slot array or a long-key buffer failed. The map is left
    /// exactly as it was before the call.
    #[error("hash map allocation failed")]
    OutOfMemory,
    /// The caller passed a zero-length key. The empty key is reserved to mark
    /// empty slots, so it is never a valid user key.
    #[error("hash map keys must be non-empty")]
    EmptyKey,
}

/// The result of a successful [`crate::Map::insert`] call.
pub enum InsertOutcome<'a, V> {
    /// The key was new; it was inserted.
    Inserted,
    /// The key already existed. The value passed to `insert` was discarded;
    /// this holds a reference to the value already stored under that key.
    Duplicate(&'a V),
}

impl<'a, V> InsertOutcome<'a, V> {
    /// True if the key was not previously present.
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }

    /// The pre-existing value, if this was a duplicate.
    pub fn duplicate(&self) -> Option<&V> {
        match self {
            InsertOutcome::Duplicate(v) => Some(v),
            InsertOutcome::Inserted => None,
        }
    }
}

impl<'a, V: fmt::Debug> fmt::Debug for InsertOutcome<'a, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertOutcome::Inserted => write!(f, "Inserted"),
            InsertOutcome::Duplicate(v) => f.debug_tuple("Duplicate").field(v).finish(),
        }
    }
}

impl<'a, V: PartialEq> PartialEq for InsertOutcome<'a, V> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (InsertOutcome::Inserted, InsertOutcome::Inserted) => true,
            (InsertOutcome::Duplicate(a), InsertOutcome::Duplicate(b)) => a == b,
            _ => false,
        }
    }
}
