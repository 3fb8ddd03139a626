//! A string-keyed Robin Hood open-addressing hash map.
//!
//! [`Map<V>`] maps variable-length byte-string keys to owned values, built
//! around an open-addressed Robin Hood table with backward-shift deletion
//! and small-string-optimized (SSO) key storage: keys shorter than a
//! pointer's worth of bytes are stored inline, longer ones get an owned
//! heap buffer. Capacity grows and shrinks automatically from a single
//! load-factor rule, and the table reseeds its internal keyed hash on every
//! resize to frustrate collision-based denial-of-service attacks.
//!
//! This is not a cache: there is no eviction policy, no TTL, and no
//! replace-on-duplicate-insert. It is not thread-safe: use external
//! synchronization if you need to share a `Map` across threads. Iteration
//! order is unspecified and not stable across mutation.
//!
//! ```
//! use rhmap::Map;
//!
//! let mut map = Map::new();
//! assert!(map.insert(b"abc", 1).unwrap().is_inserted());
//! assert_eq!(map.get(b"abc"), Some(&1));
//! assert_eq!(map.remove(b"abc"), Some(1));
//! ```

mod error;
mod hash;
mod iter;
mod key;
mod map;
mod slot;

pub use error::{InsertOutcome, MapError};
pub use iter::{Drain, Iter, Keys, Values};
pub use map::{Map, DEFAULT_CAPACITY};
