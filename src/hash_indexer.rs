use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::error::Result;
use crate::error::TableError;

/// A key that can be stored in one of the tables.
///
/// Beyond `Hash + Eq`, a key may be *absent*: a placeholder that names no
/// entry. Absent keys are rejected with [`TableError::InvalidKey`] by every
/// operation and are never stored. The only absent keys provided by this
/// crate are `None` values of `Option<T>` (and tuples or references that
/// contain one), which is how a caller spells a nullable key.
///
/// Custom key types opt in with an empty impl:
///
/// ```rust
/// use bucket_hash::TableKey;
///
/// #[derive(Hash, PartialEq, Eq)]
/// struct Coordinate(i32, i32);
///
/// impl TableKey for Coordinate {}
///
/// assert!(!Coordinate(1, 2).is_absent());
/// assert!(None::<u32>.is_absent());
/// ```
pub trait TableKey: Hash + Eq {
    /// Returns `true` if this key names no entry.
    #[inline]
    fn is_absent(&self) -> bool {
        false
    }
}

macro_rules! present_keys {
    ($($ty:ty),* $(,)?) => {
        $(impl TableKey for $ty {})*
    };
}

present_keys!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char, (), str, String,
);

impl<T: TableKey + ?Sized> TableKey for &T {
    #[inline]
    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<T: TableKey + ?Sized> TableKey for Box<T> {
    #[inline]
    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<T: TableKey + ?Sized> TableKey for Rc<T> {
    #[inline]
    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<T: TableKey + ?Sized> TableKey for Arc<T> {
    #[inline]
    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<T: TableKey> TableKey for Option<T> {
    #[inline]
    fn is_absent(&self) -> bool {
        self.as_ref().is_none_or(|key| key.is_absent())
    }
}

impl<T: Hash + Eq> TableKey for Vec<T> {}

impl<T: Hash + Eq, const N: usize> TableKey for [T; N] {}

impl<A: TableKey, B: TableKey> TableKey for (A, B) {
    #[inline]
    fn is_absent(&self) -> bool {
        self.0.is_absent() || self.1.is_absent()
    }
}

impl<A: TableKey, B: TableKey, C: TableKey> TableKey for (A, B, C) {
    #[inline]
    fn is_absent(&self) -> bool {
        self.0.is_absent() || self.1.is_absent() || self.2.is_absent()
    }
}

/// Magnitude of a hash read as a signed 64-bit integer.
///
/// `i64::MIN` maps to `2^63` rather than overflowing.
#[inline(always)]
pub fn magnitude(hash: u64) -> u64 {
    (hash as i64).unsigned_abs()
}

/// Home index of `hash` in a table of `capacity` buckets.
#[inline(always)]
pub fn home_index(hash: u64, capacity: usize) -> usize {
    debug_assert!(capacity > 0, "home index into an empty table");
    (magnitude(hash) % capacity as u64) as usize
}

/// Step between probes for double hashing: `1 + magnitude(hash) mod (c - 1)`.
///
/// Never zero. A single-slot table steps by one.
#[inline(always)]
pub fn double_hash_step(hash: u64, capacity: usize) -> usize {
    if capacity <= 1 {
        1
    } else {
        1 + (magnitude(hash) % (capacity as u64 - 1)) as usize
    }
}

/// Maps keys to buckets for a given hasher.
///
/// Every table owns one `HashIndexer`; equal keys hash identically for the
/// lifetime of that table.
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "std")]
/// # {
/// use std::hash::RandomState;
///
/// use bucket_hash::HashIndexer;
/// use bucket_hash::TableError;
///
/// let indexer = HashIndexer::new(RandomState::new());
/// let index = indexer.bucket(&"apple", 16).unwrap();
/// assert!(index < 16);
/// assert_eq!(indexer.bucket(&"apple", 16), Ok(index));
/// assert_eq!(indexer.bucket(&None::<&str>, 16), Err(TableError::InvalidKey));
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct HashIndexer<S> {
    hash_builder: S,
}

impl<S: BuildHasher> HashIndexer<S> {
    /// Creates an indexer around `hash_builder`.
    pub fn new(hash_builder: S) -> Self {
        Self { hash_builder }
    }

    /// The hasher builder keys are hashed with.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Hashes a key, rejecting absent keys.
    #[inline]
    pub fn hash<K: TableKey + ?Sized>(&self, key: &K) -> Result<u64> {
        if key.is_absent() {
            return Err(TableError::InvalidKey);
        }
        Ok(self.hash_builder.hash_one(key))
    }

    /// Home index of `key` in a table of `capacity` buckets.
    #[inline]
    pub fn bucket<K: TableKey + ?Sized>(&self, key: &K, capacity: usize) -> Result<usize> {
        Ok(home_index(self.hash(key)?, capacity))
    }
}
