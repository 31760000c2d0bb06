use core::fmt::Debug;
use core::hash::BuildHasher;

use crate::DefaultHashBuilder;
use crate::chained_table;
use crate::chained_table::ChainedTable;
use crate::direct_table;
use crate::direct_table::DirectTable;
use crate::error::Result;
use crate::hash_indexer::TableKey;
use crate::probing_table;
use crate::probing_table::ProbeStrategy;
use crate::probing_table::ProbingTable;

/// The associative-mapping contract shared by every table.
///
/// Each table also exposes these operations as inherent methods; the trait
/// exists so callers can be generic over the collision policy.
pub trait Mapping<K, V> {
    /// Iterator returned by [`iter`](Mapping::iter).
    type Iter<'a>: Iterator<Item = (&'a K, &'a V)>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    /// Returns the value stored for `key`, or
    /// [`TableError::NotFound`](crate::TableError::NotFound).
    fn get(&self, key: &K) -> Result<&V>;

    /// Returns the value stored for `key`, or `None` if absent.
    fn try_get(&self, key: &K) -> Result<Option<&V>>;

    /// Inserts or updates `key`, returning the previous value.
    fn set(&mut self, key: K, value: V) -> Result<Option<V>>;

    /// Inserts `key`, failing with
    /// [`TableError::DuplicateKey`](crate::TableError::DuplicateKey) if
    /// present.
    fn add(&mut self, key: K, value: V) -> Result<()>;

    /// Removes `key`, returning whether it was present.
    fn remove(&mut self, key: &K) -> Result<bool>;

    /// Returns `true` if `key` is stored.
    fn contains_key(&self, key: &K) -> Result<bool>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Returns `true` if no entries are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of buckets or slots.
    fn capacity(&self) -> usize;

    /// Removes every entry.
    fn clear(&mut self);

    /// Iterates over the stored pairs. Each call starts from the current
    /// state of the table.
    fn iter(&self) -> Self::Iter<'_>;

    /// Home index of `key` under the current capacity.
    fn bucket_index_for(&self, key: &K) -> Result<usize>;

    /// Upserts every pair from `iter`, stopping at the first error.
    ///
    /// Pairs stored before the error stay stored.
    fn try_extend<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        Self: Sized,
    {
        for (key, value) in iter {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// Which collision policy an [`AnyTable`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Separate chaining.
    Chained,
    /// Open addressing with the given probe strategy.
    Probing(ProbeStrategy),
    /// Direct slots, collisions rejected.
    Direct,
}

/// One of the three tables, chosen at runtime.
///
/// # Examples
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use bucket_hash::AnyTable;
/// use bucket_hash::Mapping;
/// use bucket_hash::ProbeStrategy;
/// use bucket_hash::TableKind;
///
/// for kind in [
///     TableKind::Chained,
///     TableKind::Probing(ProbeStrategy::Quadratic),
///     TableKind::Direct,
/// ] {
///     let mut table: AnyTable<u32, &str> = AnyTable::new(kind);
///     table.set(7, "seven").unwrap();
///     assert_eq!(table.get(&7), Ok(&"seven"));
///     assert_eq!(table.kind(), kind);
/// }
/// # }
/// ```
#[derive(Clone)]
pub enum AnyTable<K, V, S = DefaultHashBuilder> {
    /// A [`ChainedTable`].
    Chained(ChainedTable<K, V, S>),
    /// A [`ProbingTable`].
    Probing(ProbingTable<K, V, S>),
    /// A [`DirectTable`].
    Direct(DirectTable<K, V, S>),
}

macro_rules! dispatch {
    ($self:expr, $table:ident => $body:expr) => {
        match $self {
            AnyTable::Chained($table) => $body,
            AnyTable::Probing($table) => $body,
            AnyTable::Direct($table) => $body,
        }
    };
}

impl<K, V, S> Debug for AnyTable<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        dispatch!(self, table => table.fmt(f))
    }
}

impl<K, V, S> AnyTable<K, V, S>
where
    K: TableKey,
    S: BuildHasher,
{
    /// Creates an empty table of the given kind with default sizing.
    pub fn with_hasher(kind: TableKind, hash_builder: S) -> Self {
        match kind {
            TableKind::Chained => Self::Chained(ChainedTable::with_hasher(hash_builder)),
            TableKind::Probing(strategy) => {
                Self::Probing(ProbingTable::with_hasher(strategy, hash_builder))
            }
            TableKind::Direct => Self::Direct(DirectTable::with_hasher(hash_builder)),
        }
    }

    /// The collision policy of this table.
    pub fn kind(&self) -> TableKind {
        match self {
            Self::Chained(_) => TableKind::Chained,
            Self::Probing(table) => TableKind::Probing(table.strategy()),
            Self::Direct(_) => TableKind::Direct,
        }
    }
}

#[cfg(any(feature = "std", feature = "foldhash"))]
impl<K: TableKey, V> AnyTable<K, V, DefaultHashBuilder> {
    /// Creates an empty table of the given kind with default sizing and
    /// hasher.
    pub fn new(kind: TableKind) -> Self {
        Self::with_hasher(kind, DefaultHashBuilder::default())
    }
}

impl<K, V, S> From<ChainedTable<K, V, S>> for AnyTable<K, V, S> {
    fn from(table: ChainedTable<K, V, S>) -> Self {
        Self::Chained(table)
    }
}

impl<K, V, S> From<ProbingTable<K, V, S>> for AnyTable<K, V, S> {
    fn from(table: ProbingTable<K, V, S>) -> Self {
        Self::Probing(table)
    }
}

impl<K, V, S> From<DirectTable<K, V, S>> for AnyTable<K, V, S> {
    fn from(table: DirectTable<K, V, S>) -> Self {
        Self::Direct(table)
    }
}

impl<K, V, S> Mapping<K, V> for AnyTable<K, V, S>
where
    K: TableKey,
    S: BuildHasher,
{
    type Iter<'a>
        = AnyIter<'a, K, V>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    fn get(&self, key: &K) -> Result<&V> {
        dispatch!(self, table => table.get(key))
    }

    fn try_get(&self, key: &K) -> Result<Option<&V>> {
        dispatch!(self, table => table.try_get(key))
    }

    fn set(&mut self, key: K, value: V) -> Result<Option<V>> {
        dispatch!(self, table => table.set(key, value))
    }

    fn add(&mut self, key: K, value: V) -> Result<()> {
        dispatch!(self, table => table.add(key, value))
    }

    fn remove(&mut self, key: &K) -> Result<bool> {
        dispatch!(self, table => table.remove(key))
    }

    fn contains_key(&self, key: &K) -> Result<bool> {
        dispatch!(self, table => table.contains_key(key))
    }

    fn len(&self) -> usize {
        dispatch!(self, table => table.len())
    }

    fn capacity(&self) -> usize {
        dispatch!(self, table => table.capacity())
    }

    fn clear(&mut self) {
        dispatch!(self, table => table.clear())
    }

    fn iter(&self) -> Self::Iter<'_> {
        match self {
            Self::Chained(table) => AnyIter::Chained(table.iter()),
            Self::Probing(table) => AnyIter::Probing(table.iter()),
            Self::Direct(table) => AnyIter::Direct(table.iter()),
        }
    }

    fn bucket_index_for(&self, key: &K) -> Result<usize> {
        dispatch!(self, table => table.bucket_index_for(key))
    }
}

/// An iterator over the key-value pairs of an [`AnyTable`].
pub enum AnyIter<'a, K, V> {
    /// Iterating a chained table.
    Chained(chained_table::Iter<'a, K, V>),
    /// Iterating a probing table.
    Probing(probing_table::Iter<'a, K, V>),
    /// Iterating a direct table.
    Direct(direct_table::Iter<'a, K, V>),
}

impl<'a, K, V> Iterator for AnyIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Chained(iter) => iter.next(),
            Self::Probing(iter) => iter.next(),
            Self::Direct(iter) => iter.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::Chained(iter) => iter.size_hint(),
            Self::Probing(iter) => iter.size_hint(),
            Self::Direct(iter) => iter.size_hint(),
        }
    }
}
