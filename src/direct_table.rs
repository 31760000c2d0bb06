use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::BuildHasher;

use log::debug;
use log::warn;

use crate::DefaultHashBuilder;
use crate::config::TableConfig;
use crate::entry::Entry;
use crate::error::Result;
use crate::error::TableError;
use crate::hash_indexer::HashIndexer;
use crate::hash_indexer::TableKey;
use crate::hash_indexer::home_index;
use crate::mapping::Mapping;
#[cfg(feature = "stats")]
use crate::stats::TableStats;

/// A hash table with one slot per home index and no collision resolution.
///
/// A key lives in its home slot or nowhere. Storing a key whose home slot
/// holds a *different* key fails with [`TableError::HashCollision`]; use a
/// [`ChainedTable`](crate::ChainedTable) or
/// [`ProbingTable`](crate::ProbingTable) when every insert must succeed.
///
/// The table doubles before an insert would push `len / capacity` past the
/// configured load factor (0.75 by default).
///
/// # Examples
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use bucket_hash::DirectTable;
/// use bucket_hash::TableError;
///
/// let mut table = DirectTable::new();
/// table.set(3u64, "three").unwrap();
/// assert_eq!(table.set(3, "drei"), Ok(Some("three")));
///
/// let home = table.bucket_index_for(&3).unwrap();
/// match table.add(4, "four") {
///     Ok(()) => assert_ne!(table.bucket_index_for(&4).unwrap(), home),
///     Err(TableError::HashCollision { index }) => assert_eq!(index, home),
///     Err(other) => panic!("unexpected {other}"),
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct DirectTable<K, V, S = DefaultHashBuilder> {
    slots: Vec<Option<Entry<K, V>>>,
    len: usize,
    config: TableConfig,
    indexer: HashIndexer<S>,
}

/// Where every entry lands in a rebuilt slot array.
struct Placement {
    capacity: usize,
    moves: Vec<(usize, usize)>,
}

impl<K, V, S> Debug for DirectTable<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> DirectTable<K, V, S> {
    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the current number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns `len / capacity`.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    /// The sizing policy this table was built with.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Removes every entry, keeping the current slot count.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.len = 0;
    }

    /// Returns an iterator over the key-value pairs in slot order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.len,
        }
    }

    /// Returns an iterator over the keys, in slot order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values, in slot order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// The pair stored in slot `index`, or `None` if the slot is empty or
    /// out of range.
    pub fn slot(&self, index: usize) -> Option<(&K, &V)> {
        self.slots
            .get(index)?
            .as_ref()
            .map(|entry| (&entry.key, &entry.value))
    }

    /// Returns occupancy statistics for the table.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> TableStats {
        TableStats::new(
            self.len,
            self.capacity(),
            self.len,
            0,
            usize::from(self.len > 0),
        )
    }

    /// Plans a rebuild into `capacity` slots, failing on the first two
    /// entries that share a slot there.
    fn plan(&self, capacity: usize) -> Result<Placement> {
        let mut taken = vec![false; capacity];
        let mut moves = Vec::with_capacity(self.len);
        for (from, slot) in self.slots.iter().enumerate() {
            let Some(entry) = slot else {
                continue;
            };
            let to = home_index(entry.hash, capacity);
            if core::mem::replace(&mut taken[to], true) {
                return Err(TableError::HashCollision { index: to });
            }
            moves.push((from, to));
        }
        Ok(Placement { capacity, moves })
    }

    fn resize(&mut self, new_capacity: usize) -> Result<()> {
        let placement = self.plan(new_capacity).inspect_err(|error| {
            warn!("resize of direct table to {} slots failed: {}", new_capacity, error);
        })?;

        debug!(
            "resizing direct table from {} to {} slots ({} entries)",
            self.capacity(),
            placement.capacity,
            self.len
        );
        let mut slots: Vec<Option<Entry<K, V>>> = (0..placement.capacity).map(|_| None).collect();
        for (from, to) in placement.moves {
            slots[to] = self.slots[from].take();
        }
        self.slots = slots;
        Ok(())
    }
}

impl<K, V, S> DirectTable<K, V, S>
where
    K: TableKey,
    S: BuildHasher,
{
    /// Creates an empty table with the default configuration and the given
    /// hasher builder.
    pub fn with_hasher(hash_builder: S) -> Self {
        let config = TableConfig::direct();
        Self {
            slots: (0..config.initial_capacity).map(|_| None).collect(),
            len: 0,
            config,
            indexer: HashIndexer::new(hash_builder),
        }
    }

    /// Creates an empty table with the given configuration and hasher
    /// builder.
    ///
    /// Fails with [`TableError::InvalidConfig`] if `config` does not
    /// validate.
    pub fn with_config_and_hasher(config: TableConfig, hash_builder: S) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            slots: (0..config.initial_capacity).map(|_| None).collect(),
            len: 0,
            config,
            indexer: HashIndexer::new(hash_builder),
        })
    }

    /// The hasher builder keys are hashed with.
    pub fn hasher(&self) -> &S {
        self.indexer.hasher()
    }

    /// Returns the home slot of `key` under the current capacity.
    pub fn bucket_index_for(&self, key: &K) -> Result<usize> {
        self.indexer.bucket(key, self.capacity())
    }

    fn locate(&self, hash: u64, key: &K) -> Option<usize> {
        let index = home_index(hash, self.capacity());
        self.slots[index]
            .as_ref()
            .filter(|entry| entry.matches(hash, key))
            .map(|_| index)
    }

    /// Returns a reference to the value stored for `key`.
    ///
    /// Fails with [`TableError::NotFound`] if the key is not present.
    pub fn get(&self, key: &K) -> Result<&V> {
        self.try_get(key)?.ok_or(TableError::NotFound)
    }

    /// Returns a reference to the value stored for `key`, or `None` if the
    /// key is not present.
    pub fn try_get(&self, key: &K) -> Result<Option<&V>> {
        let hash = self.indexer.hash(key)?;
        Ok(self
            .locate(hash, key)
            .and_then(|index| self.slots[index].as_ref())
            .map(|entry| &entry.value))
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn get_mut(&mut self, key: &K) -> Result<&mut V> {
        let hash = self.indexer.hash(key)?;
        let index = self.locate(hash, key).ok_or(TableError::NotFound)?;
        self.slots[index]
            .as_mut()
            .map(|entry| &mut entry.value)
            .ok_or(TableError::NotFound)
    }

    /// Returns `true` if the table holds `key`.
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        Ok(self.try_get(key)?.is_some())
    }

    /// Inserts or updates `key`.
    ///
    /// Returns the previous value if the key was present. Fails with
    /// [`TableError::HashCollision`] if its home slot holds a different key.
    pub fn set(&mut self, key: K, value: V) -> Result<Option<V>> {
        let hash = self.indexer.hash(&key)?;
        if let Some(index) = self.locate(hash, &key)
            && let Some(entry) = self.slots[index].as_mut()
        {
            return Ok(Some(core::mem::replace(&mut entry.value, value)));
        }

        self.insert_new(hash, key, value)?;
        Ok(None)
    }

    /// Inserts `key`, failing with [`TableError::DuplicateKey`] if it is
    /// already present or [`TableError::HashCollision`] if its home slot
    /// holds a different key.
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        let hash = self.indexer.hash(&key)?;
        if self.locate(hash, &key).is_some() {
            return Err(TableError::DuplicateKey);
        }

        self.insert_new(hash, key, value)
    }

    fn insert_new(&mut self, hash: u64, key: K, value: V) -> Result<()> {
        if self.config.exceeds(self.len + 1, self.capacity())
            && let Some(new_capacity) = self.config.grown(self.capacity())
        {
            self.resize(new_capacity)?;
        }

        let index = home_index(hash, self.capacity());
        if self.slots[index].is_some() {
            warn!("slot {} of direct table already holds a different key", index);
            return Err(TableError::HashCollision { index });
        }

        self.slots[index] = Some(Entry::new(hash, key, value));
        self.len += 1;
        Ok(())
    }

    /// Removes `key`, returning `true` if it was present.
    ///
    /// A different key in the home slot is left alone.
    pub fn remove(&mut self, key: &K) -> Result<bool> {
        Ok(self.remove_entry(key)?.is_some())
    }

    /// Removes `key`, returning the stored key and value if it was present.
    pub fn remove_entry(&mut self, key: &K) -> Result<Option<(K, V)>> {
        let hash = self.indexer.hash(key)?;
        Ok(self.locate(hash, key).and_then(|index| {
            let entry = self.slots[index].take()?;
            self.len -= 1;
            Some((entry.key, entry.value))
        }))
    }
}

#[cfg(any(feature = "std", feature = "foldhash"))]
impl<K: TableKey, V> DirectTable<K, V, DefaultHashBuilder> {
    /// Creates an empty table with 16 slots and a 0.75 load factor.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty table with the given configuration.
    pub fn with_config(config: TableConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V, S> Default for DirectTable<K, V, S>
where
    K: TableKey,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> Mapping<K, V> for DirectTable<K, V, S>
where
    K: TableKey,
    S: BuildHasher,
{
    type Iter<'a>
        = Iter<'a, K, V>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    fn get(&self, key: &K) -> Result<&V> {
        DirectTable::get(self, key)
    }

    fn try_get(&self, key: &K) -> Result<Option<&V>> {
        DirectTable::try_get(self, key)
    }

    fn set(&mut self, key: K, value: V) -> Result<Option<V>> {
        DirectTable::set(self, key, value)
    }

    fn add(&mut self, key: K, value: V) -> Result<()> {
        DirectTable::add(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Result<bool> {
        DirectTable::remove(self, key)
    }

    fn contains_key(&self, key: &K) -> Result<bool> {
        DirectTable::contains_key(self, key)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        DirectTable::capacity(self)
    }

    fn clear(&mut self) {
        DirectTable::clear(self)
    }

    fn iter(&self) -> Self::Iter<'_> {
        DirectTable::iter(self)
    }

    fn bucket_index_for(&self, key: &K) -> Result<usize> {
        DirectTable::bucket_index_for(self, key)
    }
}

impl<'a, K, V, S> IntoIterator for &'a DirectTable<K, V, S> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the key-value pairs of a [`DirectTable`].
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Option<Entry<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.slots.by_ref().flatten().next()?;
        self.remaining -= 1;
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a [`DirectTable`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// An iterator over the values of a [`DirectTable`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}
