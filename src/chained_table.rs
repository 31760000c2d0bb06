use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::BuildHasher;

use log::debug;
use log::trace;

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

/// A hash table resolving collisions by separate chaining.
///
/// Each bucket is an independent sequence of entries; keys whose home index
/// coincides simply share a bucket. The table doubles its bucket count before
/// an insert would push `len / capacity` past the configured load factor
/// (0.75 by default).
///
/// # Examples
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use bucket_hash::ChainedTable;
/// use bucket_hash::TableError;
///
/// let mut table = ChainedTable::new();
/// table.add("apple", 3).unwrap();
/// assert_eq!(table.set("apple", 5), Ok(Some(3)));
/// assert_eq!(table.add("apple", 7), Err(TableError::DuplicateKey));
/// assert_eq!(table.get(&"apple"), Ok(&5));
/// assert_eq!(table.get(&"pear"), Err(TableError::NotFound));
/// # }
/// ```
#[derive(Clone)]
pub struct ChainedTable<K, V, S = DefaultHashBuilder> {
    buckets: Vec<Vec<Entry<K, V>>>,
    len: usize,
    config: TableConfig,
    indexer: HashIndexer<S>,
}

impl<K, V, S> Debug for ChainedTable<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> ChainedTable<K, V, S> {
    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the current number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns `len / capacity`.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    /// The sizing policy this table was built with.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Removes every entry, keeping the current bucket count.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }

    /// Returns an iterator over the key-value pairs, bucket by bucket and in
    /// insertion order within a bucket.
    ///
    /// The order is not preserved across resizes.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: Default::default(),
            remaining: self.len,
        }
    }

    /// Returns an iterator over the keys, in [`iter`](Self::iter) order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values, in [`iter`](Self::iter) order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns the pairs stored in bucket `index`, in insertion order, or
    /// `None` if `index` is out of range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::ChainedTable;
    ///
    /// let mut table = ChainedTable::new();
    /// table.set(42u32, "answer").unwrap();
    ///
    /// let home = table.bucket_index_for(&42).unwrap();
    /// let chain: Vec<_> = table.bucket(home).unwrap().collect();
    /// assert_eq!(chain, vec![(&42, &"answer")]);
    /// assert!(table.bucket(table.capacity()).is_none());
    /// # }
    /// ```
    pub fn bucket(&self, index: usize) -> Option<impl ExactSizeIterator<Item = (&K, &V)> + '_> {
        self.buckets
            .get(index)
            .map(|chain| chain.iter().map(|entry| (&entry.key, &entry.value)))
    }

    /// Returns occupancy statistics for the table.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> TableStats {
        let used_buckets = self.buckets.iter().filter(|b| !b.is_empty()).count();
        let longest_run = self.buckets.iter().map(Vec::len).max().unwrap_or(0);
        TableStats::new(self.len, self.capacity(), used_buckets, 0, longest_run)
    }

    fn resize(&mut self, new_capacity: usize) {
        debug!(
            "resizing chained table from {} to {} buckets ({} entries)",
            self.capacity(),
            new_capacity,
            self.len
        );

        let mut buckets: Vec<Vec<Entry<K, V>>> = (0..new_capacity).map(|_| Vec::new()).collect();
        for entry in self.buckets.drain(..).flatten() {
            buckets[home_index(entry.hash, new_capacity)].push(entry);
        }
        self.buckets = buckets;
    }
}

impl<K, V, S> ChainedTable<K, V, S>
where
    K: TableKey,
    S: BuildHasher,
{
    /// Creates an empty table with the default configuration and the given
    /// hasher builder.
    pub fn with_hasher(hash_builder: S) -> Self {
        let config = TableConfig::chained();
        Self {
            buckets: (0..config.initial_capacity).map(|_| Vec::new()).collect(),
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
            buckets: (0..config.initial_capacity).map(|_| Vec::new()).collect(),
            len: 0,
            config,
            indexer: HashIndexer::new(hash_builder),
        })
    }

    /// The hasher builder keys are hashed with.
    pub fn hasher(&self) -> &S {
        self.indexer.hasher()
    }

    /// Returns the home bucket of `key` under the current capacity.
    pub fn bucket_index_for(&self, key: &K) -> Result<usize> {
        self.indexer.bucket(key, self.capacity())
    }

    fn locate(&self, hash: u64, key: &K) -> Option<(usize, usize)> {
        let bucket = home_index(hash, self.capacity());
        self.buckets[bucket]
            .iter()
            .position(|entry| entry.matches(hash, key))
            .map(|position| (bucket, position))
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
            .map(|(bucket, position)| &self.buckets[bucket][position].value))
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn get_mut(&mut self, key: &K) -> Result<&mut V> {
        let hash = self.indexer.hash(key)?;
        let (bucket, position) = self.locate(hash, key).ok_or(TableError::NotFound)?;
        Ok(&mut self.buckets[bucket][position].value)
    }

    /// Returns `true` if the table holds `key`.
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        Ok(self.try_get(key)?.is_some())
    }

    /// Inserts or updates `key`.
    ///
    /// Returns the previous value if the key was present; its entry is updated
    /// in place. Otherwise the entry is appended to its home bucket, resizing
    /// first if the table would pass its load factor.
    pub fn set(&mut self, key: K, value: V) -> Result<Option<V>> {
        let hash = self.indexer.hash(&key)?;
        if let Some((bucket, position)) = self.locate(hash, &key) {
            let slot = &mut self.buckets[bucket][position].value;
            return Ok(Some(core::mem::replace(slot, value)));
        }

        self.insert_new(hash, key, value);
        Ok(None)
    }

    /// Inserts `key`, failing with [`TableError::DuplicateKey`] if it is
    /// already present.
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        let hash = self.indexer.hash(&key)?;
        if self.locate(hash, &key).is_some() {
            return Err(TableError::DuplicateKey);
        }

        self.insert_new(hash, key, value);
        Ok(())
    }

    fn insert_new(&mut self, hash: u64, key: K, value: V) {
        if self.config.exceeds(self.len + 1, self.capacity())
            && let Some(new_capacity) = self.config.grown(self.capacity())
        {
            self.resize(new_capacity);
        }

        let bucket = home_index(hash, self.capacity());
        let chain = &mut self.buckets[bucket];
        if !chain.is_empty() {
            trace!("chaining into bucket {} behind {} entries", bucket, chain.len());
        }
        chain.push(Entry::new(hash, key, value));
        self.len += 1;
    }

    /// Removes `key`, returning `true` if it was present.
    pub fn remove(&mut self, key: &K) -> Result<bool> {
        Ok(self.remove_entry(key)?.is_some())
    }

    /// Removes `key`, returning the stored key and value if it was present.
    pub fn remove_entry(&mut self, key: &K) -> Result<Option<(K, V)>> {
        let hash = self.indexer.hash(key)?;
        Ok(self.locate(hash, key).map(|(bucket, position)| {
            let entry = self.buckets[bucket].remove(position);
            self.len -= 1;
            (entry.key, entry.value)
        }))
    }
}

#[cfg(any(feature = "std", feature = "foldhash"))]
impl<K: TableKey, V> ChainedTable<K, V, DefaultHashBuilder> {
    /// Creates an empty table with 16 buckets and a 0.75 load factor.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty table with the given configuration.
    pub fn with_config(config: TableConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V, S> Default for ChainedTable<K, V, S>
where
    K: TableKey,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> Mapping<K, V> for ChainedTable<K, V, S>
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
        ChainedTable::get(self, key)
    }

    fn try_get(&self, key: &K) -> Result<Option<&V>> {
        ChainedTable::try_get(self, key)
    }

    fn set(&mut self, key: K, value: V) -> Result<Option<V>> {
        ChainedTable::set(self, key, value)
    }

    fn add(&mut self, key: K, value: V) -> Result<()> {
        ChainedTable::add(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Result<bool> {
        ChainedTable::remove(self, key)
    }

    fn contains_key(&self, key: &K) -> Result<bool> {
        ChainedTable::contains_key(self, key)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        ChainedTable::capacity(self)
    }

    fn clear(&mut self) {
        ChainedTable::clear(self)
    }

    fn iter(&self) -> Self::Iter<'_> {
        ChainedTable::iter(self)
    }

    fn bucket_index_for(&self, key: &K) -> Result<usize> {
        ChainedTable::bucket_index_for(self, key)
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedTable<K, V, S> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the key-value pairs of a [`ChainedTable`].
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Vec<Entry<K, V>>>,
    chain: core::slice::Iter<'a, Entry<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.chain.next() {
                self.remaining -= 1;
                return Some((&entry.key, &entry.value));
            }
            self.chain = self.buckets.next()?.iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a [`ChainedTable`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// An iterator over the values of a [`ChainedTable`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}
