use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::BuildHasher;

use log::debug;
use log::trace;
use log::warn;

use crate::DefaultHashBuilder;
use crate::config::TableConfig;
use crate::entry::Entry;
use crate::error::Result;
use crate::error::TableError;
use crate::hash_indexer::HashIndexer;
use crate::hash_indexer::TableKey;
use crate::hash_indexer::double_hash_step;
use crate::hash_indexer::home_index;
use crate::mapping::Mapping;
#[cfg(feature = "stats")]
use crate::stats::TableStats;

/// How many doublings an insert may attempt when its probe sequence has no
/// free slot.
///
/// Quadratic and double-hashing sequences do not visit every slot of a
/// power-of-two table, so an insert can run out of candidates well below the
/// load threshold.
pub const MAX_GROWTH_STEPS: usize = 4;

/// Collision-resolution strategy of a [`ProbingTable`], fixed at
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProbeStrategy {
    /// `(h + i) mod c`
    #[default]
    Linear,
    /// `(h + i²) mod c`
    Quadratic,
    /// `(h + i·step) mod c` with `step = 1 + |hash| mod (c - 1)`
    DoubleHashing,
}

impl ProbeStrategy {
    /// The slots examined for `hash` in a table of `capacity` slots, in
    /// order. Yields exactly `capacity` indices, possibly with repeats.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bucket_hash::ProbeStrategy;
    ///
    /// let linear: Vec<_> = ProbeStrategy::Linear.probe(14, 16).take(4).collect();
    /// assert_eq!(linear, [14, 15, 0, 1]);
    ///
    /// let quadratic: Vec<_> = ProbeStrategy::Quadratic.probe(3, 16).take(5).collect();
    /// assert_eq!(quadratic, [3, 4, 7, 12, 3]);
    /// ```
    pub fn probe(self, hash: u64, capacity: usize) -> ProbeSequence {
        let step = match self {
            Self::DoubleHashing => double_hash_step(hash, capacity),
            _ => 1,
        };
        ProbeSequence {
            strategy: self,
            index: if capacity == 0 {
                0
            } else {
                home_index(hash, capacity)
            },
            step,
            attempt: 0,
            capacity,
        }
    }
}

/// Iterator over the slot indices a [`ProbeStrategy`] examines.
#[derive(Debug, Clone)]
pub struct ProbeSequence {
    strategy: ProbeStrategy,
    index: usize,
    step: usize,
    attempt: usize,
    capacity: usize,
}

/// `(index + delta) mod capacity` for `index, delta < capacity`, without
/// overflow.
#[inline(always)]
fn wrapping_advance(index: usize, delta: usize, capacity: usize) -> usize {
    let room = capacity - index;
    if delta >= room {
        delta - room
    } else {
        index + delta
    }
}

impl Iterator for ProbeSequence {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.attempt >= self.capacity {
            return None;
        }

        let current = self.index;
        // (i + 1)² - i² = 2i + 1
        let delta = match self.strategy {
            ProbeStrategy::Linear => 1,
            ProbeStrategy::Quadratic => 2 * self.attempt + 1,
            ProbeStrategy::DoubleHashing => self.step,
        } % self.capacity;
        self.index = wrapping_advance(self.index, delta, self.capacity);
        self.attempt += 1;
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.capacity - self.attempt;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ProbeSequence {}

/// What a slot of a [`ProbingTable`] currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Never used since the last resize or clear; ends every search.
    Empty,
    /// Holds an entry.
    Occupied,
    /// Held an entry that was removed; searches pass over it.
    Tombstone,
}

#[derive(Clone)]
enum Slot<K, V> {
    Empty,
    Occupied(Entry<K, V>),
    Tombstone,
}

enum Probe {
    Found(usize),
    /// The first reusable slot on the sequence, if any.
    Vacant(Option<usize>),
}

/// Where every live entry lands in a rebuilt slot array.
struct Placement {
    capacity: usize,
    moves: Vec<(usize, usize)>,
    pending: usize,
}

/// A hash table resolving collisions by open addressing.
///
/// All entries live in one flat slot array. A key whose home slot is taken
/// walks the table's [`ProbeStrategy`] until it finds its own entry or a
/// free slot. Removal leaves a tombstone, which keeps later entries of the
/// same sequence reachable and is reused by the next insert that passes it.
/// The table doubles before an insert would push `len / capacity` past the
/// configured load factor (0.6 by default); tombstones are discarded on
/// every resize. When tombstones would leave too few empty slots for an
/// insert, the table rebuilds at its current capacity instead.
///
/// # Examples
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use bucket_hash::ProbeStrategy;
/// use bucket_hash::ProbingTable;
///
/// let mut table = ProbingTable::with_strategy(ProbeStrategy::DoubleHashing);
/// for word in ["alpha", "beta", "gamma"] {
///     table.add(word, word.len()).unwrap();
/// }
/// assert_eq!(table.remove(&"beta"), Ok(true));
/// assert_eq!(table.get(&"gamma"), Ok(&5));
/// assert_eq!(table.len(), 2);
/// # }
/// ```
#[derive(Clone)]
pub struct ProbingTable<K, V, S = DefaultHashBuilder> {
    slots: Vec<Slot<K, V>>,
    len: usize,
    tombstones: usize,
    strategy: ProbeStrategy,
    config: TableConfig,
    indexer: HashIndexer<S>,
}

impl<K, V, S> Debug for ProbingTable<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> ProbingTable<K, V, S> {
    /// Returns the number of entries in the table. Tombstones are not
    /// counted.
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

    /// The probe strategy fixed at construction.
    pub fn strategy(&self) -> ProbeStrategy {
        self.strategy
    }

    /// The sizing policy this table was built with.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Removes every entry and tombstone, keeping the current slot count.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = Slot::Empty;
        }
        self.len = 0;
        self.tombstones = 0;
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

    /// What slot `index` holds, or `None` if `index` is out of range.
    pub fn slot_state(&self, index: usize) -> Option<SlotState> {
        self.slots.get(index).map(|slot| match slot {
            Slot::Empty => SlotState::Empty,
            Slot::Occupied(_) => SlotState::Occupied,
            Slot::Tombstone => SlotState::Tombstone,
        })
    }

    /// Returns occupancy statistics for the table.
    ///
    /// `longest_run` is the largest number of probes any stored key needs to
    /// be found.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> TableStats {
        let capacity = self.capacity();
        let longest_run = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied(entry) => self
                    .strategy
                    .probe(entry.hash, capacity)
                    .position(|probe| probe == index)
                    .map(|distance| distance + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        TableStats::new(self.len, capacity, self.len, self.tombstones, longest_run)
    }

    fn occupied_mut(&mut self, index: usize) -> &mut Entry<K, V> {
        match &mut self.slots[index] {
            Slot::Occupied(entry) => entry,
            _ => unreachable!("probe hit on a free slot {index}"),
        }
    }

    /// Plans a rebuild into `capacity` slots that also reserves a slot for
    /// the not-yet-stored `pending` hash. `None` if some entry finds no free
    /// slot on its sequence.
    fn plan(&self, capacity: usize, pending: u64) -> Option<Placement> {
        let mut taken = vec![false; capacity];
        let mut claim = |hash: u64| {
            let index = self
                .strategy
                .probe(hash, capacity)
                .find(|&index| !taken[index])?;
            taken[index] = true;
            Some(index)
        };

        let mut moves = Vec::with_capacity(self.len);
        for (from, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied(entry) = slot {
                moves.push((from, claim(entry.hash)?));
            }
        }
        let pending = claim(pending)?;

        Some(Placement {
            capacity,
            moves,
            pending,
        })
    }

    fn apply(&mut self, placement: Placement) {
        debug!(
            "rebuilding probing table from {} to {} slots ({} entries, {} tombstones dropped)",
            self.capacity(),
            placement.capacity,
            self.len,
            self.tombstones
        );

        let mut slots: Vec<Slot<K, V>> = (0..placement.capacity).map(|_| Slot::Empty).collect();
        for (from, to) in placement.moves {
            slots[to] = core::mem::replace(&mut self.slots[from], Slot::Empty);
        }
        self.slots = slots;
        self.tombstones = 0;
    }

    /// Doubles the table until everything stored plus `pending` fits,
    /// returning the slot reserved for `pending`. Leaves the table untouched
    /// and returns `None` when no capacity within reach works.
    fn grow(&mut self, pending: u64) -> Option<usize> {
        let mut capacity = self.capacity();
        for _ in 0..MAX_GROWTH_STEPS {
            capacity = self.config.grown(capacity)?;
            if let Some(placement) = self.plan(capacity, pending) {
                let index = placement.pending;
                self.apply(placement);
                return Some(index);
            }
            trace!("no placement fits {} slots", capacity);
        }
        None
    }

    /// Whether claiming `reusable` would leave too few empty slots to end
    /// probe sequences. Reusing a tombstone never does.
    fn crowded_by_tombstones(&self, reusable: Option<usize>) -> bool {
        self.tombstones > 0
            && !reusable.is_some_and(|index| matches!(self.slots[index], Slot::Tombstone))
            && self
                .config
                .exceeds(self.len + self.tombstones + 1, self.capacity())
    }

    /// Rebuilds at the current capacity, dropping tombstones, and returns the
    /// slot reserved for `pending`.
    fn compact(&mut self, pending: u64) -> Option<usize> {
        let placement = self.plan(self.capacity(), pending)?;
        let index = placement.pending;
        self.apply(placement);
        Some(index)
    }
}

impl<K, V, S> ProbingTable<K, V, S>
where
    K: TableKey,
    S: BuildHasher,
{
    /// Creates an empty table with the default configuration, the given
    /// strategy, and the given hasher builder.
    pub fn with_hasher(strategy: ProbeStrategy, hash_builder: S) -> Self {
        let config = TableConfig::probing();
        Self {
            slots: (0..config.initial_capacity).map(|_| Slot::Empty).collect(),
            len: 0,
            tombstones: 0,
            strategy,
            config,
            indexer: HashIndexer::new(hash_builder),
        }
    }

    /// Creates an empty table with the given configuration, strategy, and
    /// hasher builder.
    ///
    /// Fails with [`TableError::InvalidConfig`] if `config` does not
    /// validate.
    pub fn with_config_and_hasher(
        config: TableConfig,
        strategy: ProbeStrategy,
        hash_builder: S,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            slots: (0..config.initial_capacity).map(|_| Slot::Empty).collect(),
            len: 0,
            tombstones: 0,
            strategy,
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

    /// Returns the slot currently holding `key`, or `None` if absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use bucket_hash::ProbingTable;
    /// use bucket_hash::SlotState;
    ///
    /// let mut table = ProbingTable::new();
    /// table.set(9u8, 'x').unwrap();
    /// let slot = table.slot_of(&9).unwrap().unwrap();
    /// assert_eq!(table.slot_state(slot), Some(SlotState::Occupied));
    /// # }
    /// ```
    pub fn slot_of(&self, key: &K) -> Result<Option<usize>> {
        let hash = self.indexer.hash(key)?;
        Ok(match self.probe(hash, key) {
            Probe::Found(index) => Some(index),
            Probe::Vacant(_) => None,
        })
    }

    fn probe(&self, hash: u64, key: &K) -> Probe {
        let mut reusable = None;
        for index in self.strategy.probe(hash, self.capacity()) {
            match &self.slots[index] {
                Slot::Empty => return Probe::Vacant(Some(reusable.unwrap_or(index))),
                Slot::Occupied(entry) if entry.matches(hash, key) => return Probe::Found(index),
                Slot::Occupied(_) => {}
                Slot::Tombstone => {
                    if reusable.is_none() {
                        trace!("probe passes tombstone at slot {}", index);
                        reusable = Some(index);
                    }
                }
            }
        }
        Probe::Vacant(reusable)
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
        Ok(match self.probe(hash, key) {
            Probe::Found(index) => match &self.slots[index] {
                Slot::Occupied(entry) => Some(&entry.value),
                _ => None,
            },
            Probe::Vacant(_) => None,
        })
    }

    /// Returns a mutable reference to the value stored for `key`.
    pub fn get_mut(&mut self, key: &K) -> Result<&mut V> {
        let hash = self.indexer.hash(key)?;
        match self.probe(hash, key) {
            Probe::Found(index) => Ok(&mut self.occupied_mut(index).value),
            Probe::Vacant(_) => Err(TableError::NotFound),
        }
    }

    /// Returns `true` if the table holds `key`.
    pub fn contains_key(&self, key: &K) -> Result<bool> {
        Ok(self.try_get(key)?.is_some())
    }

    /// Inserts or updates `key`.
    ///
    /// Returns the previous value if the key was present. Otherwise the
    /// entry goes into the first tombstone or empty slot on its probe
    /// sequence, growing the table first if it would pass its load factor.
    /// Fails with [`TableError::TableFull`] if no slot can be found even
    /// after growing.
    pub fn set(&mut self, key: K, value: V) -> Result<Option<V>> {
        let hash = self.indexer.hash(&key)?;
        match self.probe(hash, &key) {
            Probe::Found(index) => {
                let slot = &mut self.occupied_mut(index).value;
                Ok(Some(core::mem::replace(slot, value)))
            }
            Probe::Vacant(reusable) => {
                self.insert_new(hash, key, value, reusable)?;
                Ok(None)
            }
        }
    }

    /// Inserts `key`, failing with [`TableError::DuplicateKey`] if it is
    /// already present.
    pub fn add(&mut self, key: K, value: V) -> Result<()> {
        let hash = self.indexer.hash(&key)?;
        match self.probe(hash, &key) {
            Probe::Found(_) => Err(TableError::DuplicateKey),
            Probe::Vacant(reusable) => self.insert_new(hash, key, value, reusable),
        }
    }

    fn insert_new(&mut self, hash: u64, key: K, value: V, reusable: Option<usize>) -> Result<()> {
        let index = if self.config.exceeds(self.len + 1, self.capacity()) {
            self.grow(hash).or(reusable)
        } else if self.crowded_by_tombstones(reusable) {
            self.compact(hash)
                .or(reusable)
                .or_else(|| self.grow(hash))
        } else {
            reusable.or_else(|| self.grow(hash))
        };
        let Some(index) = index else {
            warn!(
                "probe sequence exhausted at {} slots ({} entries)",
                self.capacity(),
                self.len
            );
            return Err(TableError::TableFull {
                capacity: self.capacity(),
            });
        };

        if matches!(self.slots[index], Slot::Tombstone) {
            self.tombstones -= 1;
        }
        self.slots[index] = Slot::Occupied(Entry::new(hash, key, value));
        self.len += 1;
        Ok(())
    }

    /// Removes `key`, returning `true` if it was present.
    pub fn remove(&mut self, key: &K) -> Result<bool> {
        Ok(self.remove_entry(key)?.is_some())
    }

    /// Removes `key`, returning the stored key and value if it was present.
    /// Its slot becomes a tombstone.
    pub fn remove_entry(&mut self, key: &K) -> Result<Option<(K, V)>> {
        let hash = self.indexer.hash(key)?;
        let Probe::Found(index) = self.probe(hash, key) else {
            return Ok(None);
        };

        match core::mem::replace(&mut self.slots[index], Slot::Tombstone) {
            Slot::Occupied(entry) => {
                self.len -= 1;
                self.tombstones += 1;
                Ok(Some((entry.key, entry.value)))
            }
            _ => unreachable!("probe hit on a free slot {index}"),
        }
    }
}

#[cfg(any(feature = "std", feature = "foldhash"))]
impl<K: TableKey, V> ProbingTable<K, V, DefaultHashBuilder> {
    /// Creates an empty linear-probing table with 16 slots and a 0.6 load
    /// factor.
    pub fn new() -> Self {
        Self::with_strategy(ProbeStrategy::Linear)
    }

    /// Creates an empty table with the default configuration and the given
    /// strategy.
    pub fn with_strategy(strategy: ProbeStrategy) -> Self {
        Self::with_hasher(strategy, DefaultHashBuilder::default())
    }

    /// Creates an empty table with the given configuration and strategy.
    pub fn with_config(config: TableConfig, strategy: ProbeStrategy) -> Result<Self> {
        Self::with_config_and_hasher(config, strategy, DefaultHashBuilder::default())
    }
}

impl<K, V, S> Default for ProbingTable<K, V, S>
where
    K: TableKey,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::with_hasher(ProbeStrategy::default(), S::default())
    }
}

impl<K, V, S> Mapping<K, V> for ProbingTable<K, V, S>
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
        ProbingTable::get(self, key)
    }

    fn try_get(&self, key: &K) -> Result<Option<&V>> {
        ProbingTable::try_get(self, key)
    }

    fn set(&mut self, key: K, value: V) -> Result<Option<V>> {
        ProbingTable::set(self, key, value)
    }

    fn add(&mut self, key: K, value: V) -> Result<()> {
        ProbingTable::add(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Result<bool> {
        ProbingTable::remove(self, key)
    }

    fn contains_key(&self, key: &K) -> Result<bool> {
        ProbingTable::contains_key(self, key)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn capacity(&self) -> usize {
        ProbingTable::capacity(self)
    }

    fn clear(&mut self) {
        ProbingTable::clear(self)
    }

    fn iter(&self) -> Self::Iter<'_> {
        ProbingTable::iter(self)
    }

    fn bucket_index_for(&self, key: &K) -> Result<usize> {
        ProbingTable::bucket_index_for(self, key)
    }
}

impl<'a, K, V, S> IntoIterator for &'a ProbingTable<K, V, S> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the key-value pairs of a [`ProbingTable`].
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Slot::Occupied(entry) = slot {
                self.remaining -= 1;
                return Some((&entry.key, &entry.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An iterator over the keys of a [`ProbingTable`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }
}

/// An iterator over the values of a [`ProbingTable`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::string::ToString;

    use proptest::prelude::*;

    use super::*;
    use crate::test_support::IdentityState;
    use crate::test_support::SipHashBuilder;

    const STRATEGIES: [ProbeStrategy; 3] = [
        ProbeStrategy::Linear,
        ProbeStrategy::Quadratic,
        ProbeStrategy::DoubleHashing,
    ];

    fn identity_table<V>(strategy: ProbeStrategy) -> ProbingTable<i64, V, IdentityState> {
        ProbingTable::with_hasher(strategy, IdentityState)
    }

    #[test]
    fn test_probe_sequences() {
        let linear: Vec<_> = ProbeStrategy::Linear.probe(14, 16).take(4).collect();
        assert_eq!(linear, vec![14, 15, 0, 1]);

        let quadratic: Vec<_> = ProbeStrategy::Quadratic.probe(3, 16).take(5).collect();
        assert_eq!(quadratic, vec![3, 4, 7, 12, 3]);

        // step = 1 + 5 mod 15 = 6
        let double: Vec<_> = ProbeStrategy::DoubleHashing.probe(5, 16).take(5).collect();
        assert_eq!(double, vec![5, 11, 1, 7, 13]);

        for strategy in STRATEGIES {
            for capacity in [1, 2, 7, 16] {
                let sequence = strategy.probe(-9i64 as u64, capacity);
                assert_eq!(sequence.len(), capacity);
                assert!(sequence.clone().all(|index| index < capacity));
                assert_eq!(sequence.count(), capacity);
            }
        }
    }

    #[test]
    fn test_linear_covers_every_slot() {
        let mut seen: Vec<_> = ProbeStrategy::Linear.probe(5, 8).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_new_and_with_config() {
        let table: ProbingTable<i32, String, SipHashBuilder> = ProbingTable::default();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), 16);
        assert_eq!(table.strategy(), ProbeStrategy::Linear);
        assert_eq!(table.config(), &TableConfig::probing());

        let config = TableConfig::probing().with_initial_capacity(4);
        let table: ProbingTable<i32, i32, _> = ProbingTable::with_config_and_hasher(
            config,
            ProbeStrategy::Quadratic,
            SipHashBuilder::default(),
        )
        .unwrap();
        assert_eq!(table.capacity(), 4);
        assert_eq!(table.strategy(), ProbeStrategy::Quadratic);

        let broken = TableConfig::probing().with_load_factor(2.0);
        assert!(matches!(
            ProbingTable::<i32, i32, _>::with_config_and_hasher(
                broken,
                ProbeStrategy::Linear,
                SipHashBuilder::default()
            ),
            Err(TableError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_tombstone_keeps_later_entries_reachable() {
        let config = TableConfig::probing()
            .with_initial_capacity(4)
            .with_load_factor(0.75);
        let mut table =
            ProbingTable::with_config_and_hasher(config, ProbeStrategy::Linear, IdentityState)
                .unwrap();

        table.add(0i64, "zero").unwrap();
        table.add(4, "four").unwrap();
        table.add(8, "eight").unwrap();
        assert_eq!(table.capacity(), 4);
        assert_eq!(table.slot_of(&0), Ok(Some(0)));
        assert_eq!(table.slot_of(&4), Ok(Some(1)));
        assert_eq!(table.slot_of(&8), Ok(Some(2)));

        assert_eq!(table.remove(&4), Ok(true));
        assert_eq!(table.slot_state(1), Some(SlotState::Tombstone));
        assert_eq!(table.get(&8), Ok(&"eight"));
        assert_eq!(table.get(&4), Err(TableError::NotFound));
        assert_eq!(table.len(), 2);

        // The next colliding insert reuses the tombstone.
        table.add(12, "twelve").unwrap();
        assert_eq!(table.slot_of(&12), Ok(Some(1)));
        assert_eq!(table.slot_state(1), Some(SlotState::Occupied));
        assert_eq!(table.slot_state(3), Some(SlotState::Empty));
        assert_eq!(table.slot_state(4), None);
    }

    #[test]
    fn test_no_duplicate_residency_after_tombstone() {
        for strategy in STRATEGIES {
            let mut table = identity_table(strategy);
            table.add(0, 'a').unwrap();
            table.add(16, 'b').unwrap();
            table.remove(&0).unwrap();

            // 16 sits past the tombstone at its home slot; updating it must
            // find that entry rather than claim the tombstone.
            assert_eq!(table.set(16, 'c'), Ok(Some('b')));
            assert_eq!(table.add(16, 'd'), Err(TableError::DuplicateKey));
            assert_eq!(table.len(), 1);
            assert_eq!(table.iter().filter(|(k, _)| **k == 16).count(), 1);
            assert_eq!(table.slot_state(0), Some(SlotState::Tombstone));
        }
    }

    #[test]
    fn test_set_and_get() {
        for strategy in STRATEGIES {
            let mut table = ProbingTable::with_hasher(strategy, SipHashBuilder::default());
            assert_eq!(table.set(1, "hello".to_string()), Ok(None));
            assert_eq!(table.get(&1), Ok(&"hello".to_string()));
            assert_eq!(
                table.set(1, "world".to_string()),
                Ok(Some("hello".to_string()))
            );
            assert_eq!(table.len(), 1);
            assert_eq!(table.get(&2), Err(TableError::NotFound));
            assert_eq!(table.add(1, "again".to_string()), Err(TableError::DuplicateKey));
        }
    }

    #[test]
    fn test_try_get_and_get_mut() {
        let mut table = ProbingTable::with_hasher(ProbeStrategy::Quadratic, SipHashBuilder::default());
        table.set(1, 10).unwrap();
        assert_eq!(table.try_get(&1), Ok(Some(&10)));
        assert_eq!(table.try_get(&2), Ok(None));

        *table.get_mut(&1).unwrap() += 5;
        assert_eq!(table.get(&1), Ok(&15));
        assert_eq!(table.get_mut(&2), Err(TableError::NotFound));
    }

    #[test]
    fn test_absent_keys() {
        let mut table: ProbingTable<Option<&str>, u8, SipHashBuilder> = ProbingTable::default();
        assert_eq!(table.set(None, 1), Err(TableError::InvalidKey));
        assert_eq!(table.add(None, 1), Err(TableError::InvalidKey));
        assert_eq!(table.get(&None), Err(TableError::InvalidKey));
        assert_eq!(table.slot_of(&None), Err(TableError::InvalidKey));
        assert_eq!(table.remove_entry(&None), Err(TableError::InvalidKey));
        assert!(table.is_empty());
    }

    #[test]
    fn test_resize_at_threshold() {
        for strategy in STRATEGIES {
            let mut table = identity_table(strategy);
            for i in 0..9 {
                table.set(i, i * 10).unwrap();
            }
            assert_eq!(table.capacity(), 16);

            // 10 / 16 > 0.6
            table.set(9, 90).unwrap();
            assert_eq!(table.capacity(), 32);
            for i in 0..10 {
                assert_eq!(table.get(&i), Ok(&(i * 10)));
            }
        }
    }

    #[test]
    fn test_resize_discards_tombstones() {
        let mut table = identity_table(ProbeStrategy::Linear);
        for i in 0..9 {
            table.set(i, ()).unwrap();
        }
        for i in 0..4 {
            table.remove(&i).unwrap();
        }
        for i in 20..27 {
            table.set(i, ()).unwrap();
        }
        assert_eq!(table.capacity(), 32);
        assert!((0..table.capacity()).all(|i| table.slot_state(i) != Some(SlotState::Tombstone)));
        for i in (4..9).chain(20..27) {
            assert_eq!(table.contains_key(&i), Ok(true));
        }
    }

    #[test]
    fn test_churn_keeps_empty_slots() {
        let mut table = identity_table(ProbeStrategy::Linear);
        for i in 0..16 {
            table.add(i, i).unwrap();
            table.remove(&i).unwrap();
        }
        assert!(table.is_empty());
        assert_eq!(table.capacity(), 16);

        let count = |state| {
            (0..table.capacity())
                .filter(|&i| table.slot_state(i) == Some(state))
                .count()
        };
        // The tenth round rebuilt in place; rounds 9 to 15 left tombstones.
        assert_eq!(count(SlotState::Tombstone), 7);
        assert_eq!(count(SlotState::Empty), 9);
        assert_eq!(table.get(&100), Err(TableError::NotFound));
    }

    #[test]
    fn test_quadratic_exhaustion_grows() {
        let mut table = identity_table(ProbeStrategy::Quadratic);
        // i² mod 16 only reaches {0, 1, 4, 9}.
        for key in [0, 16, 32, 48] {
            table.add(key, key).unwrap();
        }
        assert_eq!(table.capacity(), 16);

        table.add(64, 64).unwrap();
        assert_eq!(table.capacity(), 32);
        assert_eq!(table.len(), 5);
        for key in [0, 16, 32, 48, 64] {
            assert_eq!(table.get(&key), Ok(&key));
        }
    }

    #[test]
    fn test_table_full_leaves_table_intact() {
        let config = TableConfig::probing()
            .with_initial_capacity(4)
            .with_max_capacity(4)
            .with_load_factor(1.0);
        let mut table =
            ProbingTable::with_config_and_hasher(config, ProbeStrategy::Linear, IdentityState)
                .unwrap();
        for i in 0..4i64 {
            table.add(i, i).unwrap();
        }

        assert_eq!(table.add(4, 4), Err(TableError::TableFull { capacity: 4 }));
        assert_eq!(table.set(5, 5), Err(TableError::TableFull { capacity: 4 }));
        assert_eq!(table.len(), 4);
        for i in 0..4i64 {
            assert_eq!(table.get(&i), Ok(&i));
        }

        // Updates still succeed.
        assert_eq!(table.set(2, 20), Ok(Some(2)));

        // A freed slot becomes usable again.
        table.remove(&1).unwrap();
        assert_eq!(table.add(4, 4), Ok(()));
        assert_eq!(table.slot_of(&4), Ok(Some(1)));
    }

    #[test]
    fn test_quadratic_pinned_reports_full() {
        let config = TableConfig::probing()
            .with_initial_capacity(16)
            .with_max_capacity(16);
        let mut table =
            ProbingTable::with_config_and_hasher(config, ProbeStrategy::Quadratic, IdentityState)
                .unwrap();
        for key in [0, 16, 32, 48] {
            table.add(key, ()).unwrap();
        }
        assert_eq!(table.add(64, ()), Err(TableError::TableFull { capacity: 16 }));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_clear() {
        let mut table = identity_table(ProbeStrategy::DoubleHashing);
        for i in 0..30 {
            table.set(i, i).unwrap();
        }
        table.remove(&3).unwrap();
        let capacity = table.capacity();

        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), capacity);
        assert!((0..capacity).all(|i| table.slot_state(i) == Some(SlotState::Empty)));
        assert_eq!(table.iter().count(), 0);
    }

    #[test]
    fn test_iterators_and_debug() {
        let mut table = identity_table(ProbeStrategy::Linear);
        table.set(17, 'b').unwrap();
        table.set(1, 'a').unwrap();
        table.set(3, 'c').unwrap();

        // 17 is at slot 1, 1 is pushed to slot 2.
        let keys: Vec<_> = table.keys().copied().collect();
        assert_eq!(keys, vec![17, 1, 3]);
        let values: String = table.values().collect();
        assert_eq!(values, "bac");
        assert_eq!(table.iter().len(), 3);
        assert_eq!(format!("{table:?}"), "{17: 'b', 1: 'a', 3: 'c'}");

        let mut seen = 0;
        for _ in &table {
            seen += 1;
        }
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_remove_entry() {
        let mut table = ProbingTable::with_hasher(ProbeStrategy::Linear, SipHashBuilder::default());
        table.set("k".to_string(), 1).unwrap();
        assert_eq!(
            table.remove_entry(&"k".to_string()),
            Ok(Some(("k".to_string(), 1)))
        );
        assert_eq!(table.remove_entry(&"k".to_string()), Ok(None));
        assert!(table.is_empty());
    }

    #[cfg(feature = "stats")]
    #[test]
    fn test_stats() {
        let mut table = identity_table(ProbeStrategy::Linear);
        table.set(0, ()).unwrap();
        table.set(16, ()).unwrap();
        table.set(32, ()).unwrap();
        table.remove(&16).unwrap();

        let stats = table.stats();
        assert_eq!(stats.len, 2);
        assert_eq!(stats.used_buckets, 2);
        assert_eq!(stats.tombstones, 1);
        assert_eq!(stats.longest_run, 3);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(u8, u16),
        Add(u8, u16),
        Remove(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<u8>(), any::<u16>()).prop_map(|(k, v)| Op::Set(k, v)),
            (any::<u8>(), any::<u16>()).prop_map(|(k, v)| Op::Add(k, v)),
            any::<u8>().prop_map(Op::Remove),
        ]
    }

    fn probe_strategy() -> impl Strategy<Value = ProbeStrategy> {
        prop_oneof![
            Just(ProbeStrategy::Linear),
            Just(ProbeStrategy::Quadratic),
            Just(ProbeStrategy::DoubleHashing),
        ]
    }

    #[test]
    fn it_s_a_hash_map() {
        proptest!(|(strategy in probe_strategy(), ops in proptest::collection::vec(op_strategy(), 0..400))| {
            let mut table = ProbingTable::with_hasher(strategy, SipHashBuilder::default());
            let mut model = std::collections::HashMap::new();

            for op in ops {
                match op {
                    Op::Set(k, v) => {
                        prop_assert_eq!(table.set(k, v), Ok(model.insert(k, v)));
                    }
                    Op::Add(k, v) => {
                        if model.contains_key(&k) {
                            prop_assert_eq!(table.add(k, v), Err(TableError::DuplicateKey));
                        } else {
                            model.insert(k, v);
                            prop_assert_eq!(table.add(k, v), Ok(()));
                        }
                    }
                    Op::Remove(k) => {
                        prop_assert_eq!(table.remove(&k), Ok(model.remove(&k).is_some()));
                    }
                }
                prop_assert_eq!(table.len(), model.len());
            }

            for (k, v) in &model {
                prop_assert_eq!(table.get(k), Ok(v));
            }
            let live = (0..=u8::MAX)
                .filter(|k| table.contains_key(k) == Ok(true))
                .count();
            prop_assert_eq!(live, table.len());
            prop_assert_eq!(table.iter().count(), table.len());
        });
    }
}
