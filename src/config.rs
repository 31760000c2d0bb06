use crate::error::Result;
use crate::error::TableError;

/// Number of buckets or slots a table starts with unless configured
/// otherwise.
pub const DEFAULT_CAPACITY: usize = 16;

/// Default load-factor threshold for chained and direct tables.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Default load-factor threshold for probing tables. Lower than the others to
/// compensate for clustering.
pub const DEFAULT_PROBING_LOAD_FACTOR: f64 = 0.6;

/// Sizing policy for a table.
///
/// A table starts with `initial_capacity` buckets (or slots) and doubles its
/// capacity whenever adding one more entry would push `len / capacity` above
/// `load_factor`. Capacity never shrinks and never grows past
/// `max_capacity`; once pinned there, the load factor is no longer enforced
/// and inserts succeed for as long as the collision policy finds room.
///
/// # Examples
///
/// ```rust
/// use bucket_hash::TableConfig;
///
/// let config = TableConfig::probing()
///     .with_initial_capacity(4)
///     .with_load_factor(0.75);
/// assert!(config.validate().is_ok());
///
/// let broken = TableConfig::direct().with_load_factor(1.5);
/// assert!(broken.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    /// Buckets or slots allocated at construction.
    pub initial_capacity: usize,
    /// Growth threshold for `len / capacity`.
    pub load_factor: f64,
    /// Upper bound on capacity.
    pub max_capacity: usize,
    /// Whether the load factor may exceed 1.0 (only chaining can hold more
    /// entries than it has buckets).
    allows_overload: bool,
}

impl TableConfig {
    /// Defaults for [`ChainedTable`](crate::ChainedTable): 16 buckets, 0.75.
    pub const fn chained() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            max_capacity: usize::MAX,
            allows_overload: true,
        }
    }

    /// Defaults for [`ProbingTable`](crate::ProbingTable): 16 slots, 0.6.
    pub const fn probing() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            load_factor: DEFAULT_PROBING_LOAD_FACTOR,
            max_capacity: usize::MAX,
            allows_overload: false,
        }
    }

    /// Defaults for [`DirectTable`](crate::DirectTable): 16 slots, 0.75.
    pub const fn direct() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            max_capacity: usize::MAX,
            allows_overload: false,
        }
    }

    /// Sets the number of buckets or slots allocated at construction.
    pub const fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Sets the growth threshold.
    pub const fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Sets the capacity the table never grows past.
    pub const fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Checks that the configuration describes a usable table.
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(TableError::InvalidConfig("initial capacity must be non-zero"));
        }
        if !self.load_factor.is_finite() || self.load_factor <= 0.0 {
            return Err(TableError::InvalidConfig(
                "load factor must be finite and positive",
            ));
        }
        if !self.allows_overload && self.load_factor > 1.0 {
            return Err(TableError::InvalidConfig(
                "load factor above 1.0 requires a chained table",
            ));
        }
        if self.max_capacity < self.initial_capacity {
            return Err(TableError::InvalidConfig(
                "max capacity is below the initial capacity",
            ));
        }
        Ok(())
    }

    /// Returns `true` if holding `len` entries in `capacity` buckets crosses
    /// the threshold.
    #[inline]
    pub(crate) fn exceeds(&self, len: usize, capacity: usize) -> bool {
        len as f64 / capacity as f64 > self.load_factor
    }

    /// The capacity after one doubling from `capacity`, or `None` if that
    /// would overflow or pass `max_capacity`.
    #[inline]
    pub(crate) fn grown(&self, capacity: usize) -> Option<usize> {
        capacity
            .checked_mul(2)
            .filter(|&next| next <= self.max_capacity)
    }
}
