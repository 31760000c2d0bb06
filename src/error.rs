use thiserror::Error;

/// Errors reported by the tables in this crate.
///
/// Every variant is a recoverable result of a single call; none of them leave
/// a table in a partially modified state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// The key is absent (for example `None` used as an `Option<T>` key).
    #[error("key is absent")]
    InvalidKey,

    /// A lookup that requires the key to be present missed.
    #[error("key not found")]
    NotFound,

    /// An insert-only operation found the key already stored.
    #[error("key already present")]
    DuplicateKey,

    /// Two distinct keys contend for one slot of a direct table.
    #[error("slot {index} already holds a different key")]
    HashCollision {
        /// The contended slot.
        index: usize,
    },

    /// The probe sequence was exhausted without finding a free slot, and the
    /// table could not grow any further.
    #[error("no free slot along the probe sequence (capacity {capacity})")]
    TableFull {
        /// Capacity of the table when the insert gave up.
        capacity: usize,
    },

    /// A [`TableConfig`](crate::TableConfig) was rejected.
    #[error("invalid table configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Result alias used by every table operation.
pub type Result<T> = core::result::Result<T, TableError>;
