#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A hash table resolving collisions by separate chaining.
pub mod chained_table;

/// Sizing policy shared by every table.
pub mod config;

/// A hash table with one slot per home index and no collision resolution.
pub mod direct_table;

/// Error type returned by every fallible table operation.
pub mod error;

/// Key validity and hash-to-index arithmetic shared by every table.
pub mod hash_indexer;

/// The mapping contract shared by every table, and a runtime choice of table.
pub mod mapping;

/// An open-addressing hash table with linear, quadratic, or double-hashing
/// probes.
pub mod probing_table;

/// Occupancy statistics.
#[cfg(feature = "stats")]
pub mod stats;

mod entry;

#[cfg(test)]
mod test_support;

pub use chained_table::ChainedTable;
pub use config::TableConfig;
pub use direct_table::DirectTable;
pub use error::Result;
pub use error::TableError;
pub use hash_indexer::HashIndexer;
pub use hash_indexer::TableKey;
pub use mapping::AnyTable;
pub use mapping::Mapping;
pub use mapping::TableKind;
pub use probing_table::ProbeStrategy;
pub use probing_table::ProbingTable;
pub use probing_table::SlotState;
#[cfg(feature = "stats")]
pub use stats::TableStats;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Hasher builder used when none is named: `foldhash`'s fast,
        /// randomly seeded state.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// Hasher builder used when none is named: the standard library's
        /// randomly seeded SipHash state.
        pub type DefaultHashBuilder = std::hash::RandomState;
    } else {
        /// Placeholder when neither `foldhash` nor `std` is enabled. It has
        /// no values, so tables must be built with an explicit hasher.
        #[derive(Clone, Copy, Debug)]
        pub enum DefaultHashBuilder {}
    }
}
