/// Occupancy statistics for a table, as returned by each table's `stats()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStats {
    /// Number of entries stored.
    pub len: usize,
    /// Number of buckets or slots.
    pub capacity: usize,
    /// Buckets holding at least one entry, or occupied slots.
    pub used_buckets: usize,
    /// Tombstoned slots (probing tables only).
    pub tombstones: usize,
    /// Longest chain (chaining), longest distance from home in probe steps
    /// plus one (probing), or 1 for a non-empty direct table.
    pub longest_run: usize,
    /// `len / capacity`.
    pub load_factor: f64,
}

impl TableStats {
    pub(crate) fn new(
        len: usize,
        capacity: usize,
        used_buckets: usize,
        tombstones: usize,
        longest_run: usize,
    ) -> Self {
        Self {
            len,
            capacity,
            used_buckets,
            tombstones,
            longest_run,
            load_factor: if capacity == 0 {
                0.0
            } else {
                len as f64 / capacity as f64
            },
        }
    }

    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.len,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Buckets in use: {}/{} ({:.2}%)",
            self.used_buckets,
            self.capacity,
            if self.capacity == 0 {
                0.0
            } else {
                self.used_buckets as f64 / self.capacity as f64 * 100.0
            }
        );
        println!("Tombstones: {}", self.tombstones);
        println!("Longest run: {}", self.longest_run);
    }
}
