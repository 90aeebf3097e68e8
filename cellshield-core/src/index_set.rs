//! Fixed-capacity set of small indices
//!
//! Stored messages on the SIM are addressed by small integers. The set of
//! pending indices is kept as a bitset so it needs no allocation and
//! iterates in ascending order.

/// Bitset over `0..BYTES * 8`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IndexSet<const BYTES: usize> {
    bits: [u8; BYTES],
}

/// Pending SMS slots (256 of them)
pub type MessageIndexSet = IndexSet<32>;

impl<const BYTES: usize> Default for IndexSet<BYTES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const BYTES: usize> IndexSet<BYTES> {
    /// Create an empty set
    pub const fn new() -> Self {
        Self { bits: [0; BYTES] }
    }

    /// Largest index that can be stored, plus one
    pub const fn capacity(&self) -> usize {
        BYTES * 8
    }

    /// Add `index`; returns `false` if it is out of range
    pub fn insert(&mut self, index: usize) -> bool {
        if index >= self.capacity() {
            return false;
        }
        self.bits[index / 8] |= 1 << (index % 8);
        true
    }

    /// Remove `index`; returns whether it was present
    pub fn remove(&mut self, index: usize) -> bool {
        let present = self.contains(index);
        if present {
            self.bits[index / 8] &= !(1 << (index % 8));
        }
        present
    }

    /// Whether `index` is in the set
    pub fn contains(&self, index: usize) -> bool {
        index < self.capacity() && self.bits[index / 8] & (1 << (index % 8)) != 0
    }

    /// Lowest index in the set
    pub fn first(&self) -> Option<usize> {
        self.iter().next()
    }

    /// Number of indices in the set
    pub fn len(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// True if no index is set
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&b| b == 0)
    }

    /// Remove every index
    pub fn clear(&mut self) {
        self.bits = [0; BYTES];
    }

    /// Indices in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.capacity()).filter(move |&i| self.contains(i))
    }
}
