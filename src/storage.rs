//! Backing arrays of a hopscotch table.
//!
//! Layout for a table with 16 logical bins and a hop range of 4:
//!
//! ```text
//! logical bins   0  1  2 ... 15
//! physical slots 0  1  2 ... 15 16 17 18
//!                               |overrun|
//! ```
//!
//! The neighborhood of bin 15 is {15, 16, 17, 18}, so there are
//! `bins + hop_range - 1` physical slots and the last neighborhood never
//! reads past the end.
//!
//! Hop bits: bit i of `hops[b]` is set when the key homed at bin b sits in
//! physical slot b + i. They are read from the lowest bit up:
//!      1011 means the key in slot b (___1), in slot b + 1 (__1_) and in
//!      slot b + 3 (1___) are all homed at b.

use crate::error::{HopscotchError, Result};
use crate::{Key, Value, EMPTY_KEY};
use std::alloc::Layout;
use std::mem::size_of;

/// Parallel arrays of keys, hop words and values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Storage {
    keys: Vec<Key>,
    hops: Vec<u32>,
    values: Vec<Value>,
    mask: usize,
    hop_range: usize,
}

/// Allocate `len` zeroed cells.
///
/// `vec![0; len]` takes zeroed pages from the allocator, so untouched slots
/// of a large table cost nothing until they are written. Only sizes that
/// cannot be represented are reported as `OutOfMemory`; an allocator that
/// refuses a representable request aborts the process, like any `Vec`.
fn zeroed<T: Copy + Default>(len: usize) -> Result<Vec<T>> {
    Layout::array::<T>(len).map_err(|_| HopscotchError::OutOfMemory {
        bytes: len.saturating_mul(size_of::<T>()),
    })?;
    Ok(vec![T::default(); len])
}

impl Storage {
    /// Allocate arrays for `bins` logical bins (a power of two).
    pub(crate) fn allocate(bins: usize, hop_range: usize) -> Result<Self> {
        debug_assert!(bins.is_power_of_two());
        debug_assert!((1..=32).contains(&hop_range));
        let capacity = bins + hop_range - 1;
        Ok(Storage {
            keys: zeroed(capacity)?,
            hops: zeroed(bins)?,
            values: zeroed(capacity)?,
            mask: bins - 1,
            hop_range,
        })
    }

    #[inline]
    pub(crate) fn mask(&self) -> usize {
        self.mask
    }

    #[inline]
    pub(crate) fn bins(&self) -> usize {
        self.mask + 1
    }

    /// Number of physical slots.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub(crate) fn hop_range(&self) -> usize {
        self.hop_range
    }

    /// Bytes held by the three arrays.
    pub(crate) fn mem_size(&self) -> usize {
        self.keys.len() * size_of::<Key>()
            + self.hops.len() * size_of::<u32>()
            + self.values.len() * size_of::<Value>()
    }

    #[inline]
    pub(crate) fn keys(&self) -> &[Key] {
        &self.keys
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> Key {
        self.keys[index]
    }

    #[inline]
    pub(crate) fn value(&self, index: usize) -> Value {
        self.values[index]
    }

    #[inline]
    pub(crate) fn hop_bits(&self, bin: usize) -> u32 {
        self.hops[bin]
    }

    /// Zero every key and hop word, keeping the allocation.
    pub(crate) fn clear(&mut self) {
        for key in self.keys.iter_mut() {
            *key = EMPTY_KEY;
        }
        for hop_bits in self.hops.iter_mut() {
            *hop_bits = 0;
        }
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    // Probing
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

    /// Look for `key` among the slots recorded in the hop bits of `bin`.
    /// Returns the slot holding it and the number of candidates compared.
    #[inline]
    pub(crate) fn find(&self, bin: usize, key: Key) -> (Option<usize>, u64) {
        let mut candidates = self.hops[bin];
        let mut probes = 0;
        while candidates != 0 {
            let offset = candidates.trailing_zeros() as usize;
            candidates &= candidates - 1;
            probes += 1;
            if self.keys[bin + offset] == key {
                return (Some(bin + offset), probes);
            }
        }
        (None, probes)
    }

    /// First empty slot at or after `start`, scanning linearly to the end of
    /// the physical array. Returns it with the number of slots examined.
    pub(crate) fn first_empty(&self, start: usize) -> (Option<usize>, u64) {
        let mut probes = 0;
        for index in start..self.keys.len() {
            probes += 1;
            if self.keys[index] == EMPTY_KEY {
                return (Some(index), probes);
            }
        }
        (None, probes)
    }

    /// Find a key that can move forward into the empty slot `free` while
    /// staying inside its own neighborhood.
    ///
    /// Home bins are checked from the farthest one (`free - (hop_range - 1)`)
    /// up, and within a bin the lowest occupied offset is taken, so each
    /// step moves the empty slot back as far as possible.
    /// Returns (home bin, slot to move from).
    ///
    /// Example: hop range 4, `free` = 10, hop bits of bin 7 = 0110.
    /// The key in slot 8 is homed at 7; moved to 10 it sits at offset 3,
    /// still inside bin 7's neighborhood, so the result is (7, 8).
    pub(crate) fn find_displacement(&self, free: usize) -> Option<(usize, usize)> {
        debug_assert_eq!(self.keys[free], EMPTY_KEY);
        let first_bin = free.saturating_sub(self.hop_range - 1);
        let last_bin = free.min(self.bins());
        for bin in first_bin..last_bin {
            let hop_bits = self.hops[bin];
            if hop_bits == 0 {
                continue;
            }
            // keys of this bin may also sit past free; only earlier ones can move
            let from = bin + hop_bits.trailing_zeros() as usize;
            if from < free {
                return Some((bin, from));
            }
        }
        None
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    // Slot alteration
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

    /// Store a key homed at `bin` in the empty slot `index`.
    #[inline]
    pub(crate) fn occupy(&mut self, bin: usize, index: usize, key: Key, value: Value) {
        debug_assert_eq!(self.keys[index], EMPTY_KEY);
        debug_assert!(index >= bin && index - bin < self.hop_range);
        self.keys[index] = key;
        self.values[index] = value;
        self.hops[bin] |= 1_u32 << (index - bin);
    }

    /// Overwrite the value of an occupied slot.
    #[inline]
    pub(crate) fn set_value(&mut self, index: usize, value: Value) {
        self.values[index] = value;
    }

    /// Move the key homed at `bin` from slot `from` into the empty slot `to`,
    /// updating the hop bits of `bin`. `from` is empty afterwards.
    pub(crate) fn relocate(&mut self, bin: usize, from: usize, to: usize) {
        debug_assert_eq!(self.keys[to], EMPTY_KEY);
        debug_assert!(to > from && to - bin < self.hop_range);
        self.keys[to] = self.keys[from];
        self.values[to] = self.values[from];
        self.keys[from] = EMPTY_KEY;
        self.hops[bin] = (self.hops[bin] & !(1_u32 << (from - bin))) | (1_u32 << (to - bin));
    }
}
