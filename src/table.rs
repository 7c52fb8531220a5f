//! The hopscotch table: placement, resize, lookup, reset and enumeration.

use crate::config::{LoadFactor, TableConfig, MAX_BINS};
use crate::error::{HopscotchError, Result};
use crate::hash::{KeyHasher, Murmur3Mixer};
use crate::stats::{Seek, Stats};
use crate::storage::Storage;
use crate::{Key, Value, EMPTY_KEY};
use std::cell::Cell;
use std::iter::FusedIterator;

/// Whether the table is in the middle of moving its keys to new arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Rehashing,
}

/// What `put` did with a key, and the physical slot holding it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Put {
    Inserted { index: usize },
    Updated { index: usize },
}

impl Put {
    pub fn index(&self) -> usize {
        match *self {
            Put::Inserted { index } | Put::Updated { index } => index,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Put::Inserted { .. })
    }
}

enum Placement {
    Placed(usize),
    NoRoom,
}

#[inline]
fn home_bin<H: KeyHasher>(hasher: &H, key: Key, mask: usize) -> usize {
    (hasher.hash(key) as usize) & mask
}

fn threshold_for(resizable: bool, load_factor: LoadFactor, storage: &Storage) -> usize {
    let ceiling = storage.capacity() - 1;
    if resizable {
        load_factor.threshold_for(storage.bins()).min(ceiling)
    } else {
        ceiling
    }
}

fn doubled(bins: usize) -> Result<usize> {
    match bins.checked_mul(2) {
        Some(next) if next <= MAX_BINS => Ok(next),
        _ => Err(HopscotchError::CapacityOverflow {
            bins: bins.saturating_mul(2),
        }),
    }
}

/// Place a key that is not in `storage` into the neighborhood of `bin`.
///
/// Finds the first empty slot at or after `bin`. While that slot is out of
/// range, an earlier key that may legally move into it is moved there and
/// the slot it left becomes the new empty slot. Slots examined while
/// searching are added to `probes`.
///
/// `NoRoom` means the key cannot be placed without growing. Any moves made
/// before giving up leave every key inside its own neighborhood.
fn place(storage: &mut Storage, bin: usize, key: Key, value: Value, probes: &mut u64) -> Placement {
    let hop_range = storage.hop_range();

    // Every slot of the neighborhood already belongs to this bin.
    if storage.hop_bits(bin).count_ones() as usize == hop_range {
        return Placement::NoRoom;
    }

    let (free, scanned) = storage.first_empty(bin);
    *probes += scanned;
    let mut free = match free {
        Some(free) => free,
        None => return Placement::NoRoom,
    };

    while free - bin >= hop_range {
        match storage.find_displacement(free) {
            Some((home, from)) => {
                storage.relocate(home, from, free);
                free = from;
            }
            None => return Placement::NoRoom,
        }
    }

    storage.occupy(bin, free, key, value);
    Placement::Placed(free)
}

/// A hopscotch hash table from non-zero word keys to `u32` values.
///
/// Every key lives within `hop_range` slots of its home bin, so a lookup
/// compares at most `hop_range` keys, and only the ones the home bin's hop
/// bits point at.
///
/// # Key zero
///
/// Key `0` marks empty slots and must never be stored. `put` only checks
/// this with a debug assertion; in release builds a zero key corrupts the
/// table's contents. Looking up zero is not meaningful either.
///
/// # Threads
///
/// Lookups update statistics through a `Cell`, so the table is not `Sync`.
/// It is meant to be owned and used by one thread at a time.
#[derive(Debug, Clone)]
pub struct HopscotchTable<H = Murmur3Mixer> {
    storage: Storage,
    hasher: H,
    resizable: bool,
    load_factor: LoadFactor,
    count: usize,
    threshold: usize,
    prev_size: usize,
    resized: bool,
    phase: Phase,
    stats: Cell<Stats>,
}

impl HopscotchTable<Murmur3Mixer> {
    /// Create a table sized for `estimated_count` keys with neighborhoods
    /// of `hop_range` slots, using the default hasher.
    pub fn create(resizable: bool, estimated_count: usize, hop_range: u8) -> Result<Self> {
        let config = TableConfig::default()
            .with_resizable(resizable)
            .with_estimated_count(estimated_count)
            .with_hop_range(hop_range);
        HopscotchTable::with_config(&config)
    }

    pub fn with_config(config: &TableConfig) -> Result<Self> {
        HopscotchTable::with_config_and_hasher(config, Murmur3Mixer::default())
    }
}

impl<H: KeyHasher> HopscotchTable<H> {
    /// Create a table with an explicit hasher.
    ///
    /// The logical bin count is the smallest power of two whose load factor
    /// threshold holds `estimated_count` keys.
    pub fn with_config_and_hasher(config: &TableConfig, hasher: H) -> Result<Self> {
        crate::init();
        config.validate()?;

        let bins = config.initial_bins();
        let storage = Storage::allocate(bins, usize::from(config.hop_range))?;
        let threshold = threshold_for(config.resizable, config.load_factor, &storage);
        log::debug!(
            "Created hopscotch table: {} bins, hop range {}, threshold {}, {} bytes",
            bins,
            config.hop_range,
            threshold,
            storage.mem_size()
        );

        Ok(HopscotchTable {
            storage,
            hasher,
            resizable: config.resizable,
            load_factor: config.load_factor,
            count: 0,
            threshold,
            prev_size: bins,
            resized: false,
            phase: Phase::Idle,
            stats: Cell::new(Stats::default()),
        })
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    // Basic operation
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

    /// Insert `key` with `value`, or overwrite the value if `key` is present.
    ///
    /// If the key cannot be placed within its neighborhood, a resizable
    /// table doubles and tries again. It also doubles after an insertion
    /// that takes the count past the threshold. A non-resizable table
    /// returns [`HopscotchError::TableFull`] instead and keeps its contents.
    ///
    /// `key` must not be 0.
    pub fn put(&mut self, key: Key, value: Value) -> Result<Put> {
        debug_assert_ne!(key, EMPTY_KEY, "key 0 is reserved for empty slots");
        debug_assert_eq!(self.phase, Phase::Idle, "put called during a rehash");

        let mut probes = 0;
        loop {
            let bin = home_bin(&self.hasher, key, self.storage.mask());
            let (found, compared) = self.storage.find(bin, key);
            probes += compared;
            if let Some(index) = found {
                self.storage.set_value(index, value);
                self.record(Seek::Hit, probes);
                return Ok(Put::Updated { index });
            }

            if !self.resizable && self.count >= self.threshold {
                return Err(self.refuse());
            }

            match place(&mut self.storage, bin, key, value, &mut probes) {
                Placement::Placed(index) => {
                    self.record(Seek::Miss, probes);
                    self.count += 1;
                    if self.count <= self.threshold {
                        return Ok(Put::Inserted { index });
                    }
                    while self.count > self.threshold {
                        self.grow()?;
                    }
                    let bin = home_bin(&self.hasher, key, self.storage.mask());
                    return match self.storage.find(bin, key) {
                        (Some(index), _) => Ok(Put::Inserted { index }),
                        (None, _) => unreachable!("rehash dropped key {:#x}", key),
                    };
                }
                Placement::NoRoom if self.resizable => self.grow()?,
                Placement::NoRoom => return Err(self.refuse()),
            }
        }
    }

    /// The value stored for `key`, or `None` if it is absent.
    pub fn get(&self, key: Key) -> Option<Value> {
        self.lookup(key).map(|index| self.storage.value(index))
    }

    /// Whether `key` is present.
    pub fn containsp(&self, key: Key) -> bool {
        self.lookup(key).is_some()
    }

    /// Physical slot of `key`, counting the lookup in the statistics.
    fn lookup(&self, key: Key) -> Option<usize> {
        let bin = home_bin(&self.hasher, key, self.storage.mask());
        let (found, probes) = self.storage.find(bin, key);
        let seek = if found.is_some() { Seek::Hit } else { Seek::Miss };
        self.record(seek, probes);
        found
    }

    /// Remove every key and clear the statistics.
    ///
    /// A table that grew since the last reset goes back to the bin count it
    /// was created with. If that allocation fails the table is still empty,
    /// just at its grown size.
    pub fn reset(&mut self) -> Result<()> {
        self.storage.clear();
        self.count = 0;
        self.stats.set(Stats::default());

        if self.resized {
            let storage = Storage::allocate(self.prev_size, self.storage.hop_range())?;
            log::debug!(
                "Shrinking hopscotch table back from {} to {} bins",
                self.storage.bins(),
                storage.bins()
            );
            self.storage = storage;
            self.threshold = threshold_for(self.resizable, self.load_factor, &self.storage);
            self.resized = false;
        }
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    // Resize
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

    fn grow(&mut self) -> Result<()> {
        let bins = doubled(self.storage.bins())?;
        self.rehash(bins)?;
        self.resized = true;
        Ok(())
    }

    /// Move every key into fresh arrays of at least `bins` logical bins,
    /// then release the old arrays.
    fn rehash(&mut self, bins: usize) -> Result<()> {
        assert_eq!(self.phase, Phase::Idle, "nested rehash");
        self.phase = Phase::Rehashing;
        let rehashed = self.rehash_into(bins);
        self.phase = Phase::Idle;

        let storage = rehashed?;
        log::debug!(
            "Resized hopscotch table from {} to {} bins ({} keys)",
            self.storage.bins(),
            storage.bins(),
            self.count
        );
        self.storage = storage;
        self.threshold = threshold_for(self.resizable, self.load_factor, &self.storage);
        Ok(())
    }

    /// Build the new arrays. If some key does not fit, start over with twice
    /// as many bins rather than growing from inside a placement.
    fn rehash_into(&self, mut bins: usize) -> Result<Storage> {
        let hop_range = self.storage.hop_range();
        'attempt: loop {
            let mut fresh = Storage::allocate(bins, hop_range)?;
            for (index, key) in Iter::over(self.storage.keys()) {
                let bin = home_bin(&self.hasher, key, fresh.mask());
                let value = self.storage.value(index);
                if let Placement::NoRoom = place(&mut fresh, bin, key, value, &mut 0) {
                    log::debug!("Rehash into {} bins ran out of room, doubling again", bins);
                    bins = doubled(bins)?;
                    continue 'attempt;
                }
            }
            return Ok(fresh);
        }
    }

    fn refuse(&self) -> HopscotchError {
        log::warn!(
            "Hopscotch table is full and not resizable ({} keys, capacity {})",
            self.count,
            self.storage.capacity()
        );
        HopscotchError::TableFull {
            capacity: self.storage.capacity(),
        }
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    // Statistics
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

    #[inline]
    fn record(&self, seek: Seek, probes: u64) {
        let mut stats = self.stats.get();
        stats.record(seek, probes);
        self.stats.set(stats);
    }

    /// Counters accumulated since creation or the last reset.
    pub fn stats(&self) -> Stats {
        self.stats.get()
    }

    /// Write the counters to the `log` facade at info level.
    pub fn log_stats(&self) {
        log::info!(
            "Hopscotch table with {} keys in {} bins (hop range {}, {} bytes): {}",
            self.count,
            self.storage.bins(),
            self.storage.hop_range(),
            self.storage.mem_size(),
            self.stats.get()
        );
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    // Enumeration and accessors
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

    /// All occupied slots as (physical index, key), highest index first.
    pub fn iter(&self) -> Iter<'_> {
        Iter::over(self.storage.keys())
    }

    /// Value stored in physical slot `index`, as yielded by [`iter`](Self::iter).
    ///
    /// Panics if `index` is not below [`capacity`](Self::capacity).
    pub fn value_at(&self, index: usize) -> Value {
        self.storage.value(index)
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Logical bin count, always a power of two.
    pub fn bins(&self) -> usize {
        self.storage.bins()
    }

    /// Physical slot count: `bins + hop_range - 1`.
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    pub fn hop_range(&self) -> usize {
        self.storage.hop_range()
    }

    /// Key count above which a resizable table grows.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Logical bin count the table was created with, restored by `reset`.
    pub fn prev_size(&self) -> usize {
        self.prev_size
    }

    /// Bytes held by the backing arrays.
    pub fn mem_size(&self) -> usize {
        self.storage.mem_size()
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    /// Whether the table grew since it was created or last reset.
    pub fn was_resized(&self) -> bool {
        self.resized
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Share of physical slots that hold a key.
    pub fn fill_rate(&self) -> f64 {
        self.count as f64 / self.storage.capacity() as f64
    }

    /// Home bin of `key` under the current bin count.
    pub fn home_bin(&self, key: Key) -> usize {
        home_bin(&self.hasher, key, self.storage.mask())
    }

    /// Hop bits of logical bin `bin`.
    pub fn hop_bits(&self, bin: usize) -> u32 {
        self.storage.hop_bits(bin)
    }

    /// Key in physical slot `index`, `EMPTY_KEY` if the slot is free.
    pub fn key_at(&self, index: usize) -> Key {
        self.storage.key(index)
    }
}

impl<'a, H: KeyHasher> IntoIterator for &'a HopscotchTable<H> {
    type Item = (usize, Key);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Occupied slots of a table, walked from the highest physical index down.
///
/// The order is only meant for complete traversal. Call
/// [`HopscotchTable::iter`] again to start over.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    keys: &'a [Key],
    remaining: usize,
}

impl<'a> Iter<'a> {
    fn over(keys: &'a [Key]) -> Self {
        Iter {
            keys,
            remaining: keys.len(),
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (usize, Key);

    fn next(&mut self) -> Option<(usize, Key)> {
        while self.remaining > 0 {
            self.remaining -= 1;
            let key = self.keys[self.remaining];
            if key != EMPTY_KEY {
                return Some((self.remaining, key));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl FusedIterator for Iter<'_> {}
