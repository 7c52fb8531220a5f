//! hopscotch-table -- a hopscotch hash table for word-sized keys
//!
//! Keys are non-zero `u64` words (typically addresses), values are `u32`.
//! Key `0` is the empty-slot marker and can never be stored.
//!
//! Every key hashing to logical bin b lives in one of the `hop_range`
//! physical slots b, b + 1, ..., b + hop_range - 1. Each bin keeps a hop
//! word recording which of those slots hold its keys, so a lookup
//! compares only those few slots.
//!
//! ```
//! use hopscotch_table::HopscotchTable;
//!
//! hopscotch_table::init();
//! let mut table = HopscotchTable::create(true, 100, 8).unwrap();
//! table.put(0x7f00_1000, 3).unwrap();
//! table.put(0x7f00_1000, 4).unwrap();
//! assert_eq!(table.get(0x7f00_1000), Some(4));
//! assert!(!table.containsp(0x7f00_2000));
//! assert_eq!(table.len(), 1);
//! ```
//!
//! Tables are single-threaded: lookups update statistics through interior
//! mutability, so a table is neither `Sync` nor meant to be shared.

pub mod config;
pub mod error;
pub mod hash;
pub mod stats;
mod storage;
pub mod table;

pub use config::{LoadFactor, TableConfig};
pub use error::{HopscotchError, Result};
pub use hash::{IdentityHasher, KeyHasher, Murmur3Mixer};
pub use stats::{Counters, Stats};
pub use table::{HopscotchTable, Iter, Phase, Put};

use std::sync::OnceLock;

/// Keys are machine words.
pub type Key = u64;

/// Values are small unsigned integers.
pub type Value = u32;

/// Reserved key marking an empty slot.
pub const EMPTY_KEY: Key = 0;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fixed mixing seed of the default hasher (the 64-bit golden ratio).
const DEFAULT_MIX_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// State shared by every table in the process.
#[derive(Debug)]
pub(crate) struct GlobalState {
    pub(crate) mix_seed: u64,
}

static GLOBAL_STATE: OnceLock<GlobalState> = OnceLock::new();

pub(crate) fn global_state() -> &'static GlobalState {
    GLOBAL_STATE.get_or_init(|| {
        log::debug!("Initializing hopscotch-table v{}", VERSION);
        GlobalState {
            mix_seed: DEFAULT_MIX_SEED,
        }
    })
}

/// Set up process-wide state. Calling it again does nothing.
///
/// Table creation runs it on first use, so calling it explicitly only
/// moves the one-time work to a point of the caller's choosing.
pub fn init() {
    global_state();
}
