//! Named creation parameters for a table.

use crate::error::{HopscotchError, Result};
use serde::{Deserialize, Serialize};

/// Widest neighborhood a 32-bit hop word can describe.
pub const MAX_HOP_RANGE: u8 = 32;

/// Largest logical bin count a table may grow to.
pub const MAX_BINS: usize = 1 << 31;

/// Fraction of logical bins that may be occupied before a resizable table
/// grows pre-emptively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFactor {
    pub numerator: u32,
    pub denominator: u32,
}

impl LoadFactor {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        LoadFactor {
            numerator,
            denominator,
        }
    }

    /// Occupancy threshold for a table with `bins` logical bins.
    pub fn threshold_for(&self, bins: usize) -> usize {
        ((bins as u128 * u128::from(self.numerator)) / u128::from(self.denominator)) as usize
    }

    /// Smallest power of two bin count whose threshold is at least `count`.
    pub fn bins_for(&self, count: usize) -> usize {
        let mut bins = 1_usize;
        while self.threshold_for(bins) < count && bins < MAX_BINS {
            bins <<= 1;
        }
        bins
    }
}

impl Default for LoadFactor {
    /// 13/16, a little above 80% occupancy.
    fn default() -> Self {
        LoadFactor::new(13, 16)
    }
}

/// Parameters for [`HopscotchTable::with_config`](crate::HopscotchTable::with_config).
///
/// ```
/// use hopscotch_table::TableConfig;
///
/// let config = TableConfig::default()
///     .with_estimated_count(1000)
///     .with_hop_range(16);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Whether the table may grow when a key does not fit.
    pub resizable: bool,
    /// Number of keys the caller expects to store.
    pub estimated_count: usize,
    /// Width of each neighborhood, in physical slots.
    pub hop_range: u8,
    pub load_factor: LoadFactor,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            resizable: true,
            estimated_count: 32,
            hop_range: 8,
            load_factor: LoadFactor::default(),
        }
    }
}

impl TableConfig {
    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    pub fn with_estimated_count(mut self, estimated_count: usize) -> Self {
        self.estimated_count = estimated_count;
        self
    }

    pub fn with_hop_range(mut self, hop_range: u8) -> Self {
        self.hop_range = hop_range;
        self
    }

    pub fn with_load_factor(mut self, load_factor: LoadFactor) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Check that the parameters describe a table that can exist.
    pub fn validate(&self) -> Result<()> {
        if self.hop_range == 0 || self.hop_range > MAX_HOP_RANGE {
            return Err(HopscotchError::invalid_config(format!(
                "hop range must be in 1..={}, got {}",
                MAX_HOP_RANGE, self.hop_range
            )));
        }
        let LoadFactor {
            numerator,
            denominator,
        } = self.load_factor;
        if numerator == 0 || denominator == 0 || numerator > denominator {
            return Err(HopscotchError::invalid_config(format!(
                "load factor must be in (0, 1], got {}/{}",
                numerator, denominator
            )));
        }
        if self.load_factor.threshold_for(MAX_BINS) < self.estimated_count {
            return Err(HopscotchError::invalid_config(format!(
                "estimated count {} exceeds the largest table",
                self.estimated_count
            )));
        }
        Ok(())
    }

    /// Logical bin count a new table built from this config starts with.
    pub fn initial_bins(&self) -> usize {
        self.load_factor.bins_for(self.estimated_count)
    }
}
