//! Hit and miss counters, kept for tuning hop range and load factor.

use serde::Serialize;
use std::fmt;

/// One bucket of counters: how many operations landed here and how many
/// physical slots they examined in total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub seeks: u64,
    pub probes: u64,
}

impl Counters {
    #[inline]
    fn record(&mut self, probes: u64) {
        self.seeks += 1;
        self.probes += probes;
    }

    /// Average probes per seek, 0 when nothing was recorded.
    pub fn mean_probes(&self) -> f64 {
        if self.seeks == 0 {
            0.0
        } else {
            self.probes as f64 / self.seeks as f64
        }
    }
}

/// Which bucket an operation counts towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Seek {
    /// The key was already present.
    Hit,
    /// The key was absent.
    Miss,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub hit: Counters,
    pub miss: Counters,
}

impl Stats {
    #[inline]
    pub(crate) fn record(&mut self, seek: Seek, probes: u64) {
        match seek {
            Seek::Hit => self.hit.record(probes),
            Seek::Miss => self.miss.record(probes),
        }
    }

    /// Total number of recorded operations.
    pub fn seeks(&self) -> u64 {
        self.hit.seeks + self.miss.seeks
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hit: {} seeks, {} probes ({:.2}/seek); miss: {} seeks, {} probes ({:.2}/seek)",
            self.hit.seeks,
            self.hit.probes,
            self.hit.mean_probes(),
            self.miss.seeks,
            self.miss.probes,
            self.miss.mean_probes(),
        )
    }
}
