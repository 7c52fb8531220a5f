//! Hash functions that map a key to its home bin.
//!
//! A table masks the hash with its logical bin count, so only the low bits
//! matter for placement. When the table doubles, one more bit is used, which
//! is what separates keys that collided before the resize.

use crate::Key;

/// A deterministic `hash(key) -> word` function.
///
/// The function must not change for the lifetime of a table; every slot
/// position depends on it.
pub trait KeyHasher {
    fn hash(&self, key: Key) -> u64;
}

/// The default hasher: the 64-bit finalizer of MurmurHash3 applied to
/// the key xor the process mixing seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Murmur3Mixer {
    seed: u64,
}

impl Murmur3Mixer {
    /// Mixer using an explicit seed instead of the process-wide one.
    pub fn with_seed(seed: u64) -> Self {
        Murmur3Mixer { seed }
    }
}

impl Default for Murmur3Mixer {
    fn default() -> Self {
        Murmur3Mixer::with_seed(crate::global_state().mix_seed)
    }
}

impl KeyHasher for Murmur3Mixer {
    #[inline]
    fn hash(&self, key: Key) -> u64 {
        fmix64(key ^ self.seed)
    }
}

/// Uses the key itself as the hash.
///
/// Useful when keys are already well distributed in their low bits, and
/// for building tables whose layout is known in advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdentityHasher;

impl KeyHasher for IdentityHasher {
    #[inline]
    fn hash(&self, key: Key) -> u64 {
        key
    }
}

/// MurmurHash3 64-bit finalizer. A bijection, so distinct keys never share
/// a full hash.
#[inline]
pub fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}
