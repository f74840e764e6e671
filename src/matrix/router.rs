use ahash::RandomState;

use crate::config::MAX_LEVELS;
use crate::FlowKey;

/// Maps a flow key to one bin index per level.
///
/// Every level owns its own `RandomState`, seeded from the router seed and
/// the level number, so the per-level index functions are independent: two
/// keys that share a bin on one level are no more likely than chance to
/// share one on another level.  Indices are the high 32 bits of the level's
/// hash masked to `[0, bins)`.
#[derive(Clone, Debug)]
pub struct BinRouter {
    hashers: Vec<RandomState>,
    /// `bins - 1`; `bins` is a power of two.
    mask: usize,
}

impl BinRouter {
    /// `levels` must be in `1..=MAX_LEVELS` and `bins` a power of two;
    /// [`SfbConfig::validate`](crate::SfbConfig::validate) guarantees both.
    pub fn new(levels: usize, bins: usize, seed: u64) -> Self {
        debug_assert!(bins.is_power_of_two());
        let levels = levels.clamp(1, MAX_LEVELS);
        let hashers = (0..levels)
            .map(|level| {
                let mut state = seed ^ (level as u64).wrapping_mul(0xA076_1D64_78BD_642F);
                RandomState::with_seeds(
                    splitmix64(&mut state),
                    splitmix64(&mut state),
                    splitmix64(&mut state),
                    splitmix64(&mut state),
                )
            })
            .collect();
        BinRouter {
            hashers,
            mask: bins - 1,
        }
    }

    #[inline]
    pub fn levels(&self) -> usize {
        self.hashers.len()
    }

    #[inline]
    pub fn bins(&self) -> usize {
        self.mask + 1
    }

    /// Bin index of `key` on `level`.  Pure: same inputs, same index.
    #[inline]
    pub fn index(&self, key: FlowKey, level: usize) -> usize {
        let h = self.hashers[level].hash_one(key);
        ((h >> 32) as usize) & self.mask
    }

    /// Indices of `key` on every level.
    pub fn route(&self, key: FlowKey) -> BinSlots {
        let mut slots = BinSlots {
            index: [0; MAX_LEVELS],
            levels: self.hashers.len() as u8,
        };
        for level in 0..self.hashers.len() {
            slots.index[level] = self.index(key, level) as u16;
        }
        slots
    }
}

/// The `(level, index)` pairs a flow key maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinSlots {
    index: [u16; MAX_LEVELS],
    levels: u8,
}

impl BinSlots {
    /// Slots from explicit indices, one per level.
    ///
    /// # Panics
    /// If more than `MAX_LEVELS` indices are given or an index exceeds
    /// `u16::MAX`.
    pub fn from_indices(indices: &[usize]) -> Self {
        assert!(indices.len() <= MAX_LEVELS, "too many levels");
        let mut index = [0u16; MAX_LEVELS];
        for (slot, &i) in index.iter_mut().zip(indices) {
            assert!(i <= u16::MAX as usize, "bin index exceeds u16");
            *slot = i as u16;
        }
        BinSlots {
            index,
            levels: indices.len() as u8,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.levels as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels == 0
    }

    /// Bin index on `level`.
    #[inline]
    pub fn get(&self, level: usize) -> usize {
        self.index[..self.len()][level] as usize
    }

    /// `(level, index)` pairs in level order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.index[..self.len()]
            .iter()
            .enumerate()
            .map(|(level, &i)| (level, i as usize))
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
