//! Plain configuration for a [`SfbQueueDisc`](crate::SfbQueueDisc).
//!
//! `SfbConfig` holds every scalar parameter of the discipline.  It is
//! validated once, when the discipline is built, and never consulted for
//! errors on the packet path.  With the `serde` feature enabled it can be
//! loaded from any serde format.
//!
//! # Example
//! ```
//! use sfb::{QueueMode, SfbConfig};
//!
//! let cfg = SfbConfig {
//!     mode: QueueMode::Bytes,
//!     limit: 64 * 1500,
//!     mean_packet_size: 1500,
//!     ..SfbConfig::default()
//! };
//! assert!(cfg.validate().is_ok());
//! assert_eq!(cfg.bin_capacity(), 4.0);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Width of a flow key in bits.  Bounds `levels * log2(bins)`.
pub const KEY_BITS: u32 = 32;

/// Upper bound on levels: one level per key bit with two bins per level.
pub const MAX_LEVELS: usize = KEY_BITS as usize;

/// Upper bound on bins per level.
pub const MAX_BINS: usize = 1 << 16;

/// Unit in which occupancy and the limit are counted.
#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum QueueMode {
    /// Occupancy is the number of queued packets.
    #[default]
    Packets,
    /// Occupancy is the sum of queued packet sizes.
    Bytes,
}

#[cfg_attr(feature = "serde", derive(Deserialize, Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct SfbConfig {
    pub mode: QueueMode,
    /// Queue limit in packets or bytes, per `mode`.
    pub limit: u32,
    /// Average packet size in bytes.  Only used to express a byte limit in
    /// packets when deriving the bin capacity.
    pub mean_packet_size: u32,
    /// Mark growth per congestion signal.
    pub increment: f64,
    /// Mark decay when an arrival finds its bin idle.
    pub decrement: f64,
    /// Bins per level (N).  Power of two.
    pub bins: usize,
    /// Number of levels (L).
    pub levels: usize,
    /// Seed of the drop-decision RNG.  `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Seed from which the per-level hash functions are derived.
    pub hash_seed: u64,
}

impl Default for SfbConfig {
    fn default() -> Self {
        SfbConfig {
            mode: QueueMode::Packets,
            limit: 25,
            mean_packet_size: 1000,
            increment: 0.0025,
            decrement: 0.00025,
            bins: 16,
            levels: 2,
            seed: None,
            hash_seed: 0x5FB0_B1E5_EED5_2016,
        }
    }
}

impl SfbConfig {
    /// Checks every scalar parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limit == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        if self.mean_packet_size == 0 {
            return Err(ConfigError::ZeroMeanPacketSize);
        }
        check_step("increment", self.increment)?;
        check_step("decrement", self.decrement)?;
        if self.bins < 2 || self.bins > MAX_BINS || !self.bins.is_power_of_two() {
            return Err(ConfigError::InvalidBinCount { bins: self.bins });
        }
        if self.levels == 0 {
            return Err(ConfigError::ZeroLevels);
        }
        let bits_per_level = self.bins.trailing_zeros();
        let needed = (self.levels as u64) * bits_per_level as u64;
        if needed > KEY_BITS as u64 {
            return Err(ConfigError::KeyWidthExceeded {
                levels: self.levels,
                bins: self.bins,
                needed: needed.min(u32::MAX as u64) as u32,
                available: KEY_BITS,
            });
        }
        Ok(())
    }

    /// Packets a single bin may hold before it counts as overloaded:
    /// `limit / bins`, with a byte limit first converted to packets via the
    /// mean packet size.
    pub fn bin_capacity(&self) -> f64 {
        let limit_packets = match self.mode {
            QueueMode::Packets => self.limit as f64,
            QueueMode::Bytes => self.limit as f64 / self.mean_packet_size.max(1) as f64,
        };
        limit_packets / self.bins.max(1) as f64
    }
}

fn check_step(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidStep { name, value })
    }
}
