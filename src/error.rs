use thiserror::Error;

use crate::config::QueueMode;

/// Reasons a discipline refuses its configuration.
///
/// Returned from [`SfbBuilder::build`](crate::SfbBuilder::build) and
/// [`SfbQueueDisc::set_queue_limit`](crate::SfbQueueDisc::set_queue_limit).
/// Packet processing never produces one of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The queue limit is zero.
    #[error("queue limit must be greater than 0")]
    ZeroLimit,

    /// The mean packet size used for byte-mode accounting is zero.
    #[error("mean packet size must be greater than 0")]
    ZeroMeanPacketSize,

    /// An increment or decrement step is not a finite value in `[0, 1]`.
    #[error("{name} step must be a finite value in [0, 1], got {value}")]
    InvalidStep { name: &'static str, value: f64 },

    /// The number of bins per level is not a power of two in `[2, 65536]`.
    #[error("bins per level must be a power of two in [2, 65536], got {bins}")]
    InvalidBinCount { bins: usize },

    /// The number of levels is zero.
    #[error("at least one level is required")]
    ZeroLevels,

    /// `levels * log2(bins)` needs more bits than a flow key carries.
    #[error("{levels} levels of {bins} bins need {needed} key bits, only {available} available")]
    KeyWidthExceeded {
        levels: usize,
        bins: usize,
        needed: u32,
        available: u32,
    },

    /// More than one flow classifier was registered.
    #[error("expected exactly one flow classifier, found {found}")]
    ClassifierCount { found: usize },

    /// More than one backing queue was registered.
    #[error("expected exactly one backing queue, found {found}")]
    BackingQueueCount { found: usize },

    /// The backing queue counts in a different unit than the discipline.
    #[error("backing queue mode {queue:?} does not match discipline mode {disc:?}")]
    ModeMismatch { queue: QueueMode, disc: QueueMode },

    /// The backing queue cannot hold `limit` units.
    #[error("backing queue capacity {capacity} is smaller than the queue limit {limit}")]
    BackingQueueTooSmall { capacity: u32, limit: u32 },
}
