/// Counters updated on every enqueue and dequeue.
///
/// Only the owning discipline writes them (`&mut self`), so plain integers
/// suffice; shared access goes through [`SharedSfb`](crate::SharedSfb).
#[derive(Debug, Default)]
pub struct StatsCounter {
    forced_drop: u64,
    unforced_drop: u64,
    rate_limited: u64,
    enqueued: u64,
    dequeued: u64,
}

impl StatsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_forced_drop(&mut self) {
        self.forced_drop += 1;
    }

    #[inline]
    pub fn record_unforced_drop(&mut self) {
        self.unforced_drop += 1;
    }

    #[inline]
    pub fn record_rate_limited(&mut self) {
        self.rate_limited += 1;
    }

    #[inline]
    pub fn record_enqueue(&mut self) {
        self.enqueued += 1;
    }

    #[inline]
    pub fn record_dequeue(&mut self) {
        self.dequeued += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns a point-in-time snapshot of the statistics.
    pub fn snapshot(&self) -> SfbStats {
        SfbStats {
            forced_drop: self.forced_drop,
            unforced_drop: self.unforced_drop,
            rate_limited: self.rate_limited,
            enqueued: self.enqueued,
            dequeued: self.dequeued,
        }
    }
}

/// A point-in-time snapshot of discipline statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SfbStats {
    /// Drops because the queue was full (reactive).
    pub forced_drop: u64,
    /// Probabilistic and rate-limit drops before the queue filled (proactive).
    pub unforced_drop: u64,
    /// Arrivals whose bins were all saturated; the throttle hook decided
    /// their fate.  Drops among them are also in `unforced_drop`.
    pub rate_limited: u64,
    /// Packets accepted into the backing queue.
    pub enqueued: u64,
    /// Packets handed out by `dequeue`.
    pub dequeued: u64,
}

impl SfbStats {
    pub fn drops(&self) -> u64 {
        self.forced_drop + self.unforced_drop
    }

    /// Offered packets: every enqueue call ends up accepted or dropped.
    pub fn offered(&self) -> u64 {
        self.enqueued + self.drops()
    }

    /// `drops / offered`, or `0.0` if nothing was offered.
    pub fn drop_rate(&self) -> f64 {
        let offered = self.offered();
        if offered == 0 {
            0.0
        } else {
            self.drops() as f64 / offered as f64
        }
    }
}
