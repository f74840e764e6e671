use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::builder::SfbBuilder;
use crate::classifier::FlowClassifier;
use crate::config::{QueueMode, SfbConfig};
use crate::error::ConfigError;
use crate::listener::{DropCause, DropListener};
use crate::matrix::{BinMatrix, BinRouter};
use crate::metrics::stats::{SfbStats, StatsCounter};
use crate::packet::{Packet, QueueItem};
use crate::queue::BackingQueue;
use crate::throttle::{ThrottleHook, ThrottleVerdict};
use crate::FlowKey;

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Outcome of offering one packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Stored in the backing queue.
    Enqueued,
    /// Refused because the queue was full.
    ForcedDrop,
    /// Refused by the minimum-mark probability draw.
    UnforcedDrop,
    /// All bins saturated and the throttle hook refused the packet.
    RateLimited,
}

impl Verdict {
    #[inline]
    pub fn is_accepted(self) -> bool {
        matches!(self, Verdict::Enqueued)
    }

    /// The drop cause, or `None` for an accepted packet.
    pub fn drop_cause(self) -> Option<DropCause> {
        match self {
            Verdict::Enqueued => None,
            Verdict::ForcedDrop => Some(DropCause::Forced),
            Verdict::UnforcedDrop => Some(DropCause::Unforced),
            Verdict::RateLimited => Some(DropCause::RateLimited),
        }
    }
}

// ---------------------------------------------------------------------------
// Queue discipline
// ---------------------------------------------------------------------------

/// A Stochastic Fair Blue queue discipline.
///
/// Every arrival is classified to a flow key and routed to one bin per
/// level.  The packet is force-dropped when the queue is full, dropped with
/// the minimum mark of its bins as probability otherwise, and stored in the
/// backing FIFO if it survives.  Bins learn from these events: idle bins
/// relax, overloaded bins and overflows raise their marks.
///
/// Calls are synchronous and take `&mut self`; wrap the discipline in a
/// [`SharedSfb`](crate::SharedSfb) to share it between threads.
///
/// # Example
/// ```
/// use sfb::{Packet, SfbBuilder};
///
/// struct Datagram { flow: u32 }
/// impl Packet for Datagram {
///     fn size(&self) -> u32 { 1_000 }
/// }
///
/// let mut disc = SfbBuilder::new()
///     .limit(25)
///     .seed(1)
///     .classifier(|d: &Datagram| d.flow)
///     .build()
///     .unwrap();
///
/// assert!(disc.enqueue(Datagram { flow: 7 }));
/// assert_eq!(disc.dequeue().map(|d| d.flow), Some(7));
/// assert!(disc.dequeue().is_none());
/// ```
pub struct SfbQueueDisc<P> {
    config: SfbConfig,
    matrix: BinMatrix,
    router: BinRouter,
    queue: Box<dyn BackingQueue<QueueItem<P>>>,
    classifier: Box<dyn FlowClassifier<P>>,
    throttle: Box<dyn ThrottleHook<P>>,
    /// Optional drop listener.  `None` if the user didn't register one.
    listener: Option<Box<dyn DropListener<P>>>,
    rng: StdRng,
    stats: StatsCounter,
}

impl<P: Packet> SfbQueueDisc<P> {
    /// Assembles a discipline from a validated configuration.
    pub(crate) fn new(
        config: SfbConfig,
        queue: Box<dyn BackingQueue<QueueItem<P>>>,
        classifier: Box<dyn FlowClassifier<P>>,
        throttle: Box<dyn ThrottleHook<P>>,
        listener: Option<Box<dyn DropListener<P>>>,
    ) -> Self {
        let matrix = BinMatrix::new(
            config.levels,
            config.bins,
            config.bin_capacity(),
            config.increment,
            config.decrement,
        );
        let router = BinRouter::new(config.levels, config.bins, config.hash_seed);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        debug!(?config, bin_capacity = matrix.capacity(), "New SfbQueueDisc");
        SfbQueueDisc {
            config,
            matrix,
            router,
            queue,
            classifier,
            throttle,
            listener,
            rng,
            stats: StatsCounter::new(),
        }
    }

    /// Returns a [`SfbBuilder`] with default parameters.
    pub fn builder() -> SfbBuilder<P> {
        SfbBuilder::new()
    }

    // -----------------------------------------------------------------------
    // Hot-path: enqueue
    // -----------------------------------------------------------------------

    /// Offers `packet`; returns `true` if it was queued.
    #[inline]
    pub fn enqueue(&mut self, packet: P) -> bool {
        self.offer(packet).is_accepted()
    }

    /// Offers `packet` and reports what happened to it.
    pub fn offer(&mut self, packet: P) -> Verdict {
        let key = self.classifier.classify(&packet);
        let slots = self.router.route(key);

        if self.would_overflow(packet.size()) {
            self.matrix.on_overflow(&slots);
            self.stats.record_forced_drop();
            self.notify_drop(&packet, key, DropCause::Forced);
            return Verdict::ForcedDrop;
        }

        self.matrix.on_arrival(&slots);
        let p_min = self.matrix.min_mark(&slots);

        if p_min >= 1.0 {
            self.stats.record_rate_limited();
            trace!(key, "all bins saturated, consulting throttle");
            if self.throttle.on_saturated(&packet, key) == ThrottleVerdict::Drop {
                self.stats.record_unforced_drop();
                self.notify_drop(&packet, key, DropCause::RateLimited);
                return Verdict::RateLimited;
            }
        } else if self.rng.gen::<f64>() <= p_min {
            self.stats.record_unforced_drop();
            self.notify_drop(&packet, key, DropCause::Unforced);
            return Verdict::UnforcedDrop;
        }

        match self.queue.enqueue(QueueItem { packet, key }) {
            Ok(()) => {
                self.matrix.on_admit(&slots);
                self.stats.record_enqueue();
                Verdict::Enqueued
            }
            Err(item) => {
                // The backing queue filled before the limit did.
                self.stats.record_forced_drop();
                self.notify_drop(&item.packet, key, DropCause::Forced);
                Verdict::ForcedDrop
            }
        }
    }

    #[inline]
    fn would_overflow(&self, size: u32) -> bool {
        let occupancy = self.queue_size() as u64;
        let incoming = match self.config.mode {
            QueueMode::Packets => 1,
            QueueMode::Bytes => size as u64,
        };
        occupancy + incoming > self.config.limit as u64
    }

    fn notify_drop(&self, packet: &P, key: FlowKey, cause: DropCause) {
        trace!(
            key,
            ?cause,
            queue_size = self.queue_size(),
            size = packet.size(),
            "SFB drop"
        );
        if let Some(listener) = &self.listener {
            listener.on_drop(packet, key, cause);
        }
    }

    // -----------------------------------------------------------------------
    // Hot-path: dequeue / peek
    // -----------------------------------------------------------------------

    /// Removes the head packet, releasing its bins.  `None` when empty.
    pub fn dequeue(&mut self) -> Option<P> {
        let item = self.queue.dequeue()?;
        let slots = self.router.route(item.key);
        self.matrix.on_depart(&slots);
        self.stats.record_dequeue();
        Some(item.packet)
    }

    /// The head packet, without removing it or touching any bin.
    pub fn peek(&self) -> Option<&P> {
        self.queue.peek().map(|item| &item.packet)
    }

    // -----------------------------------------------------------------------
    // Configuration changes
    // -----------------------------------------------------------------------

    /// Changes the queue limit and recomputes the bin capacity.
    ///
    /// Fails if the backing queue cannot hold the new limit.
    pub fn set_queue_limit(&mut self, limit: u32) -> Result<(), ConfigError> {
        if limit == 0 {
            return Err(ConfigError::ZeroLimit);
        }
        let capacity = self.queue.capacity();
        if capacity < limit {
            return Err(ConfigError::BackingQueueTooSmall { capacity, limit });
        }
        self.config.limit = limit;
        self.matrix.set_capacity(self.config.bin_capacity());
        debug!(limit, bin_capacity = self.matrix.capacity(), "SFB limit changed");
        Ok(())
    }

    /// Reseeds the drop-decision RNG with `stream`, making subsequent
    /// decisions reproducible.  Returns the number of streams used (1).
    pub fn assign_stream(&mut self, stream: u64) -> u64 {
        self.config.seed = Some(stream);
        self.rng = StdRng::seed_from_u64(stream);
        1
    }

    /// Re-initializes the discipline: discards queued packets, zeroes every
    /// bin and every counter, and reseeds the RNG from the configured seed.
    pub fn reset(&mut self) {
        while self.queue.dequeue().is_some() {}
        self.matrix.reset();
        self.stats.reset();
        if let Some(seed) = self.config.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        debug!(config = ?self.config, "SfbQueueDisc reset");
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> SfbStats {
        self.stats.snapshot()
    }

    /// Occupancy in the configured unit (packets or bytes).
    pub fn queue_size(&self) -> u32 {
        match self.config.mode {
            QueueMode::Packets => self.queue.packet_count(),
            QueueMode::Bytes => self.queue.byte_count(),
        }
    }

    /// Number of queued packets, whatever the mode.
    pub fn len(&self) -> usize {
        self.queue.packet_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn mode(&self) -> QueueMode {
        self.config.mode
    }

    pub fn limit(&self) -> u32 {
        self.config.limit
    }

    /// Packets a bin may hold before it counts as overloaded.
    pub fn bin_capacity(&self) -> f64 {
        self.matrix.capacity()
    }

    /// Read-only view of the bin matrix.
    pub fn bins(&self) -> &BinMatrix {
        &self.matrix
    }

    pub fn router(&self) -> &BinRouter {
        &self.router
    }

    pub fn config(&self) -> &SfbConfig {
        &self.config
    }

    /// The flow key `packet` would be classified to.
    pub fn classify(&self, packet: &P) -> FlowKey {
        self.classifier.classify(packet)
    }
}

impl<P> std::fmt::Debug for SfbQueueDisc<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SfbQueueDisc")
            .field("config", &self.config)
            .field("packets", &self.queue.packet_count())
            .field("bytes", &self.queue.byte_count())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}
