use tracing::debug;

use crate::classifier::{FiveTupleClassifier, FlowClassifier, FnClassifier};
use crate::config::{QueueMode, SfbConfig};
use crate::disc::SfbQueueDisc;
use crate::error::ConfigError;
use crate::listener::{DropCause, DropListener, FnListener};
use crate::packet::{Packet, QueueItem};
use crate::queue::{BackingQueue, DropTailQueue};
use crate::throttle::{FnThrottle, PassThrough, PenaltyBox, ThrottleHook, ThrottleVerdict};
use crate::FlowKey;

/// Builder for configuring and constructing a [`SfbQueueDisc`].
///
/// Parameters are checked in [`build`](Self::build), not in the setters.
///
/// # Example
/// ```
/// use sfb::{Packet, QueueMode, SfbBuilder};
///
/// struct Frame(Vec<u8>);
/// impl Packet for Frame {
///     fn size(&self) -> u32 { self.0.len() as u32 }
/// }
///
/// let disc = SfbBuilder::<Frame>::new()
///     .mode(QueueMode::Bytes)
///     .limit(64 * 1500)
///     .mean_packet_size(1500)
///     .bins(32)
///     .build()
///     .unwrap();
/// assert_eq!(disc.bin_capacity(), 2.0);
/// ```
pub struct SfbBuilder<P> {
    config: SfbConfig,
    classifiers: Vec<Box<dyn FlowClassifier<P>>>,
    queues: Vec<Box<dyn BackingQueue<QueueItem<P>>>>,
    throttle: Option<Box<dyn ThrottleHook<P>>>,
    listener: Option<Box<dyn DropListener<P>>>,
}

impl<P: Packet> SfbBuilder<P> {
    pub fn new() -> Self {
        Self::from_config(SfbConfig::default())
    }

    /// Starts from an existing configuration, e.g. one loaded with serde.
    pub fn from_config(config: SfbConfig) -> Self {
        SfbBuilder {
            config,
            classifiers: Vec::new(),
            queues: Vec::new(),
            throttle: None,
            listener: None,
        }
    }

    /// Count occupancy in packets (default) or bytes.
    pub fn mode(mut self, mode: QueueMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Queue limit in the unit given by [`mode`](Self::mode) (default: 25).
    pub fn limit(mut self, limit: u32) -> Self {
        self.config.limit = limit;
        self
    }

    /// Average packet size for byte mode (default: 1000).
    pub fn mean_packet_size(mut self, bytes: u32) -> Self {
        self.config.mean_packet_size = bytes;
        self
    }

    /// Mark increment per congestion signal (default: 0.0025).
    pub fn increment(mut self, step: f64) -> Self {
        self.config.increment = step;
        self
    }

    /// Mark decrement per idle arrival (default: 0.00025).
    pub fn decrement(mut self, step: f64) -> Self {
        self.config.decrement = step;
        self
    }

    /// Bins per level; a power of two (default: 16).
    pub fn bins(mut self, bins: usize) -> Self {
        self.config.bins = bins;
        self
    }

    /// Number of levels (default: 2).
    pub fn levels(mut self, levels: usize) -> Self {
        self.config.levels = levels;
        self
    }

    /// Seed the drop-decision RNG.  Unseeded disciplines draw from OS entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Seed of the per-level hash functions.
    pub fn hash_seed(mut self, seed: u64) -> Self {
        self.config.hash_seed = seed;
        self
    }

    /// Register a flow classifier closure.
    pub fn classifier<F>(self, f: F) -> Self
    where
        F: Fn(&P) -> FlowKey + Send + 'static,
    {
        self.add_classifier(FnClassifier(f))
    }

    /// Register a flow classifier via the [`FlowClassifier`] trait.
    ///
    /// Exactly one is allowed; with none, [`FiveTupleClassifier`] is used.
    pub fn add_classifier<C: FlowClassifier<P>>(mut self, c: C) -> Self {
        self.classifiers.push(Box::new(c));
        self
    }

    /// Register the backing FIFO.
    ///
    /// Exactly one is allowed; with none, a [`DropTailQueue`] sized to the
    /// limit is created.
    pub fn add_backing_queue<Q>(mut self, q: Q) -> Self
    where
        Q: BackingQueue<QueueItem<P>> + 'static,
    {
        self.queues.push(Box::new(q));
        self
    }

    /// Register a drop listener closure.
    ///
    /// The closure is called synchronously inside `enqueue` for every
    /// dropped packet.
    pub fn drop_listener<F>(mut self, f: F) -> Self
    where
        F: Fn(&P, FlowKey, DropCause) + Send + 'static,
    {
        self.listener = Some(Box::new(FnListener(f)));
        self
    }

    /// Register a drop listener via the [`DropListener`] trait.
    pub fn drop_listener_impl<L: DropListener<P>>(mut self, l: L) -> Self {
        self.listener = Some(Box::new(l));
        self
    }

    /// Decide the fate of packets whose bins are all saturated.
    ///
    /// # Example
    /// ```
    /// use sfb::throttle::ThrottleVerdict;
    /// use sfb::{Packet, SfbBuilder};
    ///
    /// struct Datagram(u32);
    /// impl Packet for Datagram {
    ///     fn size(&self) -> u32 { 64 }
    /// }
    ///
    /// let disc = SfbBuilder::new()
    ///     .classifier(|d: &Datagram| d.0)
    ///     .throttle(|_d: &Datagram, _key| ThrottleVerdict::Drop)
    ///     .build()
    ///     .unwrap();
    /// # let _ = disc;
    /// ```
    pub fn throttle<F>(self, f: F) -> Self
    where
        F: FnMut(&P, FlowKey) -> ThrottleVerdict + Send + 'static,
    {
        self.throttle_impl(FnThrottle(f))
    }

    /// Set a throttle hook via the [`ThrottleHook`] trait.
    pub fn throttle_impl<T: ThrottleHook<P>>(mut self, t: T) -> Self {
        self.throttle = Some(Box::new(t));
        self
    }

    /// Rate-limit inelastic flows to `rate` packets/s with a `burst`
    /// allowance.
    pub fn penalty_box(self, rate: f64, burst: u32) -> Self {
        self.throttle_impl(PenaltyBox::new(rate, burst))
    }

    /// Validate the configuration and its collaborators, then build.
    pub fn build(self) -> Result<SfbQueueDisc<P>, ConfigError> {
        self.assemble().map_err(|err| {
            debug!(%err, "Rejected SFB configuration");
            err
        })
    }

    fn assemble(mut self) -> Result<SfbQueueDisc<P>, ConfigError> {
        self.config.validate()?;

        let classifier: Box<dyn FlowClassifier<P>> = match self.classifiers.len() {
            0 => Box::new(FiveTupleClassifier::new()),
            1 => self
                .classifiers
                .pop()
                .ok_or(ConfigError::ClassifierCount { found: 0 })?,
            found => return Err(ConfigError::ClassifierCount { found }),
        };

        let queue: Box<dyn BackingQueue<QueueItem<P>>> = match self.queues.len() {
            0 => Box::new(DropTailQueue::<QueueItem<P>>::new(
                self.config.mode,
                self.config.limit,
            )),
            1 => self
                .queues
                .pop()
                .ok_or(ConfigError::BackingQueueCount { found: 0 })?,
            found => return Err(ConfigError::BackingQueueCount { found }),
        };
        if queue.mode() != self.config.mode {
            return Err(ConfigError::ModeMismatch {
                queue: queue.mode(),
                disc: self.config.mode,
            });
        }
        if queue.capacity() < self.config.limit {
            return Err(ConfigError::BackingQueueTooSmall {
                capacity: queue.capacity(),
                limit: self.config.limit,
            });
        }

        let throttle: Box<dyn ThrottleHook<P>> = match self.throttle {
            Some(hook) => hook,
            None => Box::new(PassThrough),
        };

        Ok(SfbQueueDisc::new(
            self.config,
            queue,
            classifier,
            throttle,
            self.listener,
        ))
    }
}

impl<P: Packet> Default for SfbBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pkt(u32);

    impl Packet for Pkt {
        fn size(&self) -> u32 {
            500
        }
    }

    fn err(builder: SfbBuilder<Pkt>) -> ConfigError {
        match builder.build() {
            Ok(_) => panic!("expected a configuration error"),
            Err(e) => e,
        }
    }

    #[test]
    fn defaults_build() {
        let disc = SfbBuilder::<Pkt>::new().build().unwrap();
        assert_eq!(disc.limit(), 25);
        assert_eq!(disc.mode(), QueueMode::Packets);
        assert_eq!(disc.bins().levels(), 2);
        assert_eq!(disc.bins().width(), 16);
        assert_eq!(disc.bin_capacity(), 25.0 / 16.0);
    }

    #[test]
    fn two_classifiers_rejected() {
        let b = SfbBuilder::new()
            .classifier(|p: &Pkt| p.0)
            .classifier(|p: &Pkt| p.0 + 1);
        assert_eq!(err(b), ConfigError::ClassifierCount { found: 2 });
    }

    #[test]
    fn two_backing_queues_rejected() {
        let b = SfbBuilder::<Pkt>::new()
            .add_backing_queue(DropTailQueue::with_packet_limit(25))
            .add_backing_queue(DropTailQueue::with_packet_limit(25));
        assert_eq!(err(b), ConfigError::BackingQueueCount { found: 2 });
    }

    #[test]
    fn mode_mismatch_rejected() {
        let b = SfbBuilder::<Pkt>::new()
            .mode(QueueMode::Bytes)
            .limit(10_000)
            .add_backing_queue(DropTailQueue::with_packet_limit(10_000));
        assert_eq!(
            err(b),
            ConfigError::ModeMismatch {
                queue: QueueMode::Packets,
                disc: QueueMode::Bytes,
            }
        );
    }

    #[test]
    fn undersized_backing_queue_rejected() {
        let b = SfbBuilder::<Pkt>::new()
            .limit(50)
            .add_backing_queue(DropTailQueue::with_packet_limit(40));
        assert_eq!(
            err(b),
            ConfigError::BackingQueueTooSmall {
                capacity: 40,
                limit: 50,
            }
        );
    }

    #[test]
    fn scalar_errors_surface() {
        assert_eq!(err(SfbBuilder::new().limit(0)), ConfigError::ZeroLimit);
        assert_eq!(
            err(SfbBuilder::new().bins(10)),
            ConfigError::InvalidBinCount { bins: 10 }
        );
        assert_eq!(err(SfbBuilder::new().levels(0)), ConfigError::ZeroLevels);
        assert_eq!(
            err(SfbBuilder::new().levels(9)),
            ConfigError::KeyWidthExceeded {
                levels: 9,
                bins: 16,
                needed: 36,
                available: 32,
            }
        );
    }

    #[test]
    fn from_config_keeps_parameters() {
        let cfg = SfbConfig {
            bins: 64,
            levels: 4,
            seed: Some(3),
            ..SfbConfig::default()
        };
        let disc = SfbBuilder::<Pkt>::from_config(cfg.clone()).build().unwrap();
        assert_eq!(disc.config(), &cfg);
        assert_eq!(disc.router().levels(), 4);
        assert_eq!(disc.router().bins(), 64);
    }
}
