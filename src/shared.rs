use std::sync::Arc;

use parking_lot::Mutex;

use crate::disc::{SfbQueueDisc, Verdict};
use crate::metrics::stats::SfbStats;
use crate::packet::Packet;

/// A cloneable, thread-safe handle to a [`SfbQueueDisc`].
///
/// Every call takes the discipline's lock for its duration, so each
/// enqueue or dequeue sees and leaves the bins consistent.
///
/// # Example
/// ```
/// use sfb::{Packet, SfbBuilder, SharedSfb};
/// use std::thread;
///
/// struct Datagram(u32);
/// impl Packet for Datagram {
///     fn size(&self) -> u32 { 100 }
/// }
///
/// let disc = SfbBuilder::new()
///     .limit(1_000)
///     .classifier(|d: &Datagram| d.0)
///     .build()
///     .unwrap();
/// let shared = SharedSfb::new(disc);
///
/// let producer = {
///     let shared = shared.clone();
///     thread::spawn(move || {
///         for i in 0..10 {
///             shared.enqueue(Datagram(i));
///         }
///     })
/// };
/// producer.join().unwrap();
/// assert_eq!(shared.stats().offered(), 10);
/// ```
pub struct SharedSfb<P> {
    inner: Arc<Mutex<SfbQueueDisc<P>>>,
}

impl<P> Clone for SharedSfb<P> {
    fn clone(&self) -> Self {
        SharedSfb {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Packet> SharedSfb<P> {
    pub fn new(disc: SfbQueueDisc<P>) -> Self {
        SharedSfb {
            inner: Arc::new(Mutex::new(disc)),
        }
    }

    pub fn enqueue(&self, packet: P) -> bool {
        self.inner.lock().enqueue(packet)
    }

    pub fn offer(&self, packet: P) -> Verdict {
        self.inner.lock().offer(packet)
    }

    pub fn dequeue(&self) -> Option<P> {
        self.inner.lock().dequeue()
    }

    pub fn stats(&self) -> SfbStats {
        self.inner.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Runs `f` with exclusive access to the discipline.
    pub fn with<R>(&self, f: impl FnOnce(&mut SfbQueueDisc<P>) -> R) -> R {
        let mut disc = self.inner.lock();
        f(&mut *disc)
    }
}
