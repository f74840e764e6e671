//! Throttle hook: what happens to a packet whose bins are all saturated.
//!
//! When every bin a packet routes to has a mark of 1.0, the flow is not
//! responding to drops (an inelastic flow).  Instead of another probability
//! draw, the discipline asks its [`ThrottleHook`] for a verdict.
//!
//! | Hook           | Behaviour |
//! |----------------|-----------|
//! | [`PassThrough`] (default) | admits the packet to the queue |
//! | [`PenaltyBox`] | admits up to `rate` packets/s with a burst allowance, drops the rest |
//! | [`FnThrottle`] | any closure |

use std::time::Instant;

use crate::FlowKey;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Outcome of a throttle decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThrottleVerdict {
    /// Hand the packet to the backing queue.
    Admit,
    /// Drop the packet; counted as an unforced drop.
    Drop,
}

/// Decides the fate of packets from inelastic flows.
///
/// Runs inside `enqueue`; it has no access to the discipline.
pub trait ThrottleHook<P>: Send + 'static {
    fn on_saturated(&mut self, packet: &P, key: FlowKey) -> ThrottleVerdict;
}

// ---------------------------------------------------------------------------
// Built-in implementations
// ---------------------------------------------------------------------------

/// Admits every packet.  The default hook.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassThrough;

impl<P> ThrottleHook<P> for PassThrough {
    #[inline]
    fn on_saturated(&mut self, _packet: &P, _key: FlowKey) -> ThrottleVerdict {
        ThrottleVerdict::Admit
    }
}

/// A rate limiter shared by all inelastic flows.
///
/// Implemented as GCRA (virtual scheduling): a single theoretical arrival
/// time advances by one emission interval per admitted packet, and a packet
/// is admitted while that time stays within `burst` intervals of now.
#[derive(Debug)]
pub struct PenaltyBox {
    /// Theoretical arrival time, nanoseconds since `epoch`.
    tat: u64,
    emission_interval: u64,
    burst_tolerance: u64,
    epoch: Instant,
}

impl PenaltyBox {
    /// `rate` packets per second with up to `burst` packets back to back.
    /// A zero rate or burst admits nothing.
    pub fn new(rate: f64, burst: u32) -> Self {
        let emission_interval = if rate > 0.0 && rate.is_finite() {
            (NANOS_PER_SEC / rate).max(1.0) as u64
        } else {
            u64::MAX
        };
        let burst_tolerance = if burst == 0 || emission_interval == u64::MAX {
            0
        } else {
            emission_interval.saturating_mul(burst as u64)
        };
        PenaltyBox {
            tat: 0,
            emission_interval,
            burst_tolerance,
            epoch: Instant::now(),
        }
    }

    /// Decides one packet at `now_ns` nanoseconds on the box's own clock.
    pub fn admit_at(&mut self, now_ns: u64) -> bool {
        if self.burst_tolerance == 0 {
            return false;
        }
        let new_tat = self.tat.max(now_ns).saturating_add(self.emission_interval);
        let allow_at = new_tat.saturating_sub(self.burst_tolerance);
        if now_ns >= allow_at {
            self.tat = new_tat;
            true
        } else {
            false
        }
    }

    /// Restores the full burst allowance.
    pub fn reset(&mut self) {
        self.tat = 0;
        self.epoch = Instant::now();
    }
}

impl Default for PenaltyBox {
    /// 10 packets/s with a burst of 20.
    fn default() -> Self {
        Self::new(10.0, 20)
    }
}

impl<P> ThrottleHook<P> for PenaltyBox {
    fn on_saturated(&mut self, _packet: &P, _key: FlowKey) -> ThrottleVerdict {
        let now = self.epoch.elapsed().as_nanos().min(u64::MAX as u128) as u64;
        if self.admit_at(now) {
            ThrottleVerdict::Admit
        } else {
            ThrottleVerdict::Drop
        }
    }
}

/// A throttle hook backed by a closure.
///
/// Created via [`SfbBuilder::throttle`](crate::SfbBuilder::throttle).
pub struct FnThrottle<F>(pub F);

impl<P, F> ThrottleHook<P> for FnThrottle<F>
where
    F: FnMut(&P, FlowKey) -> ThrottleVerdict + Send + 'static,
{
    #[inline]
    fn on_saturated(&mut self, packet: &P, key: FlowKey) -> ThrottleVerdict {
        (self.0)(packet, key)
    }
}
