//! Drop listener: a callback invoked whenever the discipline drops a packet.
//!
//! # Example
//! ```
//! use sfb::listener::DropCause;
//! use sfb::{Packet, SfbBuilder};
//! use std::sync::{Arc, Mutex};
//!
//! struct Datagram(u32);
//! impl Packet for Datagram {
//!     fn size(&self) -> u32 { 100 }
//! }
//!
//! let log: Arc<Mutex<Vec<(u32, DropCause)>>> = Arc::new(Mutex::new(Vec::new()));
//! let log2 = Arc::clone(&log);
//!
//! let mut disc = SfbBuilder::new()
//!     .limit(1)
//!     .seed(7)
//!     .classifier(|d: &Datagram| d.0)
//!     .drop_listener(move |_pkt: &Datagram, key, cause| {
//!         log2.lock().unwrap().push((key, cause));
//!     })
//!     .build()
//!     .unwrap();
//!
//! disc.enqueue(Datagram(1));
//! disc.enqueue(Datagram(2)); // queue full
//! assert_eq!(log.lock().unwrap().as_slice(), &[(2, DropCause::Forced)]);
//! ```

use crate::FlowKey;

// ---------------------------------------------------------------------------
// DropCause
// ---------------------------------------------------------------------------

/// Why a packet was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropCause {
    /// The queue was full.  Counted as a forced drop.
    Forced,
    /// Dropped by the minimum-mark probability draw.  Counted as an
    /// unforced drop.
    Unforced,
    /// Every routed bin was saturated and the throttle hook refused the
    /// packet.  Counted as an unforced drop.
    RateLimited,
}

// ---------------------------------------------------------------------------
// DropListener trait
// ---------------------------------------------------------------------------

/// A callback invoked each time a packet is dropped.
///
/// The callback receives the dropped packet, its flow key, and the reason.
/// It runs inside `enqueue` and has no access to the discipline, so it
/// cannot re-enter it.
pub trait DropListener<P>: Send + 'static {
    fn on_drop(&self, packet: &P, key: FlowKey, cause: DropCause);
}

/// A [`DropListener`] backed by a closure.
///
/// Created via [`SfbBuilder::drop_listener`](crate::SfbBuilder::drop_listener).
pub struct FnListener<F>(pub F);

impl<P, F> DropListener<P> for FnListener<F>
where
    F: Fn(&P, FlowKey, DropCause) + Send + 'static,
{
    fn on_drop(&self, packet: &P, key: FlowKey, cause: DropCause) {
        (self.0)(packet, key, cause)
    }
}
