//! Stochastic Fair Blue (SFB) active queue management.
//!
//! A [`SfbQueueDisc`] sits in front of a FIFO and decides, per arriving
//! packet, whether to store it.  Flows are hashed into a matrix of bins;
//! each bin keeps a drop probability that rises while the bin overflows and
//! decays while it idles.  A packet is dropped with the smallest probability
//! among its bins, so responsive flows sharing a bin with an aggressive one
//! are protected by their other levels.
//!
//! ```
//! use sfb::{Packet, SfbBuilder, Verdict};
//!
//! struct Datagram { flow: u32 }
//! impl Packet for Datagram {
//!     fn size(&self) -> u32 { 1_200 }
//! }
//!
//! let mut disc = SfbBuilder::new()
//!     .limit(2)
//!     .seed(3)
//!     .classifier(|d: &Datagram| d.flow)
//!     .build()
//!     .unwrap();
//!
//! disc.enqueue(Datagram { flow: 1 });
//! disc.enqueue(Datagram { flow: 2 });
//! assert_eq!(disc.offer(Datagram { flow: 3 }), Verdict::ForcedDrop);
//! assert_eq!(disc.stats().forced_drop, 1);
//! ```

mod builder;
mod disc;
mod error;
mod metrics;
mod shared;
pub mod classifier;
pub mod config;
pub mod listener;
pub mod matrix;
pub mod packet;
pub mod queue;
pub mod throttle;

/// Flow identifier produced by a classifier.
pub type FlowKey = u32;

pub use builder::SfbBuilder;
pub use classifier::{FiveTupleClassifier, FlowClassifier};
pub use config::{QueueMode, SfbConfig};
pub use disc::{SfbQueueDisc, Verdict};
pub use error::ConfigError;
pub use listener::{DropCause, DropListener};
pub use matrix::{Bin, BinMatrix, BinRouter, BinSlots};
pub use metrics::stats::SfbStats;
pub use packet::{FiveTuple, Packet, QueueItem};
pub use queue::{BackingQueue, DropTailQueue};
pub use shared::SharedSfb;
pub use throttle::{PassThrough, PenaltyBox, ThrottleHook, ThrottleVerdict};
