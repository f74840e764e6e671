//! Flow classifier: derives the flow key that routes a packet into bins.
//!
//! A discipline uses exactly one classifier.  When none is registered the
//! builder installs [`FiveTupleClassifier`], which hashes the IP 5-tuple.
//!
//! # Example
//! ```
//! use sfb::{Packet, SfbBuilder};
//!
//! struct Datagram { flow: u32, len: u32 }
//!
//! impl Packet for Datagram {
//!     fn size(&self) -> u32 { self.len }
//! }
//!
//! let disc = SfbBuilder::new()
//!     .classifier(|d: &Datagram| d.flow)
//!     .build()
//!     .unwrap();
//! assert!(disc.is_empty());
//! ```

use ahash::RandomState;

use crate::packet::Packet;
use crate::FlowKey;

/// Computes the flow key of a packet.
///
/// Must be deterministic: the key is stored with the queued packet and a
/// packet's bins are located from it again on departure.
pub trait FlowClassifier<P>: Send + 'static {
    fn classify(&self, packet: &P) -> FlowKey;
}

// ---------------------------------------------------------------------------
// Built-in implementations
// ---------------------------------------------------------------------------

/// Hashes the IP 5-tuple.  Packets without one classify to key 0.
pub struct FiveTupleClassifier {
    hasher: RandomState,
}

/// Fixed seeds so the same tuple maps to the same key across runs.
const FIVE_TUPLE_SEEDS: [u64; 4] = [
    0x243F_6A88_85A3_08D3,
    0x1319_8A2E_0370_7344,
    0xA409_3822_299F_31D0,
    0x082E_FA98_EC4E_6C89,
];

impl FiveTupleClassifier {
    pub fn new() -> Self {
        let [a, b, c, d] = FIVE_TUPLE_SEEDS;
        FiveTupleClassifier {
            hasher: RandomState::with_seeds(a, b, c, d),
        }
    }
}

impl Default for FiveTupleClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Packet> FlowClassifier<P> for FiveTupleClassifier {
    fn classify(&self, packet: &P) -> FlowKey {
        match packet.five_tuple() {
            Some(tuple) => self.hasher.hash_one(tuple) as FlowKey,
            None => 0,
        }
    }
}

/// A classifier backed by a closure.
///
/// Created via [`SfbBuilder::classifier`](crate::SfbBuilder::classifier).
pub struct FnClassifier<F>(pub F);

impl<P, F> FlowClassifier<P> for FnClassifier<F>
where
    F: Fn(&P) -> FlowKey + Send + 'static,
{
    #[inline]
    fn classify(&self, packet: &P) -> FlowKey {
        (self.0)(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::FiveTuple;
    use std::net::{IpAddr, Ipv4Addr};

    struct Ip(Option<FiveTuple>);

    impl Packet for Ip {
        fn size(&self) -> u32 {
            100
        }

        fn five_tuple(&self) -> Option<FiveTuple> {
            self.0
        }
    }

    fn tuple(last: u8, port: u16) -> FiveTuple {
        FiveTuple {
            source: IpAddr::V4(Ipv4Addr::new(10, 0, 0, last)),
            destination: IpAddr::V4(Ipv4Addr::new(10, 0, 1, 1)),
            source_port: port,
            destination_port: 443,
            protocol: 6,
        }
    }

    #[test]
    fn same_tuple_same_key() {
        let a = FiveTupleClassifier::new();
        let b = FiveTupleClassifier::new();
        let pkt = Ip(Some(tuple(1, 5000)));
        assert_eq!(a.classify(&pkt), a.classify(&pkt));
        assert_eq!(a.classify(&pkt), b.classify(&pkt));
    }

    #[test]
    fn different_tuples_usually_differ() {
        let c = FiveTupleClassifier::new();
        let keys: std::collections::HashSet<FlowKey> = (0..64u16)
            .map(|port| c.classify(&Ip(Some(tuple(1, 5000 + port)))))
            .collect();
        assert!(keys.len() > 60, "only {} distinct keys", keys.len());
    }

    #[test]
    fn non_ip_packets_share_key_zero() {
        let c = FiveTupleClassifier::new();
        assert_eq!(c.classify(&Ip(None)), 0);
    }

    #[test]
    fn closure_classifier() {
        let c = FnClassifier(|p: &Ip| p.0.map_or(7, |t| t.source_port as FlowKey));
        assert_eq!(c.classify(&Ip(None)), 7);
        assert_eq!(c.classify(&Ip(Some(tuple(1, 80)))), 80);
    }
}
