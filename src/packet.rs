use std::net::IpAddr;

/// What the discipline needs to know about a queued item.
pub trait Packet: Send + 'static {
    /// Size in bytes; counts against the limit in byte mode.
    fn size(&self) -> u32;

    /// The IP 5-tuple, for the default classifier.  Non-IP items return
    /// `None` and all classify to the same flow.
    fn five_tuple(&self) -> Option<FiveTuple> {
        None
    }
}

/// Source/destination address and port plus transport protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FiveTuple {
    pub source: IpAddr,
    pub destination: IpAddr,
    pub source_port: u16,
    pub destination_port: u16,
    /// IANA protocol number (6 = TCP, 17 = UDP).
    pub protocol: u8,
}

/// A packet as held by the backing queue: the caller's packet plus the flow
/// key it was classified to, so departure updates the same bins as arrival.
#[derive(Debug)]
pub struct QueueItem<P> {
    pub packet: P,
    pub key: crate::FlowKey,
}

impl<P: Packet> Packet for QueueItem<P> {
    #[inline]
    fn size(&self) -> u32 {
        self.packet.size()
    }

    fn five_tuple(&self) -> Option<FiveTuple> {
        self.packet.five_tuple()
    }
}
