use std::collections::VecDeque;

use tracing::trace;

use super::BackingQueue;
use crate::config::QueueMode;
use crate::packet::Packet;

/// A bounded FIFO that refuses arrivals once full.
///
/// The default backing queue: built with the discipline's mode and its
/// limit as capacity when none is supplied.
#[derive(Debug)]
pub struct DropTailQueue<T> {
    queue: VecDeque<T>,
    mode: QueueMode,
    capacity: u32,
    bytes: u32,
}

impl<T> DropTailQueue<T> {
    pub fn new(mode: QueueMode, capacity: u32) -> Self {
        DropTailQueue {
            queue: VecDeque::new(),
            mode,
            capacity,
            bytes: 0,
        }
    }

    /// A queue holding up to `capacity` packets.
    pub fn with_packet_limit(capacity: u32) -> Self {
        Self::new(QueueMode::Packets, capacity)
    }

    /// A queue holding up to `capacity` bytes.
    pub fn with_byte_limit(capacity: u32) -> Self {
        Self::new(QueueMode::Bytes, capacity)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

impl<T: Packet> BackingQueue<T> for DropTailQueue<T> {
    fn enqueue(&mut self, item: T) -> Result<(), T> {
        let size = item.size();
        let fits = match self.mode {
            QueueMode::Packets => (self.queue.len() as u64) < self.capacity as u64,
            QueueMode::Bytes => self.bytes as u64 + size as u64 <= self.capacity as u64,
        };
        if !fits {
            trace!(
                queue_len = self.queue.len(),
                bytes = self.bytes,
                size,
                "drop-tail queue full"
            );
            return Err(item);
        }
        self.bytes = self.bytes.saturating_add(size);
        self.queue.push_back(item);
        Ok(())
    }

    fn dequeue(&mut self) -> Option<T> {
        let item = self.queue.pop_front()?;
        self.bytes = self.bytes.saturating_sub(item.size());
        Some(item)
    }

    fn peek(&self) -> Option<&T> {
        self.queue.front()
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn packet_count(&self) -> u32 {
        self.queue.len() as u32
    }

    fn byte_count(&self) -> u32 {
        self.bytes
    }

    fn mode(&self) -> QueueMode {
        self.mode
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }
}
