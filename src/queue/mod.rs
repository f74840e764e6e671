pub mod drop_tail;

pub use drop_tail::DropTailQueue;

use crate::config::QueueMode;

/// Storage behind a discipline: a strict FIFO.
///
/// The discipline decides admission; the backing queue only stores.  It
/// must be able to hold at least the discipline's limit, counted in the
/// same [`QueueMode`].
pub trait BackingQueue<T>: Send {
    /// Appends `item`.  A full queue hands the item back as `Err(item)`.
    fn enqueue(&mut self, item: T) -> Result<(), T>;

    /// Removes the head item.
    fn dequeue(&mut self) -> Option<T>;

    /// The head item, without removing it.
    fn peek(&self) -> Option<&T>;

    fn is_empty(&self) -> bool {
        self.packet_count() == 0
    }

    /// Number of queued items.
    fn packet_count(&self) -> u32;

    /// Sum of queued item sizes.
    fn byte_count(&self) -> u32;

    /// Unit in which `capacity` is counted.
    fn mode(&self) -> QueueMode;

    /// Maximum occupancy, in packets or bytes per `mode`.
    fn capacity(&self) -> u32;

    /// Current occupancy in this queue's unit.
    fn occupancy(&self) -> u32 {
        match self.mode() {
            QueueMode::Packets => self.packet_count(),
            QueueMode::Bytes => self.byte_count(),
        }
    }
}
