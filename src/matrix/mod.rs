//! The SFB bin matrix: `levels × bins` counters shared by all flows.
//!
//! Each bin holds the number of queued packets whose flow hashes to it and a
//! marking probability.  A packet is routed to one bin per level (see
//! [`BinRouter`]); its admission probability is the **minimum** mark over
//! those bins, so a flow is only penalised when every level agrees that it
//! sits in an overloaded bin.
//!
//! Update rules, applied per routed bin:
//!
//! | Event      | Rule |
//! |------------|------|
//! | arrival    | idle bin (`packets == 0`): mark −= decrement; overloaded bin (`packets > capacity`): mark += increment |
//! | admission  | packets += 1, then mark += increment if now overloaded |
//! | departure  | packets −= 1, floored at 0 |
//! | overflow   | mark += increment on every level, counts untouched |
//!
//! Marks are clamped to `[0, 1]`; packet counts never go below zero.

pub mod router;

pub use router::{BinRouter, BinSlots};

/// Snap tolerance as a fraction of the step just applied.  Repeated float
/// steps then land exactly on 0.0 and 1.0 while a step of any size still
/// moves the mark.
const SNAP_FRACTION: f64 = 1e-6;

/// One `(level, index)` cell of the matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bin {
    /// Queued packets routed to this bin.
    pub packets: u32,
    /// Marking probability in `[0, 1]`.
    pub mark: f64,
}

/// `mark + step`, capped at 1.0.
#[inline]
pub fn raise_mark(mark: f64, step: f64) -> f64 {
    clamp_mark(mark + step, step)
}

/// `mark - step`, floored at 0.0.
#[inline]
pub fn lower_mark(mark: f64, step: f64) -> f64 {
    clamp_mark(mark - step, step)
}

#[inline]
fn clamp_mark(p: f64, step: f64) -> f64 {
    if p.is_nan() {
        return 0.0;
    }
    let snap = step.abs() * SNAP_FRACTION;
    if p <= snap {
        0.0
    } else if p >= 1.0 - snap {
        1.0
    } else {
        p
    }
}

/// The `levels × width` grid of bins and the rules that update it.
///
/// Owned by the discipline; exposed read-only through
/// [`SfbQueueDisc::bins`](crate::SfbQueueDisc::bins).
pub struct BinMatrix {
    /// Row-major: `bins[level * width + index]`.
    bins: Vec<Bin>,
    levels: usize,
    width: usize,
    /// Packets a bin may hold before it counts as overloaded.
    capacity: f64,
    increment: f64,
    decrement: f64,
}

impl BinMatrix {
    /// Creates a zeroed matrix.
    pub fn new(levels: usize, width: usize, capacity: f64, increment: f64, decrement: f64) -> Self {
        BinMatrix {
            bins: vec![Bin::default(); levels * width],
            levels,
            width,
            capacity,
            increment,
            decrement,
        }
    }

    #[inline]
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Bins per level.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Changes the overload threshold; bin contents are kept.
    pub fn set_capacity(&mut self, capacity: f64) {
        self.capacity = capacity;
    }

    /// The bin at `(level, index)`.
    ///
    /// # Panics
    ///
    /// Panics if `level >= levels()` or `index >= width()`.
    #[inline]
    pub fn bin(&self, level: usize, index: usize) -> &Bin {
        &self.bins[self.offset(level, index)]
    }

    /// The bin at `(level, index)`, or `None` if either is out of range.
    pub fn get(&self, level: usize, index: usize) -> Option<&Bin> {
        if level < self.levels && index < self.width {
            self.bins.get(level * self.width + index)
        } else {
            None
        }
    }

    /// All bins, level by level.
    pub fn iter(&self) -> impl Iterator<Item = &Bin> {
        self.bins.iter()
    }

    /// The bins of one level.
    pub fn level(&self, level: usize) -> &[Bin] {
        &self.bins[level * self.width..(level + 1) * self.width]
    }

    /// Zeroes every bin.
    pub fn reset(&mut self) {
        self.bins.fill(Bin::default());
    }

    #[inline]
    fn offset(&self, level: usize, index: usize) -> usize {
        assert!(
            level < self.levels && index < self.width,
            "bin ({level}, {index}) outside a {}x{} matrix",
            self.levels,
            self.width
        );
        level * self.width + index
    }

    #[inline]
    fn is_overloaded(&self, bin: &Bin) -> bool {
        bin.packets as f64 > self.capacity
    }

    pub fn increment_mark(&mut self, level: usize, index: usize) {
        let step = self.increment;
        let off = self.offset(level, index);
        let bin = &mut self.bins[off];
        bin.mark = raise_mark(bin.mark, step);
    }

    pub fn decrement_mark(&mut self, level: usize, index: usize) {
        let step = self.decrement;
        let off = self.offset(level, index);
        let bin = &mut self.bins[off];
        bin.mark = lower_mark(bin.mark, step);
    }

    /// Pre-admission update: rewards idle bins, penalises overloaded ones.
    pub fn on_arrival(&mut self, slots: &BinSlots) {
        for (level, index) in slots.iter() {
            let bin = *self.bin(level, index);
            if bin.packets == 0 {
                self.decrement_mark(level, index);
            } else if self.is_overloaded(&bin) {
                self.increment_mark(level, index);
            }
        }
    }

    /// Accounts an admitted packet and re-checks the overload threshold.
    pub fn on_admit(&mut self, slots: &BinSlots) {
        for (level, index) in slots.iter() {
            let off = self.offset(level, index);
            let bin = &mut self.bins[off];
            bin.packets = bin.packets.saturating_add(1);
            let bin = *bin;
            if self.is_overloaded(&bin) {
                self.increment_mark(level, index);
            }
        }
    }

    /// Accounts a departed packet.
    pub fn on_depart(&mut self, slots: &BinSlots) {
        for (level, index) in slots.iter() {
            let off = self.offset(level, index);
            let bin = &mut self.bins[off];
            bin.packets = bin.packets.saturating_sub(1);
        }
    }

    /// Forced-drop update: every routed bin is penalised.
    pub fn on_overflow(&mut self, slots: &BinSlots) {
        for (level, index) in slots.iter() {
            self.increment_mark(level, index);
        }
    }

    /// Minimum mark over the routed bins; `1.0` for empty slots.
    pub fn min_mark(&self, slots: &BinSlots) -> f64 {
        slots
            .iter()
            .map(|(level, index)| self.bin(level, index).mark)
            .fold(1.0_f64, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INC: f64 = 0.0025;
    const DEC: f64 = 0.00025;

    fn matrix() -> BinMatrix {
        // The default discipline: 25 packets over 16 bins, two levels.
        BinMatrix::new(2, 16, 25.0 / 16.0, INC, DEC)
    }

    #[test]
    fn starts_zeroed() {
        let m = matrix();
        assert_eq!(m.iter().count(), 32);
        assert!(m.iter().all(|b| b.packets == 0 && b.mark == 0.0));
    }

    #[test]
    fn raise_and_lower_clamp() {
        assert_eq!(raise_mark(0.999, 0.01), 1.0);
        assert_eq!(lower_mark(0.0001, 0.01), 0.0);
        assert!((raise_mark(0.5, 0.0025) - 0.5025).abs() < 1e-12);
        assert_eq!(lower_mark(f64::NAN, 0.1), 0.0);
    }

    #[test]
    fn tiny_steps_still_move_the_mark() {
        let step = 5e-10;
        let mut mark = 0.0;
        for _ in 0..1_000 {
            mark = raise_mark(mark, step);
        }
        assert!((mark - 5e-7).abs() < 1e-12, "mark {mark}");
        assert_eq!(lower_mark(mark, step), mark - step);
    }

    #[test]
    fn near_one_is_not_rounded_up() {
        assert_eq!(raise_mark(0.9999999995, 0.0), 0.9999999995);
        assert!(raise_mark(0.999_999_998, 5e-10) < 1.0);
        assert_eq!(lower_mark(1e-9, 0.0), 1e-9);
    }

    #[test]
    fn bin_access_is_bounds_checked() {
        let m = matrix();
        assert!(m.get(0, 15).is_some());
        assert!(m.get(0, 16).is_none());
        assert!(m.get(2, 0).is_none());
        let caught = std::panic::catch_unwind(|| *m.bin(0, 20));
        assert!(caught.is_err(), "index past the width must not alias level 1");
    }

    #[test]
    fn arrival_on_idle_bin_decays_mark_to_floor() {
        let mut m = matrix();
        let slots = BinSlots::from_indices(&[1, 2]);
        m.on_overflow(&slots); // mark = INC on both
        for _ in 0..10 {
            m.on_arrival(&slots);
        }
        // 10 * DEC == INC.
        assert_eq!(m.bin(0, 1).mark, 0.0);
        m.on_arrival(&slots);
        assert_eq!(m.bin(0, 1).mark, 0.0, "mark must not go below zero");
    }

    #[test]
    fn arrival_on_lightly_loaded_bin_changes_nothing() {
        let mut m = matrix();
        let slots = BinSlots::from_indices(&[4, 4]);
        m.on_admit(&slots); // 1 packet, capacity 1.5625
        m.on_arrival(&slots);
        assert_eq!(m.bin(0, 4).packets, 1);
        assert_eq!(m.bin(0, 4).mark, 0.0);
    }

    #[test]
    fn admit_then_depart_restores_counts() {
        let mut m = matrix();
        let slots = BinSlots::from_indices(&[7, 11]);
        m.on_admit(&slots);
        assert_eq!(m.bin(0, 7).packets, 1);
        assert_eq!(m.bin(1, 11).packets, 1);
        m.on_depart(&slots);
        assert_eq!(m.bin(0, 7).packets, 0);
        assert_eq!(m.bin(1, 11).packets, 0);
    }

    #[test]
    fn depart_never_underflows() {
        let mut m = matrix();
        let slots = BinSlots::from_indices(&[0, 0]);
        m.on_depart(&slots);
        m.on_depart(&slots);
        assert_eq!(m.bin(0, 0).packets, 0);
    }

    #[test]
    fn overloaded_bin_is_penalised_on_arrival_and_admission() {
        let mut m = matrix();
        let slots = BinSlots::from_indices(&[3, 5]);
        m.on_admit(&slots); // 1 <= capacity
        assert_eq!(m.bin(0, 3).mark, 0.0);
        m.on_admit(&slots); // 2 > capacity
        assert_eq!(m.bin(0, 3).mark, INC);
        m.on_arrival(&slots); // still overloaded
        assert_eq!(m.bin(0, 3).mark, INC + INC);
        m.on_admit(&slots);
        assert!((m.bin(0, 3).mark - 3.0 * INC).abs() < 1e-12);
    }

    #[test]
    fn saturates_at_exactly_one() {
        let mut m = matrix();
        let slots = BinSlots::from_indices(&[9, 9]);
        m.on_admit(&slots); // first packet does not exceed the capacity
        // 1 / 0.0025 = 400 increments reach 1.0.
        for _ in 0..399 {
            m.on_admit(&slots);
        }
        assert!(m.bin(0, 9).mark < 1.0);
        m.on_admit(&slots);
        assert_eq!(m.bin(0, 9).mark, 1.0);
        for _ in 0..50 {
            m.on_admit(&slots);
        }
        assert_eq!(m.bin(0, 9).mark, 1.0);
        assert_eq!(m.bin(1, 9).mark, 1.0);
    }

    #[test]
    fn overflow_touches_marks_only() {
        let mut m = matrix();
        let slots = BinSlots::from_indices(&[2, 14]);
        m.on_overflow(&slots);
        assert_eq!(m.bin(0, 2).mark, INC);
        assert_eq!(m.bin(1, 14).mark, INC);
        assert_eq!(m.bin(0, 2).packets, 0);
        assert_eq!(m.bin(1, 14).packets, 0);
    }

    #[test]
    fn min_mark_takes_the_least_congested_level() {
        let mut m = matrix();
        let heavy = BinSlots::from_indices(&[1, 1]);
        let partial = BinSlots::from_indices(&[1, 2]);
        for _ in 0..400 {
            m.on_overflow(&heavy);
        }
        assert_eq!(m.min_mark(&heavy), 1.0);
        assert_eq!(m.min_mark(&partial), 0.0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut m = matrix();
        let slots = BinSlots::from_indices(&[6, 6]);
        m.on_admit(&slots);
        m.on_overflow(&slots);
        m.reset();
        assert!(m.iter().all(|b| *b == Bin::default()));
    }

    #[test]
    fn level_view_has_width_bins() {
        let m = matrix();
        assert_eq!(m.level(0).len(), 16);
        assert_eq!(m.level(1).len(), 16);
    }
}
