//! Fairness demo: SFB vs a plain drop-tail FIFO.
//!
//! Eight responsive flows (additive increase, multiplicative decrease) share
//! a link with one unresponsive flow that sends at a fixed rate far above
//! its share.  The same traffic model is replayed against both queues.
//!
//! Run with:
//!     cargo run --example drop_rate --release
//!
//! Set `RUST_LOG=sfb=debug` to see the discipline's own logging.

use sfb::{BackingQueue, DropTailQueue, Packet, SfbBuilder, SfbQueueDisc};
use tracing_subscriber::EnvFilter;

const RESPONSIVE: u32 = 8;
const UNRESPONSIVE_KEY: u32 = 99;
/// Packets the unresponsive flow offers per tick.
const BLAST: u32 = 40;
/// Packets the link drains per tick.
const SERVICE: u32 = 24;
const TICKS: u32 = 20_000;
const LIMIT: u32 = 50;

struct Segment {
    flow: u32,
}

impl Packet for Segment {
    fn size(&self) -> u32 {
        1_000
    }
}

/// Anything that stores or refuses a segment.
trait Link {
    fn push(&mut self, seg: Segment) -> bool;
    fn pull(&mut self) -> Option<Segment>;
}

impl Link for SfbQueueDisc<Segment> {
    fn push(&mut self, seg: Segment) -> bool {
        self.enqueue(seg)
    }

    fn pull(&mut self) -> Option<Segment> {
        self.dequeue()
    }
}

impl Link for DropTailQueue<Segment> {
    fn push(&mut self, seg: Segment) -> bool {
        self.enqueue(seg).is_ok()
    }

    fn pull(&mut self) -> Option<Segment> {
        self.dequeue()
    }
}

#[derive(Default, Clone, Copy)]
struct FlowStats {
    offered: u64,
    delivered: u64,
}

fn simulate(link: &mut impl Link) -> (Vec<FlowStats>, FlowStats) {
    let mut windows = vec![1.0f64; RESPONSIVE as usize];
    let mut responsive = vec![FlowStats::default(); RESPONSIVE as usize];
    let mut blaster = FlowStats::default();

    for _ in 0..TICKS {
        for (flow, window) in windows.iter_mut().enumerate() {
            let mut dropped = false;
            for _ in 0..window.floor().max(1.0) as u32 {
                responsive[flow].offered += 1;
                if !link.push(Segment { flow: flow as u32 }) {
                    dropped = true;
                }
            }
            *window = if dropped {
                (*window / 2.0).max(1.0)
            } else {
                *window + 1.0
            };
        }
        for _ in 0..BLAST {
            blaster.offered += 1;
            link.push(Segment {
                flow: UNRESPONSIVE_KEY,
            });
        }
        for _ in 0..SERVICE {
            match link.pull() {
                Some(seg) if seg.flow == UNRESPONSIVE_KEY => blaster.delivered += 1,
                Some(seg) => responsive[seg.flow as usize].delivered += 1,
                None => break,
            }
        }
    }
    (responsive, blaster)
}

fn report(name: &str, responsive: &[FlowStats], blaster: FlowStats) {
    let delivered: u64 = responsive.iter().map(|f| f.delivered).sum::<u64>() + blaster.delivered;
    let share = |d: u64| d as f64 / delivered.max(1) as f64 * 100.0;
    let responsive_delivered: u64 = responsive.iter().map(|f| f.delivered).sum();

    println!("{name}");
    println!(
        "  responsive flows : {:>6.2}% of link  ({:>5.2}% each on average)",
        share(responsive_delivered),
        share(responsive_delivered) / RESPONSIVE as f64
    );
    println!(
        "  unresponsive     : {:>6.2}% of link  (drop rate {:>5.2}%)",
        share(blaster.delivered),
        (1.0 - blaster.delivered as f64 / blaster.offered.max(1) as f64) * 100.0
    );
    println!();
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("SFB fairness demo");
    println!("  {RESPONSIVE} AIMD flows + 1 flow at {BLAST} pkt/tick, link {SERVICE} pkt/tick");
    println!("  queue limit {LIMIT} packets, {TICKS} ticks");
    println!();

    let mut fifo: DropTailQueue<Segment> = DropTailQueue::with_packet_limit(LIMIT);
    let (responsive, blaster) = simulate(&mut fifo);
    report("Drop-tail FIFO", &responsive, blaster);

    let mut disc = match SfbBuilder::new()
        .limit(LIMIT)
        .seed(0x5FB)
        .classifier(|s: &Segment| s.flow)
        .penalty_box(0.0, 0)
        .build()
    {
        Ok(disc) => disc,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return;
        }
    };
    let (responsive, blaster) = simulate(&mut disc);
    report("Stochastic Fair Blue", &responsive, blaster);

    let stats = disc.stats();
    println!(
        "SFB counters: forced {}, unforced {}, rate-limited {}",
        stats.forced_drop, stats.unforced_drop, stats.rate_limited
    );
}
