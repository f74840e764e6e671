use proptest::prelude::*;
use sfb::{FlowKey, Packet, QueueMode, SfbBuilder, SfbQueueDisc, Verdict};

#[derive(Debug, Clone)]
struct Pkt {
    key: FlowKey,
    seq: u32,
    size: u32,
}

impl Packet for Pkt {
    fn size(&self) -> u32 {
        self.size
    }
}

#[derive(Debug, Clone)]
enum Op {
    Offer { key: FlowKey, size: u32 },
    Dequeue,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..12u32, 40..1_500u32).prop_map(|(key, size)| Op::Offer { key, size }),
        1 => Just(Op::Dequeue),
    ]
}

fn build(mode: QueueMode, limit: u32, bins: usize, levels: usize, seed: u64) -> SfbQueueDisc<Pkt> {
    SfbBuilder::new()
        .mode(mode)
        .limit(limit)
        .mean_packet_size(500)
        .bins(bins)
        .levels(levels)
        .seed(seed)
        // Large steps so short sequences reach both mark bounds.
        .increment(0.05)
        .decrement(0.01)
        .classifier(|p: &Pkt| p.key)
        .build()
        .unwrap()
}

fn check(disc: &SfbQueueDisc<Pkt>) -> Result<(), TestCaseError> {
    for bin in disc.bins().iter() {
        prop_assert!((0.0..=1.0).contains(&bin.mark), "mark {} out of range", bin.mark);
    }
    for level in 0..disc.bins().levels() {
        let held: u64 = disc.bins().level(level).iter().map(|b| b.packets as u64).sum();
        prop_assert_eq!(held, disc.len() as u64, "level {} count", level);
    }
    prop_assert!(disc.queue_size() <= disc.limit());
    let stats = disc.stats();
    prop_assert_eq!(stats.enqueued - stats.dequeued, disc.len() as u64);
    Ok(())
}

proptest! {
    #[test]
    fn bins_track_queue_contents(
        ops in proptest::collection::vec(op(), 1..400),
        bytes in any::<bool>(),
        levels in 1..4usize,
        bins_log2 in 1..6u32,
        seed in any::<u64>(),
    ) {
        let (mode, limit) = if bytes {
            (QueueMode::Bytes, 8_000)
        } else {
            (QueueMode::Packets, 16)
        };
        let mut disc = build(mode, limit, 1 << bins_log2, levels, seed);
        let mut offered = 0u64;

        for (seq, op) in ops.into_iter().enumerate() {
            match op {
                Op::Offer { key, size } => {
                    offered += 1;
                    let before = disc.len();
                    let verdict = disc.offer(Pkt { key, seq: seq as u32, size });
                    let grew = disc.len() == before + 1;
                    prop_assert_eq!(verdict.is_accepted(), grew);
                    if verdict == Verdict::ForcedDrop {
                        prop_assert_eq!(disc.len(), before);
                    }
                }
                Op::Dequeue => {
                    let before = disc.len();
                    let out = disc.dequeue();
                    prop_assert_eq!(out.is_some(), before > 0);
                }
            }
            check(&disc)?;
        }
        prop_assert_eq!(disc.stats().offered(), offered);
    }

    #[test]
    fn accepted_packets_leave_in_arrival_order(
        keys in proptest::collection::vec(0..8u32, 1..200),
        seed in any::<u64>(),
    ) {
        let mut disc = build(QueueMode::Packets, 1_000, 16, 2, seed);
        let mut accepted = Vec::new();
        for (seq, key) in keys.into_iter().enumerate() {
            let seq = seq as u32;
            if disc.enqueue(Pkt { key, seq, size: 100 }) {
                accepted.push(seq);
            }
        }
        let drained: Vec<u32> = std::iter::from_fn(|| disc.dequeue().map(|p| p.seq)).collect();
        prop_assert_eq!(drained, accepted);
        prop_assert!(disc.bins().iter().all(|b| b.packets == 0));
    }

    #[test]
    fn equal_seeds_agree(
        keys in proptest::collection::vec(0..5u32, 1..300),
        seed in any::<u64>(),
    ) {
        let mut a = build(QueueMode::Packets, 8, 8, 2, seed);
        let mut b = build(QueueMode::Packets, 8, 8, 2, seed);
        for (seq, key) in keys.into_iter().enumerate() {
            let p = Pkt { key, seq: seq as u32, size: 100 };
            prop_assert_eq!(a.offer(p.clone()), b.offer(p));
            if seq % 3 == 0 {
                a.dequeue();
                b.dequeue();
            }
        }
        prop_assert_eq!(a.stats(), b.stats());
    }
}
