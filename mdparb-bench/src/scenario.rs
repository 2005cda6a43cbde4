//! Reproducible A/B feed scenarios.

use bytes::Bytes;
use mdparb_core::{Line, PacketHeader};

/// Small xorshift generator; scenarios must replay identically from a seed.
#[derive(Debug, Clone)]
pub struct XorShift(u64);

impl XorShift {
    /// Creates a generator. A zero seed is replaced by a fixed constant.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed })
    }

    /// Returns the next value.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Returns a value in `0..bound`.
    pub fn below(&mut self, bound: u64) -> u64 {
        if bound == 0 { 0 } else { self.next_u64() % bound }
    }
}

/// Shape of a generated scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioConfig {
    /// First sequence number.
    pub first_sequence: u32,
    /// Number of sequences published.
    pub packets: u32,
    /// Per-mille chance that line A drops a packet.
    pub drop_a_per_mille: u64,
    /// Per-mille chance that line B drops a packet.
    pub drop_b_per_mille: u64,
    /// Maximum number of sequences a packet may arrive late.
    pub jitter: u64,
    /// Payload bytes after the sequence header.
    pub payload_size: usize,
    /// Generator seed.
    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            first_sequence: 1,
            packets: 10_000,
            drop_a_per_mille: 0,
            drop_b_per_mille: 0,
            jitter: 0,
            payload_size: 64,
            seed: 1,
        }
    }
}

impl ScenarioConfig {
    /// Healthy feeds: both lines deliver everything in order.
    #[must_use]
    pub fn healthy(packets: u32) -> Self {
        Self {
            packets,
            ..Default::default()
        }
    }

    /// Lossy feeds with reordering.
    #[must_use]
    pub fn lossy(packets: u32, drop_per_mille: u64, jitter: u64) -> Self {
        Self {
            packets,
            drop_a_per_mille: drop_per_mille,
            drop_b_per_mille: drop_per_mille,
            jitter,
            ..Default::default()
        }
    }
}

/// One datagram arriving on one line.
#[derive(Debug, Clone)]
pub struct FeedArrival {
    /// Line the datagram arrives on.
    pub line: Line,
    /// Sequence carried in the header.
    pub sequence: u64,
    /// Full datagram, header included.
    pub datagram: Bytes,
}

/// Generates the arrival order for a scenario.
///
/// Both lines carry every sequence unless dropped. A packet delayed by `d`
/// sequences is interleaved after the packets published `d` steps later.
#[must_use]
pub fn generate(config: &ScenarioConfig) -> Vec<FeedArrival> {
    let mut rng = XorShift::new(config.seed);
    let mut keyed = Vec::with_capacity(config.packets as usize * 2);

    for offset in 0..config.packets {
        let sequence = config.first_sequence.wrapping_add(offset);
        for line in Line::ALL {
            let drop = match line {
                Line::A => config.drop_a_per_mille,
                Line::B => config.drop_b_per_mille,
            };
            if rng.below(1000) < drop {
                continue;
            }
            let delay = rng.below(config.jitter + 1);
            let key = (u64::from(offset) + delay) * 2 + u64::from(line == Line::B);
            keyed.push((key, keyed.len(), line, sequence));
        }
    }
    keyed.sort_unstable_by_key(|(key, order, _, _)| (*key, *order));

    keyed
        .into_iter()
        .map(|(_, _, line, sequence)| FeedArrival {
            line,
            sequence: u64::from(sequence),
            datagram: datagram(sequence, config.payload_size),
        })
        .collect()
}

/// Builds a datagram carrying `sequence` and `payload_size` filler bytes.
#[must_use]
pub fn datagram(sequence: u32, payload_size: usize) -> Bytes {
    let mut buf = vec![0u8; PacketHeader::ENCODED_LENGTH + payload_size];
    PacketHeader::encode(sequence, &mut buf);
    Bytes::from(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_scenario_alternates_lines() {
        let arrivals = generate(&ScenarioConfig::healthy(3));
        let order: Vec<(Line, u64)> = arrivals.iter().map(|a| (a.line, a.sequence)).collect();
        assert_eq!(
            order,
            vec![
                (Line::A, 1),
                (Line::B, 1),
                (Line::A, 2),
                (Line::B, 2),
                (Line::A, 3),
                (Line::B, 3),
            ]
        );
        assert_eq!(arrivals[0].datagram.len(), 4 + 64);
        assert_eq!(PacketHeader::decode(&arrivals[5].datagram).unwrap().sequence, 3);
    }

    #[test]
    fn test_same_seed_same_scenario() {
        let config = ScenarioConfig::lossy(500, 50, 3);
        let one: Vec<u64> = generate(&config).iter().map(|a| a.sequence).collect();
        let two: Vec<u64> = generate(&config).iter().map(|a| a.sequence).collect();
        assert_eq!(one, two);
        assert!(one.len() < 1000);
    }

    #[test]
    fn test_drop_all_of_one_line() {
        let config = ScenarioConfig {
            drop_b_per_mille: 1000,
            ..ScenarioConfig::healthy(100)
        };
        let arrivals = generate(&config);
        assert_eq!(arrivals.len(), 100);
        assert!(arrivals.iter().all(|a| a.line == Line::A));
    }

    #[test]
    fn test_zero_seed_is_usable() {
        let mut rng = XorShift::new(0);
        assert_ne!(rng.next_u64(), 0);
        assert_eq!(rng.below(0), 0);
    }
}
