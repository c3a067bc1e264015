//! RTP reorderer for incoming tracks
//!
//! Restores transmission order with a fixed ring of `buffer_size` slots placed
//! after the expected sequence number. A gap is declared lost only once a
//! packet arrives that no longer fits in the ring; there is no timer.

use log::warn;
use serde::{Deserialize, Serialize};
use webrtc::rtp::packet::Packet;

use crate::config::{REORDER_BUFFER_SIZE, REORDER_RESET_THRESHOLD};
use crate::error::{Result, TrackError};

/// Largest ring that still fits in the positive half of the 16-bit space.
pub const MAX_BUFFER_SIZE: usize = 0x8000;

/// Reorderer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorderConfig {
    /// Packets that may be held while waiting for a missing one
    pub buffer_size: usize,
    /// Consecutive late packets that make the reorderer resynchronize
    pub reset_threshold: u32,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            buffer_size: REORDER_BUFFER_SIZE,
            reset_threshold: REORDER_RESET_THRESHOLD,
        }
    }
}

impl ReorderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 || self.buffer_size > MAX_BUFFER_SIZE {
            return Err(TrackError::InvalidConfig(format!(
                "reorder buffer_size must be in 1..={}, got {}",
                MAX_BUFFER_SIZE, self.buffer_size
            )));
        }
        if self.reset_threshold == 0 {
            return Err(TrackError::InvalidConfig(
                "reorder reset_threshold must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sequence-number reorderer
///
/// `process` returns the packets that can be released, in sequence order,
/// together with the number of sequence numbers given up as lost. Every
/// sequence number is either released once or counted lost once; duplicates
/// and packets older than the expected one are dropped.
///
/// The first packet seen sets the starting point and is released at once.
/// Packets older than it are dropped uncounted, like any late packet.
///
/// After `reset_threshold` late packets in a row the sender is assumed to
/// have restarted: everything held is released, the open gap before it and
/// the late packets dropped so far are counted lost, and the stream resumes
/// after the packet that triggered the resync.
pub struct Reorderer {
    /// Ring of early packets, slot `abs_pos` belongs to `expected_seq`
    buffer: Vec<Option<Packet>>,
    abs_pos: usize,
    /// Expected next sequence number, `None` until the first packet
    expected_seq: Option<u16>,
    behind_count: u32,
    config: ReorderConfig,
    /// Statistics
    packets_received: u64,
    packets_reordered: u64,
    packets_lost: u64,
}

impl Default for Reorderer {
    fn default() -> Self {
        Self::new(ReorderConfig::default())
    }
}

impl Reorderer {
    /// Create a reorderer; the config is expected to be validated
    pub fn new(config: ReorderConfig) -> Self {
        let size = config.buffer_size.clamp(1, MAX_BUFFER_SIZE);
        Self {
            buffer: (0..size).map(|_| None).collect(),
            abs_pos: 0,
            expected_seq: None,
            behind_count: 0,
            config,
            packets_received: 0,
            packets_reordered: 0,
            packets_lost: 0,
        }
    }

    /// Feed one packet, get back the released run and the lost count
    pub fn process(&mut self, packet: Packet) -> (Vec<Packet>, u64) {
        self.packets_received += 1;
        let seq = packet.header.sequence_number;

        let Some(expected) = self.expected_seq else {
            self.expected_seq = Some(seq.wrapping_add(1));
            return (vec![packet], 0);
        };

        let rel_pos = seq.wrapping_sub(expected) as i16;

        // already released, already given up, or a restarted sender
        if rel_pos < 0 {
            self.behind_count += 1;
            if self.behind_count >= self.config.reset_threshold {
                warn!(
                    "Reorderer: {} late packets in a row, resynchronizing on seq {}",
                    self.behind_count, seq
                );
                let (mut run, gap) = self.drain();
                let lost = gap + u64::from(self.behind_count - 1);
                self.clear();
                self.expected_seq = Some(seq.wrapping_add(1));
                self.packets_lost += lost;
                run.push(packet);
                return (run, lost);
            }
            return (Vec::new(), 0);
        }
        self.behind_count = 0;

        let size = self.buffer.len();
        let rel_pos = rel_pos as usize;

        // the gap did not close within the ring: release everything held
        if rel_pos >= size {
            let mut run: Vec<Packet> = (0..size)
                .filter_map(|i| self.buffer[(self.abs_pos + i) % size].take())
                .collect();
            let lost = (rel_pos - run.len()) as u64;
            run.push(packet);
            self.expected_seq = Some(seq.wrapping_add(1));
            self.packets_lost += lost;
            return (run, lost);
        }

        if rel_pos != 0 {
            let slot = (self.abs_pos + rel_pos) % size;
            if self.buffer[slot].is_none() {
                self.buffer[slot] = Some(packet);
                self.packets_reordered += 1;
            }
            return (Vec::new(), 0);
        }

        let mut run = vec![packet];
        self.abs_pos = (self.abs_pos + 1) % size;
        while let Some(next) = self.buffer[self.abs_pos].take() {
            run.push(next);
            self.abs_pos = (self.abs_pos + 1) % size;
        }
        self.expected_seq = Some(seq.wrapping_add(run.len() as u16));
        (run, 0)
    }

    /// Expected next sequence number, if any packet was seen
    pub fn expected_seq(&self) -> Option<u16> {
        self.expected_seq
    }

    /// Number of packets currently held
    pub fn buffered(&self) -> usize {
        self.buffer.iter().filter(|slot| slot.is_some()).count()
    }

    /// Take every held packet in ring order, with the count of empty slots
    /// before the last one
    fn drain(&mut self) -> (Vec<Packet>, u64) {
        let size = self.buffer.len();
        let mut run = Vec::new();
        let mut span = 0;
        for i in 0..size {
            if let Some(held) = self.buffer[(self.abs_pos + i) % size].take() {
                run.push(held);
                span = i + 1;
            }
        }
        let gap = (span - run.len()) as u64;
        (run, gap)
    }

    fn clear(&mut self) {
        self.buffer.iter_mut().for_each(|slot| *slot = None);
        self.abs_pos = 0;
        self.behind_count = 0;
    }

    /// Get statistics: (received, reordered, lost, buffered)
    pub fn stats(&self) -> (u64, u64, u64, usize) {
        (
            self.packets_received,
            self.packets_reordered,
            self.packets_lost,
            self.buffered(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use webrtc::rtp::header::Header;

    fn make_packet(seq: u16) -> Packet {
        Packet {
            header: Header {
                sequence_number: seq,
                timestamp: seq as u32 * 3000,
                marker: true,
                ..Default::default()
            },
            payload: Bytes::from(vec![seq as u8]),
        }
    }

    fn seqs(packets: &[Packet]) -> Vec<u16> {
        packets.iter().map(|p| p.header.sequence_number).collect()
    }

    /// Feed all packets, collect everything released and the total loss
    fn feed(reorderer: &mut Reorderer, order: &[u16]) -> (Vec<u16>, u64) {
        let mut out = Vec::new();
        let mut lost = 0;
        for &seq in order {
            let (run, l) = reorderer.process(make_packet(seq));
            out.extend(seqs(&run));
            lost += l;
        }
        (out, lost)
    }

    #[test]
    fn test_in_order_packets() {
        let mut reorderer = Reorderer::default();

        for seq in 1..=3 {
            let (run, lost) = reorderer.process(make_packet(seq));
            assert_eq!(seqs(&run), vec![seq]);
            assert_eq!(lost, 0);
        }
        assert_eq!(reorderer.expected_seq(), Some(4));
    }

    #[test]
    fn test_out_of_order_packets() {
        let mut reorderer = Reorderer::default();

        let (run, _) = reorderer.process(make_packet(1));
        assert_eq!(seqs(&run), vec![1]);

        let (run, lost) = reorderer.process(make_packet(4));
        assert!(run.is_empty());
        assert_eq!(lost, 0);
        let (run, _) = reorderer.process(make_packet(3));
        assert!(run.is_empty());
        assert_eq!(reorderer.buffered(), 2);

        let (run, lost) = reorderer.process(make_packet(2));
        assert_eq!(seqs(&run), vec![2, 3, 4]);
        assert_eq!(lost, 0);
        assert_eq!(reorderer.buffered(), 0);
    }

    #[test]
    fn test_permutation_without_loss() {
        // a fixed shuffle of 100..=147, every displacement below the window
        let mut order: Vec<u16> = (100..148).collect();
        for chunk in order.chunks_mut(7) {
            chunk.reverse();
        }
        order.swap(3, 20);
        order.swap(30, 45);
        // start with the lowest so it initializes the expected pointer
        let first = order.iter().position(|&s| s == 100).unwrap();
        order.swap(0, first);

        let mut reorderer = Reorderer::default();
        let mut out = Vec::new();
        for &seq in &order {
            let (run, lost) = reorderer.process(make_packet(seq));
            assert_eq!(lost, 0, "no loss expected at seq {}", seq);
            out.extend(seqs(&run));
        }
        assert_eq!(out, (100..148).collect::<Vec<u16>>());
    }

    #[test]
    fn test_duplicate_packets() {
        let mut reorderer = Reorderer::default();

        let (out, lost) = feed(&mut reorderer, &[1, 3, 3, 2, 2, 1, 4]);
        assert_eq!(out, vec![1, 2, 3, 4]);
        assert_eq!(lost, 0);
    }

    #[test]
    fn test_gap_declared_lost_after_window() {
        let mut reorderer = Reorderer::default();
        let (out, _) = feed(&mut reorderer, &(0..10).collect::<Vec<u16>>());
        assert_eq!(out.len(), 10);

        // 10..15 never arrive
        let mut total_lost = 0;
        let mut released = Vec::new();
        for seq in 15..(15 + 59) {
            let (run, lost) = reorderer.process(make_packet(seq));
            assert!(run.is_empty());
            total_lost += lost;
        }
        assert_eq!(total_lost, 0);
        assert_eq!(reorderer.buffered(), 59);

        // seq 74 is 64 ahead of the expected 10
        let (run, lost) = reorderer.process(make_packet(74));
        released.extend(seqs(&run));
        total_lost += lost;

        assert_eq!(total_lost, 5);
        assert_eq!(released, (15..=74).collect::<Vec<u16>>());
        assert_eq!(reorderer.expected_seq(), Some(75));

        // emission continues normally
        let (run, lost) = reorderer.process(make_packet(75));
        assert_eq!(seqs(&run), vec![75]);
        assert_eq!(lost, 0);
        assert_eq!(reorderer.stats().2, 5);
    }

    #[test]
    fn test_far_jump_counts_whole_gap() {
        let mut reorderer = Reorderer::default();
        feed(&mut reorderer, &[500]);

        let (run, lost) = reorderer.process(make_packet(700));
        assert_eq!(seqs(&run), vec![700]);
        assert_eq!(lost, 199);
    }

    #[test]
    fn test_sparse_buffer_flush() {
        let mut reorderer = Reorderer::new(ReorderConfig {
            buffer_size: 8,
            ..Default::default()
        });
        feed(&mut reorderer, &[0]);

        // 1, 3, 5 missing; 2, 4, 6 held
        let (out, lost) = feed(&mut reorderer, &[2, 4, 6]);
        assert!(out.is_empty());
        assert_eq!(lost, 0);

        // 9 is 8 past the expected 1
        let (run, lost) = reorderer.process(make_packet(9));
        assert_eq!(seqs(&run), vec![2, 4, 6, 9]);
        // 1, 3, 5, 7, 8
        assert_eq!(lost, 5);
    }

    #[test]
    fn test_late_packet_after_loss_is_dropped() {
        let mut reorderer = Reorderer::new(ReorderConfig {
            buffer_size: 4,
            ..Default::default()
        });
        feed(&mut reorderer, &[0]);
        let (out, lost) = feed(&mut reorderer, &[2, 3, 4, 5]);
        assert_eq!(out, vec![2, 3, 4, 5]);
        assert_eq!(lost, 1);

        // 1 shows up too late: it was already counted
        let (run, lost) = reorderer.process(make_packet(1));
        assert!(run.is_empty());
        assert_eq!(lost, 0);
    }

    #[test]
    fn test_sequence_wraparound() {
        let mut reorderer = Reorderer::default();

        let (out, lost) = feed(&mut reorderer, &[65534, 65535, 0, 1]);
        assert_eq!(out, vec![65534, 65535, 0, 1]);
        assert_eq!(lost, 0);

        let mut reorderer = Reorderer::default();
        let (out, lost) = feed(&mut reorderer, &[65533, 0, 65535, 65534, 1]);
        assert_eq!(out, vec![65533, 65534, 65535, 0, 1]);
        assert_eq!(lost, 0);
    }

    #[test]
    fn test_wraparound_with_loss() {
        let mut reorderer = Reorderer::new(ReorderConfig {
            buffer_size: 4,
            ..Default::default()
        });
        feed(&mut reorderer, &[65534]);

        // 65535 lost, 0..=3 arrive; 3 is 4 past the expected 65535
        let (out, lost) = feed(&mut reorderer, &[0, 1, 2, 3]);
        assert_eq!(out, vec![0, 1, 2, 3]);
        assert_eq!(lost, 1);
        assert_eq!(reorderer.expected_seq(), Some(4));
    }

    #[test]
    fn test_resync_after_sender_restart() {
        let mut reorderer = Reorderer::default();
        feed(&mut reorderer, &(1000..1010).collect::<Vec<u16>>());

        // sender restarts from 10
        let restart: Vec<u16> = (10..10 + REORDER_RESET_THRESHOLD as u16).collect();
        let (out, lost) = feed(&mut reorderer, &restart);
        // every restart packet but the last was dropped as late
        assert_eq!(lost, REORDER_RESET_THRESHOLD as u64 - 1);
        assert_eq!(out, vec![*restart.last().unwrap()]);

        let next = restart.last().unwrap() + 1;
        let (run, _) = reorderer.process(make_packet(next));
        assert_eq!(seqs(&run), vec![next]);
    }

    #[test]
    fn test_resync_releases_held_packets() {
        let mut reorderer = Reorderer::default();
        feed(&mut reorderer, &[1000]);

        // 1001..=1004 missing, 1005..=1007 held
        let (out, lost) = feed(&mut reorderer, &[1005, 1006, 1007]);
        assert!(out.is_empty());
        assert_eq!(lost, 0);

        // sender restarts from 10; 10..=16 are dropped as late
        let (out, lost) = feed(&mut reorderer, &(10..17).collect::<Vec<u16>>());
        assert!(out.is_empty());
        assert_eq!(lost, 0);

        let (run, lost) = reorderer.process(make_packet(17));
        assert_eq!(seqs(&run), vec![1005, 1006, 1007, 17]);
        // 1001..=1004 and 10..=16
        assert_eq!(lost, 11);
        assert_eq!(reorderer.buffered(), 0);
        assert_eq!(reorderer.stats().2, 11);

        let (run, lost) = reorderer.process(make_packet(18));
        assert_eq!(seqs(&run), vec![18]);
        assert_eq!(lost, 0);
    }

    #[test]
    fn test_packets_older_than_first_are_dropped() {
        let mut reorderer = Reorderer::default();

        // 101 sets the starting point, so 100 is already behind it
        let (out, lost) = feed(&mut reorderer, &[101, 100, 102, 103]);
        assert_eq!(out, vec![101, 102, 103]);
        assert_eq!(lost, 0);
        assert_eq!(reorderer.stats().0, 4);
    }

    #[test]
    fn test_config_validation() {
        assert!(ReorderConfig::default().validate().is_ok());
        let zero = ReorderConfig {
            buffer_size: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
        let huge = ReorderConfig {
            buffer_size: MAX_BUFFER_SIZE + 1,
            ..Default::default()
        };
        assert!(huge.validate().is_err());
        let no_reset = ReorderConfig {
            reset_threshold: 0,
            ..Default::default()
        };
        assert!(no_reset.validate().is_err());
    }

    #[test]
    fn test_stats() {
        let mut reorderer = Reorderer::default();
        feed(&mut reorderer, &[1, 3, 2]);

        let (received, reordered, lost, buffered) = reorderer.stats();
        assert_eq!(received, 3);
        assert_eq!(reordered, 1);
        assert_eq!(lost, 0);
        assert_eq!(buffered, 0);
    }
}
