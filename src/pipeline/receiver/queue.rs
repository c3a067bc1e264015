//! Pending output queue of an incoming track

use std::collections::VecDeque;
use webrtc::rtp::packet::Packet;

/// FIFO of released packets waiting to be read
///
/// Packets with an empty payload are skipped on the way out; some browsers
/// send them and they carry nothing a depacketizer can use.
#[derive(Debug, Default)]
pub struct PendingQueue {
    packets: VecDeque<Packet>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the content with a freshly released run
    pub fn refill(&mut self, run: Vec<Packet>) {
        debug_assert!(self.packets.is_empty(), "refill of a non-empty queue");
        self.packets.extend(run);
    }

    /// Pop the first packet with a payload, returning it with the number of
    /// empty packets discarded on the way
    pub fn pop_front(&mut self) -> (Option<Packet>, u64) {
        let mut skipped = 0;
        while let Some(packet) = self.packets.pop_front() {
            if packet.payload.is_empty() {
                skipped += 1;
                continue;
            }
            return (Some(packet), skipped);
        }
        (None, skipped)
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}
