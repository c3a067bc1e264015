//! Health counters for an incoming track

use std::sync::atomic::{AtomicU64, Ordering};

/// Health metrics for an incoming track
///
/// Shared between the read path and the background feedback tasks.
/// All fields use atomic operations for thread-safe access.
#[derive(Debug, Default)]
pub struct TrackHealth {
    /// RTP packets read from the transport
    pub packets_received: AtomicU64,

    /// RTP packets handed to the consumer
    pub packets_emitted: AtomicU64,

    /// Sequence numbers given up as lost by the reorderer
    pub packets_lost: AtomicU64,

    /// Zero-payload packets filtered out
    pub empty_packets_dropped: AtomicU64,

    /// RTCP reads completed by the liveness pump
    pub rtcp_reports_drained: AtomicU64,

    /// PLI messages written
    pub keyframe_requests_sent: AtomicU64,
}

impl TrackHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.packets_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emitted(&self) {
        self.packets_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lost(&self, count: u64) {
        self.packets_lost.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_empty_dropped(&self, count: u64) {
        self.empty_packets_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_rtcp_drained(&self) {
        self.rtcp_reports_drained.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_keyframe_request(&self) {
        self.keyframe_requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn packets_received(&self) -> u64 {
        self.packets_received.load(Ordering::Relaxed)
    }

    pub fn packets_emitted(&self) -> u64 {
        self.packets_emitted.load(Ordering::Relaxed)
    }

    pub fn packets_lost(&self) -> u64 {
        self.packets_lost.load(Ordering::Relaxed)
    }

    pub fn empty_packets_dropped(&self) -> u64 {
        self.empty_packets_dropped.load(Ordering::Relaxed)
    }

    pub fn rtcp_reports_drained(&self) -> u64 {
        self.rtcp_reports_drained.load(Ordering::Relaxed)
    }

    pub fn keyframe_requests_sent(&self) -> u64 {
        self.keyframe_requests_sent.load(Ordering::Relaxed)
    }

    /// Loss as a percentage of the sequence numbers seen so far
    pub fn loss_rate(&self) -> f64 {
        let lost = self.packets_lost();
        let total = lost + self.packets_emitted();
        if total == 0 {
            return 0.0;
        }
        (lost as f64 / total as f64) * 100.0
    }

    pub fn summary(&self) -> HealthSummary {
        HealthSummary {
            packets_received: self.packets_received(),
            packets_emitted: self.packets_emitted(),
            packets_lost: self.packets_lost(),
            empty_packets_dropped: self.empty_packets_dropped(),
            rtcp_reports_drained: self.rtcp_reports_drained(),
            keyframe_requests_sent: self.keyframe_requests_sent(),
            loss_rate: self.loss_rate(),
        }
    }
}

/// Point-in-time copy of [`TrackHealth`]
#[derive(Debug, Clone)]
pub struct HealthSummary {
    pub packets_received: u64,
    pub packets_emitted: u64,
    pub packets_lost: u64,
    pub empty_packets_dropped: u64,
    pub rtcp_reports_drained: u64,
    pub keyframe_requests_sent: u64,
    pub loss_rate: f64,
}

impl std::fmt::Display for HealthSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Health: {} received, {} emitted, {} lost ({:.2}%), {} empty, {} rtcp drained, {} keyframe requests",
            self.packets_received,
            self.packets_emitted,
            self.packets_lost,
            self.loss_rate,
            self.empty_packets_dropped,
            self.rtcp_reports_drained,
            self.keyframe_requests_sent
        )
    }
}
