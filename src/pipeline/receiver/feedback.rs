//! RTCP side of an incoming track
//!
//! Two background tasks run next to the read path:
//! - LivenessPump: reads and discards inbound RTCP. The NACK, REMB and RTT
//!   interceptors of webrtc-rs only see reports that somebody reads.
//! - KeyframeSolicitor: sends a PLI on a fixed period so the publisher keeps
//!   pushing key frames (video only).
//!
//! Both end silently on the first I/O error; the RTP read path is what reports
//! the end of the stream.

use log::{debug, info};
use rtcp::payload_feedbacks::picture_loss_indication::PictureLossIndication;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};

use crate::pipeline::health::TrackHealth;
use crate::utils::net::webrtc::{FeedbackReader, FeedbackWriter, RtcpPacket};

/// Drains the inbound RTCP of one track
pub struct LivenessPump {
    reader: Arc<dyn FeedbackReader>,
    health: Arc<TrackHealth>,
}

impl LivenessPump {
    pub fn new(reader: Arc<dyn FeedbackReader>, health: Arc<TrackHealth>) -> Self {
        Self { reader, health }
    }

    pub async fn run(self) {
        loop {
            match self.reader.read_feedback().await {
                Ok(_) => self.health.record_rtcp_drained(),
                Err(e) => {
                    debug!("LivenessPump: RTCP read ended: {}", e);
                    break;
                }
            }
        }
        info!(
            "LivenessPump: finished ({} reports drained)",
            self.health.rtcp_reports_drained()
        );
    }
}

/// Periodically asks the sender of a video track for a key frame
pub struct KeyframeSolicitor {
    writer: Arc<dyn FeedbackWriter>,
    media_ssrc: u32,
    interval: Duration,
    health: Arc<TrackHealth>,
}

impl KeyframeSolicitor {
    pub fn new(
        writer: Arc<dyn FeedbackWriter>,
        media_ssrc: u32,
        interval: Duration,
        health: Arc<TrackHealth>,
    ) -> Self {
        Self {
            writer,
            media_ssrc,
            interval,
            health,
        }
    }

    fn picture_loss_indication(&self) -> RtcpPacket {
        Box::new(PictureLossIndication {
            sender_ssrc: 0,
            media_ssrc: self.media_ssrc,
        })
    }

    pub async fn run(self) {
        // first request one full period after start
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = self
                .writer
                .write_feedback(&[self.picture_loss_indication()])
                .await
            {
                debug!(
                    "KeyframeSolicitor: PLI for ssrc {} not sent, stopping: {}",
                    self.media_ssrc, e
                );
                break;
            }
            self.health.record_keyframe_request();
        }
        info!(
            "KeyframeSolicitor: finished ({} requests sent)",
            self.health.keyframe_requests_sent()
        );
    }
}
