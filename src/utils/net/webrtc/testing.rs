//! In-memory stand-ins for the webrtc-rs transport

use super::{FeedbackReader, FeedbackWriter, RemoteTrack, RtcpPacket};
use crate::format::CodecDescriptor;
use async_trait::async_trait;
use bytes::Bytes;
use rtcp::packet::Packet as _;
use rtcp::payload_feedbacks::picture_loss_indication::PictureLossIndication;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Instant;
use webrtc::rtp::header::Header;
use webrtc::rtp::packet::Packet;

pub fn packet(seq: u16, payload: &'static [u8]) -> Packet {
    Packet {
        header: Header {
            sequence_number: seq,
            timestamp: seq as u32 * 3000,
            ..Default::default()
        },
        payload: Bytes::from_static(payload),
    }
}

pub fn codec(mime_type: &str, payload_type: u8) -> CodecDescriptor {
    CodecDescriptor {
        mime_type: mime_type.to_string(),
        payload_type,
        ..Default::default()
    }
}

/// Replays a fixed list of packets, then reports the connection closed
pub struct FakeTrack {
    codec: CodecDescriptor,
    ssrc: u32,
    packets: Mutex<VecDeque<Packet>>,
}

impl FakeTrack {
    pub fn new(codec: CodecDescriptor, ssrc: u32, packets: Vec<Packet>) -> Self {
        Self {
            codec,
            ssrc,
            packets: Mutex::new(packets.into()),
        }
    }
}

#[async_trait]
impl RemoteTrack for FakeTrack {
    fn negotiated_codec(&self) -> CodecDescriptor {
        self.codec.clone()
    }

    fn media_ssrc(&self) -> u32 {
        self.ssrc
    }

    async fn read_packet(&self) -> Result<Packet, webrtc::Error> {
        let next = self.packets.lock().unwrap().pop_front();
        next.ok_or(webrtc::Error::ErrConnectionClosed)
    }
}

/// Hands out `reports` empty RTCP reads, then either fails or hangs
pub struct FakeFeedbackReader {
    remaining: AtomicUsize,
    hang: bool,
    reads: AtomicUsize,
}

impl FakeFeedbackReader {
    /// Never returns, like an idle receiver
    pub fn idle() -> Self {
        Self {
            remaining: AtomicUsize::new(0),
            hang: true,
            reads: AtomicUsize::new(0),
        }
    }

    /// Returns `reports` reads, then fails
    pub fn closing_after(reports: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(reports),
            hang: false,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedbackReader for FakeFeedbackReader {
    async fn read_feedback(&self) -> Result<Vec<RtcpPacket>, webrtc::Error> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let available = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if available {
            tokio::task::yield_now().await;
            return Ok(Vec::new());
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        Err(webrtc::Error::ErrConnectionClosed)
    }
}

/// Records every PLI written, optionally failing from the n-th write on
pub struct FakeFeedbackWriter {
    fail_from: Option<usize>,
    attempts: AtomicUsize,
    sent: Mutex<Vec<(Instant, u32)>>,
}

impl FakeFeedbackWriter {
    pub fn new() -> Self {
        Self {
            fail_from: None,
            attempts: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Fails every write starting with the `n`-th (0-based)
    pub fn failing_from(n: usize) -> Self {
        Self {
            fail_from: Some(n),
            ..Self::new()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// (send time, media ssrc) of every PLI written
    pub fn sent(&self) -> Vec<(Instant, u32)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedbackWriter for FakeFeedbackWriter {
    async fn write_feedback(&self, packets: &[RtcpPacket]) -> Result<(), webrtc::Error> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_from.is_some_and(|n| attempt >= n) {
            return Err(webrtc::Error::ErrConnectionClosed);
        }
        let mut sent = self.sent.lock().unwrap();
        for packet in packets {
            if let Some(pli) = packet.as_any().downcast_ref::<PictureLossIndication>() {
                sent.push((Instant::now(), pli.media_ssrc));
            }
        }
        Ok(())
    }
}
