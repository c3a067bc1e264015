//! Incoming track
//!
//! Facade over one remote WebRTC track: resolves its [`Format`], reorders its
//! RTP packets, filters empty ones and keeps the RTCP side alive.

use log::{info, warn};
use std::sync::Arc;
use tokio::task::JoinHandle;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp::packet::Packet;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_remote::TrackRemote;

use crate::config::TrackConfig;
use crate::error::{Result, TrackError};
use crate::format::Format;
use crate::pipeline::health::TrackHealth;
use crate::pipeline::receiver::feedback::{KeyframeSolicitor, LivenessPump};
use crate::pipeline::receiver::queue::PendingQueue;
use crate::pipeline::receiver::reorder::Reorderer;
use crate::utils::net::webrtc::{FeedbackReader, FeedbackWriter, RemoteTrack};
use crate::utils::sos::SignalOfStop;

/// An incoming track
///
/// Packets come out of [`IncomingTrack::read_rtp`] in sequence order; gaps
/// that never fill are skipped and only reported through the log and
/// [`TrackHealth`]. The background RTCP tasks stop when the track is closed,
/// dropped, or when the transport fails.
pub struct IncomingTrack {
    track: Arc<dyn RemoteTrack>,
    format: Format,
    ssrc: u32,
    reorderer: Reorderer,
    pending: PendingQueue,
    health: Arc<TrackHealth>,
    sos: SignalOfStop,
    tasks: Vec<JoinHandle<Option<()>>>,
}

impl IncomingTrack {
    /// Bind a remote track. Must be called from within a tokio runtime.
    ///
    /// Fails without starting anything if the negotiated codec is not
    /// supported or the config is invalid.
    pub fn new(
        track: Arc<dyn RemoteTrack>,
        receiver: Arc<dyn FeedbackReader>,
        writer: Arc<dyn FeedbackWriter>,
        config: TrackConfig,
    ) -> Result<Self> {
        config.validate()?;
        let codec = track.negotiated_codec();
        let format = Format::resolve(&codec)?;
        let ssrc = track.media_ssrc();

        let health = Arc::new(TrackHealth::new());
        let sos = SignalOfStop::new();
        let mut tasks = Vec::with_capacity(2);

        // read incoming RTCP packets to make interceptors work
        tasks.push(sos.spawn(LivenessPump::new(receiver, health.clone()).run()));

        if format.is_video() {
            tasks.push(
                sos.spawn(
                    KeyframeSolicitor::new(writer, ssrc, config.keyframe_interval, health.clone())
                        .run(),
                ),
            );
        }

        info!(
            "IncomingTrack: {} track ssrc {} bound as {}",
            format.media_kind(),
            ssrc,
            format
        );

        Ok(Self {
            track,
            format,
            ssrc,
            reorderer: Reorderer::new(config.reorder),
            pending: PendingQueue::new(),
            health,
            sos,
            tasks,
        })
    }

    /// Bind a webrtc-rs track with the default configuration
    pub fn from_webrtc(
        track: Arc<TrackRemote>,
        receiver: Arc<RTCRtpReceiver>,
        peer_connection: Arc<RTCPeerConnection>,
    ) -> Result<Self> {
        Self::new(track, receiver, peer_connection, TrackConfig::default())
    }

    /// The track format
    pub fn format(&self) -> &Format {
        &self.format
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    pub fn health(&self) -> &Arc<TrackHealth> {
        &self.health
    }

    /// Read the next RTP packet in sequence order
    ///
    /// A transport error is final: it is returned as is and the background
    /// tasks are stopped.
    pub async fn read_rtp(&mut self) -> Result<Packet> {
        loop {
            let (packet, skipped) = self.pending.pop_front();
            if skipped != 0 {
                // sometimes Chrome sends empty RTP packets. ignore them.
                self.health.record_empty_dropped(skipped);
            }
            if let Some(packet) = packet {
                self.health.record_emitted();
                return Ok(packet);
            }

            let packet = match self.track.read_packet().await {
                Ok(packet) => packet,
                Err(e) => {
                    let err = TrackError::from(e);
                    info!("IncomingTrack: ssrc {} read ended: {}", self.ssrc, err);
                    if err.is_terminal() {
                        self.close();
                    }
                    return Err(err);
                }
            };
            self.health.record_received();

            let (run, lost) = self.reorderer.process(packet);
            if lost != 0 {
                warn!("{} RTP packets lost on ssrc {}", lost, self.ssrc);
                self.health.record_lost(lost);
            }

            self.pending.refill(run);
        }
    }

    /// Stop the background RTCP tasks
    pub fn close(&self) {
        if self.sos.cancelled() {
            return;
        }
        self.sos.cancel();
        let (received, reordered, lost, buffered) = self.reorderer.stats();
        info!(
            "IncomingTrack: ssrc {} closed. {} | reorder: {} in, {} reordered, {} lost, {} held",
            self.ssrc,
            self.health.summary(),
            received,
            reordered,
            lost,
            buffered
        );
    }

    /// Background RTCP tasks still running
    pub fn running_tasks(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_finished()).count()
    }
}

impl Drop for IncomingTrack {
    fn drop(&mut self) {
        self.close();
    }
}
