use crate::format::CodecDescriptor;
use async_trait::async_trait;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp::packet::Packet;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_remote::TrackRemote;

/// Boxed RTCP message as exchanged with webrtc-rs
pub type RtcpPacket = Box<dyn rtcp::packet::Packet + Send + Sync>;

/// Inbound RTP side of a remote track
#[async_trait]
pub trait RemoteTrack: Send + Sync {
    /// Codec negotiated for the track, with the payload type actually in use
    fn negotiated_codec(&self) -> CodecDescriptor;

    /// SSRC of the media source, target of key-frame requests
    fn media_ssrc(&self) -> u32;

    /// Wait for the next RTP packet
    async fn read_packet(&self) -> Result<Packet, webrtc::Error>;
}

/// Inbound RTCP side of a remote track
#[async_trait]
pub trait FeedbackReader: Send + Sync {
    async fn read_feedback(&self) -> Result<Vec<RtcpPacket>, webrtc::Error>;
}

/// Outbound RTCP of the session
#[async_trait]
pub trait FeedbackWriter: Send + Sync {
    async fn write_feedback(&self, packets: &[RtcpPacket]) -> Result<(), webrtc::Error>;
}

#[async_trait]
impl RemoteTrack for TrackRemote {
    fn negotiated_codec(&self) -> CodecDescriptor {
        let mut codec = CodecDescriptor::from(&self.codec());
        codec.payload_type = self.payload_type();
        codec
    }

    fn media_ssrc(&self) -> u32 {
        self.ssrc()
    }

    async fn read_packet(&self) -> Result<Packet, webrtc::Error> {
        let (packet, _) = self.read_rtp().await?;
        Ok(packet)
    }
}

#[async_trait]
impl FeedbackReader for RTCRtpReceiver {
    async fn read_feedback(&self) -> Result<Vec<RtcpPacket>, webrtc::Error> {
        let (packets, _) = self.read_rtcp().await?;
        Ok(packets)
    }
}

#[async_trait]
impl FeedbackWriter for RTCPeerConnection {
    async fn write_feedback(&self, packets: &[RtcpPacket]) -> Result<(), webrtc::Error> {
        self.write_rtcp(packets).await?;
        Ok(())
    }
}
