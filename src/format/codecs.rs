//! Codec negotiation tables for incoming tracks
//!
//! Two ordered lists, video and audio, in preference order. They are used both
//! when building the local offer and when resolving the codec of a remote
//! track, so they are kept as plain data.

use webrtc::api::media_engine::{
    MIME_TYPE_AV1, MIME_TYPE_G722, MIME_TYPE_H264, MIME_TYPE_OPUS, MIME_TYPE_PCMA,
    MIME_TYPE_PCMU, MIME_TYPE_VP8, MIME_TYPE_VP9, MediaEngine,
};
use webrtc::rtp_transceiver::RTCPFeedback;
use webrtc::rtp_transceiver::rtp_codec::{
    RTCRtpCodecCapability, RTCRtpCodecParameters, RTPCodecType,
};

/// One negotiable codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecEntry {
    pub mime_type: &'static str,
    pub clock_rate: u32,
    /// 0 when the SDP omits the channel count
    pub channels: u16,
    pub sdp_fmtp_line: &'static str,
    pub payload_type: u8,
}

impl CodecEntry {
    const fn new(
        mime_type: &'static str,
        clock_rate: u32,
        channels: u16,
        sdp_fmtp_line: &'static str,
        payload_type: u8,
    ) -> Self {
        Self {
            mime_type,
            clock_rate,
            channels,
            sdp_fmtp_line,
            payload_type,
        }
    }

    pub fn is_video(&self) -> bool {
        self.mime_type
            .get(..6)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("video/"))
    }

    /// Convert into webrtc-rs codec parameters
    pub fn to_parameters(&self) -> RTCRtpCodecParameters {
        RTCRtpCodecParameters {
            capability: RTCRtpCodecCapability {
                mime_type: self.mime_type.to_string(),
                clock_rate: self.clock_rate,
                channels: self.channels,
                sdp_fmtp_line: self.sdp_fmtp_line.to_string(),
                rtcp_feedback: if self.is_video() {
                    video_rtcp_feedback()
                } else {
                    Vec::new()
                },
            },
            payload_type: self.payload_type,
            ..Default::default()
        }
    }
}

const H264_FMTP_BASELINE: &str =
    "level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=42001f";
const H264_FMTP_CONSTRAINED: &str =
    "level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=42e01f";

/// Video codecs, most preferred first
pub const INCOMING_VIDEO_CODECS: &[CodecEntry] = &[
    CodecEntry::new(MIME_TYPE_AV1, 90000, 0, "profile-id=1", 96),
    CodecEntry::new(MIME_TYPE_AV1, 90000, 0, "", 97),
    CodecEntry::new(MIME_TYPE_VP9, 90000, 0, "profile-id=3", 98),
    CodecEntry::new(MIME_TYPE_VP9, 90000, 0, "profile-id=2", 99),
    CodecEntry::new(MIME_TYPE_VP9, 90000, 0, "profile-id=1", 100),
    CodecEntry::new(MIME_TYPE_VP9, 90000, 0, "profile-id=0", 101),
    CodecEntry::new(MIME_TYPE_VP8, 90000, 0, "", 102),
    CodecEntry::new(MIME_TYPE_H264, 90000, 0, H264_FMTP_BASELINE, 103),
    CodecEntry::new(MIME_TYPE_H264, 90000, 0, H264_FMTP_CONSTRAINED, 104),
];

/// Audio codecs, most preferred first
pub const INCOMING_AUDIO_CODECS: &[CodecEntry] = &[
    CodecEntry::new(
        MIME_TYPE_OPUS,
        48000,
        2,
        "minptime=10;useinbandfec=1;stereo=1;sprop-stereo=1",
        111,
    ),
    CodecEntry::new(MIME_TYPE_G722, 8000, 0, "", 9),
    CodecEntry::new(MIME_TYPE_PCMU, 8000, 2, "", 118),
    CodecEntry::new(MIME_TYPE_PCMA, 8000, 2, "", 119),
    CodecEntry::new(MIME_TYPE_PCMU, 8000, 0, "", 0),
    CodecEntry::new(MIME_TYPE_PCMA, 8000, 0, "", 8),
];

fn video_rtcp_feedback() -> Vec<RTCPFeedback> {
    [("goog-remb", ""), ("ccm", "fir"), ("nack", ""), ("nack", "pli")]
        .into_iter()
        .map(|(typ, parameter)| RTCPFeedback {
            typ: typ.to_string(),
            parameter: parameter.to_string(),
        })
        .collect()
}

/// Register both tables, in preference order, on a media engine
pub fn register_incoming_codecs(media_engine: &mut MediaEngine) -> Result<(), webrtc::Error> {
    for entry in INCOMING_VIDEO_CODECS {
        media_engine.register_codec(entry.to_parameters(), RTPCodecType::Video)?;
    }
    for entry in INCOMING_AUDIO_CODECS {
        media_engine.register_codec(entry.to_parameters(), RTPCodecType::Audio)?;
    }
    Ok(())
}
