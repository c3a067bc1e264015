//! Track formats
//!
//! Maps the codec negotiated for a remote track to the [`Format`] handed to the
//! depacketizers downstream. Resolution looks at the mime type only; clock rate
//! and fmtp are used just to derive auxiliary fields.

pub mod codecs;

use crate::error::{Result, TrackError};
use crate::pipeline::MediaKind;
use codecs::CodecEntry;
use webrtc::api::media_engine::{
    MIME_TYPE_AV1, MIME_TYPE_G722, MIME_TYPE_H264, MIME_TYPE_OPUS, MIME_TYPE_PCMA,
    MIME_TYPE_PCMU, MIME_TYPE_VP8, MIME_TYPE_VP9,
};
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecParameters;

/// Static payload type of G.722.
pub const G722_PAYLOAD_TYPE: u8 = 9;
/// Static payload type of mono G.711 mu-law.
pub const PCMU_PAYLOAD_TYPE: u8 = 0;
/// Static payload type of mono G.711 A-law.
pub const PCMA_PAYLOAD_TYPE: u8 = 8;
/// Payload type used for G.711 mu-law with more than one channel.
pub const PCMU_MULTICHANNEL_PAYLOAD_TYPE: u8 = 118;
/// Payload type used for G.711 A-law with more than one channel.
pub const PCMA_MULTICHANNEL_PAYLOAD_TYPE: u8 = 119;

const OPUS_STEREO_MARKER: &str = "stereo=1";
const H264_PACKETIZATION_MODE: u8 = 1;
const G711_SAMPLE_RATE: u32 = 8000;

/// Codec parameters negotiated for one remote track
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecDescriptor {
    pub mime_type: String,
    pub clock_rate: u32,
    /// 0 when the SDP omits the channel count
    pub channels: u16,
    pub sdp_fmtp_line: String,
    pub payload_type: u8,
}

impl From<&RTCRtpCodecParameters> for CodecDescriptor {
    fn from(params: &RTCRtpCodecParameters) -> Self {
        Self {
            mime_type: params.capability.mime_type.clone(),
            clock_rate: params.capability.clock_rate,
            channels: params.capability.channels,
            sdp_fmtp_line: params.capability.sdp_fmtp_line.clone(),
            payload_type: params.payload_type,
        }
    }
}

impl From<&CodecEntry> for CodecDescriptor {
    fn from(entry: &CodecEntry) -> Self {
        Self {
            mime_type: entry.mime_type.to_string(),
            clock_rate: entry.clock_rate,
            channels: entry.channels,
            sdp_fmtp_line: entry.sdp_fmtp_line.to_string(),
            payload_type: entry.payload_type,
        }
    }
}

/// Format bound to an incoming track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Av1 {
        payload_type: u8,
    },
    Vp9 {
        payload_type: u8,
    },
    Vp8 {
        payload_type: u8,
    },
    H264 {
        payload_type: u8,
        packetization_mode: u8,
    },
    Opus {
        payload_type: u8,
        channel_count: u16,
    },
    G722,
    G711 {
        payload_type: u8,
        mu_law: bool,
        sample_rate: u32,
        channel_count: u16,
    },
}

impl Format {
    /// Resolve the format of a negotiated codec
    pub fn resolve(codec: &CodecDescriptor) -> Result<Format> {
        let mime = codec.mime_type.as_str();
        let is = |candidate: &str| mime.eq_ignore_ascii_case(candidate);
        let payload_type = codec.payload_type;

        let format = if is(MIME_TYPE_AV1) {
            Format::Av1 { payload_type }
        } else if is(MIME_TYPE_VP9) {
            Format::Vp9 { payload_type }
        } else if is(MIME_TYPE_VP8) {
            Format::Vp8 { payload_type }
        } else if is(MIME_TYPE_H264) {
            Format::H264 {
                payload_type,
                packetization_mode: H264_PACKETIZATION_MODE,
            }
        } else if is(MIME_TYPE_OPUS) {
            Format::Opus {
                payload_type,
                channel_count: if codec.sdp_fmtp_line.contains(OPUS_STEREO_MARKER) {
                    2
                } else {
                    1
                },
            }
        } else if is(MIME_TYPE_G722) {
            Format::G722
        } else if is(MIME_TYPE_PCMU) {
            Self::g711(codec.channels, true)
        } else if is(MIME_TYPE_PCMA) {
            Self::g711(codec.channels, false)
        } else {
            return Err(TrackError::UnsupportedCodec {
                mime_type: codec.mime_type.clone(),
            });
        };

        Ok(format)
    }

    // The static G.711 payload types are only defined for mono.
    fn g711(channels: u16, mu_law: bool) -> Format {
        let channel_count = channels.max(1);
        let payload_type = match (mu_law, channel_count > 1) {
            (true, false) => PCMU_PAYLOAD_TYPE,
            (true, true) => PCMU_MULTICHANNEL_PAYLOAD_TYPE,
            (false, false) => PCMA_PAYLOAD_TYPE,
            (false, true) => PCMA_MULTICHANNEL_PAYLOAD_TYPE,
        };
        Format::G711 {
            payload_type,
            mu_law,
            sample_rate: G711_SAMPLE_RATE,
            channel_count,
        }
    }

    pub fn payload_type(&self) -> u8 {
        match *self {
            Format::Av1 { payload_type }
            | Format::Vp9 { payload_type }
            | Format::Vp8 { payload_type }
            | Format::H264 { payload_type, .. }
            | Format::Opus { payload_type, .. }
            | Format::G711 { payload_type, .. } => payload_type,
            Format::G722 => G722_PAYLOAD_TYPE,
        }
    }

    /// RTP clock rate
    pub fn clock_rate(&self) -> u32 {
        match self {
            Format::Av1 { .. } | Format::Vp9 { .. } | Format::Vp8 { .. } | Format::H264 { .. } => {
                90000
            }
            Format::Opus { .. } => 48000,
            // G.722 advertises 8000 Hz on the wire for historical reasons
            Format::G722 => 8000,
            Format::G711 { sample_rate, .. } => *sample_rate,
        }
    }

    /// Audio channel count, `None` for video
    pub fn channel_count(&self) -> Option<u16> {
        match *self {
            Format::Opus { channel_count, .. } | Format::G711 { channel_count, .. } => {
                Some(channel_count)
            }
            Format::G722 => Some(1),
            _ => None,
        }
    }

    pub fn media_kind(&self) -> MediaKind {
        match self {
            Format::Av1 { .. } | Format::Vp9 { .. } | Format::Vp8 { .. } | Format::H264 { .. } => {
                MediaKind::Video
            }
            Format::Opus { .. } | Format::G722 | Format::G711 { .. } => MediaKind::Audio,
        }
    }

    pub fn is_video(&self) -> bool {
        self.media_kind() == MediaKind::Video
    }

    /// Short codec name for logging
    pub fn codec_name(&self) -> &'static str {
        match self {
            Format::Av1 { .. } => "AV1",
            Format::Vp9 { .. } => "VP9",
            Format::Vp8 { .. } => "VP8",
            Format::H264 { .. } => "H264",
            Format::Opus { .. } => "Opus",
            Format::G722 => "G722",
            Format::G711 { mu_law: true, .. } => "PCMU",
            Format::G711 { mu_law: false, .. } => "PCMA",
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.codec_name(), self.clock_rate())?;
        if let Some(channels) = self.channel_count() {
            write!(f, "/{}", channels)?;
        }
        write!(f, " (pt {})", self.payload_type())
    }
}
