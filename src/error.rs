use thiserror::Error;

/// Result type for track operations
pub type Result<T> = std::result::Result<T, TrackError>;

/// Error types for incoming track operations
#[derive(Debug, Error)]
pub enum TrackError {
    /// The negotiated codec has no matching format
    #[error("unsupported codec: {mime_type}")]
    UnsupportedCodec { mime_type: String },

    /// Reading from the transport failed; the track is finished
    #[error("transport read failed: {0}")]
    Transport(#[from] webrtc::Error),

    /// Rejected configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TrackError {
    /// Whether the error ends the track for good
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrackError::Transport(_))
    }
}
