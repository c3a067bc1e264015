//! Incoming WebRTC track ingest for Castify
//!
//! Turns one negotiated inbound RTP stream into an ordered, loss-aware packet
//! stream tagged with its codec [`Format`]:
//! - codec resolution from the negotiated parameters
//! - reordering with loss accounting
//! - RTCP draining so the interceptors keep working
//! - periodic PLI key-frame requests for video
//!
//! ```text
//! TrackRemote → IncomingTrack::read_rtp → Reorderer → PendingQueue → consumer
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod utils;

pub use config::TrackConfig;
pub use error::{Result, TrackError};
pub use format::{CodecDescriptor, Format};
pub use pipeline::receiver::{IncomingTrack, ReorderConfig, Reorderer};
pub use pipeline::{MediaKind, TrackHealth};
