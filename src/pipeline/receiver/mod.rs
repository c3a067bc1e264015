//! Receiver pipeline components
//!
//! This module contains the pieces behind one incoming track:
//! - Reorderer: sequence-number reordering with loss accounting
//! - PendingQueue: released packets waiting to be read
//! - LivenessPump / KeyframeSolicitor: RTCP background tasks
//! - IncomingTrack: the facade the consumer reads from
//!
//! The receiver flow:
//! ```text
//! TrackRemote → IncomingTrack::read_rtp → Reorderer → PendingQueue → consumer
//! RTCRtpReceiver → LivenessPump
//! KeyframeSolicitor → RTCPeerConnection (PLI, video only)
//! ```

pub mod feedback;
pub mod incoming_track;
pub mod queue;
pub mod reorder;

pub use feedback::{KeyframeSolicitor, LivenessPump};
pub use incoming_track::IncomingTrack;
pub use queue::PendingQueue;
pub use reorder::{ReorderConfig, Reorderer};
