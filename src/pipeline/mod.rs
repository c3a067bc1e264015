//! Pipeline layer for incoming media
//!
//! - Receiver: ordering, loss accounting and feedback for one remote track
//! - Health: counters shared by the track and its background tasks

pub mod health;
pub mod receiver;
pub mod types;

pub use health::{HealthSummary, TrackHealth};
pub use types::MediaKind;
