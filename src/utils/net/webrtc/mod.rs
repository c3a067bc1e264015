mod common;
mod interfaces;
#[cfg(test)]
pub(crate) mod testing;

pub use common::create_ingest_api;
pub use interfaces::{FeedbackReader, FeedbackWriter, RemoteTrack, RtcpPacket};
