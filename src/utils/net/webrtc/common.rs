use crate::format::codecs::register_incoming_codecs;
use std::sync::Arc;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::{API, APIBuilder};
use webrtc::interceptor::registry::Registry;

/// WebRTC API able to receive every format an incoming track resolves.
///
/// The default interceptors (NACK, RTCP reports, TWCC) are registered too;
/// they rely on the inbound RTCP being read, see `LivenessPump`.
pub fn create_ingest_api() -> Result<Arc<API>, webrtc::Error> {
    let mut media_engine = MediaEngine::default();
    register_incoming_codecs(&mut media_engine)?;

    let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

    let api = APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .build();

    Ok(Arc::new(api))
}
