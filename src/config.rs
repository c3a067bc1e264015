use crate::error::{Result, TrackError};
use crate::pipeline::receiver::ReorderConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Interval between two PLI key-frame requests on video tracks.
pub const KEYFRAME_INTERVAL: Duration = Duration::from_secs(2);

/// Number of packets the reorderer may hold before declaring a gap lost.
pub const REORDER_BUFFER_SIZE: usize = 64;

/// Consecutive late packets after which the reorderer resynchronizes.
pub const REORDER_RESET_THRESHOLD: u32 = 8;

/// Per-track settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Period of the key-frame solicitor (video only)
    pub keyframe_interval: Duration,
    /// Reorder window settings
    pub reorder: ReorderConfig,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            keyframe_interval: KEYFRAME_INTERVAL,
            reorder: ReorderConfig::default(),
        }
    }
}

impl TrackConfig {
    pub fn validate(&self) -> Result<()> {
        if self.keyframe_interval.is_zero() {
            return Err(TrackError::InvalidConfig(
                "keyframe_interval must be greater than zero".to_string(),
            ));
        }
        self.reorder.validate()
    }
}
