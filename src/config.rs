//! Engine configuration.
//!
//! All behavioral constants live here with defaults matching the deployed
//! service: image analysis throttled to one computation per second, screen
//! commentary to one per three seconds, ten retained history entries, a
//! 30-second liveness probe, and internal cleanup every 100 invocations.

use serde::Deserialize;
use std::time::Duration;

use crate::history::DEFAULT_HISTORY_CAP;

/// Configuration for one image pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImagePipelineConfig {
    /// Minimum interval between model invocations.
    #[serde(with = "duration_secs")]
    pub min_interval: Duration,

    /// Reject image payloads larger than this before decoding.
    pub max_image_bytes: usize,

    /// Longest edge images are downscaled to before the vision call.
    pub downscale_to: u32,
}

impl Default for ImagePipelineConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(1),
            max_image_bytes: 8 * 1024 * 1024,
            downscale_to: 512,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Period of the `"ping"` liveness probe.
    #[serde(with = "duration_secs")]
    pub keepalive_interval: Duration,

    /// Language hint passed to the speech model.
    pub language: String,

    /// Camera (JPEG) pipeline settings.
    pub camera: ImagePipelineConfig,

    /// Screen (PNG) pipeline settings.
    pub screen: ImagePipelineConfig,

    /// Minimum interval between screen commentary generations.
    #[serde(with = "duration_secs")]
    pub comment_interval: Duration,

    /// Retained commentary history entries per pipeline.
    pub history_cap: usize,

    /// Invocations between internal cleanup passes.
    pub cleanup_every: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            keepalive_interval: Duration::from_secs(30),
            language: "ja".to_string(),
            camera: ImagePipelineConfig::default(),
            screen: ImagePipelineConfig {
                downscale_to: 640,
                ..ImagePipelineConfig::default()
            },
            comment_interval: Duration::from_secs(3),
            history_cap: DEFAULT_HISTORY_CAP,
            cleanup_every: 100,
        }
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}
