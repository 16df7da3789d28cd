use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{JointTable, NumericPolicy, PlaybackSpeed, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub playback: PlaybackConfig,
    pub joint_table: JointTable,
}

impl AppConfig {
    /// Decodes a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}

/// Options recognised by a playback session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Wrap to the first record after the last one instead of holding it.
    pub looping: bool,
    pub speed: PlaybackSpeed,
    /// Record to resume from after loading.
    pub start_frame_index: Option<usize>,
    pub numeric_policy: NumericPolicy,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            looping: true,
            speed: PlaybackSpeed::NORMAL,
            start_frame_index: None,
            numeric_policy: NumericPolicy::SkipLine,
        }
    }
}
