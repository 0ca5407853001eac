//! Top-level configuration file.

use crate::display::DisplayConfig;
use crate::error::{FrameStageError, Result};
use crate::settings::VideoSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of video buffer slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BufferCount {
    /// Decode into one slot while the other is shown
    #[default]
    Double,
    /// Direct rendering: the decoder may hold a reference frame
    Triple,
}

impl BufferCount {
    pub fn get(self) -> usize {
        match self {
            Self::Double => 2,
            Self::Triple => 3,
        }
    }

    /// Parse a slot count.
    pub fn from_count(count: usize) -> Result<Self> {
        match count {
            2 => Ok(Self::Double),
            3 => Ok(Self::Triple),
            n => Err(FrameStageError::Config(format!(
                "buffer count must be 2 or 3, got {}",
                n
            ))),
        }
    }
}

/// Renderer behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    pub buffer_count: BufferCount,
    /// Video is shown fullscreen (uses the selected video resolution)
    pub fullscreen: bool,
}

/// Everything the output stage reads from disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameStageConfig {
    pub display: DisplayConfig,
    pub video: VideoSettings,
    pub renderer: RendererSettings,
}

impl FrameStageConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
