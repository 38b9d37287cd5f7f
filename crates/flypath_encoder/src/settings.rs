// SPDX-License-Identifier: MIT OR Apache-2.0
//! Service settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, ServiceError};

/// Default settings file name
pub const ENCODER_SETTINGS_FILE: &str = "encoder.ron";

/// Encoding service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Address to bind
    pub bind_address: String,
    /// Port to listen on
    pub port: u16,
    /// Directory holding one subdirectory per session
    pub output_dir: PathBuf,
    /// ffmpeg executable
    pub ffmpeg: String,
    /// Frame rate passed to ffmpeg
    pub framerate: u32,
    /// Seconds without frame activity before a session and its
    /// directory are removed. A finished video is kept this long after
    /// encoding; sessions waiting in finish are never reclaimed.
    pub cleanup_after_secs: u64,
    /// Seconds finish waits for outstanding frames
    pub finish_timeout_secs: u64,
    /// Largest accepted frame body in bytes
    pub max_frame_bytes: usize,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 67,
            output_dir: PathBuf::from("output"),
            ffmpeg: "ffmpeg".to_string(),
            framerate: 30,
            cleanup_after_secs: 60,
            finish_timeout_secs: 120,
            max_frame_bytes: 64 * 1024 * 1024,
        }
    }
}

impl EncoderSettings {
    /// Idle period before a session is reclaimed
    pub fn cleanup_after(&self) -> Duration {
        Duration::from_secs(self.cleanup_after_secs)
    }

    /// Longest finish waits for frames
    pub fn finish_timeout(&self) -> Duration {
        Duration::from_secs(self.finish_timeout_secs)
    }

    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: EncoderSettings =
            ron::from_str(&content).map_err(|e| ServiceError::Settings(e.to_string()))?;
        if settings.framerate == 0 {
            return Err(ServiceError::Settings("framerate must be non-zero".to_string()));
        }
        Ok(settings)
    }

    /// Save settings to a RON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, config)
            .map_err(|e| ServiceError::Settings(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
