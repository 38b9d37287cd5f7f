// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ExportError, Result};

/// Default export settings file name
pub const EXPORT_SETTINGS_FILE: &str = "export.ron";

/// Settings for one export run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Base URL of the encoding service
    pub service_url: String,
    /// Output frame rate
    pub fps: u32,
    /// Export width in pixels
    pub width: u32,
    /// Export height in pixels
    pub height: u32,
    /// Where the finished video is saved
    pub output_path: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:67".to_string(),
            fps: 30,
            width: 1280,
            height: 720,
            output_path: PathBuf::from("output.mp4"),
        }
    }
}

impl ExportSettings {
    /// Seconds between exported frames
    pub fn frame_step(&self) -> f64 {
        1.0 / f64::from(self.fps)
    }

    /// Check the settings can drive an export
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(ExportError::Settings("fps must be non-zero".to_string()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ExportError::Settings(
                "export width/height must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: ExportSettings =
            ron::from_str(&content).map_err(|e| ExportError::Settings(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a RON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        let content = ron::ser::to_string_pretty(self, config)
            .map_err(|e| ExportError::Settings(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
