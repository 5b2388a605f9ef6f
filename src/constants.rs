// SPDX-License-Identifier: GPL-3.0-only

//! Scanner-wide constants

use serde::{Deserialize, Serialize};

/// Text recognition accuracy presets
///
/// Engines that support it trade accuracy for latency. Live scanning
/// defaults to `Fast` since frames keep arriving while one is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecognitionLevel {
    /// Lower latency, lower accuracy (default for live feeds)
    #[default]
    Fast,
    /// Higher accuracy, slower
    Accurate,
}

impl RecognitionLevel {
    /// Get all level variants for UI iteration
    pub const ALL: [RecognitionLevel; 2] = [RecognitionLevel::Fast, RecognitionLevel::Accurate];

    /// Get display name for the level
    pub fn display_name(&self) -> &'static str {
        match self {
            RecognitionLevel::Fast => "Fast",
            RecognitionLevel::Accurate => "Accurate",
        }
    }
}

impl std::str::FromStr for RecognitionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(RecognitionLevel::Fast),
            "accurate" => Ok(RecognitionLevel::Accurate),
            other => Err(format!("unknown recognition level '{}'", other)),
        }
    }
}

/// QR detector tuning
pub mod detector {
    /// Frames larger than this (either side) are downscaled before detection
    pub const DEFAULT_MAX_DIMENSION: u32 = 640;
}

/// Overlay drawing defaults
pub mod overlay {
    /// Default stroke color for barcode outlines (opaque green, RGBA)
    pub const DEFAULT_STROKE_COLOR: [u8; 4] = [0, 255, 0, 255];
}

/// Scanner option presets
pub mod options {
    /// Toolbar height when the scanner owns the whole screen
    pub const FULL_SCREEN_TOOLBAR_HEIGHT: f32 = 60.0;

    /// Close button label when the scanner owns the whole screen
    pub const FULL_SCREEN_CLOSE_TEXT: &str = "Close";
}

/// File format constants
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Config storage location
pub mod storage {
    /// Directory name under the platform config dir
    pub const CONFIG_DIR_NAME: &str = "live-scanner";

    /// Config file name
    pub const CONFIG_FILE_NAME: &str = "config.json";
}
