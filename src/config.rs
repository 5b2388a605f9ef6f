// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{RecognitionLevel, detector, options, overlay, storage};
use crate::errors::{ScannerError, ScannerResult};
use crate::frame_processor::serializer::SerializerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// RGBA color, 0-255 per channel
pub type Rgba = [u8; 4];

pub const BLACK: Rgba = [0, 0, 0, 255];
pub const WHITE: Rgba = [255, 255, 255, 255];

/// What the scanner looks for in each frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScannerMode {
    /// Decode barcodes / QR codes
    #[default]
    Barcode,
    /// Recognize text
    Ocr,
}

impl ScannerMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            ScannerMode::Barcode => "Barcode",
            ScannerMode::Ocr => "Text",
        }
    }
}

/// Presentation options of the scanner view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerOptions {
    /// Label of the close button (empty hides the text)
    pub close_button_text: String,
    pub close_button_text_color: Rgba,
    pub background_color: Rgba,
    /// Height reserved for the toolbar, 0 when there is none
    pub toolbar_height: f32,
    /// Scanner owns the whole screen instead of being embedded
    pub full_screen: bool,
    /// Outline detected barcodes on the preview
    pub draw_rectangles: bool,
}

impl ScannerOptions {
    /// Preset for a full-screen or an embedded scanner
    pub fn full_screen(full_screen: bool) -> Self {
        if full_screen {
            Self {
                close_button_text: options::FULL_SCREEN_CLOSE_TEXT.to_string(),
                close_button_text_color: BLACK,
                background_color: WHITE,
                toolbar_height: options::FULL_SCREEN_TOOLBAR_HEIGHT,
                full_screen: true,
                draw_rectangles: false,
            }
        } else {
            Self {
                close_button_text: String::new(),
                close_button_text_color: WHITE,
                background_color: WHITE,
                toolbar_height: 0.0,
                full_screen: false,
                draw_rectangles: true,
            }
        }
    }
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self::full_screen(false)
    }
}

/// Persisted scanner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub mode: ScannerMode,
    pub options: ScannerOptions,
    /// Accuracy requested from the text recognizer
    pub recognition_level: RecognitionLevel,
    /// Bound on queued frames; unbounded when absent
    pub max_pending: Option<usize>,
    /// Frames are downscaled to this size before QR detection
    pub detector_max_dimension: u32,
    /// Color of barcode outlines
    pub stroke_color: Rgba,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            mode: ScannerMode::default(),
            options: ScannerOptions::default(),
            recognition_level: RecognitionLevel::default(),
            max_pending: None,
            detector_max_dimension: detector::DEFAULT_MAX_DIMENSION,
            stroke_color: overlay::DEFAULT_STROKE_COLOR,
        }
    }
}

impl ScannerConfig {
    /// Serializer settings derived from this config
    pub fn serializer_config(&self) -> SerializerConfig {
        SerializerConfig {
            level: self.recognition_level,
            max_pending: self.max_pending,
        }
    }
}

/// Default config file location
pub fn default_config_path() -> ScannerResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| {
            dir.join(storage::CONFIG_DIR_NAME)
                .join(storage::CONFIG_FILE_NAME)
        })
        .ok_or_else(|| ScannerError::Config("No config directory on this platform".into()))
}

/// Load configuration from file
pub fn load_config(path: &Path) -> ScannerResult<ScannerConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ScannerConfig = serde_json::from_str(&content)?;
    debug!(path = %path.display(), "Loaded scanner config");
    Ok(config)
}

/// Load configuration, falling back to defaults when the file is missing
pub fn load_or_default(path: &Path) -> ScannerResult<ScannerConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(ScannerConfig::default());
    }
    load_config(path)
}

/// Save configuration to file, creating parent directories
pub fn save_config(config: &ScannerConfig, path: &Path) -> ScannerResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    info!(path = %path.display(), "Saved scanner config");
    Ok(())
}
