// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame recognition
//!
//! These types describe what goes into a recognition engine and what comes
//! back out of it.

use crate::constants::RecognitionLevel;
use crate::errors::RecognitionError;
use crate::orientation::ImageOrientation;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared handle to a decoded frame
pub type FrameImage = Arc<RgbaImage>;

/// Result delivered for one recognition request
///
/// `Ok` carries the recognized values (possibly empty), `Err` means the
/// request failed and produced nothing.
pub type RecognitionOutcome<T = Vec<String>> = Result<T, RecognitionError>;

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the detector's
/// buffer, which is landscape-referenced: `x` runs along the long axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    /// Left edge (0.0 = left of frame, 1.0 = right of frame)
    pub x: f32,
    /// Top edge (0.0 = top of frame, 1.0 = bottom of frame)
    pub y: f32,
    /// Width as fraction of frame width
    pub width: f32,
    /// Height as fraction of frame height
    pub height: f32,
}

impl NormalizedRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a normalized rect from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        Self {
            x: x as f32 / frame_width as f32,
            y: y as f32 / frame_height as f32,
            width: width as f32 / frame_width as f32,
            height: height as f32 / frame_height as f32,
        }
    }

    /// Whether every component lies in [0, 1] and the rect stays inside
    pub fn is_normalized(&self) -> bool {
        let unit = 0.0..=1.0;
        unit.contains(&self.x)
            && unit.contains(&self.y)
            && unit.contains(&self.width)
            && unit.contains(&self.height)
            && self.x + self.width <= 1.0 + f32::EPSILON
            && self.y + self.height <= 1.0 + f32::EPSILON
    }
}

/// A decoded barcode with its location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarcodeDetection {
    /// Bounding box in normalized frame coordinates
    pub bounds: NormalizedRect,
    /// Raw content decoded from the code
    pub content: String,
}

impl BarcodeDetection {
    pub fn new(bounds: NormalizedRect, content: String) -> Self {
        Self { bounds, content }
    }
}

/// Work handed to a recognition engine
#[derive(Debug, Clone)]
pub struct RecognitionJob {
    /// Frame to analyse
    pub image: FrameImage,
    /// How the frame is rotated relative to the upright scene, if known
    pub orientation: Option<ImageOrientation>,
    /// Requested accuracy
    pub level: RecognitionLevel,
}

impl RecognitionJob {
    /// Image rotated upright according to `orientation`
    pub fn upright_image(&self) -> FrameImage {
        match self.orientation {
            None | Some(ImageOrientation::Up) => Arc::clone(&self.image),
            Some(orientation) => Arc::new(orientation.apply(&self.image)),
        }
    }
}
