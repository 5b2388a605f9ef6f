// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! This module implements QR code detection using the rqrr crate.
//! It converts frames to grayscale and searches for QR codes,
//! returning their positions and decoded content.

use crate::constants::detector::DEFAULT_MAX_DIMENSION;
use crate::frame_processor::serializer::{Completion, RecognitionEngine};
use crate::frame_processor::types::{BarcodeDetection, NormalizedRect, RecognitionJob};
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbaImage};
use tracing::{debug, trace};

/// QR code detector
///
/// Analyzes frames to detect and decode QR codes.
/// Optimized for real-time processing with frame downscaling.
#[derive(Debug, Clone, Copy)]
pub struct QrDetector {
    /// Maximum dimension for processing (frames are downscaled to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    /// Create a new QR detector with default settings
    pub fn new() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }

    /// Create a QR detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }
}

impl RecognitionEngine for QrDetector {
    type Output = Vec<BarcodeDetection>;

    // Bounds must stay in the buffer's own frame, so orientation is ignored
    fn start(&mut self, job: RecognitionJob, completion: Completion<Self::Output>) {
        let max_dim = self.max_dimension;
        tokio::task::spawn_blocking(move || {
            let detections = detect_sync(&job.image, max_dim);
            completion.succeed(detections);
        });
    }
}

/// Synchronous QR detection (runs in blocking task)
pub fn detect_sync(image: &RgbaImage, max_dimension: u32) -> Vec<BarcodeDetection> {
    let start = std::time::Instant::now();

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let (gray, scale) = prepare_gray(image, max_dimension);
    let (proc_width, proc_height) = gray.dimensions();

    trace!(
        proc_width,
        proc_height,
        scale,
        conversion_ms = start.elapsed().as_millis(),
        "Prepared grayscale image for processing"
    );

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        proc_width as usize,
        proc_height as usize,
        |x, y| gray.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();

    trace!(count = grids.len(), "QR grid detection complete");

    let mut detections = Vec::with_capacity(grids.len());

    for grid in &grids {
        let content = match grid.decode() {
            Ok((_, content)) => content,
            Err(e) => {
                debug!(error = ?e, "Failed to decode QR code");
                continue;
            }
        };

        // rqrr reports the outer corners of the symbol, possibly skewed
        let corners = &grid.bounds;
        let min_x = corners.iter().map(|p| p.x).min().unwrap_or(0).max(0) as f32;
        let max_x = (corners.iter().map(|p| p.x).max().unwrap_or(0) as f32).min(proc_width as f32);
        let min_y = corners.iter().map(|p| p.y).min().unwrap_or(0).max(0) as f32;
        let max_y = (corners.iter().map(|p| p.y).max().unwrap_or(0) as f32).min(proc_height as f32);
        if max_x <= min_x || max_y <= min_y {
            continue;
        }

        // Scale back to original frame coordinates
        let bounds = NormalizedRect::from_pixels(
            (min_x * scale) as u32,
            (min_y * scale) as u32,
            ((max_x - min_x) * scale) as u32,
            ((max_y - min_y) * scale) as u32,
            width,
            height,
        );

        debug!(
            content = %content,
            x = bounds.x,
            y = bounds.y,
            width = bounds.width,
            height = bounds.height,
            "Detected QR code"
        );

        detections.push(BarcodeDetection::new(bounds, content));
    }

    if !detections.is_empty() {
        debug!(
            count = detections.len(),
            total_ms = start.elapsed().as_millis(),
            "QR detection found codes"
        );
    }

    detections
}

/// Convert to grayscale, downscaling so neither side exceeds `max_dimension`
///
/// Returns the image and the factor mapping processed pixels back to source.
fn prepare_gray(image: &RgbaImage, max_dimension: u32) -> (GrayImage, f32) {
    let (width, height) = image.dimensions();
    let gray = imageops::grayscale(image);

    if width <= max_dimension && height <= max_dimension {
        return (gray, 1.0);
    }

    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let new_width = ((width as f32 / scale) as u32).max(1);
    let new_height = ((height as f32 / scale) as u32).max(1);

    (
        imageops::resize(&gray, new_width, new_height, FilterType::Triangle),
        scale,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_prepare_gray_keeps_small_frames() {
        let img = RgbaImage::from_pixel(320, 240, Rgba([255, 255, 255, 255]));
        let (gray, scale) = prepare_gray(&img, 640);
        assert_eq!(gray.dimensions(), (320, 240));
        assert_eq!(scale, 1.0);
        assert_eq!(gray.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn test_prepare_gray_downscales_long_side() {
        let img = RgbaImage::new(1280, 720);
        let (gray, scale) = prepare_gray(&img, 640);
        assert_eq!(gray.dimensions(), (640, 360));
        assert!((scale - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_blank_frame_has_no_detections() {
        let img = RgbaImage::from_pixel(64, 48, Rgba([255, 255, 255, 255]));
        assert!(detect_sync(&img, DEFAULT_MAX_DIMENSION).is_empty());
    }

    #[test]
    fn test_empty_frame_has_no_detections() {
        assert!(detect_sync(&RgbaImage::new(0, 0), DEFAULT_MAX_DIMENSION).is_empty());
    }

    #[tokio::test]
    async fn test_engine_completes_blank_frame_with_no_codes() {
        use crate::frame_processor::serializer::{RequestSerializer, SerializerConfig};

        let serializer =
            RequestSerializer::spawn(QrDetector::with_max_dimension(32), SerializerConfig::default());
        let img = std::sync::Arc::new(RgbaImage::from_pixel(100, 50, Rgba([0, 0, 0, 255])));
        assert_eq!(serializer.recognize(img, None).await, Ok(Vec::new()));
    }
}
