// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera frames

use crate::errors::CameraError;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Pixel layout of a captured buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// BGRA - 32-bit with alpha, blue first (common camera output)
    BGRA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
}

impl PixelFormat {
    /// Bytes used by one pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::RGBA | PixelFormat::BGRA => 4,
            PixelFormat::RGB24 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// A single frame delivered by a frame source
///
/// The pixel data is reference counted so frames can be handed to worker
/// tasks without copying.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Raw pixel rows, `stride` bytes apart
    pub data: Arc<[u8]>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride (bytes per row, may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap a tightly packed RGBA image as a frame
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let width = image.width();
        let height = image.height();
        let data: Vec<u8> = image.into_raw();

        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            format: PixelFormat::RGBA,
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// Check that the buffer can hold the declared geometry
    pub fn validate(&self) -> Result<(), CameraError> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::InvalidFrame(format!(
                "empty dimensions {}x{}",
                self.width, self.height
            )));
        }

        let row_bytes = self.width as usize * self.format.bytes_per_pixel();
        let stride = self.stride as usize;
        if stride < row_bytes {
            return Err(CameraError::InvalidFrame(format!(
                "stride {} shorter than row of {} bytes",
                stride, row_bytes
            )));
        }

        let needed = stride * (self.height as usize - 1) + row_bytes;
        if self.data.len() < needed {
            return Err(CameraError::InvalidFrame(format!(
                "buffer holds {} bytes, {} needed",
                self.data.len(),
                needed
            )));
        }

        Ok(())
    }

    /// Decode the frame into a packed RGBA image, dropping stride padding
    pub fn to_rgba_image(&self) -> Result<RgbaImage, CameraError> {
        self.validate()?;

        let width = self.width as usize;
        let bpp = self.format.bytes_per_pixel();
        let stride = self.stride as usize;

        let mut rgba = Vec::with_capacity(width * self.height as usize * 4);
        for y in 0..self.height as usize {
            let row = &self.data[y * stride..y * stride + width * bpp];
            for px in row.chunks_exact(bpp) {
                let pixel = match self.format {
                    PixelFormat::RGBA => [px[0], px[1], px[2], px[3]],
                    PixelFormat::BGRA => [px[2], px[1], px[0], px[3]],
                    PixelFormat::RGB24 => [px[0], px[1], px[2], 255],
                    PixelFormat::Gray8 => [px[0], px[0], px[0], 255],
                };
                rgba.extend_from_slice(&pixel);
            }
        }

        RgbaImage::from_raw(self.width, self.height, rgba).ok_or_else(|| {
            CameraError::InvalidFrame("decoded data does not match dimensions".to_string())
        })
    }

    /// Read one pixel as RGBA, `None` when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let offset = y as usize * self.stride as usize + x as usize * bpp;
        let px = self.data.get(offset..offset + bpp)?;
        Some(Rgba(match self.format {
            PixelFormat::RGBA => [px[0], px[1], px[2], px[3]],
            PixelFormat::BGRA => [px[2], px[1], px[0], px[3]],
            PixelFormat::RGB24 => [px[0], px[1], px[2], 255],
            PixelFormat::Gray8 => [px[0], px[0], px[0], 255],
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(data: Vec<u8>, width: u32, height: u32, stride: u32, format: PixelFormat) -> CameraFrame {
        CameraFrame {
            width,
            height,
            data: Arc::from(data.as_slice()),
            format,
            stride,
            captured_at: Instant::now(),
        }
    }

    #[test]
    fn test_to_rgba_drops_stride_padding() {
        let data: Vec<u8> = vec![
            255, 0, 0, 255, // Red pixel
            0, 255, 0, 255, // Green pixel
            0, 0, // stride padding
            0, 0, 255, 255, // Blue pixel
            255, 255, 255, 255, // White pixel
            0, 0, // stride padding
        ];

        let img = frame(data, 2, 2, 10, PixelFormat::RGBA)
            .to_rgba_image()
            .unwrap();
        assert_eq!(img.as_raw().len(), 16);
        assert_eq!(img.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(img.get_pixel(1, 0), &Rgba([0, 255, 0, 255]));
        assert_eq!(img.get_pixel(0, 1), &Rgba([0, 0, 255, 255]));
        assert_eq!(img.get_pixel(1, 1), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_bgra_swaps_channels() {
        let img = frame(vec![10, 20, 30, 40], 1, 1, 4, PixelFormat::BGRA)
            .to_rgba_image()
            .unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgba([30, 20, 10, 40]));
    }

    #[test]
    fn test_gray_expands_to_opaque_rgba() {
        let f = frame(vec![7, 9], 2, 1, 2, PixelFormat::Gray8);
        let img = f.to_rgba_image().unwrap();
        assert_eq!(img.get_pixel(1, 0), &Rgba([9, 9, 9, 255]));
        assert_eq!(f.pixel(0, 0), Some(Rgba([7, 7, 7, 255])));
        assert_eq!(f.pixel(2, 0), None);
    }

    #[test]
    fn test_empty_buffer_is_rejected() {
        let err = frame(Vec::new(), 4, 4, 16, PixelFormat::RGBA)
            .to_rgba_image()
            .unwrap_err();
        assert!(matches!(err, CameraError::InvalidFrame(_)));
    }

    #[test]
    fn test_zero_dimensions_are_rejected() {
        assert!(frame(Vec::new(), 0, 0, 0, PixelFormat::RGBA).validate().is_err());
    }

    #[test]
    fn test_short_stride_is_rejected() {
        let f = frame(vec![0; 64], 4, 4, 8, PixelFormat::RGBA);
        assert!(f.validate().is_err());
    }

    #[test]
    fn test_from_rgba_image_round_trips() {
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(2, 1, Rgba([1, 2, 3, 4]));
        let f = CameraFrame::from_rgba_image(img.clone());
        assert_eq!(f.stride, 12);
        assert_eq!(f.to_rgba_image().unwrap(), img);
    }
}
