// SPDX-License-Identifier: GPL-3.0-only

//! Device and image orientation
//!
//! Camera sensors deliver landscape buffers regardless of how the device is
//! held. The interface orientation decides how a buffer must be interpreted
//! before text recognition and whether overlay axes are swapped. It is
//! always passed explicitly; nothing here queries global device state.

use image::{RgbaImage, imageops};
use serde::{Deserialize, Serialize};

/// Orientation of the user interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterfaceOrientation {
    /// Not known (e.g. device lying flat)
    #[default]
    Unknown,
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl InterfaceOrientation {
    /// Whether the display is taller than wide
    pub fn is_portrait(&self) -> bool {
        matches!(
            self,
            InterfaceOrientation::Portrait | InterfaceOrientation::PortraitUpsideDown
        )
    }

    /// Orientation a captured buffer has relative to the upright scene
    ///
    /// Returns `None` when the interface orientation is unknown, in which
    /// case recognizers run without orientation metadata.
    pub fn image_orientation(&self) -> Option<ImageOrientation> {
        match self {
            InterfaceOrientation::Portrait => Some(ImageOrientation::Right),
            InterfaceOrientation::LandscapeLeft => Some(ImageOrientation::Down),
            InterfaceOrientation::LandscapeRight => Some(ImageOrientation::Up),
            InterfaceOrientation::PortraitUpsideDown => Some(ImageOrientation::Left),
            InterfaceOrientation::Unknown => None,
        }
    }

    /// Orientation to configure on the preview connection
    pub fn video_orientation(&self) -> VideoOrientation {
        match self {
            InterfaceOrientation::Portrait => VideoOrientation::Portrait,
            InterfaceOrientation::PortraitUpsideDown => VideoOrientation::PortraitUpsideDown,
            InterfaceOrientation::LandscapeLeft => VideoOrientation::LandscapeLeft,
            InterfaceOrientation::LandscapeRight => VideoOrientation::LandscapeRight,
            InterfaceOrientation::Unknown => VideoOrientation::Portrait,
        }
    }

    /// EXIF orientation tag used to rotate preview images
    pub fn exif_orientation(&self) -> Option<u8> {
        match self {
            InterfaceOrientation::Portrait => Some(6),
            InterfaceOrientation::PortraitUpsideDown => Some(8),
            InterfaceOrientation::LandscapeLeft => Some(3),
            InterfaceOrientation::LandscapeRight => Some(1),
            InterfaceOrientation::Unknown => None,
        }
    }
}

impl std::str::FromStr for InterfaceOrientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "portrait" => Ok(Self::Portrait),
            "portraitupsidedown" => Ok(Self::PortraitUpsideDown),
            "landscapeleft" => Ok(Self::LandscapeLeft),
            "landscaperight" => Ok(Self::LandscapeRight),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown orientation '{}'", other)),
        }
    }
}

/// Where the top row of a buffer ends up in the upright scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageOrientation {
    Up,
    Down,
    Left,
    Right,
}

impl ImageOrientation {
    /// Rotate an image so that it is upright
    pub fn apply(&self, image: &RgbaImage) -> RgbaImage {
        match self {
            ImageOrientation::Up => image.clone(),
            ImageOrientation::Down => imageops::rotate180(image),
            ImageOrientation::Left => imageops::rotate270(image),
            ImageOrientation::Right => imageops::rotate90(image),
        }
    }
}

/// Orientation of the capture connection feeding the preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoOrientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}
