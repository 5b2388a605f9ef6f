// SPDX-License-Identifier: GPL-3.0-only

//! Frame sources and device access
//!
//! - [`camera`]: frame types and torch access provided by the capture layer
//! - [`virtual_camera`]: frames loaded from image files

pub mod camera;
pub mod virtual_camera;
