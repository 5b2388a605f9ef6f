// SPDX-License-Identifier: GPL-3.0-only

//! File-backed frame source
//!
//! Feeds still images through the scanner as if they came from a camera.

pub mod file_source;

pub use file_source::{FileFrameSource, load_image_as_frame};
