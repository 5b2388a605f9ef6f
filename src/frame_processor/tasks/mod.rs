// SPDX-License-Identifier: GPL-3.0-only

//! Recognition engines
//!
//! Implementations of [`RecognitionEngine`](super::serializer::RecognitionEngine)
//! shipped with the crate.

pub mod blocking;
pub mod qr_detector;

pub use blocking::BlockingEngine;
pub use qr_detector::QrDetector;
