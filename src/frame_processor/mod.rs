// SPDX-License-Identifier: GPL-3.0-only

//! Frame processor module for serialized frame recognition
//!
//! Frames are submitted to a [`RequestSerializer`], which feeds them one at
//! a time to a [`RecognitionEngine`] and hands each result back to the
//! caller that submitted it, in submission order.

pub mod serializer;
pub mod tasks;
pub mod types;

pub use serializer::{
    Completion, RecognitionCallback, RecognitionEngine, RequestSerializer, SerializerConfig,
};
pub use tasks::{BlockingEngine, QrDetector};
pub use types::{
    BarcodeDetection, FrameImage, NormalizedRect, RecognitionJob, RecognitionOutcome,
};
