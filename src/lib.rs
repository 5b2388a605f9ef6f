// SPDX-License-Identifier: GPL-3.0-only

//! Live Scanner - barcode and text scanning over a live camera feed
//!
//! This library provides the core of a live scanner: frames from a capture
//! layer are recognized one at a time, results are reported back in order,
//! and barcode outlines are projected onto the preview surface.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`frame_processor`]: Single-flight request serializer and engines
//! - [`overlay`]: Projection of detections into preview coordinates
//! - [`scanner`]: Live scanning session and delegate notification
//! - [`backends`]: Camera frames, torch access and file-backed frames
//! - [`orientation`]: Interface, image and video orientation mapping
//! - [`config`]: Scanner options and persisted configuration
//!
//! # Example
//!
//! ```ignore
//! let serializer = RequestSerializer::spawn(QrDetector::new(), SerializerConfig::default());
//! let codes = serializer.recognize(image, None).await?;
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod frame_processor;
pub mod orientation;
pub mod overlay;
pub mod scanner;

// Re-export commonly used types
pub use backends::camera::{CameraFrame, PixelFormat, TorchControl, TorchStatus};
pub use config::{ScannerConfig, ScannerMode, ScannerOptions};
pub use constants::RecognitionLevel;
pub use errors::{CameraError, RecognitionError, ScannerError, ScannerResult};
pub use frame_processor::{
    BarcodeDetection, Completion, NormalizedRect, QrDetector, RecognitionEngine,
    RequestSerializer, SerializerConfig,
};
pub use orientation::{ImageOrientation, InterfaceOrientation};
pub use overlay::{Overlay, ProjectedRect, TargetFrame};
pub use scanner::{LiveScanner, ScannerDelegate, ScannerEngine};
