// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the live scanner

use std::fmt;

/// Result type alias using ScannerError
pub type ScannerResult<T> = Result<T, ScannerError>;

/// Main scanner error type
#[derive(Debug, Clone, PartialEq)]
pub enum ScannerError {
    /// Camera-related errors
    Camera(CameraError),
    /// Recognition-related errors
    Recognition(RecognitionError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// The user closed the capture view
    UserClosed,
    /// Generic error with message
    Other(String),
}

/// Camera-specific errors
#[derive(Debug, Clone, PartialEq)]
pub enum CameraError {
    /// No camera devices found
    NoCameraFound,
    /// Frame uses a pixel format we cannot convert
    InvalidFormat(String),
    /// Frame buffer is empty or too short for its declared geometry
    InvalidFrame(String),
    /// Device has no torch
    TorchUnavailable,
    /// Backend error reported by the capture layer
    BackendError(String),
}

/// Errors delivered to recognition callbacks
///
/// Every submitted request ends with either its strings or one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionError {
    /// The frame could not be turned into an image, never queued
    InvalidImage(String),
    /// The engine refused to start on this image
    EngineRejected(String),
    /// The engine ran but reported a failure
    EngineFailed(String),
    /// The engine dropped its completion handle without reporting
    Abandoned,
    /// The pending queue reached its configured bound
    QueueFull,
    /// The serializer task is no longer running
    ServiceStopped,
}

impl fmt::Display for ScannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScannerError::Camera(e) => write!(f, "Camera error: {}", e),
            ScannerError::Recognition(e) => write!(f, "Recognition error: {}", e),
            ScannerError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ScannerError::Storage(msg) => write!(f, "Storage error: {}", msg),
            ScannerError::UserClosed => write!(f, "User closed the capture view"),
            ScannerError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::NoCameraFound => write!(f, "No camera devices found"),
            CameraError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            CameraError::InvalidFrame(msg) => write!(f, "Invalid frame: {}", msg),
            CameraError::TorchUnavailable => write!(f, "Torch is not available"),
            CameraError::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionError::InvalidImage(msg) => write!(f, "Invalid image: {}", msg),
            RecognitionError::EngineRejected(msg) => write!(f, "Engine rejected request: {}", msg),
            RecognitionError::EngineFailed(msg) => write!(f, "Engine failed: {}", msg),
            RecognitionError::Abandoned => write!(f, "Engine dropped the request"),
            RecognitionError::QueueFull => write!(f, "Recognition queue is full"),
            RecognitionError::ServiceStopped => write!(f, "Recognition service stopped"),
        }
    }
}

impl std::error::Error for ScannerError {}
impl std::error::Error for CameraError {}
impl std::error::Error for RecognitionError {}

impl From<CameraError> for ScannerError {
    fn from(err: CameraError) -> Self {
        ScannerError::Camera(err)
    }
}

impl From<RecognitionError> for ScannerError {
    fn from(err: RecognitionError) -> Self {
        ScannerError::Recognition(err)
    }
}

// A frame that fails conversion is an invalid recognition input
impl From<CameraError> for RecognitionError {
    fn from(err: CameraError) -> Self {
        RecognitionError::InvalidImage(err.to_string())
    }
}

impl From<String> for ScannerError {
    fn from(msg: String) -> Self {
        ScannerError::Other(msg)
    }
}

impl From<&str> for ScannerError {
    fn from(msg: &str) -> Self {
        ScannerError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for ScannerError {
    fn from(err: std::io::Error) -> Self {
        ScannerError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ScannerError {
    fn from(err: serde_json::Error) -> Self {
        ScannerError::Config(err.to_string())
    }
}
