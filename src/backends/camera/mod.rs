// SPDX-License-Identifier: GPL-3.0-only

//! Camera-facing abstractions
//!
//! The capture session itself lives outside this crate. What the scanner
//! needs from it is expressed here: frames ([`CameraFrame`]) and access to
//! the torch ([`TorchControl`]).

pub mod types;

pub use types::*;

use crate::errors::CameraError;
use serde::{Deserialize, Serialize};

/// State of the device torch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TorchStatus {
    On,
    Off,
    Unavailable,
}

/// Torch access provided by the capture layer
pub trait TorchControl: Send + Sync {
    /// Whether the active capture device has a torch
    fn has_torch(&self) -> bool;

    /// Switch the torch on or off
    fn set_torch(&self, on: bool) -> Result<(), CameraError>;
}

/// Torch control for devices without a torch
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTorch;

impl TorchControl for NoTorch {
    fn has_torch(&self) -> bool {
        false
    }

    fn set_torch(&self, _on: bool) -> Result<(), CameraError> {
        Err(CameraError::TorchUnavailable)
    }
}
