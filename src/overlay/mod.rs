// SPDX-License-Identifier: GPL-3.0-only

//! Barcode outline overlay
//!
//! Detections use normalized coordinates (0.0 to 1.0) relative to the
//! detector's buffer. The sensor delivers that buffer landscape, so its
//! `x` axis runs along the long side of the scene. This module maps those
//! rectangles into the pixel space of the surface the preview is drawn on
//! and builds a stroke-only outline path for a renderer.
//!
//! # Coordinate System
//!
//! The normalized `y` axis becomes the target's horizontal axis and the
//! normalized `x` axis its vertical one. In portrait orientations the
//! target's width and height are swapped before scaling.

use crate::constants::overlay::DEFAULT_STROKE_COLOR;
use crate::frame_processor::types::NormalizedRect;
use crate::orientation::InterfaceOrientation;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// RGBA stroke color
pub type StrokeColor = [u8; 4];

/// Size of the surface outlines are drawn on, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TargetFrame {
    pub width: f32,
    pub height: f32,
}

impl TargetFrame {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width and height to scale with for the given orientation
    fn effective_size(&self, orientation: InterfaceOrientation) -> (f32, f32) {
        if orientation.is_portrait() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }
}

/// A rectangle in target-frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ProjectedRect {
    /// Corners clockwise from the origin corner
    pub fn corners(&self) -> [(f32, f32); 4] {
        let right = self.x + self.width;
        let bottom = self.y + self.height;
        [
            (self.x, self.y),
            (right, self.y),
            (right, bottom),
            (self.x, bottom),
        ]
    }
}

/// One drawing instruction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathCommand {
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
    Close,
}

/// Outline path made of closed subpaths
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlayPath {
    pub commands: Vec<PathCommand>,
}

impl OverlayPath {
    /// Append a closed four-corner subpath
    pub fn add_rect(&mut self, rect: &ProjectedRect) {
        let [first, rest @ ..] = rect.corners();
        self.commands.push(PathCommand::MoveTo {
            x: first.0,
            y: first.1,
        });
        for (x, y) in rest {
            self.commands.push(PathCommand::LineTo { x, y });
        }
        self.commands.push(PathCommand::Close);
    }

    /// Number of subpaths
    pub fn subpath_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo { .. }))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Outline layer for one batch of detections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub frame: TargetFrame,
    pub path: OverlayPath,
    pub stroke_color: StrokeColor,
    /// Always `None`; outlines are never filled
    pub fill: Option<StrokeColor>,
}

/// Map normalized rectangles into target-frame pixels
pub fn project(
    rects: &[NormalizedRect],
    target: TargetFrame,
    orientation: InterfaceOrientation,
) -> Vec<ProjectedRect> {
    let (eff_width, eff_height) = target.effective_size(orientation);

    rects
        .iter()
        .map(|rect| ProjectedRect {
            x: rect.y * eff_height,
            y: rect.x * eff_width,
            width: rect.width * eff_width,
            height: rect.height * eff_height,
        })
        .collect()
}

/// Build the outline layer for a set of detections
pub fn build_overlay(
    rects: &[NormalizedRect],
    target: TargetFrame,
    orientation: InterfaceOrientation,
    stroke_color: StrokeColor,
) -> Overlay {
    let mut path = OverlayPath::default();
    for rect in project(rects, target, orientation) {
        path.add_rect(&rect);
    }

    trace!(
        rects = rects.len(),
        width = target.width,
        height = target.height,
        ?orientation,
        "Built barcode overlay"
    );

    Overlay {
        frame: target,
        path,
        stroke_color,
        fill: None,
    }
}

/// [`build_overlay`] with the default green stroke
pub fn build_default_overlay(
    rects: &[NormalizedRect],
    target: TargetFrame,
    orientation: InterfaceOrientation,
) -> Overlay {
    build_overlay(rects, target, orientation, DEFAULT_STROKE_COLOR)
}
