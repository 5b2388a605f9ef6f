// SPDX-License-Identifier: GPL-3.0-only

//! Frame source backed by image files

use crate::backends::camera::types::CameraFrame;
use crate::constants::file_formats;
use crate::errors::CameraError;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Load an image file as an RGBA camera frame
pub fn load_image_as_frame(path: &Path) -> Result<CameraFrame, CameraError> {
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        CameraError::BackendError(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    debug!(width = rgba.width(), height = rgba.height(), "Image loaded successfully");

    Ok(CameraFrame::from_rgba_image(rgba))
}

/// Sequence of frames read from image files, in order
///
/// Directories are expanded to the images they contain, sorted by name.
/// Files with unsupported extensions are skipped.
#[derive(Debug, Clone)]
pub struct FileFrameSource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl FileFrameSource {
    /// Build a source from files and directories
    pub fn from_paths<I, P>(inputs: I) -> Result<Self, CameraError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut paths = Vec::new();

        for input in inputs {
            let input = input.as_ref();
            if input.is_dir() {
                let entries = std::fs::read_dir(input).map_err(|e| {
                    CameraError::BackendError(format!(
                        "Failed to read directory '{}': {}",
                        input.display(),
                        e
                    ))
                })?;
                let mut found: Vec<PathBuf> = entries
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.is_file() && has_image_extension(p))
                    .collect();
                found.sort();
                paths.extend(found);
            } else if has_image_extension(input) {
                paths.push(input.to_path_buf());
            } else {
                warn!(path = %input.display(), "Skipping unsupported file");
            }
        }

        if paths.is_empty() {
            return Err(CameraError::NoCameraFound);
        }

        Ok(Self { paths, next: 0 })
    }

    /// Number of frames this source yields
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Iterator for FileFrameSource {
    type Item = (PathBuf, Result<CameraFrame, CameraError>);

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.get(self.next)?.clone();
        self.next += 1;
        let frame = load_image_as_frame(&path);
        Some((path, frame))
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(file_formats::is_image_extension)
        .unwrap_or(false)
}
