// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for scanner operations
//!
//! This module provides command-line functionality for:
//! - Scanning image files for barcodes
//! - Projecting rectangles onto a preview frame
//! - Showing and writing the configuration

use futures::future::join_all;
use live_scanner::backends::virtual_camera::FileFrameSource;
use live_scanner::config::{self, ScannerConfig, ScannerMode};
use live_scanner::overlay::{self, TargetFrame};
use live_scanner::{
    InterfaceOrientation, LiveScanner, NormalizedRect, RecognitionLevel, ScannerDelegate,
    ScannerEngine, ScannerError,
};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Logs delegate notifications; results are read from each frame's outcome
struct LogDelegate;

impl ScannerDelegate for LogDelegate {
    fn captured_strings(&self, strings: Vec<String>) {
        debug!(count = strings.len(), "Codes captured");
    }

    fn live_capture_ended(&self, error: Option<ScannerError>) {
        debug!(error = ?error, "Capture ended");
    }
}

/// Scan image files for barcodes and print one JSON line per image
pub fn scan_files(
    config_path: &Path,
    inputs: Vec<PathBuf>,
    orientation: InterfaceOrientation,
    level: Option<RecognitionLevel>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = config::load_or_default(config_path)?;
    if let Some(level) = level {
        config.recognition_level = level;
    }
    // Every file must produce a result
    config.max_pending = None;

    let source = FileFrameSource::from_paths(&inputs)?;
    eprintln!("Scanning {} image(s)...", source.len());

    let runtime = tokio::runtime::Runtime::new()?;
    let lines = runtime.block_on(scan_source(source, orientation, &config, ScannerEngine::Qr))?;

    let mut found = 0;
    let mut failed = 0;
    for line in &lines {
        match line["codes"].as_array() {
            Some(codes) => found += codes.len(),
            None => failed += 1,
        }
        println!("{}", line);
    }
    eprintln!("Found {} code(s), {} image(s) failed", found, failed);

    Ok(())
}

/// Run every frame through a barcode scanner, one JSON value per path
///
/// Each path gets either `codes` or an `error`, in input order.
async fn scan_source(
    source: FileFrameSource,
    orientation: InterfaceOrientation,
    config: &ScannerConfig,
    engine: ScannerEngine,
) -> Result<Vec<Value>, ScannerError> {
    let scanner = LiveScanner::new(
        ScannerMode::Barcode,
        config.options.clone(),
        Arc::new(LogDelegate),
        engine,
        config,
    )?;
    scanner.start_scanning();

    let mut pending = Vec::new();
    for (path, frame) in source {
        let path = path.display().to_string();
        let scan = match frame {
            Ok(frame) => Ok(scanner.scan_barcode_frame(&frame, orientation)),
            Err(e) => {
                warn!(path = %path, error = %e, "Skipping unreadable image");
                Err(ScannerError::from(e))
            }
        };
        pending.push((path, scan));
    }

    let (paths, scans): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
    let outcomes = join_all(scans.into_iter().map(|scan| async move {
        match scan {
            Ok(scan) => scan.await,
            Err(e) => Err(e),
        }
    }))
    .await;
    scanner.stop_scanning();

    Ok(paths
        .into_iter()
        .zip(outcomes)
        .map(|(path, outcome)| match outcome {
            Ok(detections) => {
                let codes: Vec<&str> = detections.iter().map(|d| d.content.as_str()).collect();
                json!({ "path": path, "codes": codes })
            }
            Err(e) => json!({ "path": path, "error": e.to_string() }),
        })
        .collect())
}

/// Project rectangles onto a frame and print the overlay as JSON
pub fn project_rects(
    config_path: &Path,
    frame: &str,
    rects: &[String],
    orientation: InterfaceOrientation,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_or_default(config_path)?;
    let target = parse_frame(frame)?;
    let rects = rects
        .iter()
        .map(|r| parse_rect(r))
        .collect::<Result<Vec<_>, _>>()?;

    for rect in rects.iter().filter(|r| !r.is_normalized()) {
        warn!(?rect, "Rectangle extends outside the unit square");
    }

    let report = projection_report(&rects, target, orientation, config.stroke_color);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Projected rects and overlay, with the orientation details a renderer needs
fn projection_report(
    rects: &[NormalizedRect],
    target: TargetFrame,
    orientation: InterfaceOrientation,
    stroke_color: overlay::StrokeColor,
) -> Value {
    json!({
        "orientation": orientation,
        "video_orientation": orientation.video_orientation(),
        "exif_orientation": orientation.exif_orientation(),
        "projected": overlay::project(rects, target, orientation),
        "overlay": overlay::build_overlay(rects, target, orientation, stroke_color),
    })
}

/// Print the effective configuration, optionally writing it out
pub fn show_config(config_path: &Path, write: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_or_default(config_path)?;
    if write {
        config::save_config(&config, config_path)?;
        eprintln!("Config written to {}", config_path.display());
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Parse a `WIDTHxHEIGHT` frame size
fn parse_frame(value: &str) -> Result<TargetFrame, String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("Frame size '{}' must look like 400x200", value))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f32>()
            .map_err(|e| format!("Invalid frame size '{}': {}", value, e))
    };
    let frame = TargetFrame::new(parse(width)?, parse(height)?);
    if frame.width <= 0.0 || frame.height <= 0.0 {
        return Err(format!("Frame size '{}' must be positive", value));
    }
    Ok(frame)
}

/// Parse an `x,y,w,h` normalized rectangle
fn parse_rect(value: &str) -> Result<NormalizedRect, String> {
    let parts = value
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("Invalid rectangle '{}': {}", value, e))?;

    match parts.as_slice() {
        [x, y, w, h] => Ok(NormalizedRect::new(*x, *y, *w, *h)),
        _ => Err(format!("Rectangle '{}' needs four values x,y,w,h", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use live_scanner::BarcodeDetection;
    use live_scanner::frame_processor::BlockingEngine;
    use live_scanner::frame_processor::types::RecognitionJob;
    use std::time::Duration;

    #[tokio::test]
    async fn test_failed_frame_gets_error_line_and_scan_finishes() {
        let dir = tempfile::tempdir().unwrap();
        for (name, width) in [("a.png", 10), ("b.png", 20), ("c.png", 30)] {
            image::RgbaImage::new(width, 4)
                .save(dir.path().join(name))
                .unwrap();
        }
        std::fs::write(dir.path().join("d.png"), b"garbage").unwrap();

        let engine = ScannerEngine::Barcode(Box::new(BlockingEngine::new(
            |job: &RecognitionJob| {
                if job.image.width() == 20 {
                    panic!("decoder crashed");
                }
                Ok(vec![BarcodeDetection::new(
                    NormalizedRect::new(0.0, 0.0, 1.0, 1.0),
                    format!("w{}", job.image.width()),
                )])
            },
        )));
        let source = FileFrameSource::from_paths([dir.path()]).unwrap();

        let lines = tokio::time::timeout(
            Duration::from_secs(5),
            scan_source(
                source,
                InterfaceOrientation::Unknown,
                &ScannerConfig::default(),
                engine,
            ),
        )
        .await
        .expect("scan did not finish")
        .unwrap();

        assert_eq!(lines.len(), 4);
        assert!(lines[0]["path"].as_str().unwrap().ends_with("a.png"));
        assert_eq!(lines[0]["codes"], json!(["w10"]));
        assert!(lines[1]["path"].as_str().unwrap().ends_with("b.png"));
        assert!(lines[1]["error"].as_str().unwrap().contains("dropped"));
        assert_eq!(lines[2]["codes"], json!(["w30"]));
        assert!(lines[3]["path"].as_str().unwrap().ends_with("d.png"));
        assert!(lines[3]["error"].is_string());
    }

    #[test]
    fn test_parse_frame() {
        assert_eq!(parse_frame("400x200"), Ok(TargetFrame::new(400.0, 200.0)));
        assert_eq!(parse_frame("640X480"), Ok(TargetFrame::new(640.0, 480.0)));
        assert!(parse_frame("400").is_err());
        assert!(parse_frame("0x200").is_err());
    }

    #[test]
    fn test_projection_report_carries_orientation_details() {
        let report = projection_report(
            &[NormalizedRect::new(0.0, 0.0, 0.5, 0.5)],
            TargetFrame::new(400.0, 200.0),
            InterfaceOrientation::Portrait,
            [0, 255, 0, 255],
        );

        assert_eq!(report["orientation"], "Portrait");
        assert_eq!(report["video_orientation"], "Portrait");
        assert_eq!(report["exif_orientation"], 6);
        assert_eq!(report["projected"][0]["width"], 100.0);
        assert_eq!(report["projected"][0]["height"], 200.0);
        assert_eq!(report["overlay"]["fill"], Value::Null);

        let unknown = projection_report(
            &[],
            TargetFrame::new(400.0, 200.0),
            InterfaceOrientation::Unknown,
            [0, 255, 0, 255],
        );
        assert_eq!(unknown["exif_orientation"], Value::Null);
        assert_eq!(unknown["video_orientation"], "Portrait");
    }

    #[test]
    fn test_parse_rect() {
        assert_eq!(
            parse_rect("0, 0.25, 0.5,0.5"),
            Ok(NormalizedRect::new(0.0, 0.25, 0.5, 0.5))
        );
        assert!(parse_rect("0,0,1").is_err());
        assert!(parse_rect("a,b,c,d").is_err());
    }
}
