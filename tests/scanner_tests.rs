// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for live scanner dispatch

use image::{Rgba, RgbaImage};
use live_scanner::frame_processor::BlockingEngine;
use live_scanner::frame_processor::types::RecognitionJob;
use live_scanner::{
    BarcodeDetection, CameraFrame, ImageOrientation, InterfaceOrientation, LiveScanner,
    NormalizedRect, PixelFormat, RecognitionError, ScannerConfig, ScannerDelegate, ScannerEngine,
    ScannerError, ScannerMode, ScannerOptions, TargetFrame,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::timeout;

/// Delegate forwarding every capture to the test
struct ChannelDelegate {
    tx: mpsc::UnboundedSender<Vec<String>>,
}

impl ScannerDelegate for ChannelDelegate {
    fn captured_strings(&self, strings: Vec<String>) {
        let _ = self.tx.send(strings);
    }

    fn live_capture_ended(&self, _error: Option<ScannerError>) {}
}

fn delegate() -> (Arc<dyn ScannerDelegate>, mpsc::UnboundedReceiver<Vec<String>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(ChannelDelegate { tx }), rx)
}

async fn next_capture(rx: &mut mpsc::UnboundedReceiver<Vec<String>>) -> Vec<String> {
    timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("no capture reported")
        .expect("delegate channel closed")
}

fn frame(width: u32, height: u32) -> CameraFrame {
    CameraFrame::from_rgba_image(RgbaImage::from_pixel(width, height, Rgba([255; 4])))
}

fn broken_frame() -> CameraFrame {
    CameraFrame {
        width: 8,
        height: 8,
        data: Arc::from(Vec::new().into_boxed_slice()),
        format: PixelFormat::BGRA,
        stride: 32,
        captured_at: Instant::now(),
    }
}

/// Text engine reporting the orientation and size it was given
fn text_engine(seen: Arc<Mutex<Vec<Option<ImageOrientation>>>>) -> ScannerEngine {
    ScannerEngine::Text(Box::new(BlockingEngine::new(move |job: &RecognitionJob| {
        seen.lock().unwrap().push(job.orientation);
        let upright = job.upright_image();
        Ok(vec![format!("{}x{}", upright.width(), upright.height())])
    })))
}

/// Barcode engine finding one code in the top-left quarter
fn barcode_engine() -> ScannerEngine {
    ScannerEngine::Barcode(Box::new(BlockingEngine::new(|job: &RecognitionJob| {
        if job.image.width() < 10 {
            return Ok(Vec::new());
        }
        Ok(vec![BarcodeDetection::new(
            NormalizedRect::new(0.0, 0.0, 0.5, 0.5),
            "hello".to_string(),
        )])
    })))
}

#[tokio::test]
async fn test_text_mode_reports_and_publishes_strings() {
    let (delegate, mut captures) = delegate();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let scanner = LiveScanner::new(
        ScannerMode::Ocr,
        ScannerOptions::full_screen(true),
        delegate,
        text_engine(Arc::clone(&seen)),
        &ScannerConfig::default(),
    )
    .unwrap();
    let mut stream = scanner.captured_strings_stream().unwrap();

    // Not scanning yet
    scanner.handle_frame(&frame(4, 2), InterfaceOrientation::Portrait);
    scanner.start_scanning();
    scanner.handle_frame(&frame(4, 2), InterfaceOrientation::Portrait);

    assert_eq!(next_capture(&mut captures).await, vec!["2x4".to_string()]);
    timeout(Duration::from_secs(1), stream.changed())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(*stream.borrow(), vec!["2x4".to_string()]);
    assert_eq!(*seen.lock().unwrap(), vec![Some(ImageOrientation::Right)]);
}

#[tokio::test]
async fn test_text_mode_drops_unconvertible_frames() {
    let (delegate, mut captures) = delegate();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let scanner = LiveScanner::new(
        ScannerMode::Ocr,
        ScannerOptions::default(),
        delegate,
        text_engine(Arc::clone(&seen)),
        &ScannerConfig::default(),
    )
    .unwrap();
    scanner.start_scanning();

    scanner.handle_frame(&broken_frame(), InterfaceOrientation::LandscapeRight);
    scanner.handle_frame(&frame(6, 3), InterfaceOrientation::Unknown);

    // Only the valid frame produces a capture
    assert_eq!(next_capture(&mut captures).await, vec!["6x3".to_string()]);
    assert_eq!(*seen.lock().unwrap(), vec![None]);
}

#[tokio::test]
async fn test_barcode_mode_reports_every_frame_and_draws_overlay() {
    let (delegate, mut captures) = delegate();
    let scanner = LiveScanner::new(
        ScannerMode::Barcode,
        ScannerOptions::default(),
        delegate,
        barcode_engine(),
        &ScannerConfig::default(),
    )
    .unwrap();
    assert!(scanner.captured_strings_stream().is_none());
    let mut overlays = scanner.overlay_stream();

    scanner.set_preview_frame(TargetFrame::new(400.0, 200.0));
    scanner.start_scanning();
    scanner.handle_frame(&frame(20, 10), InterfaceOrientation::Portrait);
    assert_eq!(next_capture(&mut captures).await, vec!["hello".to_string()]);

    timeout(Duration::from_secs(1), overlays.changed())
        .await
        .unwrap()
        .unwrap();
    let overlay = overlays.borrow_and_update().clone().unwrap();
    assert_eq!(overlay.path.subpath_count(), 1);
    assert_eq!(overlay.fill, None);
    assert_eq!(overlay.frame, TargetFrame::new(400.0, 200.0));

    // Empty results are still reported
    scanner.handle_frame(&frame(4, 4), InterfaceOrientation::Portrait);
    assert!(next_capture(&mut captures).await.is_empty());
}

#[tokio::test]
async fn test_barcode_mode_without_rectangles_leaves_overlay_empty() {
    let (delegate, mut captures) = delegate();
    let scanner = LiveScanner::new(
        ScannerMode::Barcode,
        ScannerOptions::full_screen(true),
        delegate,
        barcode_engine(),
        &ScannerConfig::default(),
    )
    .unwrap();
    let overlays = scanner.overlay_stream();

    scanner.start_scanning();
    scanner.handle_frame(&frame(20, 10), InterfaceOrientation::LandscapeRight);
    assert_eq!(next_capture(&mut captures).await, vec!["hello".to_string()]);
    assert!(overlays.borrow().is_none());
}

#[tokio::test]
async fn test_stop_scanning_ignores_frames() {
    let (delegate, mut captures) = delegate();
    let scanner = LiveScanner::new(
        ScannerMode::Barcode,
        ScannerOptions::default(),
        delegate,
        barcode_engine(),
        &ScannerConfig::default(),
    )
    .unwrap();

    scanner.start_scanning();
    scanner.stop_scanning();
    scanner.handle_frame(&frame(20, 10), InterfaceOrientation::LandscapeRight);
    assert!(
        timeout(Duration::from_millis(100), captures.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_barcode_frame_outcomes_include_failures() {
    let (delegate, mut captures) = delegate();
    let engine = ScannerEngine::Barcode(Box::new(BlockingEngine::new(|job: &RecognitionJob| {
        match job.image.width() {
            20 => panic!("decoder crashed"),
            30 => Err("unreadable symbol".to_string()),
            width => Ok(vec![BarcodeDetection::new(
                NormalizedRect::new(0.0, 0.0, 0.5, 0.5),
                format!("w{}", width),
            )]),
        }
    })));
    let scanner = LiveScanner::new(
        ScannerMode::Barcode,
        ScannerOptions::default(),
        delegate,
        engine,
        &ScannerConfig::default(),
    )
    .unwrap();

    let scans = vec![
        scanner.scan_barcode_frame(&frame(10, 4), InterfaceOrientation::Unknown),
        scanner.scan_barcode_frame(&frame(20, 4), InterfaceOrientation::Unknown),
        scanner.scan_barcode_frame(&broken_frame(), InterfaceOrientation::Unknown),
        scanner.scan_barcode_frame(&frame(30, 4), InterfaceOrientation::Unknown),
        scanner.scan_barcode_frame(&frame(40, 4), InterfaceOrientation::Unknown),
    ];
    let outcomes = timeout(Duration::from_secs(2), futures::future::join_all(scans))
        .await
        .expect("scan did not finish");

    assert_eq!(outcomes[0].as_ref().unwrap()[0].content, "w10");
    assert_eq!(
        outcomes[1],
        Err(ScannerError::Recognition(RecognitionError::Abandoned))
    );
    assert!(matches!(
        outcomes[2],
        Err(ScannerError::Recognition(RecognitionError::InvalidImage(_)))
    ));
    assert_eq!(
        outcomes[3],
        Err(ScannerError::Recognition(RecognitionError::EngineFailed(
            "unreadable symbol".to_string()
        )))
    );
    assert_eq!(outcomes[4].as_ref().unwrap()[0].content, "w40");

    // Only the successful frames reach the delegate
    assert_eq!(next_capture(&mut captures).await, vec!["w10".to_string()]);
    assert_eq!(next_capture(&mut captures).await, vec!["w40".to_string()]);
    assert!(captures.try_recv().is_err());
}

#[tokio::test]
async fn test_barcode_frame_in_text_mode_is_config_error() {
    let (delegate, _captures) = delegate();
    let scanner = LiveScanner::new(
        ScannerMode::Ocr,
        ScannerOptions::default(),
        delegate,
        text_engine(Arc::new(Mutex::new(Vec::new()))),
        &ScannerConfig::default(),
    )
    .unwrap();

    let outcome = scanner
        .scan_barcode_frame(&frame(4, 4), InterfaceOrientation::Unknown)
        .await;
    assert!(matches!(outcome, Err(ScannerError::Config(_))));
}
