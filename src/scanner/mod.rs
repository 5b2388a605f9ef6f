// SPDX-License-Identifier: GPL-3.0-only

//! Live scanner
//!
//! Ties the pieces together for one capture session: frames from the
//! capture layer go through a [`RequestSerializer`], results are reported to
//! a [`ScannerDelegate`] and published on watch channels a view can follow.
//!
//! In barcode mode every completed frame is reported, even when nothing was
//! found, and the outline overlay is refreshed when rectangle drawing is
//! enabled. In text mode only successful recognitions are reported.

use crate::backends::camera::{CameraFrame, NoTorch, TorchControl, TorchStatus};
use crate::config::{ScannerConfig, ScannerMode, ScannerOptions};
use crate::errors::{RecognitionError, ScannerError, ScannerResult};
use crate::frame_processor::serializer::{RecognitionEngine, RequestSerializer};
use crate::frame_processor::tasks::QrDetector;
use crate::frame_processor::types::{BarcodeDetection, RecognitionOutcome};
use crate::orientation::InterfaceOrientation;
use crate::overlay::{self, Overlay, StrokeColor, TargetFrame};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, trace, warn};

/// Receiver of scan results
///
/// Methods are called from the serializer task and should return quickly.
pub trait ScannerDelegate: Send + Sync + 'static {
    /// Strings captured from one frame
    fn captured_strings(&self, strings: Vec<String>);

    /// The capture session ended, with the reason if it was not a normal stop
    fn live_capture_ended(&self, error: Option<ScannerError>);
}

/// Engine producing barcode detections
pub type BarcodeEngine = Box<dyn RecognitionEngine<Output = Vec<BarcodeDetection>>>;

/// Engine producing recognized text
pub type TextEngine = Box<dyn RecognitionEngine<Output = Vec<String>>>;

/// Recognition backend for a scanner
pub enum ScannerEngine {
    /// Bundled QR detector, tuned from the config
    Qr,
    /// Custom barcode engine
    Barcode(BarcodeEngine),
    /// Text recognizer
    Text(TextEngine),
}

enum Recognizer {
    Barcode(RequestSerializer<Vec<BarcodeDetection>>),
    Ocr(RequestSerializer<Vec<String>>),
}

/// One live scanning session
pub struct LiveScanner {
    mode: ScannerMode,
    options: ScannerOptions,
    stroke_color: StrokeColor,
    delegate: Arc<dyn ScannerDelegate>,
    recognizer: Recognizer,
    scanning: Arc<AtomicBool>,
    preview: Arc<watch::Sender<TargetFrame>>,
    strings: Option<Arc<watch::Sender<Vec<String>>>>,
    overlay: Arc<watch::Sender<Option<Overlay>>>,
    torch: Arc<dyn TorchControl>,
    torch_on: AtomicBool,
}

impl LiveScanner {
    /// Create a scanner on the current tokio runtime
    ///
    /// The engine must match the mode: [`ScannerEngine::Text`] for
    /// [`ScannerMode::Ocr`], either barcode variant for
    /// [`ScannerMode::Barcode`].
    pub fn new(
        mode: ScannerMode,
        options: ScannerOptions,
        delegate: Arc<dyn ScannerDelegate>,
        engine: ScannerEngine,
        config: &ScannerConfig,
    ) -> ScannerResult<Self> {
        let serializer_config = config.serializer_config();

        let recognizer = match (mode, engine) {
            (ScannerMode::Barcode, ScannerEngine::Qr) => Recognizer::Barcode(
                RequestSerializer::spawn(
                    QrDetector::with_max_dimension(config.detector_max_dimension),
                    serializer_config,
                ),
            ),
            (ScannerMode::Barcode, ScannerEngine::Barcode(engine)) => {
                Recognizer::Barcode(RequestSerializer::spawn(engine, serializer_config))
            }
            (ScannerMode::Ocr, ScannerEngine::Text(engine)) => {
                Recognizer::Ocr(RequestSerializer::spawn(engine, serializer_config))
            }
            (mode, _) => {
                return Err(ScannerError::Config(format!(
                    "Engine does not match {} mode",
                    mode.display_name()
                )));
            }
        };

        let strings = match mode {
            ScannerMode::Ocr => Some(Arc::new(watch::Sender::new(Vec::new()))),
            ScannerMode::Barcode => None,
        };

        info!(
            mode = mode.display_name(),
            full_screen = options.full_screen,
            draw_rectangles = options.draw_rectangles,
            "Live scanner created"
        );

        Ok(Self {
            mode,
            options,
            stroke_color: config.stroke_color,
            delegate,
            recognizer,
            scanning: Arc::new(AtomicBool::new(false)),
            preview: Arc::new(watch::Sender::new(TargetFrame::default())),
            strings,
            overlay: Arc::new(watch::Sender::new(None)),
            torch: Arc::new(NoTorch),
            torch_on: AtomicBool::new(false),
        })
    }

    /// Create a scanner from a config, using its mode and options
    pub fn from_config(
        config: &ScannerConfig,
        delegate: Arc<dyn ScannerDelegate>,
        engine: ScannerEngine,
    ) -> ScannerResult<Self> {
        Self::new(config.mode, config.options.clone(), delegate, engine, config)
    }

    /// Use the capture layer's torch
    pub fn with_torch(mut self, torch: Arc<dyn TorchControl>) -> Self {
        self.torch = torch;
        self
    }

    pub fn mode(&self) -> ScannerMode {
        self.mode
    }

    pub fn options(&self) -> &ScannerOptions {
        &self.options
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    pub fn start_scanning(&self) {
        if !self.scanning.swap(true, Ordering::SeqCst) {
            info!(mode = self.mode.display_name(), "Scanning started");
        }
    }

    /// Stop handling frames; requests already queued still complete
    pub fn stop_scanning(&self) {
        if self.scanning.swap(false, Ordering::SeqCst) {
            info!(mode = self.mode.display_name(), "Scanning stopped");
        }
    }

    /// Size of the surface barcode outlines are drawn on
    pub fn set_preview_frame(&self, frame: TargetFrame) {
        debug!(width = frame.width, height = frame.height, "Preview frame updated");
        self.preview.send_replace(frame);
    }

    /// Latest strings recognized, in text mode only
    pub fn captured_strings_stream(&self) -> Option<watch::Receiver<Vec<String>>> {
        self.strings.as_ref().map(|tx| tx.subscribe())
    }

    /// Latest barcode outline layer
    pub fn overlay_stream(&self) -> watch::Receiver<Option<Overlay>> {
        self.overlay.subscribe()
    }

    /// Feed one captured frame
    ///
    /// Never blocks. Ignored while not scanning.
    pub fn handle_frame(&self, frame: &CameraFrame, orientation: InterfaceOrientation) {
        if !self.is_scanning() {
            trace!("Frame ignored, not scanning");
            return;
        }

        match &self.recognizer {
            Recognizer::Ocr(serializer) => self.handle_text_frame(serializer, frame, orientation),
            Recognizer::Barcode(serializer) => {
                self.handle_barcode_frame(serializer, frame, orientation, None)
            }
        }
    }

    fn handle_text_frame(
        &self,
        serializer: &RequestSerializer<Vec<String>>,
        frame: &CameraFrame,
        orientation: InterfaceOrientation,
    ) {
        let image = match frame.to_rgba_image() {
            Ok(image) => Arc::new(image),
            Err(e) => {
                debug!(error = %e, "Dropping frame that could not be converted");
                return;
            }
        };

        let delegate = Arc::clone(&self.delegate);
        let strings = self.strings.clone();
        serializer.submit(image, orientation.image_orientation(), move |outcome| {
            match outcome {
                Ok(recognized) => {
                    trace!(count = recognized.len(), "Text recognized");
                    if let Some(tx) = strings {
                        tx.send_replace(recognized.clone());
                    }
                    delegate.captured_strings(recognized);
                }
                Err(e) => debug!(error = %e, "Text recognition failed"),
            }
        });
    }

    fn handle_barcode_frame(
        &self,
        serializer: &RequestSerializer<Vec<BarcodeDetection>>,
        frame: &CameraFrame,
        orientation: InterfaceOrientation,
        reply: Option<oneshot::Sender<RecognitionOutcome<Vec<BarcodeDetection>>>>,
    ) {
        let delegate = Arc::clone(&self.delegate);
        let draw = self.options.draw_rectangles;
        let stroke_color = self.stroke_color;
        let preview = Arc::clone(&self.preview);
        let overlay_tx = Arc::clone(&self.overlay);

        // Detector bounds stay in buffer coordinates; orientation only
        // matters when projecting them
        serializer.submit_frame(frame, None, move |outcome| {
            let detections = match outcome {
                Ok(detections) => detections,
                Err(e) => {
                    debug!(error = %e, "Barcode detection failed");
                    if let Some(reply) = reply {
                        let _ = reply.send(Err(e));
                    }
                    return;
                }
            };

            if draw {
                let rects: Vec<_> = detections.iter().map(|d| d.bounds).collect();
                let target = *preview.borrow();
                overlay_tx.send_replace(Some(overlay::build_overlay(
                    &rects,
                    target,
                    orientation,
                    stroke_color,
                )));
            }

            let codes: Vec<String> = detections.iter().map(|d| d.content.clone()).collect();
            trace!(count = codes.len(), "Barcodes captured");
            delegate.captured_strings(codes);

            if let Some(reply) = reply {
                let _ = reply.send(Ok(detections));
            }
        });
    }

    /// Feed one frame in barcode mode and await its own outcome
    ///
    /// Goes through the same path as [`handle_frame`](Self::handle_frame):
    /// the delegate and overlay are updated on success. Failures, which
    /// `handle_frame` only logs, are returned here. Runs whether or not
    /// scanning is started.
    pub fn scan_barcode_frame(
        &self,
        frame: &CameraFrame,
        orientation: InterfaceOrientation,
    ) -> impl Future<Output = ScannerResult<Vec<BarcodeDetection>>> + Send + use<> {
        let rx = match &self.recognizer {
            Recognizer::Barcode(serializer) => {
                let (tx, rx) = oneshot::channel();
                self.handle_barcode_frame(serializer, frame, orientation, Some(tx));
                Some(rx)
            }
            Recognizer::Ocr(_) => None,
        };

        async move {
            let rx = rx.ok_or_else(|| {
                ScannerError::Config("Barcode scan requested in Text mode".to_string())
            })?;
            let outcome = rx.await.unwrap_or(Err(RecognitionError::ServiceStopped));
            Ok(outcome?)
        }
    }

    /// Stop scanning and report that the user closed the view
    pub fn close(&self) {
        self.stop_scanning();
        if self.torch_on.swap(false, Ordering::SeqCst) {
            if let Err(e) = self.torch.set_torch(false) {
                warn!(error = %e, "Failed to switch torch off on close");
            }
        }
        self.overlay.send_replace(None);
        info!("Capture closed by user");
        self.delegate
            .live_capture_ended(Some(ScannerError::UserClosed));
    }

    pub fn is_torch_available(&self) -> bool {
        self.torch.has_torch()
    }

    /// Switch the torch between on and off
    pub fn toggle_torch(&self) -> TorchStatus {
        if !self.torch.has_torch() {
            debug!("Torch toggle requested without a torch");
            return TorchStatus::Unavailable;
        }

        let target = !self.torch_on.load(Ordering::SeqCst);
        match self.torch.set_torch(target) {
            Ok(()) => {
                self.torch_on.store(target, Ordering::SeqCst);
                debug!(on = target, "Torch toggled");
                if target {
                    TorchStatus::On
                } else {
                    TorchStatus::Off
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to toggle torch");
                TorchStatus::Unavailable
            }
        }
    }
}
