// SPDX-License-Identifier: GPL-3.0-only

//! Adapter for synchronous recognizers
//!
//! Most OCR libraries expose a blocking "image in, strings out" call. This
//! wraps such a call as a [`RecognitionEngine`] that runs on tokio's
//! blocking pool, one job at a time.

use crate::frame_processor::serializer::{Completion, RecognitionEngine};
use crate::frame_processor::types::RecognitionJob;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Engine backed by a blocking closure
///
/// The closure receives the job (use [`RecognitionJob::upright_image`] when
/// the recognizer needs an upright picture) and returns the recognized
/// values or a failure message.
pub struct BlockingEngine<F, T> {
    recognize: Arc<F>,
    _output: PhantomData<fn() -> T>,
}

impl<F, T> BlockingEngine<F, T>
where
    F: Fn(&RecognitionJob) -> Result<T, String> + Send + Sync + 'static,
    T: Send + 'static,
{
    pub fn new(recognize: F) -> Self {
        Self {
            recognize: Arc::new(recognize),
            _output: PhantomData,
        }
    }
}

impl<F, T> RecognitionEngine for BlockingEngine<F, T>
where
    F: Fn(&RecognitionJob) -> Result<T, String> + Send + Sync + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn start(&mut self, job: RecognitionJob, completion: Completion<T>) {
        let recognize = Arc::clone(&self.recognize);
        tokio::task::spawn_blocking(move || match recognize(&job) {
            Ok(value) => completion.succeed(value),
            Err(reason) => {
                debug!(reason = %reason, "Blocking recognizer failed");
                completion.fail(reason);
            }
        });
    }
}
