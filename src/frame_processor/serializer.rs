// SPDX-License-Identifier: GPL-3.0-only

//! Single-flight recognition request serializer
//!
//! Frames arrive from the capture layer far faster than a recognition engine
//! can process them, and engines handle one image at a time. The serializer
//! queues requests and feeds them to the engine strictly one after another:
//!
//! ```text
//!  capture thread ──submit──┐
//!                           ▼
//!                  ┌──────────────────┐   start(job, completion)   ┌────────┐
//!                  │ serializer task  │ ─────────────────────────▶ │ engine │
//!                  │ (owns the queue) │ ◀───────────────────────── │        │
//!                  └──────────────────┘      completion.finish     └────────┘
//!                           │
//!                           ▼
//!                  callback(outcome), in submission order
//! ```
//!
//! All queue mutation happens inside one tokio task, so there is no lock.
//! `submit` only sends a message and never blocks, which makes it safe to
//! call from capture callbacks on plain threads. The in-flight request is
//! always the queue front; its completion pops it, fires its callback and
//! then starts the next request.

use crate::backends::camera::types::CameraFrame;
use crate::constants::RecognitionLevel;
use crate::errors::RecognitionError;
use crate::frame_processor::types::{FrameImage, RecognitionJob, RecognitionOutcome};
use crate::orientation::ImageOrientation;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, trace, warn};

/// Callback receiving the outcome of one request
pub type RecognitionCallback<T> = Box<dyn FnOnce(RecognitionOutcome<T>) + Send + 'static>;

/// A recognition capability that processes one image at a time
///
/// `start` is called from the serializer task and must return quickly;
/// the actual work belongs on another task or thread. The engine reports
/// the result through `completion`, exactly once. An engine that cannot
/// start on an image reports that through [`Completion::reject`]. A
/// completion that is dropped unused fails its request with
/// [`RecognitionError::Abandoned`], so the queue never stalls on it.
pub trait RecognitionEngine: Send + 'static {
    /// Value produced for a successful request
    type Output: Send + 'static;

    /// Begin processing `job`
    fn start(&mut self, job: RecognitionJob, completion: Completion<Self::Output>);
}

impl<T: Send + 'static> RecognitionEngine for Box<dyn RecognitionEngine<Output = T>> {
    type Output = T;

    fn start(&mut self, job: RecognitionJob, completion: Completion<T>) {
        (**self).start(job, completion);
    }
}

/// Serializer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SerializerConfig {
    /// Accuracy requested from the engine for every job
    pub level: RecognitionLevel,
    /// Upper bound on queued requests, including the one in flight
    ///
    /// `None` keeps every request (the queue grows under sustained
    /// overload). With a bound, a request arriving at a full queue is
    /// rejected immediately with [`RecognitionError::QueueFull`].
    pub max_pending: Option<usize>,
}

/// One queued request
struct RecognitionRequest<T> {
    id: u64,
    image: FrameImage,
    orientation: Option<ImageOrientation>,
    callback: RecognitionCallback<T>,
}

enum Command<T> {
    Submit {
        image: FrameImage,
        orientation: Option<ImageOrientation>,
        callback: RecognitionCallback<T>,
    },
    Completed {
        id: u64,
        outcome: RecognitionOutcome<T>,
    },
}

/// Handle an engine uses to report the result of its current job
///
/// Consumed by [`finish`](Self::finish), so a job completes at most once.
pub struct Completion<T: Send + 'static> {
    id: u64,
    tx: Option<mpsc::UnboundedSender<Command<T>>>,
}

impl<T: Send + 'static> Completion<T> {
    /// Report the outcome of the job
    pub fn finish(mut self, outcome: RecognitionOutcome<T>) {
        self.send(outcome);
    }

    /// Report recognized values
    pub fn succeed(self, value: T) {
        self.finish(Ok(value));
    }

    /// Report that recognition ran and failed
    pub fn fail(self, reason: impl Into<String>) {
        self.finish(Err(RecognitionError::EngineFailed(reason.into())));
    }

    /// Report that the engine could not start on this image
    pub fn reject(self, reason: impl Into<String>) {
        self.finish(Err(RecognitionError::EngineRejected(reason.into())));
    }

    /// Identifier of the request this completion belongs to
    pub fn request_id(&self) -> u64 {
        self.id
    }

    fn send(&mut self, outcome: RecognitionOutcome<T>) {
        if let Some(tx) = self.tx.take() {
            // The serializer task only goes away once every completion is gone
            if tx.send(Command::Completed { id: self.id, outcome }).is_err() {
                warn!(id = self.id, "Serializer stopped before completion arrived");
            }
        }
    }
}

impl<T: Send + 'static> Drop for Completion<T> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!(id = self.id, "Recognition completion dropped without a result");
            self.send(Err(RecognitionError::Abandoned));
        }
    }
}

impl<T: Send + 'static> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("id", &self.id)
            .field("pending", &self.tx.is_some())
            .finish()
    }
}

/// Front end of the serializer task
///
/// Cheap to clone; all clones feed the same queue. When every handle and
/// every outstanding completion is dropped the task exits.
pub struct RequestSerializer<T: Send + 'static = Vec<String>> {
    tx: mpsc::UnboundedSender<Command<T>>,
    pending: Arc<AtomicUsize>,
}

impl<T: Send + 'static> Clone for RequestSerializer<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<T: Send + 'static> RequestSerializer<T> {
    /// Start the serializer task on the current tokio runtime
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn<E>(engine: E, config: SerializerConfig) -> Self
    where
        E: RecognitionEngine<Output = T>,
    {
        Self::spawn_with_handle(engine, config, &Handle::current())
    }

    /// Start the serializer task on the given runtime
    pub fn spawn_with_handle<E>(engine: E, config: SerializerConfig, handle: &Handle) -> Self
    where
        E: RecognitionEngine<Output = T>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));

        let worker = Worker {
            engine,
            config,
            queue: VecDeque::new(),
            next_id: 0,
            tx: tx.downgrade(),
            pending: Arc::clone(&pending),
        };
        handle.spawn(worker.run(rx));

        Self { tx, pending }
    }

    /// Queue an image for recognition
    ///
    /// Returns immediately. `callback` runs on the serializer task once the
    /// request has been processed, after the callbacks of every request
    /// submitted before it. Keep it short; the next request starts after it
    /// returns.
    pub fn submit<F>(&self, image: FrameImage, orientation: Option<ImageOrientation>, callback: F)
    where
        F: FnOnce(RecognitionOutcome<T>) + Send + 'static,
    {
        let command = Command::Submit {
            image,
            orientation,
            callback: Box::new(callback),
        };
        if let Err(mpsc::error::SendError(command)) = self.tx.send(command) {
            warn!("Recognition request submitted after serializer stopped");
            if let Command::Submit { callback, .. } = command {
                callback(Err(RecognitionError::ServiceStopped));
            }
        }
    }

    /// Decode a raw frame and queue it
    ///
    /// A frame that cannot be decoded never enters the queue: `callback`
    /// receives [`RecognitionError::InvalidImage`] right away, on the
    /// calling thread.
    pub fn submit_frame<F>(
        &self,
        frame: &CameraFrame,
        orientation: Option<ImageOrientation>,
        callback: F,
    ) where
        F: FnOnce(RecognitionOutcome<T>) + Send + 'static,
    {
        match frame.to_rgba_image() {
            Ok(image) => self.submit(Arc::new(image), orientation, callback),
            Err(e) => {
                debug!(error = %e, "Frame rejected before queueing");
                callback(Err(e.into()));
            }
        }
    }

    /// Queue an image and await its outcome
    pub fn recognize(
        &self,
        image: FrameImage,
        orientation: Option<ImageOrientation>,
    ) -> impl Future<Output = RecognitionOutcome<T>> + Send + use<T> {
        let (tx, rx) = oneshot::channel();
        self.submit(image, orientation, move |outcome| {
            let _ = tx.send(outcome);
        });
        async move { rx.await.unwrap_or(Err(RecognitionError::ServiceStopped)) }
    }

    /// Requests currently queued, including the one in flight
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

/// State owned by the serializer task
struct Worker<E: RecognitionEngine> {
    engine: E,
    config: SerializerConfig,
    queue: VecDeque<RecognitionRequest<E::Output>>,
    next_id: u64,
    tx: mpsc::WeakUnboundedSender<Command<E::Output>>,
    pending: Arc<AtomicUsize>,
}

impl<E: RecognitionEngine> Worker<E> {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command<E::Output>>) {
        debug!("Recognition serializer started");

        while let Some(command) = rx.recv().await {
            match command {
                Command::Submit {
                    image,
                    orientation,
                    callback,
                } => self.enqueue(image, orientation, callback),
                Command::Completed { id, outcome } => self.complete(id, outcome),
            }
        }

        // Only reachable once nothing can complete the front any more
        for request in self.queue.drain(..) {
            (request.callback)(Err(RecognitionError::ServiceStopped));
        }
        self.pending.store(0, Ordering::SeqCst);
        debug!("Recognition serializer stopped");
    }

    fn enqueue(
        &mut self,
        image: FrameImage,
        orientation: Option<ImageOrientation>,
        callback: RecognitionCallback<E::Output>,
    ) {
        if let Some(max) = self.config.max_pending {
            if self.queue.len() >= max.max(1) {
                debug!(pending = self.queue.len(), "Recognition queue full, rejecting request");
                callback(Err(RecognitionError::QueueFull));
                return;
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.queue.push_back(RecognitionRequest {
            id,
            image,
            orientation,
            callback,
        });
        self.pending.store(self.queue.len(), Ordering::SeqCst);
        trace!(id, pending = self.queue.len(), "Queued recognition request");

        if self.queue.len() == 1 {
            self.start_front();
        }
    }

    fn complete(&mut self, id: u64, outcome: RecognitionOutcome<E::Output>) {
        let front_id = self.queue.front().map(|request| request.id);
        if front_id != Some(id) {
            error!(id, ?front_id, "Completion does not match the in-flight request");
            panic!(
                "recognition completion for request {} but in-flight request is {:?}",
                id, front_id
            );
        }

        if let Some(request) = self.queue.pop_front() {
            self.pending.store(self.queue.len(), Ordering::SeqCst);
            trace!(
                id,
                success = outcome.is_ok(),
                pending = self.queue.len(),
                "Recognition request finished"
            );
            (request.callback)(outcome);
        }

        if !self.queue.is_empty() {
            self.start_front();
        }
    }

    fn start_front(&mut self) {
        let Some(request) = self.queue.front() else {
            return;
        };
        let job = RecognitionJob {
            image: Arc::clone(&request.image),
            orientation: request.orientation,
            level: self.config.level,
        };
        let id = request.id;

        match self.tx.upgrade() {
            Some(tx) => {
                trace!(id, "Starting recognition");
                let completion = Completion { id, tx: Some(tx) };
                self.engine.start(job, completion);
            }
            None => {
                // Every handle is gone and nothing is in flight; fail the rest
                warn!(pending = self.queue.len(), "Serializer shut down with queued requests");
                for request in self.queue.drain(..) {
                    (request.callback)(Err(RecognitionError::ServiceStopped));
                }
                self.pending.store(0, Ordering::SeqCst);
            }
        }
    }
}
