//! Frame sources feeding the stabilization pipeline.
//!
//! The camera and detection models live outside this crate. A source's job is
//! only to deliver already-resolved [`FrameInput`] values (or a per-frame
//! grab error) over a channel the pipeline consumes.

use crate::perception::types::FrameInput;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A single frame's worth of perception output, or the reason it was lost.
pub type FrameResult = Result<FrameInput, FrameError>;

/// Errors a frame source can surface for an individual frame.
///
/// These never terminate a session; the pipeline logs them and retries.
#[derive(Debug, Clone)]
pub enum FrameError {
    /// The frame grab itself failed (camera stall, device busy)
    Grab(String),
    /// A detection model invocation failed for this frame
    Model(String),
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::Grab(msg) => write!(f, "frame grab failed: {msg}"),
            FrameError::Model(msg) => write!(f, "model invocation failed: {msg}"),
        }
    }
}

impl std::error::Error for FrameError {}

/// Errors from starting or driving a source.
#[derive(Debug)]
pub enum SourceError {
    AlreadyRunning,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::AlreadyRunning => write!(f, "frame source is already running"),
        }
    }
}

impl std::error::Error for SourceError {}

/// A running producer of per-frame perception output.
pub trait FrameSource {
    /// Begin delivering frames. Fails if already running.
    fn start(&mut self) -> Result<(), SourceError>;

    /// Stop delivering frames and release any held model handles.
    /// Idempotent: stopping a stopped source is a no-op.
    fn stop(&mut self);

    /// Channel the pipeline reads frames from.
    fn receiver(&self) -> &Receiver<FrameResult>;
}

/// A source that never emits frames.
///
/// Exists so the agent compiles and runs on hosts without a camera or the
/// detection models installed; external integrations push frames through
/// [`NoopFrameSource::sender`] instead.
pub struct NoopFrameSource {
    sender: Sender<FrameResult>,
    receiver: Receiver<FrameResult>,
    running: Arc<AtomicBool>,
}

impl NoopFrameSource {
    pub fn new() -> Self {
        let (sender, receiver) = bounded(256);
        Self {
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle external frame producers can push through.
    pub fn sender(&self) -> Sender<FrameResult> {
        self.sender.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for NoopFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for NoopFrameSource {
    fn start(&mut self) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn receiver(&self) -> &Receiver<FrameResult> {
        &self.receiver
    }
}
