//! Frame-processing pipeline tying the classifiers to shared state.
//!
//! The pipeline owns the three classifiers and publishes their outputs to a
//! [`SharedState`] bundle after every frame, so the server and reporter
//! threads always read a coherent current state.

use crate::config::{Config, ConfigError};
use crate::core::{
    AffectClassifier, AttentionClassifier, GestureClassifier, SharedState,
};
use crate::perception::source::FrameResult;
use crate::perception::types::FrameInput;
use chrono::Duration;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Owns the classifiers and drives them frame by frame.
pub struct Pipeline {
    attention: AttentionClassifier,
    affect: AffectClassifier,
    gesture: GestureClassifier,
    shared: Arc<SharedState>,
}

impl Pipeline {
    /// Build a pipeline from a validated configuration.
    pub fn new(config: &Config, shared: Arc<SharedState>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            attention: AttentionClassifier::new(interval(config.attention_interval)),
            affect: AffectClassifier::new(interval(config.affect_interval)),
            gesture: GestureClassifier::new(
                interval(config.gesture_interval),
                interval(config.gesture_hold),
            ),
            shared: shared.clone(),
        })
    }

    pub fn shared(&self) -> Arc<SharedState> {
        self.shared.clone()
    }

    /// Run each classifier over one frame and publish the results.
    pub fn process_frame(&mut self, input: &FrameInput) {
        let attention = self.attention.process(input);
        let affect = self.affect.process(input);
        let gesture = self.gesture.process(input);

        self.shared.attention.publish(attention);
        self.shared.affect.publish(affect);
        self.shared.gesture.publish(gesture);
        self.shared.record_frame_time(input.captured_at);
    }

    /// Consume frames from a source channel until stopped.
    ///
    /// Frame-level model failures are logged and backed off; the previous
    /// published state stands until the source recovers.
    pub fn run(&mut self, receiver: &Receiver<FrameResult>, running: &AtomicBool) {
        while running.load(Ordering::SeqCst) {
            match receiver.recv_timeout(std::time::Duration::from_millis(100)) {
                Ok(Ok(frame)) => self.process_frame(&frame),
                Ok(Err(e)) => {
                    tracing::warn!("frame acquisition failed: {e}");
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::info!("frame source disconnected, stopping pipeline");
                    break;
                }
            }
        }
    }
}

fn interval(d: std::time::Duration) -> Duration {
    Duration::milliseconds(d.as_millis() as i64)
}
