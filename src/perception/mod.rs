//! Perception input layer for the Presence Sensor Agent.
//!
//! This module defines the per-frame data the external landmark and emotion
//! models deliver, and the channel-based sources that feed it to the
//! stabilization pipeline.

pub mod source;
pub mod types;

// Re-export commonly used types
pub use source::{FrameError, FrameResult, FrameSource, NoopFrameSource, SourceError};
pub use types::{
    face_landmark, hand_landmark, EmotionScores, FaceBox, FaceGeometry, FrameInput, HandGeometry,
    Landmark,
};
