//! Core functionality for the Presence Sensor Agent.
//!
//! This module contains:
//! - Rate limiting and bounded history primitives shared by the classifiers
//! - The three stabilizing classifiers (attention, affect, gesture)
//! - Published state records and the merged snapshot

pub mod affect;
pub mod attention;
pub mod debounce;
pub mod gesture;
pub mod snapshot;

// Re-export commonly used types
pub use affect::AffectClassifier;
pub use attention::AttentionClassifier;
pub use debounce::{History, Throttle};
pub use gesture::GestureClassifier;
pub use snapshot::{
    AffectState, AttentionState, Emotion, Gesture, GazeDirection, GestureState, Report,
    SharedState, Snapshot, StateCell,
};
