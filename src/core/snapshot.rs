//! Published classifier states and the merged snapshot.
//!
//! Each classifier replaces its whole state record on re-evaluation; readers
//! on other threads only ever observe a complete prior publication. The
//! [`SharedState`] bundle is what the server and reporter threads hold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Coarse gaze direction derived from head-pose ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GazeDirection {
    Center,
    Up,
    Down,
    Left,
    Right,
}

impl Default for GazeDirection {
    fn default() -> Self {
        GazeDirection::Center
    }
}

/// Stabilized attention output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttentionState {
    pub is_focused: bool,
    pub eye_aspect_ratio: f64,
    pub gaze_score: f64,
    pub gaze_direction: GazeDirection,
}

/// Closed set of affect labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Happy,
    Sad,
    Neutral,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Neutral => "neutral",
        }
    }
}

/// Stabilized affect output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffectState {
    pub emotion: Emotion,
    pub confidence: f64,
}

impl Default for AffectState {
    fn default() -> Self {
        // Matches the published state before any frame has been scored.
        Self {
            emotion: Emotion::Neutral,
            confidence: 0.7,
        }
    }
}

/// Closed set of gesture labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    None,
    HandDetected,
    ThumbsUp,
    Peace,
    Wave,
}

impl Gesture {
    /// Discrete gestures are held for the post-detection lockout window.
    pub fn is_discrete(&self) -> bool {
        matches!(self, Gesture::ThumbsUp | Gesture::Peace | Gesture::Wave)
    }
}

/// Stabilized gesture output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureState {
    pub gesture: Gesture,
    pub confidence: f64,
}

impl Default for GestureState {
    fn default() -> Self {
        Self {
            gesture: Gesture::None,
            confidence: 0.0,
        }
    }
}

/// Immutable merged record of the three classifier outputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub attention: AttentionState,
    pub affect: AffectState,
    pub gesture: GestureState,
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Flatten into the wire format consumed by the remote endpoint.
    pub fn to_report(&self, source: &str) -> Report {
        Report {
            emotion: self.affect.emotion.as_str().to_string(),
            focus: if self.attention.is_focused {
                "focused".to_string()
            } else {
                "distracted".to_string()
            },
            thumbs_up: detection_flag(self.gesture.gesture == Gesture::ThumbsUp),
            wave: detection_flag(self.gesture.gesture == Gesture::Wave),
            timestamp: self.captured_at.to_rfc3339(),
            source: source.to_string(),
        }
    }
}

fn detection_flag(detected: bool) -> String {
    if detected {
        "detected".to_string()
    } else {
        "not_detected".to_string()
    }
}

/// Flat lower-cased state record for transmission by the reporting layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub emotion: String,
    pub focus: String,
    pub thumbs_up: String,
    pub wave: String,
    pub timestamp: String,
    pub source: String,
}

/// Single-writer, multi-reader cell holding one published value.
///
/// Publishing replaces the whole value under the lock; readers clone a
/// complete prior publication and never observe a half-updated record.
#[derive(Debug)]
pub struct StateCell<T: Clone> {
    inner: RwLock<T>,
}

impl<T: Clone> StateCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }

    /// Replace the published value wholesale.
    pub fn publish(&self, value: T) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = value;
    }

    /// Copy out the current published value.
    pub fn read(&self) -> T {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl<T: Clone + Default> Default for StateCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// The three classifier cells plus the timestamp of the last processed frame.
#[derive(Debug, Default)]
pub struct SharedState {
    pub attention: StateCell<AttentionState>,
    pub affect: StateCell<AffectState>,
    pub gesture: StateCell<GestureState>,
    last_frame_at: StateCell<Option<DateTime<Utc>>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the capture timestamp of the most recently processed frame.
    pub fn record_frame_time(&self, at: DateTime<Utc>) {
        self.last_frame_at.publish(Some(at));
    }

    /// Merge the three current publications into one snapshot.
    ///
    /// Falls back to the read time when no frame has been processed yet.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            attention: self.attention.read(),
            affect: self.affect.read(),
            gesture: self.gesture.read(),
            captured_at: self.last_frame_at.read().unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_cell_publishes_whole_values() {
        let cell = StateCell::new(AttentionState::default());
        let state = AttentionState {
            is_focused: true,
            eye_aspect_ratio: 0.3,
            gaze_score: 0.8,
            gaze_direction: GazeDirection::Center,
        };
        cell.publish(state);
        assert_eq!(cell.read(), state);
    }

    #[test]
    fn test_snapshot_merges_current_publications() {
        let shared = SharedState::new();
        shared.affect.publish(AffectState {
            emotion: Emotion::Happy,
            confidence: 0.9,
        });
        shared.gesture.publish(GestureState {
            gesture: Gesture::Wave,
            confidence: 1.0,
        });
        let now = Utc::now();
        shared.record_frame_time(now);

        let snapshot = shared.snapshot();
        assert_eq!(snapshot.affect.emotion, Emotion::Happy);
        assert_eq!(snapshot.gesture.gesture, Gesture::Wave);
        assert_eq!(snapshot.captured_at, now);
    }

    #[test]
    fn test_report_field_semantics() {
        let shared = SharedState::new();
        shared.gesture.publish(GestureState {
            gesture: Gesture::ThumbsUp,
            confidence: 0.9,
        });
        let report = shared.snapshot().to_report("sensor-test");

        assert_eq!(report.emotion, "neutral");
        assert_eq!(report.focus, "distracted");
        assert_eq!(report.thumbs_up, "detected");
        assert_eq!(report.wave, "not_detected");
        assert_eq!(report.source, "sensor-test");

        let json = serde_json::to_value(&report).unwrap();
        for field in ["emotion", "focus", "thumbs_up", "wave", "timestamp", "source"] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn test_default_states() {
        assert_eq!(AffectState::default().emotion, Emotion::Neutral);
        assert!((AffectState::default().confidence - 0.7).abs() < 1e-9);
        assert_eq!(GestureState::default().gesture, Gesture::None);
        assert!(!AttentionState::default().is_focused);
    }
}
