//! Per-frame perception input types.
//!
//! These types carry the already-resolved output of the external landmark and
//! emotion models for a single frame. Absence of a face or hand is a value,
//! never an error: classifiers treat missing geometry as a no-detection signal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single normalized landmark point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another landmark in the x/y plane.
    pub fn distance_2d(&self, other: &Landmark) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Full 3-D Euclidean distance to another landmark.
    pub fn distance(&self, other: &Landmark) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Face mesh landmark indices used by the attention classifier.
///
/// Indices follow the MediaPipe face mesh ordering produced by the external
/// landmark model.
pub mod face_landmark {
    pub const NOSE_TIP: usize = 1;
    pub const FOREHEAD: usize = 10;
    pub const CHIN: usize = 152;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const RIGHT_EYE_OUTER: usize = 263;
    pub const LEFT_EAR: usize = 234;
    pub const RIGHT_EAR: usize = 454;

    /// Six ordered landmarks per eye: outer corner, two upper-lid points,
    /// inner corner, two lower-lid points.
    pub const LEFT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];
    pub const RIGHT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];
}

/// Hand landmark indices used by the gesture classifier.
///
/// Indices follow the 21-point MediaPipe hand model ordering.
pub mod hand_landmark {
    pub const WRIST: usize = 0;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;

    /// Finger (tip, proximal joint) pairs in thumb-to-pinky order.
    pub const FINGERS: [(usize, usize); 5] = [
        (THUMB_TIP, THUMB_IP),
        (INDEX_TIP, INDEX_PIP),
        (MIDDLE_TIP, MIDDLE_PIP),
        (RING_TIP, RING_PIP),
        (PINKY_TIP, PINKY_PIP),
    ];
}

/// Ordered face mesh landmarks for one detected face.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaceGeometry {
    pub landmarks: Vec<Landmark>,
}

impl FaceGeometry {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Get a landmark by mesh index.
    pub fn landmark(&self, index: usize) -> Option<Landmark> {
        self.landmarks.get(index).copied()
    }

    /// Whether the geometry carries every landmark the attention classifier
    /// reads. A truncated mesh is treated as no-detection rather than being
    /// indexed out of bounds.
    pub fn has_attention_landmarks(&self) -> bool {
        use face_landmark::*;
        let mut required = vec![NOSE_TIP, FOREHEAD, CHIN, LEFT_EAR, RIGHT_EAR];
        required.extend_from_slice(&LEFT_EYE);
        required.extend_from_slice(&RIGHT_EYE);
        required.into_iter().all(|i| i < self.landmarks.len())
    }
}

/// Ordered hand landmarks for one detected hand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandGeometry {
    pub landmarks: Vec<Landmark>,
}

impl HandGeometry {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    pub fn landmark(&self, index: usize) -> Option<Landmark> {
        self.landmarks.get(index).copied()
    }

    /// Whether all 21 hand-model landmarks are present.
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() > hand_landmark::PINKY_TIP
    }
}

/// Raw per-category emotion scores from the external scoring model.
///
/// Scores are DeepFace-style percentages. Categories beyond the three the
/// affect classifier fuses are preserved in `extra` for diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmotionScores {
    #[serde(default)]
    pub happy: f64,
    #[serde(default)]
    pub sad: f64,
    #[serde(default)]
    pub neutral: f64,
    #[serde(flatten, default)]
    pub extra: HashMap<String, f64>,
}

impl EmotionScores {
    pub fn new(happy: f64, sad: f64, neutral: f64) -> Self {
        Self {
            happy,
            sad,
            neutral,
            extra: HashMap::new(),
        }
    }
}

/// Relative bounding box of the detected face within the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FaceBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A degenerate box (zero or negative extent) carries no usable face
    /// region for emotion scoring.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Everything the external detection models resolved for one frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameInput {
    /// Capture timestamp of the frame
    pub captured_at: DateTime<Utc>,
    /// Face mesh landmarks, if a face was detected
    pub face: Option<FaceGeometry>,
    /// Bounding box of the detected face
    pub face_box: Option<FaceBox>,
    /// Raw emotion score vector for the face region
    pub emotions: Option<EmotionScores>,
    /// Hand landmarks, if a hand was detected
    pub hand: Option<HandGeometry>,
}

impl FrameInput {
    /// An empty frame (nothing detected) at the given timestamp.
    pub fn empty(captured_at: DateTime<Utc>) -> Self {
        Self {
            captured_at,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_distance() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(3.0, 4.0, 0.0);
        assert!((a.distance_2d(&b) - 5.0).abs() < 1e-9);
        assert!((a.distance(&b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_truncated_face_mesh_is_incomplete() {
        let face = FaceGeometry::new(vec![Landmark::default(); 100]);
        assert!(!face.has_attention_landmarks());

        let face = FaceGeometry::new(vec![Landmark::default(); 468]);
        assert!(face.has_attention_landmarks());
    }

    #[test]
    fn test_hand_completeness() {
        assert!(!HandGeometry::new(vec![Landmark::default(); 10]).is_complete());
        assert!(HandGeometry::new(vec![Landmark::default(); 21]).is_complete());
    }

    #[test]
    fn test_face_box_validity() {
        assert!(FaceBox::new(0.1, 0.1, 0.5, 0.5).is_valid());
        assert!(!FaceBox::new(0.1, 0.1, 0.0, 0.5).is_valid());
        assert!(!FaceBox::new(0.1, 0.1, 0.5, -1.0).is_valid());
    }

    #[test]
    fn test_emotion_scores_deserialize_missing_categories() {
        let scores: EmotionScores = serde_json::from_str(r#"{"happy": 42.0}"#).unwrap();
        assert_eq!(scores.happy, 42.0);
        assert_eq!(scores.sad, 0.0);
        assert_eq!(scores.neutral, 0.0);
    }
}
