//! Attention classification from face mesh geometry.
//!
//! Per-frame signals are the averaged eye aspect ratio (EAR) of both eyes and
//! a five-component weighted gaze score. A frame counts as "looking at the
//! screen" when both clear their thresholds and the gaze is not upward; the
//! published focus flag is a majority vote over the last ten evaluated
//! frames, which suppresses blink- and jitter-level flicker.

use crate::core::debounce::{History, Throttle};
use crate::core::snapshot::{AttentionState, GazeDirection};
use crate::perception::types::{face_landmark, FaceGeometry, FrameInput, Landmark};
use chrono::Duration;

/// Minimum averaged EAR for an open-eyed frame.
const MIN_EYE_ASPECT_RATIO: f64 = 0.18;
/// Minimum gaze score for a frame to count as looking at the screen.
const GAZE_SCORE_THRESHOLD: f64 = 0.60;
/// Fraction of looking frames in the history required for focus.
const FOCUS_FRACTION: f64 = 0.7;
/// Rolling vote window over per-frame looking flags.
const HISTORY_CAPACITY: usize = 10;
/// Multiples of the evaluation interval after which silence reads as distraction.
const SILENCE_FACTOR: i32 = 3;

// Gaze fusion weights and thresholds. These are tuned as a set; changing one
// shifts the meaning of the 0.60 score threshold above.
const VERTICAL_GAZE_WEIGHT: f64 = 2.5;
const UPWARD_WEIGHT_BOOST: f64 = 1.5;
const HORIZONTAL_GAZE_WEIGHT: f64 = 2.0;
const CENTER_WEIGHT: f64 = 2.5;
const DOWNWARD_RATIO_THRESHOLD: f64 = 0.60;
const UPWARD_RATIO_THRESHOLD: f64 = 0.43;
const DOWNWARD_SCORE_FLOOR: f64 = 0.25;
const UPWARD_SCORE_FLOOR: f64 = 0.18;

/// Gaze score and coarse direction for a single frame.
#[derive(Debug, Clone, Copy)]
struct GazeEstimate {
    score: f64,
    direction: GazeDirection,
}

/// Stabilizing classifier for attention focus.
pub struct AttentionClassifier {
    throttle: Throttle,
    history: History<bool>,
    state: AttentionState,
}

impl AttentionClassifier {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            throttle: Throttle::new(min_interval),
            history: History::new(HISTORY_CAPACITY),
            state: AttentionState::default(),
        }
    }

    /// The last published state.
    pub fn state(&self) -> AttentionState {
        self.state
    }

    /// Evaluate one frame and return the (possibly unchanged) published state.
    pub fn process(&mut self, input: &FrameInput) -> AttentionState {
        let now = input.captured_at;

        let face = input
            .face
            .as_ref()
            .filter(|f| f.has_attention_landmarks());

        let Some(face) = face else {
            // Prolonged absence reads as distraction: once no real evaluation
            // has happened for 3x the interval, each further silent frame
            // votes against focus. EAR and gaze keep their last values.
            if let Some(elapsed) = self.throttle.elapsed_since_last(now) {
                if elapsed > self.throttle.min_interval() * SILENCE_FACTOR {
                    self.history.push(false);
                    self.state.is_focused = self.history.true_fraction() >= FOCUS_FRACTION;
                }
            }
            return self.state;
        };

        if !self.throttle.permit(now) {
            return self.state;
        }

        let left_ear = eye_aspect_ratio(face, &face_landmark::LEFT_EYE);
        let right_ear = eye_aspect_ratio(face, &face_landmark::RIGHT_EYE);
        let avg_ear = (left_ear + right_ear) / 2.0;

        let gaze = estimate_gaze(face);

        let is_looking = avg_ear > MIN_EYE_ASPECT_RATIO
            && gaze.score > GAZE_SCORE_THRESHOLD
            && gaze.direction != GazeDirection::Up;

        self.history.push(is_looking);

        self.state = AttentionState {
            is_focused: self.history.true_fraction() >= FOCUS_FRACTION,
            eye_aspect_ratio: avg_ear,
            gaze_score: gaze.score,
            gaze_direction: gaze.direction,
        };
        self.state
    }
}

/// EAR from six ordered eye landmarks: (|p1-p5| + |p2-p4|) / (2 * |p0-p3|).
///
/// A degenerate eye (zero inter-corner distance) yields 0 rather than an
/// error, which reads as a closed eye downstream.
fn eye_aspect_ratio(face: &FaceGeometry, indices: &[usize; 6]) -> f64 {
    let p: Vec<Landmark> = indices
        .iter()
        .map(|&i| face.landmark(i).unwrap_or_default())
        .collect();

    let v1 = p[1].distance(&p[5]);
    let v2 = p[2].distance(&p[4]);
    let h = p[0].distance(&p[3]);

    if h == 0.0 {
        return 0.0;
    }
    (v1 + v2) / (2.0 * h)
}

/// Fuse five normalized sub-scores into a gaze score and derive a direction.
fn estimate_gaze(face: &FaceGeometry) -> GazeEstimate {
    use face_landmark::*;

    let l = |i: usize| face.landmark(i).unwrap_or_default();
    let nose = l(NOSE_TIP);
    let left_eye = l(LEFT_EYE_OUTER);
    let right_eye = l(RIGHT_EYE_OUTER);
    let chin = l(CHIN);
    let forehead = l(FOREHEAD);
    let left_ear_point = l(LEFT_EAR);
    let right_ear_point = l(RIGHT_EAR);

    let nose_offset_x = (nose.x - 0.5).abs();
    let nose_offset_y = (nose.y - 0.5).abs();

    let left_eye_dist = nose.distance_2d(&left_eye);
    let right_eye_dist = nose.distance_2d(&right_eye);

    let ear_ratio =
        nose.distance_2d(&left_ear_point) / nose.distance_2d(&right_ear_point).max(1e-6);
    let mut horizontal_score = 1.0 - ((ear_ratio - 1.0).abs() * HORIZONTAL_GAZE_WEIGHT).min(1.0);

    let symmetry_score = 1.0 - ((left_eye_dist - right_eye_dist).abs() * 10.0).min(1.0);

    let eye_level_score = 1.0 - ((left_eye.y - right_eye.y).abs() * 20.0).min(1.0);

    let center_score = 1.0 - ((nose_offset_x + nose_offset_y) * CENTER_WEIGHT).min(1.0);

    // Head pitch: where the nose tip sits between forehead and chin.
    let vertical_ratio = (nose.y - forehead.y) / (chin.y - forehead.y).max(0.001);

    // Eyes above the forehead landmark is a strong upward-gaze signal.
    let eye_center_y = (left_eye.y + right_eye.y) / 2.0;
    let eyes_above_forehead = eye_center_y < forehead.y;

    let mut vertical_gaze_score = 1.0;
    if vertical_ratio > DOWNWARD_RATIO_THRESHOLD {
        let downward = (vertical_ratio - DOWNWARD_RATIO_THRESHOLD) / 0.40;
        vertical_gaze_score = (1.0 - downward * VERTICAL_GAZE_WEIGHT).max(0.0);
        if vertical_gaze_score < DOWNWARD_SCORE_FLOOR {
            vertical_gaze_score = 0.0;
        }
    } else if vertical_ratio < UPWARD_RATIO_THRESHOLD {
        let upward = (UPWARD_RATIO_THRESHOLD - vertical_ratio) / UPWARD_RATIO_THRESHOLD;
        vertical_gaze_score = (1.0 - upward * (VERTICAL_GAZE_WEIGHT * UPWARD_WEIGHT_BOOST)).max(0.0);
        if vertical_gaze_score < UPWARD_SCORE_FLOOR || eyes_above_forehead {
            vertical_gaze_score = 0.0;
        }
    }

    if nose_offset_x > 0.15 {
        horizontal_score *= 0.5;
    }

    let score = center_score * 0.25
        + symmetry_score * 0.05
        + horizontal_score * 0.30
        + eye_level_score * 0.05
        + vertical_gaze_score * 0.35;

    let direction = if vertical_ratio > DOWNWARD_RATIO_THRESHOLD {
        GazeDirection::Down
    } else if vertical_ratio < UPWARD_RATIO_THRESHOLD || eyes_above_forehead {
        GazeDirection::Up
    } else if ear_ratio < 0.80 {
        GazeDirection::Right
    } else if ear_ratio > 1.20 {
        GazeDirection::Left
    } else {
        GazeDirection::Center
    };

    GazeEstimate { score, direction }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::types::FrameInput;
    use chrono::{TimeZone, Utc};

    fn ts(millis: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn set(landmarks: &mut [Landmark], index: usize, x: f64, y: f64) {
        landmarks[index] = Landmark::new(x, y, 0.0);
    }

    /// A front-facing synthetic face: nose centered, symmetric ears and eyes,
    /// vertical ratio 0.5, per-eye EAR 0.30.
    fn front_face() -> FaceGeometry {
        let mut lm = vec![Landmark::default(); 468];
        set(&mut lm, face_landmark::NOSE_TIP, 0.5, 0.5);
        set(&mut lm, face_landmark::FOREHEAD, 0.5, 0.30);
        set(&mut lm, face_landmark::CHIN, 0.5, 0.70);
        set(&mut lm, face_landmark::LEFT_EAR, 0.35, 0.5);
        set(&mut lm, face_landmark::RIGHT_EAR, 0.65, 0.5);

        // Left eye: corners 0.06 apart, lids 0.018 apart -> EAR 0.30
        set(&mut lm, 33, 0.42, 0.45);
        set(&mut lm, 160, 0.43, 0.441);
        set(&mut lm, 158, 0.46, 0.441);
        set(&mut lm, 133, 0.48, 0.45);
        set(&mut lm, 153, 0.46, 0.459);
        set(&mut lm, 144, 0.43, 0.459);

        // Right eye, mirrored
        set(&mut lm, 362, 0.52, 0.45);
        set(&mut lm, 385, 0.53, 0.441);
        set(&mut lm, 387, 0.56, 0.441);
        set(&mut lm, 263, 0.58, 0.45);
        set(&mut lm, 373, 0.56, 0.459);
        set(&mut lm, 380, 0.53, 0.459);

        FaceGeometry::new(lm)
    }

    /// Same face with both eyes collapsed to a point: EAR denominator is 0.
    fn closed_eyes_face() -> FaceGeometry {
        let mut face = front_face();
        for &i in face_landmark::LEFT_EYE.iter() {
            face.landmarks[i] = Landmark::new(0.45, 0.45, 0.0);
        }
        for &i in face_landmark::RIGHT_EYE.iter() {
            face.landmarks[i] = Landmark::new(0.55, 0.45, 0.0);
        }
        face
    }

    fn face_frame(millis: i64, face: FaceGeometry) -> FrameInput {
        FrameInput {
            captured_at: ts(millis),
            face: Some(face),
            ..Default::default()
        }
    }

    #[test]
    fn test_ear_formula() {
        let ear = eye_aspect_ratio(&front_face(), &face_landmark::LEFT_EYE);
        assert!((ear - 0.30).abs() < 1e-9, "unexpected EAR {ear}");
    }

    #[test]
    fn test_degenerate_eye_yields_zero_ear() {
        let ear = eye_aspect_ratio(&closed_eyes_face(), &face_landmark::LEFT_EYE);
        assert_eq!(ear, 0.0);

        // A zero-EAR frame never votes for focus
        let mut classifier = AttentionClassifier::new(chrono::Duration::milliseconds(150));
        let state = classifier.process(&face_frame(0, closed_eyes_face()));
        assert_eq!(state.eye_aspect_ratio, 0.0);
        assert!(!state.is_focused);
    }

    #[test]
    fn test_front_face_scores_center() {
        let gaze = estimate_gaze(&front_face());
        assert_eq!(gaze.direction, GazeDirection::Center);
        assert!(gaze.score > 0.95, "front face should score high: {}", gaze.score);
    }

    #[test]
    fn test_upward_pitch_is_never_looking() {
        let mut face = front_face();
        // Nose high between forehead and chin: vertical ratio 0.25
        set(&mut face.landmarks, face_landmark::NOSE_TIP, 0.5, 0.40);
        let gaze = estimate_gaze(&face);
        assert_eq!(gaze.direction, GazeDirection::Up);

        let mut classifier = AttentionClassifier::new(chrono::Duration::milliseconds(150));
        for i in 0..10 {
            classifier.process(&face_frame(i * 200, face.clone()));
        }
        assert!(!classifier.state().is_focused);
    }

    #[test]
    fn test_downward_pitch_direction() {
        let mut face = front_face();
        set(&mut face.landmarks, face_landmark::NOSE_TIP, 0.5, 0.56);
        let gaze = estimate_gaze(&face);
        assert_eq!(gaze.direction, GazeDirection::Down);
    }

    #[test]
    fn test_turned_head_direction() {
        let mut face = front_face();
        // Nose closer to the right ear: ear ratio > 1.2 reads as looking left
        set(&mut face.landmarks, face_landmark::LEFT_EAR, 0.30, 0.5);
        set(&mut face.landmarks, face_landmark::RIGHT_EAR, 0.58, 0.5);
        let gaze = estimate_gaze(&face);
        assert_eq!(gaze.direction, GazeDirection::Left);
    }

    #[test]
    fn test_focus_requires_majority_of_window() {
        let mut classifier = AttentionClassifier::new(chrono::Duration::milliseconds(150));

        // 3 closed-eye frames then 7 looking frames: fraction exactly 0.7
        for i in 0..3 {
            classifier.process(&face_frame(i * 200, closed_eyes_face()));
        }
        for i in 3..10 {
            classifier.process(&face_frame(i * 200, front_face()));
        }
        assert!(classifier.state().is_focused);

        // 7 closed, 3 looking: fraction 0.3
        let mut classifier = AttentionClassifier::new(chrono::Duration::milliseconds(150));
        for i in 0..7 {
            classifier.process(&face_frame(i * 200, closed_eyes_face()));
        }
        for i in 7..10 {
            classifier.process(&face_frame(i * 200, front_face()));
        }
        assert!(!classifier.state().is_focused);
    }

    #[test]
    fn test_sustained_front_face_focuses() {
        let mut classifier = AttentionClassifier::new(chrono::Duration::milliseconds(150));
        let mut state = AttentionState::default();
        for i in 0..10 {
            state = classifier.process(&face_frame(i * 200, front_face()));
        }
        assert!(state.is_focused);
        assert_eq!(state.gaze_direction, GazeDirection::Center);
        assert!((state.eye_aspect_ratio - 0.30).abs() < 1e-9);
        assert!(state.gaze_score > 0.60);
    }

    #[test]
    fn test_rate_limit_skips_close_frames() {
        let mut classifier = AttentionClassifier::new(chrono::Duration::milliseconds(150));
        classifier.process(&face_frame(0, front_face()));
        // 100ms later: inside the interval, state unchanged, no history vote
        let before = classifier.state();
        let after = classifier.process(&face_frame(100, closed_eyes_face()));
        assert_eq!(before, after);
    }

    #[test]
    fn test_prolonged_absence_decays_focus() {
        let mut classifier = AttentionClassifier::new(chrono::Duration::milliseconds(150));
        for i in 0..10 {
            classifier.process(&face_frame(i * 200, front_face()));
        }
        assert!(classifier.state().is_focused);

        // Silent frames: nothing happens until 3x the interval has elapsed,
        // then every silent frame votes against focus.
        let base = 10 * 200;
        for i in 0..13 {
            classifier.process(&FrameInput::empty(ts(base + i * 200)));
        }
        let state = classifier.state();
        assert!(!state.is_focused);
        // Last measured EAR is retained, not zeroed
        assert!((state.eye_aspect_ratio - 0.30).abs() < 1e-9);
    }

    #[test]
    fn test_truncated_mesh_treated_as_absence() {
        let mut classifier = AttentionClassifier::new(chrono::Duration::milliseconds(150));
        let short = FaceGeometry::new(vec![Landmark::default(); 50]);
        let state = classifier.process(&face_frame(0, short));
        assert_eq!(state, AttentionState::default());
    }
}
