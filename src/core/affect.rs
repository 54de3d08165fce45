//! Affect classification from raw emotion score vectors.
//!
//! Raw per-category scores from the external scoring model are biased toward
//! detectability (smiles boosted, neutral dampened), normalized, and reduced
//! to a frame label. Publication is hysteretic: two consecutive matching
//! frame labels adopt a new emotion, except that neutral is escaped
//! immediately. Fast out of neutral, slow between transient emotions.

use crate::core::debounce::{History, Throttle};
use crate::core::snapshot::{AffectState, Emotion};
use crate::perception::types::{EmotionScores, FrameInput};
use chrono::Duration;

/// Label history depth; only the last two entries drive the stability rule.
const HISTORY_CAPACITY: usize = 3;

/// Raw happy score above which a smile is treated as understated and doubled.
const HAPPY_BOOST_THRESHOLD: f64 = 30.0;
const HAPPY_BOOST: f64 = 2.0;
const SAD_SCALE: f64 = 0.7;
const NEUTRAL_SCALE: f64 = 0.9;

/// Normalized-score cutoffs for the frame-level label.
const HAPPY_NORM_THRESHOLD: f64 = 0.5;
const SAD_NORM_THRESHOLD: f64 = 0.4;

/// Stabilizing classifier for emotional affect.
pub struct AffectClassifier {
    throttle: Throttle,
    history: History<Emotion>,
    state: AffectState,
}

impl AffectClassifier {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            throttle: Throttle::new(min_interval),
            history: History::new(HISTORY_CAPACITY),
            state: AffectState::default(),
        }
    }

    /// The last published state.
    pub fn state(&self) -> AffectState {
        self.state
    }

    /// Evaluate one frame and return the (possibly unchanged) published state.
    pub fn process(&mut self, input: &FrameInput) -> AffectState {
        // Emotion scoring needs a usable face region.
        if !input.face_box.is_some_and(|b| b.is_valid()) {
            return self.state;
        }

        if !self.throttle.permit(input.captured_at) {
            return self.state;
        }

        let Some(scores) = input.emotions.as_ref() else {
            // The scoring call failed for this frame. Skip it: no history
            // entry, previous state stands.
            tracing::debug!("emotion scores missing for scored frame, keeping previous state");
            return self.state;
        };

        let (label, confidence) = classify_frame(scores);
        let emotion = self.stabilize(label);

        self.state = AffectState {
            emotion,
            confidence,
        };
        self.state
    }

    /// Push a frame label and apply the 2-of-N adoption rule.
    fn stabilize(&mut self, label: Emotion) -> Emotion {
        self.history.push(label);

        if self.history.len() < 2 {
            return label;
        }

        let last_two: Vec<Emotion> = self.history.last_n(2).copied().collect();
        if last_two[0] == last_two[1] {
            return last_two[1];
        }

        // Disagreeing frames: hold the published emotion, unless we are
        // escaping neutral, which happens on the first non-neutral frame.
        let held = self.state.emotion;
        if held == Emotion::Neutral && label != Emotion::Neutral {
            return label;
        }
        held
    }
}

/// Bias, normalize, and label one frame's raw scores.
///
/// Returns the frame label and its normalized score as confidence.
fn classify_frame(scores: &EmotionScores) -> (Emotion, f64) {
    let mut happy = scores.happy;
    if happy > HAPPY_BOOST_THRESHOLD {
        happy *= HAPPY_BOOST;
    }
    let sad = scores.sad * SAD_SCALE;
    let neutral = scores.neutral * NEUTRAL_SCALE;

    let total = happy + sad + neutral;
    let (happy_norm, sad_norm, neutral_norm) = if total > 0.0 {
        (happy / total, sad / total, neutral / total)
    } else {
        (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0)
    };

    if happy_norm > HAPPY_NORM_THRESHOLD {
        (Emotion::Happy, happy_norm)
    } else if sad_norm > SAD_NORM_THRESHOLD {
        (Emotion::Sad, sad_norm)
    } else {
        (Emotion::Neutral, neutral_norm)
    }
}
