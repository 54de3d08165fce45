//! Gesture classification from hand landmarks.
//!
//! Static poses (thumbs-up, peace) are rule-based on extended-finger counts
//! and tip positions. The dynamic wave gesture counts direction reversals of
//! the wrist x-coordinate over a sliding window. Once a discrete gesture
//! fires it is held for a lockout interval so a single detection stays
//! visible instead of flickering.

use crate::core::debounce::{History, Throttle};
use crate::core::snapshot::{Gesture, GestureState};
use crate::perception::types::{hand_landmark, FrameInput, HandGeometry};
use chrono::{DateTime, Duration, Utc};

/// Sliding window of wrist x-positions for wave detection.
const X_HISTORY_CAPACITY: usize = 12;
/// Minimum peak-to-peak wrist travel for a wave.
const WAVE_MOVEMENT_THRESHOLD: f64 = 0.05;
/// Minimum accumulated direction reversals for a wave.
const WAVE_REVERSAL_THRESHOLD: u32 = 3;
/// Minimum horizontal separation between index and middle tips for peace.
const PEACE_SEPARATION: f64 = 0.03;
const STATIC_GESTURE_CONFIDENCE: f64 = 0.9;

/// Stabilizing classifier for discrete hand gestures.
pub struct GestureClassifier {
    throttle: Throttle,
    hold_duration: Duration,
    x_history: History<f64>,
    direction_changes: u32,
    last_direction: Option<i8>,
    last_fired_at: Option<DateTime<Utc>>,
    state: GestureState,
}

impl GestureClassifier {
    pub fn new(min_interval: Duration, hold_duration: Duration) -> Self {
        Self {
            throttle: Throttle::new(min_interval),
            hold_duration,
            x_history: History::new(X_HISTORY_CAPACITY),
            direction_changes: 0,
            last_direction: None,
            last_fired_at: None,
            state: GestureState::default(),
        }
    }

    /// The last published state.
    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Evaluate one frame and return the (possibly unchanged) published state.
    pub fn process(&mut self, input: &FrameInput) -> GestureState {
        let now = input.captured_at;

        // A freshly fired discrete gesture is held without re-evaluation,
        // even through hand-absent frames, until the lockout elapses.
        if self.state.gesture.is_discrete() {
            if let Some(fired_at) = self.last_fired_at {
                if now - fired_at < self.hold_duration {
                    return self.state;
                }
            }
        }

        let hand = input.hand.as_ref().filter(|h| h.is_complete());
        let Some(hand) = hand else {
            // No debounce on absence: wipe the motion state immediately.
            self.x_history.clear();
            self.direction_changes = 0;
            self.last_direction = None;
            self.state = GestureState {
                gesture: Gesture::None,
                confidence: 0.0,
            };
            return self.state;
        };

        if !self.throttle.permit(now) {
            return self.state;
        }

        let result = self.recognize(hand);
        if result.gesture.is_discrete() {
            self.last_fired_at = Some(now);
        }
        self.state = result;
        self.state
    }

    /// Evaluate static poses then the wave window, in priority order.
    fn recognize(&mut self, hand: &HandGeometry) -> GestureState {
        use hand_landmark::*;

        let l = |i: usize| hand.landmark(i).unwrap_or_default();
        let wrist = l(WRIST);
        let thumb_tip = l(THUMB_TIP);
        let index_tip = l(INDEX_TIP);
        let middle_tip = l(MIDDLE_TIP);

        self.x_history.push(wrist.x);

        let extended = extended_fingers(hand);
        let extended_count = extended.iter().filter(|&&e| e).count();

        // Thumbs-up: the thumb alone, pointing above the wrist
        if extended_count == 1 && extended[0] && thumb_tip.y < wrist.y {
            return GestureState {
                gesture: Gesture::ThumbsUp,
                confidence: STATIC_GESTURE_CONFIDENCE,
            };
        }

        // Peace: index and middle alone, both above the wrist and spread apart
        if extended_count == 2
            && extended[1]
            && extended[2]
            && index_tip.y < wrist.y
            && middle_tip.y < wrist.y
            && (index_tip.x - middle_tip.x).abs() > PEACE_SEPARATION
        {
            return GestureState {
                gesture: Gesture::Peace,
                confidence: STATIC_GESTURE_CONFIDENCE,
            };
        }

        // Wave: open hand oscillating horizontally across a full window
        if self.x_history.is_full() && extended_count >= 4 {
            let xs: Vec<f64> = self.x_history.iter().copied().collect();
            for pair in xs.windows(2) {
                let direction: i8 = if pair[1] > pair[0] { 1 } else { -1 };
                if let Some(last) = self.last_direction {
                    if direction != last {
                        self.direction_changes += 1;
                    }
                }
                self.last_direction = Some(direction);
            }

            let max = xs.iter().cloned().fold(f64::MIN, f64::max);
            let min = xs.iter().cloned().fold(f64::MAX, f64::min);
            let total_movement = max - min;

            if total_movement > WAVE_MOVEMENT_THRESHOLD
                && self.direction_changes >= WAVE_REVERSAL_THRESHOLD
            {
                let confidence = (0.5 * (total_movement / WAVE_MOVEMENT_THRESHOLD)
                    + 0.5 * (self.direction_changes as f64 / WAVE_REVERSAL_THRESHOLD as f64))
                    .min(1.0);
                self.direction_changes = 0;
                return GestureState {
                    gesture: Gesture::Wave,
                    confidence: (confidence * 100.0).round() / 100.0,
                };
            }
        }

        GestureState {
            gesture: Gesture::HandDetected,
            confidence: 1.0,
        }
    }
}

/// Per-finger extension flags in thumb-to-pinky order.
///
/// A finger is extended when its tip sits above (numerically below) its
/// proximal joint in normalized image coordinates.
fn extended_fingers(hand: &HandGeometry) -> [bool; 5] {
    let mut extended = [false; 5];
    for (i, &(tip, pip)) in hand_landmark::FINGERS.iter().enumerate() {
        let tip = hand.landmark(tip).unwrap_or_default();
        let pip = hand.landmark(pip).unwrap_or_default();
        extended[i] = tip.y < pip.y;
    }
    extended
}
