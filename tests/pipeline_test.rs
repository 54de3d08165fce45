//! End-to-end tests for the stabilization pipeline

use chrono::{DateTime, TimeZone, Utc};
use presence_sensor_agent::config::Config;
use presence_sensor_agent::core::{Emotion, Gesture, SharedState};
use presence_sensor_agent::perception::{
    face_landmark, hand_landmark, EmotionScores, FaceBox, FaceGeometry, FrameInput, HandGeometry,
    Landmark,
};
use presence_sensor_agent::pipeline::Pipeline;
use std::sync::Arc;

fn ts(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).unwrap()
}

fn pipeline() -> (Pipeline, Arc<SharedState>) {
    let shared = Arc::new(SharedState::new());
    let pipeline = Pipeline::new(&Config::default(), shared.clone()).expect("valid config");
    (pipeline, shared)
}

/// A front-facing synthetic face: nose centered, symmetric ears and eyes,
/// open eyes well above the blink threshold.
fn front_face() -> FaceGeometry {
    let mut lm = vec![Landmark::default(); 468];
    let mut set = |i: usize, x: f64, y: f64| lm[i] = Landmark::new(x, y, 0.0);

    set(face_landmark::NOSE_TIP, 0.5, 0.5);
    set(face_landmark::FOREHEAD, 0.5, 0.30);
    set(face_landmark::CHIN, 0.5, 0.70);
    set(face_landmark::LEFT_EAR, 0.35, 0.5);
    set(face_landmark::RIGHT_EAR, 0.65, 0.5);

    // Eye corners 0.06 apart, lids 0.018 apart
    set(33, 0.42, 0.45);
    set(160, 0.43, 0.441);
    set(158, 0.46, 0.441);
    set(133, 0.48, 0.45);
    set(153, 0.46, 0.459);
    set(144, 0.43, 0.459);

    set(362, 0.52, 0.45);
    set(385, 0.53, 0.441);
    set(387, 0.56, 0.441);
    set(263, 0.58, 0.45);
    set(373, 0.56, 0.459);
    set(380, 0.53, 0.459);

    FaceGeometry::new(lm)
}

/// A 21-point hand at the given wrist x with per-finger extension flags.
fn hand(wrist_x: f64, extended: [bool; 5]) -> HandGeometry {
    let mut lm = vec![Landmark::default(); 21];
    lm[hand_landmark::WRIST] = Landmark::new(wrist_x, 0.8, 0.0);
    for (i, &(tip, pip)) in hand_landmark::FINGERS.iter().enumerate() {
        let x = wrist_x + 0.04 * i as f64;
        lm[pip] = Landmark::new(x, 0.65, 0.0);
        let tip_y = if extended[i] { 0.55 } else { 0.75 };
        lm[tip] = Landmark::new(x, tip_y, 0.0);
    }
    HandGeometry::new(lm)
}

const THUMB_ONLY: [bool; 5] = [true, false, false, false, false];
const OPEN_PALM: [bool; 5] = [true, true, true, true, true];

#[test]
fn test_sustained_face_reports_focused() {
    let (mut pipeline, shared) = pipeline();

    for i in 0..10 {
        pipeline.process_frame(&FrameInput {
            captured_at: ts(i * 200),
            face: Some(front_face()),
            ..Default::default()
        });
    }

    let report = shared.snapshot().to_report("sensor-test");
    assert_eq!(report.focus, "focused");
}

#[test]
fn test_wave_detected_end_to_end() {
    let (mut pipeline, shared) = pipeline();

    for i in 0..12 {
        let x = if i % 2 == 0 { 0.40 } else { 0.50 };
        pipeline.process_frame(&FrameInput {
            captured_at: ts(i * 60),
            hand: Some(hand(x, OPEN_PALM)),
            ..Default::default()
        });
    }

    let snapshot = shared.snapshot();
    assert_eq!(snapshot.gesture.gesture, Gesture::Wave);
    assert_eq!(snapshot.to_report("sensor-test").wave, "detected");
}

#[test]
fn test_thumbs_up_report_fields() {
    let (mut pipeline, shared) = pipeline();

    pipeline.process_frame(&FrameInput {
        captured_at: ts(0),
        hand: Some(hand(0.5, THUMB_ONLY)),
        ..Default::default()
    });

    let report = shared.snapshot().to_report("sensor-test");
    assert_eq!(report.thumbs_up, "detected");
    assert_eq!(report.wave, "not_detected");
    assert_eq!(report.emotion, "neutral");
    assert_eq!(report.focus, "distracted");
}

#[test]
fn test_happy_frames_adopt_happy_and_hold_through_absence() {
    let (mut pipeline, shared) = pipeline();

    for i in 0..2 {
        pipeline.process_frame(&FrameInput {
            captured_at: ts(i * 500),
            face_box: Some(FaceBox::new(0.2, 0.2, 0.4, 0.4)),
            emotions: Some(EmotionScores::new(70.0, 5.0, 25.0)),
            ..Default::default()
        });
    }
    assert_eq!(shared.snapshot().affect.emotion, Emotion::Happy);

    // With no face in view the last emotion stands
    for i in 0..5 {
        pipeline.process_frame(&FrameInput::empty(ts(1000 + i * 500)));
    }
    assert_eq!(shared.snapshot().affect.emotion, Emotion::Happy);
}

#[test]
fn test_sustained_absence_reaches_terminal_states() {
    let (mut pipeline, shared) = pipeline();

    // Build up activity: focused face and a held thumbs-up
    for i in 0..10 {
        pipeline.process_frame(&FrameInput {
            captured_at: ts(i * 200),
            face: Some(front_face()),
            hand: Some(hand(0.5, THUMB_ONLY)),
            ..Default::default()
        });
    }
    let snapshot = shared.snapshot();
    assert!(snapshot.attention.is_focused);
    assert_eq!(snapshot.gesture.gesture, Gesture::ThumbsUp);

    // Then a long stretch of empty frames
    let base = 10 * 200;
    for i in 0..15 {
        pipeline.process_frame(&FrameInput::empty(ts(base + i * 200)));
    }

    let snapshot = shared.snapshot();
    assert!(!snapshot.attention.is_focused);
    assert_eq!(snapshot.gesture.gesture, Gesture::None);
    // Affect keeps its default; it was never scored
    assert_eq!(snapshot.affect.emotion, Emotion::Neutral);
}

#[test]
fn test_report_wire_format() {
    let (mut pipeline, shared) = pipeline();
    pipeline.process_frame(&FrameInput::empty(ts(0)));

    let report = shared.snapshot().to_report("sensor-abc123");
    let json = serde_json::to_value(&report).expect("serializable");

    assert_eq!(json["emotion"], "neutral");
    assert_eq!(json["focus"], "distracted");
    assert_eq!(json["thumbs_up"], "not_detected");
    assert_eq!(json["wave"], "not_detected");
    assert_eq!(json["source"], "sensor-abc123");
    assert_eq!(json["timestamp"], ts(0).to_rfc3339());
}

#[cfg(feature = "server")]
mod server_tests {
    use super::*;
    use presence_sensor_agent::server::{run, ServerConfig};
    use std::time::Duration;

    #[tokio::test]
    async fn test_health_endpoint() {
        let shared = Arc::new(SharedState::new());
        let config = ServerConfig::new(0, "http://localhost:9999/api/cv-event");

        let (addr, shutdown_tx) = run(config, shared).await.expect("Failed to start server");

        // Give server time to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert!(body["version"].as_str().is_some());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_state_endpoint_reflects_published_state() {
        let shared = Arc::new(SharedState::new());
        let config = ServerConfig::new(0, "http://localhost:9999/api/cv-event");

        let (addr, shutdown_tx) =
            run(config, shared.clone()).await.expect("Failed to start server");
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Publish a thumbs-up through the pipeline
        let mut pipeline = Pipeline::new(&Config::default(), shared).expect("valid config");
        pipeline.process_frame(&FrameInput {
            captured_at: ts(0),
            hand: Some(hand(0.5, THUMB_ONLY)),
            ..Default::default()
        });

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/api/state", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["thumbs_up"], "detected");
        assert_eq!(body["wave"], "not_detected");
        assert!(body["source"].as_str().unwrap_or("").starts_with("sensor-"));

        let _ = shutdown_tx.send(());
    }
}
