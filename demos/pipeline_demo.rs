//! Demonstration of the Presence Sensor Agent stabilization pipeline.
//!
//! This example shows how to:
//! 1. Build a pipeline from the default configuration
//! 2. Push synthetic frames through a frame source
//! 3. Watch the published states converge and decay
//! 4. Flatten a snapshot into the reporting wire format
//!
//! Run with: cargo run --example pipeline_demo
//!
//! No camera or detection models are needed; frames are synthesized.

use chrono::{Duration as ChronoDuration, Utc};
use presence_sensor_agent::{
    config::Config,
    core::SharedState,
    perception::{
        face_landmark, hand_landmark, FaceGeometry, FrameInput, FrameSource, HandGeometry,
        Landmark, NoopFrameSource,
    },
    pipeline::Pipeline,
    PRIVACY_DECLARATION,
};
use std::sync::Arc;

fn main() {
    println!("Presence Sensor Agent - Pipeline Demo");
    println!("=====================================");
    println!();
    println!("{PRIVACY_DECLARATION}");
    println!();

    let config = Config::default();
    let shared = Arc::new(SharedState::new());
    let mut pipeline = match Pipeline::new(&config, shared.clone()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error building pipeline: {e}");
            return;
        }
    };

    let mut source = NoopFrameSource::new();
    let sender = source.sender();
    if let Err(e) = source.start() {
        eprintln!("Error starting source: {e}");
        return;
    }

    let start = Utc::now();
    let at = |millis: i64| start + ChronoDuration::milliseconds(millis);

    // Phase 1: two seconds of a front-facing, open-eyed face
    println!("Phase 1: attentive face for 2s");
    for i in 0..10 {
        let frame = FrameInput {
            captured_at: at(i * 200),
            face: Some(front_face()),
            ..Default::default()
        };
        let _ = sender.send(Ok(frame));
    }

    // Phase 2: a waving open palm
    println!("Phase 2: waving hand");
    for i in 0..12 {
        let x = if i % 2 == 0 { 0.40 } else { 0.50 };
        let frame = FrameInput {
            captured_at: at(2000 + i * 60),
            hand: Some(open_palm(x)),
            ..Default::default()
        };
        let _ = sender.send(Ok(frame));
    }

    // Phase 3: nobody in view
    println!("Phase 3: empty frames");
    for i in 0..15 {
        let _ = sender.send(Ok(FrameInput::empty(at(4000 + i * 200))));
    }

    // Drain everything we queued
    while let Ok(result) = source.receiver().try_recv() {
        match result {
            Ok(frame) => {
                pipeline.process_frame(&frame);
                let snapshot = shared.snapshot();
                println!(
                    "  [{}] focus={} emotion={} gesture={:?}",
                    frame.captured_at.format("%H:%M:%S%.3f"),
                    snapshot.attention.is_focused,
                    snapshot.affect.emotion.as_str(),
                    snapshot.gesture.gesture,
                );
            }
            Err(e) => eprintln!("  frame error: {e}"),
        }
    }

    source.stop();

    // Final report as it would go over the wire
    println!();
    println!("Final report:");
    let report = shared.snapshot().to_report("sensor-demo");
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error serializing report: {e}"),
    }
    println!();
    println!("Demo complete!");
}

/// A front-facing synthetic face with open eyes.
fn front_face() -> FaceGeometry {
    let mut lm = vec![Landmark::default(); 468];
    let mut set = |i: usize, x: f64, y: f64| lm[i] = Landmark::new(x, y, 0.0);

    set(face_landmark::NOSE_TIP, 0.5, 0.5);
    set(face_landmark::FOREHEAD, 0.5, 0.30);
    set(face_landmark::CHIN, 0.5, 0.70);
    set(face_landmark::LEFT_EAR, 0.35, 0.5);
    set(face_landmark::RIGHT_EAR, 0.65, 0.5);

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

/// An open palm at the given wrist x, all five fingers extended.
fn open_palm(wrist_x: f64) -> HandGeometry {
    let mut lm = vec![Landmark::default(); 21];
    lm[hand_landmark::WRIST] = Landmark::new(wrist_x, 0.8, 0.0);
    for (i, &(tip, pip)) in hand_landmark::FINGERS.iter().enumerate() {
        let x = wrist_x + 0.04 * i as f64;
        lm[pip] = Landmark::new(x, 0.65, 0.0);
        lm[tip] = Landmark::new(x, 0.55, 0.0);
    }
    HandGeometry::new(lm)
}
