//! Presence Sensor Agent - webcam perception stabilization for ambient apps.
//!
//! This library turns noisy per-frame face, emotion, and hand detections into
//! slow-changing presence states an application can react to directly:
//! focused/distracted attention, a stabilized emotion, and discrete hand
//! gestures (thumbs-up, peace, wave).
//!
//! # Privacy Guarantees
//!
//! - **No frames leave the device**: only coarse state labels are reported
//! - **No identity**: no face recognition, embeddings, or images are stored
//! - **No raw landmarks**: per-frame geometry is discarded after classification
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Presence Sensor Agent                     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌──────────────────────┐                  │
//! │  │ FrameSource │──▶│       Pipeline       │                  │
//! │  │ (landmarks, │   │ attention / affect / │                  │
//! │  │  emotions)  │   │       gesture        │                  │
//! │  └─────────────┘   └──────────┬───────────┘                  │
//! │                               ▼                              │
//! │                       ┌──────────────┐    ┌──────────────┐   │
//! │                       │ SharedState  │───▶│   Reporter   │   │
//! │                       │  (snapshot)  │    │  / Server    │   │
//! │                       └──────────────┘    └──────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use presence_sensor_agent::config::Config;
//! use presence_sensor_agent::core::SharedState;
//! use presence_sensor_agent::pipeline::Pipeline;
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let shared = Arc::new(SharedState::new());
//! let mut pipeline = Pipeline::new(&config, shared.clone()).expect("valid config");
//!
//! // Frames from a FrameSource are fed through pipeline.process_frame();
//! // shared.snapshot() can be read from any thread.
//! ```

pub mod config;
pub mod core;
pub mod perception;
pub mod pipeline;

#[cfg(feature = "reporter")]
pub mod reporter;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use config::Config;
pub use core::{
    AffectClassifier, AttentionClassifier, GestureClassifier, Report, SharedState, Snapshot,
};
pub use perception::{FrameInput, FrameSource, NoopFrameSource};
pub use pipeline::Pipeline;

// Reporter re-exports (when enabled)
#[cfg(feature = "reporter")]
pub use reporter::{BlockingReporterClient, ReporterClient, ReporterConfig, ReporterError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║          PRESENCE SENSOR AGENT - PRIVACY DECLARATION             ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This agent derives coarse presence states from the webcam.      ║
║                                                                  ║
║  ✓ WHAT WE REPORT:                                               ║
║    • Whether you appear focused or distracted                    ║
║    • A coarse emotion label (happy, sad, neutral)                ║
║    • Discrete hand gestures (thumbs-up, peace, wave)             ║
║                                                                  ║
║  ✗ WHAT WE NEVER STORE OR TRANSMIT:                              ║
║    • Camera frames or any image content                          ║
║    • Face identity, embeddings, or recognition data              ║
║    • Raw landmark geometry beyond the current frame              ║
║                                                                  ║
║  All processing happens locally. Only the coarse state labels    ║
║  above ever leave this device.                                   ║
║                                                                  ║
║  You can view the current state anytime with:                    ║
║    presence-sensor status                                        ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
