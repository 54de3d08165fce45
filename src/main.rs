//! Presence Sensor Agent CLI
//!
//! Webcam perception stabilization for ambient applications.

use clap::{Parser, Subcommand};
use presence_sensor_agent::{
    config::Config,
    core::SharedState,
    perception::{FrameSource, NoopFrameSource},
    pipeline::Pipeline,
    PRIVACY_DECLARATION, VERSION,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[cfg(feature = "reporter")]
use presence_sensor_agent::{BlockingReporterClient, ReporterConfig};

#[derive(Parser)]
#[command(name = "presence-sensor")]
#[command(version = VERSION)]
#[command(about = "Webcam perception stabilization for ambient applications", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start processing frames
    Start {
        /// Feed a synthetic frame stream (no camera or models required)
        #[arg(long)]
        synthetic: bool,

        /// Push state reports to the configured endpoint (requires reporter feature)
        #[arg(long)]
        report: bool,

        /// Override the reporting endpoint URL
        #[arg(long)]
        report_url: Option<String>,

        /// Override the reporting interval in milliseconds
        #[arg(long)]
        report_interval: Option<u64>,

        /// Serve the current state over HTTP (requires server feature)
        #[arg(long)]
        serve: bool,

        /// Port for the state server (0 for random)
        #[arg(long, default_value = "8787")]
        port: u16,
    },

    /// Pause frame processing
    Pause,

    /// Resume frame processing
    Resume,

    /// Show current configuration and state
    Status,

    /// Display privacy declaration
    Privacy,

    /// Show configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            synthetic,
            report,
            report_url,
            report_interval,
            serve,
            port,
        } => cmd_start(synthetic, report, report_url, report_interval, serve, port),
        Commands::Pause => cmd_pause(),
        Commands::Resume => cmd_resume(),
        Commands::Status => cmd_status(),
        Commands::Privacy => cmd_privacy(),
        Commands::Config => cmd_config(),
    }
}

#[allow(unused_variables)]
fn cmd_start(
    synthetic: bool,
    report: bool,
    report_url: Option<String>,
    report_interval: Option<u64>,
    serve: bool,
    port: u16,
) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = Config::load().unwrap_or_default();
    if let Some(url) = report_url {
        config.report_url = url;
    }
    if let Some(millis) = report_interval {
        config.report_interval = Duration::from_millis(millis);
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    let shared = Arc::new(SharedState::new());
    let mut pipeline = match Pipeline::new(&config, shared.clone()) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error building pipeline: {e}");
            std::process::exit(1);
        }
    };

    let mut source = NoopFrameSource::new();
    let receiver = source.receiver().clone();

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc_handler(r);

    println!("Presence Sensor Agent v{VERSION}");

    // Support pause/resume from another process by polling the config file.
    // If paused at startup, wait until resumed before starting the source.
    let mut paused = config.paused;
    let paused_flag = Arc::new(AtomicBool::new(paused));
    let mut last_config_check = std::time::Instant::now();

    if paused {
        println!("Processing is currently paused.");
        println!("Run `presence-sensor resume` to start processing.");
        println!();
    } else if let Err(e) = source.start() {
        eprintln!("Error starting frame source: {e}");
        std::process::exit(1);
    }

    if synthetic {
        spawn_synthetic_feed(source.sender(), running.clone(), paused_flag.clone());
        println!("Feeding synthetic frames.");
    } else {
        println!("Waiting for an external frame producer.");
    }
    println!("Press Ctrl+C to stop.");
    println!();

    // Reporter state
    #[cfg(feature = "reporter")]
    let mut reporter = if report {
        match BlockingReporterClient::new(ReporterConfig::new(&config.report_url)) {
            Ok(client) => {
                println!("Reporting to {} as {}", config.report_url, client.device_id());
                Some(client)
            }
            Err(e) => {
                eprintln!("Error creating reporter: {e}");
                std::process::exit(1);
            }
        }
    } else {
        None
    };
    #[cfg(feature = "reporter")]
    let reporter_source = reporter
        .as_ref()
        .map(|c| c.device_id().to_string())
        .unwrap_or_default();
    #[cfg(feature = "reporter")]
    let mut last_report = std::time::Instant::now();

    #[cfg(not(feature = "reporter"))]
    if report {
        eprintln!("Reporting requested but the binary was built without the reporter feature.");
        std::process::exit(1);
    }

    // State server
    #[cfg(feature = "server")]
    let server = if serve {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                eprintln!("Error creating server runtime: {e}");
                std::process::exit(1);
            }
        };

        let server_config =
            presence_sensor_agent::server::ServerConfig::new(port, &config.report_url);
        match runtime.block_on(presence_sensor_agent::server::run(server_config, shared.clone())) {
            Ok((addr, shutdown)) => {
                println!("Serving state on http://{addr}");
                Some((runtime, shutdown))
            }
            Err(e) => {
                eprintln!("Error starting server: {e}");
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    #[cfg(not(feature = "server"))]
    if serve {
        eprintln!("Serving requested but the binary was built without the server feature.");
        std::process::exit(1);
    }

    // Main frame loop
    while running.load(Ordering::SeqCst) {
        // Periodically reload config so `presence-sensor pause/resume` can control a running agent.
        if last_config_check.elapsed() >= Duration::from_secs(1) {
            if let Ok(cfg) = Config::load() {
                if cfg.paused != paused {
                    paused = cfg.paused;
                    paused_flag.store(paused, Ordering::SeqCst);

                    if paused {
                        println!();
                        println!("Pausing processing...");
                        source.stop();

                        // Drain any queued frames.
                        while receiver.try_recv().is_ok() {}
                    } else {
                        println!();
                        println!("Resuming processing...");
                        if let Err(e) = source.start() {
                            eprintln!("Error resuming frame source: {e}");
                            std::process::exit(1);
                        }
                    }
                }
            }
            last_config_check = std::time::Instant::now();
        }

        if paused {
            thread::sleep(Duration::from_millis(100));
            continue;
        }

        // Process frames with timeout
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(Ok(frame)) => pipeline.process_frame(&frame),
            Ok(Err(e)) => {
                tracing::warn!("frame acquisition failed: {e}");
                thread::sleep(Duration::from_millis(100));
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                eprintln!("Frame source disconnected unexpectedly");
                break;
            }
        }

        // Push a state report if the interval has passed
        #[cfg(feature = "reporter")]
        if let Some(ref mut client) = reporter {
            if last_report.elapsed() >= config.report_interval {
                let state_report = shared.snapshot().to_report(&reporter_source);
                match client.send(state_report) {
                    Ok(presence_sensor_agent::reporter::ReportOutcome::Sent) => {
                        tracing::debug!("state report sent");
                    }
                    Ok(presence_sensor_agent::reporter::ReportOutcome::Unchanged) => {}
                    Err(e) => {
                        eprintln!("[Report] push failed: {e}");
                    }
                }
                last_report = std::time::Instant::now();
            }
        }
    }

    // Stop processing
    println!();
    println!("Stopping...");
    source.stop();

    #[cfg(feature = "server")]
    if let Some((runtime, shutdown)) = server {
        let _ = shutdown.send(());
        runtime.shutdown_timeout(Duration::from_secs(2));
    }

    let snapshot = shared.snapshot();
    println!(
        "Final state: {} / {} / {:?}",
        snapshot.affect.emotion.as_str(),
        if snapshot.attention.is_focused {
            "focused"
        } else {
            "distracted"
        },
        snapshot.gesture.gesture
    );
}

fn cmd_pause() {
    let mut config = Config::load().unwrap_or_default();
    config.paused = true;
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!("Processing paused. Use 'presence-sensor resume' to continue.");
}

fn cmd_resume() {
    let mut config = Config::load().unwrap_or_default();
    config.paused = false;
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!("Processing resumed.");
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Presence Sensor Agent Status");
    println!("============================");
    println!();
    println!("Configuration:");
    println!(
        "  Attention interval: {}ms",
        config.attention_interval.as_millis()
    );
    println!(
        "  Affect interval: {}ms",
        config.affect_interval.as_millis()
    );
    println!(
        "  Gesture interval: {}ms",
        config.gesture_interval.as_millis()
    );
    println!("  Gesture hold: {}ms", config.gesture_hold.as_millis());
    println!("  Report endpoint: {}", config.report_url);
    println!(
        "  Report interval: {}ms",
        config.report_interval.as_millis()
    );
    println!("  Paused: {}", config.paused);
}

fn cmd_privacy() {
    println!("{PRIVACY_DECLARATION}");
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}

/// Push a simple synthetic frame stream at roughly 15 fps.
///
/// Alternates a neutral front-facing face with short absences so every
/// classifier sees both detection and no-detection input.
fn spawn_synthetic_feed(
    sender: crossbeam_channel::Sender<presence_sensor_agent::perception::FrameResult>,
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
) {
    use presence_sensor_agent::perception::{
        face_landmark, EmotionScores, FaceBox, FaceGeometry, FrameInput, Landmark,
    };

    thread::spawn(move || {
        let mut tick: u64 = 0;
        while running.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(66));
            if paused.load(Ordering::SeqCst) {
                continue;
            }

            // ~2s of face, ~1s of absence
            let frame = if tick % 45 < 30 {
                let mut landmarks = vec![Landmark::new(0.5, 0.5, 0.0); 468];
                landmarks[face_landmark::NOSE_TIP] = Landmark::new(0.5, 0.5, 0.0);
                landmarks[face_landmark::FOREHEAD] = Landmark::new(0.5, 0.30, 0.0);
                landmarks[face_landmark::CHIN] = Landmark::new(0.5, 0.70, 0.0);
                landmarks[face_landmark::LEFT_EAR] = Landmark::new(0.35, 0.5, 0.0);
                landmarks[face_landmark::RIGHT_EAR] = Landmark::new(0.65, 0.5, 0.0);
                for (eye, base_x) in [
                    (&face_landmark::LEFT_EYE, 0.40),
                    (&face_landmark::RIGHT_EYE, 0.54),
                ] {
                    landmarks[eye[0]] = Landmark::new(base_x, 0.45, 0.0);
                    landmarks[eye[3]] = Landmark::new(base_x + 0.06, 0.45, 0.0);
                    landmarks[eye[1]] = Landmark::new(base_x + 0.02, 0.432, 0.0);
                    landmarks[eye[2]] = Landmark::new(base_x + 0.04, 0.432, 0.0);
                    landmarks[eye[5]] = Landmark::new(base_x + 0.02, 0.468, 0.0);
                    landmarks[eye[4]] = Landmark::new(base_x + 0.04, 0.468, 0.0);
                }

                FrameInput {
                    captured_at: chrono::Utc::now(),
                    face: Some(FaceGeometry::new(landmarks)),
                    face_box: Some(FaceBox::new(0.3, 0.3, 0.4, 0.4)),
                    emotions: Some(EmotionScores::new(10.0, 5.0, 85.0)),
                    hand: None,
                }
            } else {
                FrameInput::empty(chrono::Utc::now())
            };

            if sender.send(Ok(frame)).is_err() {
                break;
            }
            tick += 1;
        }
    });
}
