//! Gesture tracker: print the smoothed hand position from a webcam.

use anyhow::{Context, Result};
use clap::Parser;
use gesture_tracking::camera::opencv::OpenCvCameraSource;
use gesture_tracking::config::{Config, EXAMPLE_CONFIG};
use gesture_tracking::controller::TrackingController;
use gesture_tracking::detector::onnx::OnnxHandDetector;
use gesture_tracking::detector::{LandmarkDetector, LandmarkModel};
use gesture_tracking::SessionState;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Camera to track: "default", a camera index or a device path
    #[arg(long, default_value = "default")]
    camera: String,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Named filter profile from the configuration file
    #[arg(short, long)]
    profile: Option<String>,

    /// Hand landmark model, overriding the configuration file
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// List available cameras and exit
    #[arg(long)]
    list_cameras: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,

    /// Milliseconds between printed snapshots
    #[arg(long, default_value = "100")]
    interval_ms: u64,

    /// Write the latest preview JPEG to this file on every snapshot
    #[arg(long)]
    preview_out: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    let source = Arc::new(OpenCvCameraSource);

    if args.list_cameras {
        for option in gesture_tracking::camera::detect_camera_options(source.as_ref()) {
            println!("{}\t{}", option.id, option.label);
        }
        return Ok(());
    }

    info!("Gesture Tracker");

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::from_file(path).with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(model) = args.model {
        config.detector.model_path = model;
    }
    if let Err(e) = config.validate_model_path() {
        warn!("{}", e);
    }

    let detector_config = config.detector.clone();
    let model = Arc::new(LandmarkModel::new(move || {
        let detector = OnnxHandDetector::from_config(&detector_config)?;
        Ok(Arc::new(detector) as Arc<dyn LandmarkDetector>)
    }));

    let mut controller = TrackingController::new(source, model, config, args.profile)?;
    let reader = controller.select_device(&args.camera)?;

    let interval = Duration::from_millis(args.interval_ms.max(1));
    let mut last_state = None;
    loop {
        std::thread::sleep(interval);

        let state = reader.state();
        if last_state != Some(state) {
            info!("Session {}", state);
            last_state = Some(state);
        }

        let snapshot = reader.snapshot();
        if let Some(error) = snapshot.error {
            anyhow::bail!("Tracking failed: {error}");
        }
        if state == SessionState::Stopped {
            break;
        }

        if let (Some(path), Some(frame)) = (&args.preview_out, &snapshot.frame) {
            if let Err(e) = std::fs::write(path, &frame.jpeg[..]) {
                warn!("Failed to write preview to {}: {}", path.display(), e);
            }
        }

        let gesture = snapshot.gesture.map_or("none", |g| g.as_str());
        match (snapshot.x, snapshot.y) {
            (Some(x), Some(y)) => println!("{x:.3}\t{y:.3}\t{gesture}"),
            _ if snapshot.ready => println!("-\t-\tnone"),
            _ => {}
        }
    }

    controller.stop();
    Ok(())
}
