//! Webcam hand tracking for gesture-controlled games.
//!
//! This library turns a live camera feed into a single smoothed, normalized
//! control point plus a throttled preview image:
//! - `OpenCV` `VideoCapture` for camera access (feature `camera`)
//! - ONNX Runtime for hand landmark inference (feature `onnx`)
//! - A One Euro filter per axis, gated by a short track-loss hold window
//!
//! The pipeline per frame is:
//! 1. Capture a frame from the selected camera
//! 2. Detect 21 hand landmarks
//! 3. Extract the index fingertip, falling back to the palm centroid
//! 4. Smooth both axes, holding the last point through brief dropouts
//! 5. Independently, encode a mirrored JPEG preview at a limited rate
//!
//! # Examples
//!
//! ## Filtering a Signal
//!
//! ```
//! use gesture_tracking::config::FilterConfig;
//! use gesture_tracking::filters::create_filter;
//!
//! # fn main() -> gesture_tracking::Result<()> {
//! let mut filter = create_filter("one_euro", &FilterConfig::default())?;
//!
//! assert_eq!(filter.filter(0.50, 0.0), 0.50);
//! let smoothed = filter.filter(0.52, 16.0);
//! assert!(smoothed > 0.50 && smoothed < 0.52);
//! # Ok(())
//! # }
//! ```
//!
//! ## Running a Session
//!
//! ```no_run
//! # #[cfg(all(feature = "camera", feature = "onnx"))]
//! # fn main() -> gesture_tracking::Result<()> {
//! use gesture_tracking::camera::opencv::OpenCvCameraSource;
//! use gesture_tracking::config::Config;
//! use gesture_tracking::controller::TrackingController;
//! use gesture_tracking::detector::{onnx::OnnxHandDetector, LandmarkDetector, LandmarkModel};
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let detector_config = config.detector.clone();
//! let model = Arc::new(LandmarkModel::new(move || {
//!     Ok(Arc::new(OnnxHandDetector::from_config(&detector_config)?) as Arc<dyn LandmarkDetector>)
//! }));
//!
//! let mut controller = TrackingController::new(Arc::new(OpenCvCameraSource), model, config, None)?;
//! let reader = controller.select_device("default")?;
//!
//! let snapshot = reader.snapshot();
//! if let (Some(x), Some(y)) = (snapshot.x, snapshot.y) {
//!     println!("Hand at ({x:.2}, {y:.2})");
//! }
//! controller.stop();
//! # Ok(())
//! # }
//! # #[cfg(not(all(feature = "camera", feature = "onnx")))]
//! # fn main() {}
//! ```

/// Error types and result handling
pub mod error;

/// Constants used throughout the pipeline
pub mod constants;

/// Configuration management
pub mod config;

/// Scalar smoothing filters
pub mod filters;

/// Hand landmarks and control point extraction
pub mod landmarks;

/// Track-loss hysteresis and per-axis smoothing
pub mod arbiter;

/// Timestamped camera frames
pub mod frame;

/// Throttled JPEG preview encoding
pub mod preview;

/// Camera sources, device selection and capture sessions
pub mod camera;

/// Hand landmark detection
pub mod detector;

/// Tracking session orchestration
pub mod session;

/// Camera switching on top of tracking sessions
pub mod controller;

pub use error::{Error, Result};
pub use session::{SessionState, SnapshotReader, TrackingSession, TrackingSnapshot};
