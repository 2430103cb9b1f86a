//! Constants used throughout the pipeline

/// Number of landmarks reported per hand
pub const NUM_HAND_LANDMARKS: usize = 21;

/// Index fingertip landmark
pub const INDEX_FINGER_TIP: usize = 8;

/// Wrist plus the five finger bases, used for the palm centroid fallback
pub const PALM_LANDMARKS: [usize; 6] = [0, 1, 5, 9, 13, 17];

/// Reserved device identifier selecting the platform default camera
pub const DEFAULT_CAMERA_ID: &str = "default";

/// Label used when no camera can be enumerated
pub const DEFAULT_CAMERA_LABEL: &str = "Default Camera";

/// Default One Euro filter parameters
pub const DEFAULT_MIN_CUTOFF: f64 = 1.2;
pub const DEFAULT_BETA: f64 = 0.025;
pub const DEFAULT_DERIVATIVE_CUTOFF: f64 = 1.0;

/// Lower bound on the filter sample interval, in seconds
pub const MIN_SAMPLE_INTERVAL: f64 = 1.0 / 240.0;

/// Absent frames tolerated before tracking counts as lost, in milliseconds
pub const DEFAULT_LOSS_HOLD_MS: f64 = 120.0;

/// Minimum spacing between preview encodes, in milliseconds
pub const DEFAULT_PREVIEW_THROTTLE_MS: f64 = 30.0;

/// Preview frames are downscaled to at most this width
pub const DEFAULT_PROCESS_WIDTH: u32 = 480;

/// JPEG quality for preview frames (1-100)
pub const DEFAULT_PREVIEW_QUALITY: u8 = 50;

/// Capture envelope: requested resolution and frame rate
pub const IDEAL_CAPTURE_WIDTH: u32 = 640;
pub const IDEAL_CAPTURE_HEIGHT: u32 = 360;
pub const IDEAL_CAPTURE_FPS: u32 = 30;

/// Capture envelope: hard caps
pub const MAX_CAPTURE_WIDTH: u32 = 960;
pub const MAX_CAPTURE_HEIGHT: u32 = 720;
pub const MAX_CAPTURE_FPS: u32 = 60;

/// Poll interval used when a stream has no frame ready yet, in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 16;

/// Hand landmark model input edge length in pixels
pub const DEFAULT_MODEL_INPUT_SIZE: u32 = 224;

/// Minimum hand presence score accepted from the detector
pub const DEFAULT_MIN_HAND_CONFIDENCE: f32 = 0.4;
