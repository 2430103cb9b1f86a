//! Configuration management for the gesture tracking pipeline

use crate::camera::CaptureConstraints;
use crate::constants::{
    DEFAULT_BETA, DEFAULT_DERIVATIVE_CUTOFF, DEFAULT_LOSS_HOLD_MS, DEFAULT_MIN_CUTOFF, DEFAULT_MIN_HAND_CONFIDENCE,
    DEFAULT_MODEL_INPUT_SIZE, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PREVIEW_QUALITY, DEFAULT_PREVIEW_THROTTLE_MS,
    DEFAULT_PROCESS_WIDTH,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera capture envelope
    pub camera: CaptureConstraints,

    /// Default filter configuration
    pub filter: FilterConfig,

    /// Named filter overrides, e.g. one per game
    pub profiles: BTreeMap<String, FilterConfig>,

    /// Track loss and frame delivery
    pub tracking: TrackingConfig,

    /// Camera preview snapshots
    pub preview: PreviewConfig,

    /// Landmark model
    pub detector: DetectorConfig,
}

/// Filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Filter type name passed to `create_filter`
    pub kind: String,

    /// One Euro cutoff at rest, in Hz
    pub min_cutoff: f64,

    /// One Euro speed coefficient
    pub beta: f64,

    /// One Euro derivative cutoff, in Hz
    pub derivative_cutoff: f64,
}

/// Track loss hysteresis and frame delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// How long a missing hand is bridged before the point is cleared, in ms
    pub loss_hold_ms: f64,

    /// Sleep between polls when the stream has no frame ready, in ms
    pub poll_interval_ms: u64,
}

/// Preview snapshot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Produce preview snapshots at all
    pub enabled: bool,

    /// Minimum spacing between encodes, in ms
    pub throttle_ms: f64,

    /// Frames wider than this are downscaled before encoding
    pub process_width: u32,

    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

/// Landmark model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Path to the hand landmark ONNX model
    pub model_path: PathBuf,

    /// Minimum hand presence score (0.0-1.0)
    pub min_hand_confidence: f32,

    /// Model input edge length in pixels
    pub input_size: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            kind: "one_euro".to_string(),
            min_cutoff: DEFAULT_MIN_CUTOFF,
            beta: DEFAULT_BETA,
            derivative_cutoff: DEFAULT_DERIVATIVE_CUTOFF,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            loss_hold_ms: DEFAULT_LOSS_HOLD_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            throttle_ms: DEFAULT_PREVIEW_THROTTLE_MS,
            process_width: DEFAULT_PROCESS_WIDTH,
            jpeg_quality: DEFAULT_PREVIEW_QUALITY,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("assets/hand_landmark.onnx"),
            min_hand_confidence: DEFAULT_MIN_HAND_CONFIDENCE,
            input_size: DEFAULT_MODEL_INPUT_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the text is not a valid configuration.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Filter settings for a named profile, falling back to the default section
    #[must_use]
    pub fn filter_profile(&self, name: Option<&str>) -> &FilterConfig {
        name.and_then(|n| self.profiles.get(n)).unwrap_or(&self.filter)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        self.camera.validate()?;

        for (name, filter) in std::iter::once(("default", &self.filter))
            .chain(self.profiles.iter().map(|(k, v)| (k.as_str(), v)))
        {
            crate::filters::create_filter(&filter.kind, filter)
                .map_err(|e| Error::ConfigError(format!("Filter profile '{name}': {e}")))?;
        }

        if !(self.tracking.loss_hold_ms.is_finite() && self.tracking.loss_hold_ms >= 0.0) {
            return Err(Error::ConfigError("Loss hold window must be non-negative".to_string()));
        }
        if self.tracking.poll_interval_ms == 0 {
            return Err(Error::ConfigError("Poll interval must be greater than 0".to_string()));
        }

        if !(self.preview.throttle_ms.is_finite() && self.preview.throttle_ms >= 0.0) {
            return Err(Error::ConfigError("Preview throttle must be non-negative".to_string()));
        }
        if self.preview.process_width == 0 {
            return Err(Error::ConfigError("Preview width must be greater than 0".to_string()));
        }
        if !(1..=100).contains(&self.preview.jpeg_quality) {
            return Err(Error::ConfigError("JPEG quality must be between 1 and 100".to_string()));
        }

        if !(0.0..=1.0).contains(&self.detector.min_hand_confidence) {
            return Err(Error::ConfigError(
                "Hand confidence threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.detector.input_size == 0 {
            return Err(Error::ConfigError("Model input size must be greater than 0".to_string()));
        }

        Ok(())
    }

    /// Check that the configured model file exists
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if the model path does not exist.
    pub fn validate_model_path(&self) -> Result<()> {
        if self.detector.model_path.exists() {
            Ok(())
        } else {
            Err(Error::ConfigError(format!(
                "Hand landmark model not found: {}",
                self.detector.model_path.display()
            )))
        }
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Gesture Tracking Configuration

# Capture envelope
camera:
  ideal_width: 640
  ideal_height: 360
  ideal_fps: 30
  max_width: 960
  max_height: 720
  max_fps: 60

# Default smoothing
filter:
  kind: "one_euro"
  min_cutoff: 1.2
  beta: 0.025
  derivative_cutoff: 1.0

# Optional per-game overrides, selected with --profile
profiles:
  pong:
    kind: "one_euro"
    min_cutoff: 2.0
    beta: 0.05
    derivative_cutoff: 1.0

# Track loss
tracking:
  loss_hold_ms: 120.0
  poll_interval_ms: 16

# Camera preview
preview:
  enabled: true
  throttle_ms: 30.0
  process_width: 480
  jpeg_quality: 50

# Landmark model
detector:
  model_path: "assets/hand_landmark.onnx"
  min_hand_confidence: 0.4
  input_size: 224
"#;
