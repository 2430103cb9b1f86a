//! Camera access: device selection, capture constraints and the owning
//! capture session.
//!
//! Backends implement [`CameraSource`] and hand out [`CameraStream`]s. The
//! pipeline never talks to a stream directly; it goes through
//! [`CameraSession`], which stamps frames and guarantees the stream is
//! released on every exit path.

/// Owning capture session
pub mod capture;

/// Device identifiers and camera listing
pub mod device;

/// `OpenCV` `VideoCapture` backend
#[cfg(feature = "camera")]
pub mod opencv;

pub use capture::CameraSession;
pub use device::{detect_camera_options, CameraOption, DeviceSelection, FacingMode};

use crate::constants::{
    IDEAL_CAPTURE_FPS, IDEAL_CAPTURE_HEIGHT, IDEAL_CAPTURE_WIDTH, MAX_CAPTURE_FPS, MAX_CAPTURE_HEIGHT,
    MAX_CAPTURE_WIDTH,
};
use crate::{Error, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Requested capture envelope: backends aim for the ideal values and never
/// exceed the maximums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConstraints {
    /// Preferred frame width
    pub ideal_width: u32,
    /// Preferred frame height
    pub ideal_height: u32,
    /// Preferred frame rate
    pub ideal_fps: u32,
    /// Largest acceptable width
    pub max_width: u32,
    /// Largest acceptable height
    pub max_height: u32,
    /// Largest acceptable frame rate
    pub max_fps: u32,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            ideal_width: IDEAL_CAPTURE_WIDTH,
            ideal_height: IDEAL_CAPTURE_HEIGHT,
            ideal_fps: IDEAL_CAPTURE_FPS,
            max_width: MAX_CAPTURE_WIDTH,
            max_height: MAX_CAPTURE_HEIGHT,
            max_fps: MAX_CAPTURE_FPS,
        }
    }
}

impl CaptureConstraints {
    /// Resolution and frame rate to request: the ideal envelope clamped to the caps
    #[must_use]
    pub fn requested(&self) -> (u32, u32, u32) {
        (
            self.ideal_width.min(self.max_width),
            self.ideal_height.min(self.max_height),
            self.ideal_fps.min(self.max_fps),
        )
    }

    /// Whether a negotiated resolution fits under the caps
    #[must_use]
    pub const fn admits(&self, width: u32, height: u32) -> bool {
        width <= self.max_width && height <= self.max_height
    }

    /// Validate constraints
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if any dimension or rate is zero.
    pub fn validate(&self) -> Result<()> {
        let (w, h, fps) = self.requested();
        if w == 0 || h == 0 {
            return Err(Error::ConfigError("Capture resolution must be non-zero".to_string()));
        }
        if fps == 0 {
            return Err(Error::ConfigError("Capture frame rate must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// A live capture stream. Dropping it releases the device.
pub trait CameraStream: Send {
    /// Wait for the next frame.
    ///
    /// Returns `Ok(None)` when no new frame is ready yet, and an error once
    /// the stream has died.
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Negotiated frame size
    fn resolution(&self) -> (u32, u32);

    /// Release the device early. Called at most once; `Drop` must release
    /// it too.
    fn close(&mut self) {}
}

/// Something that can open cameras
pub trait CameraSource: Send + Sync {
    /// Acquire a stream for `device`.
    ///
    /// # Errors
    ///
    /// Returns `Error::CameraUnavailable` when the device cannot be opened.
    fn open(&self, device: &DeviceSelection, constraints: &CaptureConstraints) -> Result<Box<dyn CameraStream>>;

    /// List video input devices. Labels and ids may be blank.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform cannot enumerate devices.
    fn enumerate(&self) -> Result<Vec<CameraOption>>;
}
