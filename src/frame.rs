//! Captured video frames.

use image::RgbImage;
use std::sync::Arc;

/// One captured RGB frame with its session timestamp.
///
/// Pixels are shared, so handing a frame to both the detector and the
/// preview encoder does not copy the image.
#[derive(Debug, Clone)]
pub struct Frame {
    image: Arc<RgbImage>,
    timestamp_ms: f64,
    sequence: u64,
}

impl Frame {
    /// Wrap an image taken at `timestamp_ms`
    #[must_use]
    pub fn new(image: RgbImage, timestamp_ms: f64, sequence: u64) -> Self {
        Self {
            image: Arc::new(image),
            timestamp_ms,
            sequence,
        }
    }

    /// Pixel data
    #[must_use]
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Milliseconds since the session's capture clock started
    #[must_use]
    pub const fn timestamp_ms(&self) -> f64 {
        self.timestamp_ms
    }

    /// Position of this frame in the session, starting at 0
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Frame width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
