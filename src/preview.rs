//! Throttled camera preview snapshots.
//!
//! Encoding runs at most once per throttle interval no matter how fast the
//! camera delivers, on a downscaled and mirrored copy of the frame so the
//! preview matches the mirrored control coordinates.

use crate::config::PreviewConfig;
use crate::frame::Frame;
use crate::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, RgbImage};
use log::{debug, warn};
use std::sync::Arc;

/// JPEG-encoded preview image. Cloning shares the encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFrame {
    /// Width after downscaling
    pub width: u32,
    /// Height after downscaling
    pub height: u32,
    /// Encoded JPEG bytes
    pub jpeg: Arc<[u8]>,
}

/// Rate-limited preview encoder
pub struct PreviewEncoder {
    throttle_ms: f64,
    process_width: u32,
    quality: u8,
    last_encode_ms: Option<f64>,
    latest: Option<PreviewFrame>,
}

impl PreviewEncoder {
    /// Create an encoder from configuration
    #[must_use]
    pub fn new(config: &PreviewConfig) -> Self {
        Self {
            throttle_ms: config.throttle_ms,
            process_width: config.process_width.max(1),
            quality: config.jpeg_quality.clamp(1, 100),
            last_encode_ms: None,
            latest: None,
        }
    }

    /// Offer a frame. Returns the new preview if one was encoded.
    ///
    /// Frames inside the throttle window are skipped. An encoding failure is
    /// logged and the previous preview stays current.
    pub fn offer(&mut self, frame: &Frame) -> Option<PreviewFrame> {
        let now = frame.timestamp_ms();
        if let Some(last) = self.last_encode_ms {
            if now - last <= self.throttle_ms {
                return None;
            }
        }

        match self.encode(frame.image()) {
            Ok(preview) => {
                self.last_encode_ms = Some(now);
                self.latest = Some(preview.clone());
                Some(preview)
            }
            Err(e) => {
                warn!("Preview encoding failed for frame {}: {}", frame.sequence(), e);
                None
            }
        }
    }

    /// Most recent successfully encoded preview
    #[must_use]
    pub const fn latest(&self) -> Option<&PreviewFrame> {
        self.latest.as_ref()
    }

    /// Downscale, mirror and encode one image
    ///
    /// # Errors
    ///
    /// Returns `Error::EncodingFailure` for an empty image or a JPEG error.
    pub fn encode(&self, image: &RgbImage) -> Result<PreviewFrame> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::EncodingFailure(format!("Empty frame {width}x{height}")));
        }

        let (out_w, out_h) = scaled_size(width, height, self.process_width);
        let mut scaled = if (out_w, out_h) == (width, height) {
            image.clone()
        } else {
            imageops::resize(image, out_w, out_h, FilterType::Triangle)
        };
        imageops::flip_horizontal_in_place(&mut scaled);

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.quality)
            .encode(scaled.as_raw(), out_w, out_h, ColorType::Rgb8)
            .map_err(|e| Error::EncodingFailure(e.to_string()))?;

        debug!("Encoded {}x{} preview, {} bytes", out_w, out_h, jpeg.len());

        Ok(PreviewFrame {
            width: out_w,
            height: out_h,
            jpeg: jpeg.into(),
        })
    }
}

/// Fit `width` into `max_width` keeping aspect ratio; never upscales
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scaled_size(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let scale = f64::from(max_width) / f64::from(width);
    let h = (f64::from(height) * scale).floor() as u32;
    (max_width, h.max(1))
}
