use super::{CameraOption, CameraSource, CameraStream, CaptureConstraints, DeviceSelection};
use crate::{Error, Result};
use image::RgbImage;
use log::{debug, info, warn};
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};

/// Consecutive failed reads after which a stream counts as dead
const MAX_FAILED_READS: u32 = 30;

/// Camera indices tried by `enumerate`
const SCAN_INDICES: i32 = 10;

/// Cameras opened through `OpenCV` `VideoCapture`.
///
/// Device ids are either a numeric camera index or a device path such as
/// `/dev/video2`. The default selection opens index 0, which is the
/// user-facing webcam on laptops.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenCvCameraSource;

impl OpenCvCameraSource {
    fn capture_for(device: &DeviceSelection) -> Result<VideoCapture> {
        let capture = match device {
            DeviceSelection::Default => VideoCapture::new(0, videoio::CAP_ANY)?,
            DeviceSelection::Exact(id) => match id.parse::<i32>() {
                Ok(index) => VideoCapture::new(index, videoio::CAP_ANY)?,
                Err(_) => VideoCapture::from_file(id, videoio::CAP_ANY)?,
            },
        };
        Ok(capture)
    }
}

impl CameraSource for OpenCvCameraSource {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn open(&self, device: &DeviceSelection, constraints: &CaptureConstraints) -> Result<Box<dyn CameraStream>> {
        if let Some(facing) = device.facing_mode() {
            debug!("Default camera requested, facing {:?}", facing);
        }

        let mut capture = Self::capture_for(device)
            .map_err(|e| Error::CameraUnavailable(format!("Unable to access camera '{device}': {e}")))?;

        if !capture.is_opened()? {
            return Err(Error::CameraUnavailable(format!(
                "Camera '{device}' is not available (missing, busy or permission denied)"
            )));
        }

        let (width, height, fps) = constraints.requested();
        capture.set(CAP_PROP_FRAME_WIDTH, f64::from(width))?;
        capture.set(CAP_PROP_FRAME_HEIGHT, f64::from(height))?;
        capture.set(CAP_PROP_FPS, f64::from(fps))?;

        // Keep only the newest frame queued so reads never return stale images
        capture.set(CAP_PROP_BUFFERSIZE, 1.0)?;

        let actual_width = capture.get(CAP_PROP_FRAME_WIDTH)? as u32;
        let actual_height = capture.get(CAP_PROP_FRAME_HEIGHT)? as u32;
        let actual_fps = capture.get(CAP_PROP_FPS)?;
        info!("Negotiated {}x{} @{:.1}fps", actual_width, actual_height, actual_fps);

        Ok(Box::new(OpenCvStream {
            capture,
            frame: Mat::default(),
            width: actual_width,
            height: actual_height,
            failed_reads: 0,
        }))
    }

    fn enumerate(&self) -> Result<Vec<CameraOption>> {
        let mut found = Vec::new();
        for index in 0..SCAN_INDICES {
            let Ok(mut capture) = VideoCapture::new(index, videoio::CAP_ANY) else {
                continue;
            };
            if capture.is_opened().unwrap_or(false) {
                found.push(CameraOption {
                    id: index.to_string(),
                    label: String::new(),
                });
            }
            if let Err(e) = capture.release() {
                warn!("Failed to release scanned camera {}: {}", index, e);
            }
        }
        Ok(found)
    }
}

/// Open `VideoCapture` handle
struct OpenCvStream {
    capture: VideoCapture,
    frame: Mat,
    width: u32,
    height: u32,
    failed_reads: u32,
}

impl OpenCvStream {
    #[allow(clippy::cast_sign_loss)]
    fn to_rgb(&self) -> Result<RgbImage> {
        let mut rgb = Mat::default();
        imgproc::cvt_color(&self.frame, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        let width = rgb.cols() as u32;
        let height = rgb.rows() as u32;
        let data = rgb.data_bytes()?.to_vec();

        RgbImage::from_raw(width, height, data)
            .ok_or_else(|| Error::InvalidInput(format!("Frame buffer does not match {width}x{height} RGB")))
    }
}

impl CameraStream for OpenCvStream {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let ok = self.capture.read(&mut self.frame)?;
        if !ok || self.frame.empty() {
            self.failed_reads += 1;
            if self.failed_reads >= MAX_FAILED_READS {
                return Err(Error::CameraUnavailable(format!(
                    "Capture stream stopped delivering frames after {} attempts",
                    self.failed_reads
                )));
            }
            return Ok(None);
        }
        self.failed_reads = 0;
        self.to_rgb().map(Some)
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn close(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Failed to release camera: {}", e);
        }
    }
}

impl Drop for OpenCvStream {
    fn drop(&mut self) {
        if self.capture.is_opened().unwrap_or(false) {
            self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore = "Requires a camera"]
    fn test_open_default_camera() {
        let source = OpenCvCameraSource;
        let mut stream = source
            .open(&DeviceSelection::Default, &CaptureConstraints::default())
            .expect("Failed to open camera");
        let (w, h) = stream.resolution();
        assert!(w > 0 && h > 0);
        stream.close();
    }

    #[test]
    fn test_missing_device_path_is_unavailable() {
        let source = OpenCvCameraSource;
        let result = source.open(
            &DeviceSelection::Exact("/nonexistent/video99".to_string()),
            &CaptureConstraints::default(),
        );
        assert!(matches!(result, Err(Error::CameraUnavailable(_))));
    }
}
