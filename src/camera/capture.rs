use super::{CameraSource, CameraStream, CaptureConstraints, DeviceSelection};
use crate::frame::Frame;
use crate::{Error, Result};
use log::{debug, info, warn};
use std::time::Instant;

/// Smallest step used to keep frame timestamps strictly increasing, in ms
const TIMESTAMP_EPSILON_MS: f64 = 1e-3;

/// Owns one open camera stream for the lifetime of a tracking session.
///
/// Frames come out stamped with milliseconds since the session opened,
/// strictly increasing. The stream is released by [`CameraSession::close`]
/// or, failing that, on drop.
pub struct CameraSession {
    stream: Option<Box<dyn CameraStream>>,
    device: DeviceSelection,
    clock: Instant,
    last_timestamp_ms: Option<f64>,
    frame_count: u64,
}

impl CameraSession {
    /// Acquire `device` from `source`
    ///
    /// # Errors
    ///
    /// Returns `Error::CameraUnavailable` if the device cannot be opened or
    /// negotiates a size above the capture caps.
    pub fn open(source: &dyn CameraSource, device: &DeviceSelection, constraints: &CaptureConstraints) -> Result<Self> {
        let (w, h, fps) = constraints.requested();
        info!("Opening camera '{}' at {}x{} @{}fps", device, w, h, fps);

        let mut stream = source.open(device, constraints).map_err(into_unavailable)?;

        let (width, height) = stream.resolution();
        if !constraints.admits(width, height) {
            stream.close();
            return Err(Error::CameraUnavailable(format!(
                "Camera '{device}' delivers {width}x{height}, above the {}x{} limit",
                constraints.max_width, constraints.max_height
            )));
        }
        info!("Camera '{}' streaming at {}x{}", device, width, height);

        Ok(Self {
            stream: Some(stream),
            device: device.clone(),
            clock: Instant::now(),
            last_timestamp_ms: None,
            frame_count: 0,
        })
    }

    /// Next frame, or `Ok(None)` if the stream has nothing new yet
    ///
    /// # Errors
    ///
    /// Returns `Error::CameraUnavailable` once the stream has died or the
    /// session was closed.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::CameraUnavailable(format!("Camera '{}' is closed", self.device)))?;

        let Some(image) = stream.next_frame().map_err(into_unavailable)? else {
            return Ok(None);
        };

        let timestamp_ms = self.stamp();
        let frame = Frame::new(image, timestamp_ms, self.frame_count);
        self.frame_count += 1;
        Ok(Some(frame))
    }

    /// Release the camera. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
            info!("Camera '{}' released after {} frames", self.device, self.frame_count);
        }
    }

    /// Whether the stream is still held
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Device this session was opened for
    #[must_use]
    pub const fn device(&self) -> &DeviceSelection {
        &self.device
    }

    /// Frames delivered so far
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    fn stamp(&mut self) -> f64 {
        let elapsed = self.clock.elapsed().as_secs_f64() * 1000.0;
        let timestamp = match self.last_timestamp_ms {
            Some(last) if elapsed <= last => {
                debug!("Clock did not advance between frames, nudging timestamp");
                last + TIMESTAMP_EPSILON_MS
            }
            _ => elapsed,
        };
        self.last_timestamp_ms = Some(timestamp);
        timestamp
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        if self.stream.is_some() {
            warn!("Camera '{}' dropped without close, releasing", self.device);
            self.close();
        }
    }
}

fn into_unavailable(error: Error) -> Error {
    match error {
        Error::CameraUnavailable(_) => error,
        other => Error::CameraUnavailable(other.to_string()),
    }
}
