//! Tracking session: one camera, one smoothed control point.
//!
//! A session owns a `capture` worker (camera stream and preview encoding)
//! and a `detect` worker (landmark detection, extraction and smoothing).
//! Frames are handed to the detector only when it is idle; anything that
//! arrives while a detection is outstanding is dropped for detection but
//! still feeds the preview.
//!
//! Consumers never touch the workers. They read [`TrackingSnapshot`]s
//! through a [`SnapshotReader`], which can be cloned freely and outlives
//! the session.

use crate::arbiter::{PointSmoother, SmoothedPoint};
use crate::camera::{CameraSession, CameraSource, CaptureConstraints, DeviceSelection};
use crate::config::{Config, TrackingConfig};
use crate::detector::LandmarkModel;
use crate::frame::Frame;
use crate::landmarks::{extract_point, GestureTag, NormalizedPoint};
use crate::preview::{PreviewEncoder, PreviewFrame};
use crate::{Error, Result};
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Lifecycle of a tracking session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Camera acquisition in flight
    Starting,
    /// Frames are flowing
    Ready,
    /// The camera or model failed; nothing more will be published
    Failed,
    /// Torn down on request
    Stopped,
}

impl SessionState {
    /// Whether the session can no longer change state
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Stopped)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What a consumer sees of a session.
///
/// `x` and `y` are either both present or both absent. `ready` means the
/// camera is streaming, not that a hand is in view. Once `error` is set the
/// point stays absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingSnapshot {
    /// Smoothed horizontal position in [0, 1], mirrored
    pub x: Option<f64>,
    /// Smoothed vertical position in [0, 1]
    pub y: Option<f64>,
    /// How the point was derived
    pub gesture: Option<GestureTag>,
    /// Latest preview image
    pub frame: Option<PreviewFrame>,
    /// Camera stream has started
    pub ready: bool,
    /// Terminal error message
    pub error: Option<String>,
}

impl TrackingSnapshot {
    /// Visible point, if any
    #[must_use]
    pub fn point(&self) -> Option<NormalizedPoint> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(NormalizedPoint { x, y }),
            _ => None,
        }
    }

    fn set_point(&mut self, visible: Option<SmoothedPoint>) {
        self.x = visible.map(|v| v.point.x);
        self.y = visible.map(|v| v.point.y);
        self.gesture = visible.and_then(|v| v.gesture);
    }
}

struct Published {
    state: SessionState,
    snapshot: TrackingSnapshot,
}

/// Read-only handle on a session's published state
#[derive(Clone)]
pub struct SnapshotReader {
    inner: Arc<RwLock<Published>>,
}

impl SnapshotReader {
    fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Published {
                state: SessionState::Starting,
                snapshot: TrackingSnapshot::default(),
            })),
        }
    }

    /// Copy of the latest snapshot
    #[must_use]
    pub fn snapshot(&self) -> TrackingSnapshot {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).snapshot.clone()
    }

    /// Current session state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).state
    }

    /// Apply `update` unless the session already reached a terminal state
    fn publish(&self, update: impl FnOnce(&mut TrackingSnapshot)) {
        let mut published = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if !published.state.is_terminal() {
            update(&mut published.snapshot);
        }
    }

    fn mark_ready(&self) {
        let mut published = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if published.state == SessionState::Starting {
            published.state = SessionState::Ready;
            published.snapshot.ready = true;
        }
    }

    fn fail(&self, error: &Error) {
        let mut published = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if published.state.is_terminal() {
            return;
        }
        error!("Tracking session failed: {}", error);
        published.state = SessionState::Failed;
        published.snapshot.set_point(None);
        published.snapshot.ready = false;
        published.snapshot.error = Some(error.to_string());
    }

    fn mark_stopped(&self) {
        let mut published = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if published.state.is_terminal() {
            return;
        }
        published.state = SessionState::Stopped;
        published.snapshot.set_point(None);
        published.snapshot.ready = false;
    }
}

/// A running tracking pipeline bound to one camera.
///
/// Dropping the session tears it down the same way as [`TrackingSession::stop`].
pub struct TrackingSession {
    device: DeviceSelection,
    cancelled: Arc<AtomicBool>,
    reader: SnapshotReader,
    workers: Vec<JoinHandle<()>>,
}

impl TrackingSession {
    /// Start tracking on `device`.
    ///
    /// Returns immediately in [`SessionState::Starting`]; camera acquisition
    /// and model loading happen on the workers and are reported through the
    /// snapshot. `profile` selects a named filter profile from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter configuration is invalid or a worker
    /// thread cannot be spawned.
    pub fn start(
        device: DeviceSelection,
        source: Arc<dyn CameraSource>,
        model: Arc<LandmarkModel>,
        config: &Config,
        profile: Option<&str>,
    ) -> Result<Self> {
        let smoother = PointSmoother::new(config.filter_profile(profile), &config.tracking)?;
        let encoder = config.preview.enabled.then(|| PreviewEncoder::new(&config.preview));

        info!("Starting tracking session on camera '{}'", device);

        let cancelled = Arc::new(AtomicBool::new(false));
        let reader = SnapshotReader::new();
        let (frames_tx, frames_rx) = mpsc::sync_channel::<Frame>(0);

        let detect = DetectWorker {
            model,
            smoother,
            frames: frames_rx,
            cancelled: Arc::clone(&cancelled),
            reader: reader.clone(),
        };
        let capture = CaptureWorker {
            source,
            device: device.clone(),
            constraints: config.camera,
            tracking: config.tracking.clone(),
            encoder,
            frames: frames_tx,
            cancelled: Arc::clone(&cancelled),
            reader: reader.clone(),
        };

        let mut workers = Vec::with_capacity(2);
        workers.push(thread::Builder::new().name("detect".to_string()).spawn(move || detect.run())?);

        // A failed spawn drops the sender, which lets the detect worker exit
        match thread::Builder::new().name("capture".to_string()).spawn(move || capture.run()) {
            Ok(handle) => workers.push(handle),
            Err(e) => {
                cancelled.store(true, Ordering::Release);
                join_all(&mut workers);
                return Err(e.into());
            }
        }

        Ok(Self {
            device,
            cancelled,
            reader,
            workers,
        })
    }

    /// Stop frame delivery, release the camera and wait for both workers.
    ///
    /// A failed session keeps its error; any other session ends up
    /// [`SessionState::Stopped`].
    pub fn stop(mut self) {
        self.shutdown();
    }

    /// Device this session tracks
    #[must_use]
    pub const fn device(&self) -> &DeviceSelection {
        &self.device
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.reader.state()
    }

    /// Copy of the latest snapshot
    #[must_use]
    pub fn snapshot(&self) -> TrackingSnapshot {
        self.reader.snapshot()
    }

    /// Handle for consumers on other threads
    #[must_use]
    pub fn reader(&self) -> SnapshotReader {
        self.reader.clone()
    }

    fn shutdown(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.cancelled.store(true, Ordering::Release);
        join_all(&mut self.workers);
        self.reader.mark_stopped();
        info!("Tracking session on camera '{}' ended {}", self.device, self.reader.state());
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn join_all(workers: &mut Vec<JoinHandle<()>>) {
    for handle in workers.drain(..) {
        let name = handle.thread().name().unwrap_or("worker").to_string();
        if handle.join().is_err() {
            warn!("Tracking worker '{}' panicked", name);
        }
    }
}

/// Owns the camera and the preview encoder
struct CaptureWorker {
    source: Arc<dyn CameraSource>,
    device: DeviceSelection,
    constraints: CaptureConstraints,
    tracking: TrackingConfig,
    encoder: Option<PreviewEncoder>,
    frames: SyncSender<Frame>,
    cancelled: Arc<AtomicBool>,
    reader: SnapshotReader,
}

impl CaptureWorker {
    fn run(mut self) {
        let mut camera = match CameraSession::open(self.source.as_ref(), &self.device, &self.constraints) {
            Ok(camera) => camera,
            Err(e) => {
                self.abort(&e);
                return;
            }
        };

        if self.is_cancelled() {
            camera.close();
            return;
        }
        self.reader.mark_ready();

        let poll = Duration::from_millis(self.tracking.poll_interval_ms.max(1));
        let mut dropped: u64 = 0;

        while !self.is_cancelled() {
            let frame = match camera.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    thread::sleep(poll);
                    continue;
                }
                Err(e) => {
                    self.abort(&e);
                    break;
                }
            };

            if self.is_cancelled() {
                break;
            }

            if let Some(encoder) = self.encoder.as_mut() {
                if let Some(preview) = encoder.offer(&frame) {
                    self.reader.publish(|snapshot| snapshot.frame = Some(preview));
                }
            }

            match self.frames.try_send(frame) {
                Ok(()) => {}
                Err(TrySendError::Full(frame)) => {
                    dropped += 1;
                    debug!("Detector busy, dropping frame {}", frame.sequence());
                }
                Err(TrySendError::Disconnected(_)) => break,
            }
        }

        info!(
            "Capture stopped after {} frames ({} skipped by detection)",
            camera.frame_count(),
            dropped
        );
        camera.close();
    }

    fn abort(&self, error: &Error) {
        if !self.is_cancelled() {
            self.reader.fail(error);
            self.cancelled.store(true, Ordering::Release);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Owns the smoothing state; the only writer of the tracked point
struct DetectWorker {
    model: Arc<LandmarkModel>,
    smoother: PointSmoother,
    frames: Receiver<Frame>,
    cancelled: Arc<AtomicBool>,
    reader: SnapshotReader,
}

impl DetectWorker {
    fn run(mut self) {
        let detector = match self.model.get() {
            Ok(detector) => detector,
            Err(e) => {
                if !self.cancelled.load(Ordering::Acquire) {
                    self.reader.fail(&e);
                    self.cancelled.store(true, Ordering::Release);
                }
                return;
            }
        };

        for frame in &self.frames {
            if self.cancelled.load(Ordering::Acquire) {
                break;
            }

            let timestamp_ms = frame.timestamp_ms();
            let hand = match detector.detect(&frame, timestamp_ms) {
                Ok(hand) => hand,
                Err(e) => {
                    warn!("Detection failed on frame {}: {}", frame.sequence(), e);
                    None
                }
            };

            if self.cancelled.load(Ordering::Acquire) {
                break;
            }

            let detection = hand.as_ref().and_then(extract_point);
            let visible = self.smoother.update(timestamp_ms, detection);
            self.reader.publish(|snapshot| snapshot.set_point(visible));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_point_pairs_coordinates() {
        let mut snapshot = TrackingSnapshot::default();
        assert!(snapshot.point().is_none());
        snapshot.x = Some(0.3);
        assert!(snapshot.point().is_none());
        snapshot.y = Some(0.7);
        assert_eq!(snapshot.point(), Some(NormalizedPoint { x: 0.3, y: 0.7 }));
    }

    #[test]
    fn test_failure_is_terminal() {
        let reader = SnapshotReader::new();
        reader.mark_ready();
        reader.publish(|s| {
            s.x = Some(0.5);
            s.y = Some(0.5);
        });
        reader.fail(&Error::CameraUnavailable("unplugged".to_string()));

        reader.publish(|s| {
            s.x = Some(0.1);
            s.y = Some(0.1);
        });
        reader.mark_ready();
        reader.mark_stopped();

        let snapshot = reader.snapshot();
        assert_eq!(reader.state(), SessionState::Failed);
        assert!(snapshot.point().is_none());
        assert!(!snapshot.ready);
        assert!(snapshot.error.as_deref().is_some_and(|e| e.contains("unplugged")));
    }

    #[test]
    fn test_stopped_clears_point() {
        let reader = SnapshotReader::new();
        reader.mark_ready();
        reader.publish(|s| {
            s.x = Some(0.5);
            s.y = Some(0.5);
        });
        reader.mark_stopped();
        assert_eq!(reader.state(), SessionState::Stopped);
        assert!(reader.snapshot().point().is_none());
        assert!(reader.snapshot().error.is_none());
    }
}
