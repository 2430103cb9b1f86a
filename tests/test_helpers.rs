//! Scripted camera and detector backends for pipeline tests

#![allow(dead_code)]

use gesture_tracking::camera::{CameraOption, CameraSource, CameraStream, CaptureConstraints, DeviceSelection};
use gesture_tracking::constants::NUM_HAND_LANDMARKS;
use gesture_tracking::detector::{LandmarkDetector, LandmarkModel};
use gesture_tracking::frame::Frame;
use gesture_tracking::landmarks::{HandLandmarks, Landmark};
use gesture_tracking::{Error, Result, SnapshotReader, TrackingSnapshot};
use image::RgbImage;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Counters shared between a scripted source and the test
#[derive(Default)]
pub struct CameraCounters {
    pub opened: AtomicUsize,
    pub released: AtomicUsize,
    pub frames: AtomicUsize,
    pub last_device: Mutex<Option<DeviceSelection>>,
}

impl CameraCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }

    pub fn last_device(&self) -> Option<DeviceSelection> {
        self.last_device.lock().unwrap().clone()
    }
}

/// Camera whose behaviour is fixed up front
pub struct ScriptedSource {
    pub open_delay: Duration,
    pub open_error: Option<String>,
    pub frame_limit: Option<usize>,
    pub frame_interval: Duration,
    pub size: (u32, u32),
    pub devices: Vec<CameraOption>,
    pub counters: Arc<CameraCounters>,
}

impl ScriptedSource {
    /// Streams 64x48 frames every 2 ms until closed
    pub fn streaming() -> Self {
        Self {
            open_delay: Duration::ZERO,
            open_error: None,
            frame_limit: None,
            frame_interval: Duration::from_millis(2),
            size: (64, 48),
            devices: Vec::new(),
            counters: Arc::new(CameraCounters::default()),
        }
    }

    /// Fails to open after `delay`
    pub fn failing_open(delay: Duration, cause: &str) -> Self {
        Self {
            open_delay: delay,
            open_error: Some(cause.to_string()),
            ..Self::streaming()
        }
    }

    /// Delivers `frames` frames, then the stream errors
    pub fn dying_after(frames: usize) -> Self {
        Self {
            frame_limit: Some(frames),
            ..Self::streaming()
        }
    }
}

impl CameraSource for ScriptedSource {
    fn open(&self, device: &DeviceSelection, _: &CaptureConstraints) -> Result<Box<dyn CameraStream>> {
        thread::sleep(self.open_delay);
        *self.counters.last_device.lock().unwrap() = Some(device.clone());
        if let Some(cause) = &self.open_error {
            return Err(Error::CameraUnavailable(cause.clone()));
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedStream {
            remaining: self.frame_limit,
            interval: self.frame_interval,
            size: self.size,
            counters: Arc::clone(&self.counters),
        }))
    }

    fn enumerate(&self) -> Result<Vec<CameraOption>> {
        Ok(self.devices.clone())
    }
}

struct ScriptedStream {
    remaining: Option<usize>,
    interval: Duration,
    size: (u32, u32),
    counters: Arc<CameraCounters>,
}

impl CameraStream for ScriptedStream {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        thread::sleep(self.interval);
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Err(Error::CameraUnavailable("device unplugged".to_string()));
            }
            *remaining -= 1;
        }
        self.counters.frames.fetch_add(1, Ordering::SeqCst);
        Ok(Some(RgbImage::new(self.size.0, self.size.1)))
    }

    fn resolution(&self) -> (u32, u32) {
        self.size
    }
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Detector driven by a closure
pub struct FnDetector<F>(pub F);

impl<F> LandmarkDetector for FnDetector<F>
where
    F: Fn(&Frame) -> Result<Option<HandLandmarks>> + Send + Sync,
{
    fn detect(&self, frame: &Frame, _timestamp_ms: f64) -> Result<Option<HandLandmarks>> {
        (self.0)(frame)
    }
}

/// Model that is already loaded with `detect`
pub fn model_from<F>(detect: F) -> Arc<LandmarkModel>
where
    F: Fn(&Frame) -> Result<Option<HandLandmarks>> + Send + Sync + 'static,
{
    Arc::new(LandmarkModel::preloaded(Arc::new(FnDetector(detect))))
}

/// Model that never sees a hand
pub fn blind_model() -> Arc<LandmarkModel> {
    model_from(|_| Ok(None))
}

/// Every landmark at the same raw position
pub fn hand_at(x: f32, y: f32) -> HandLandmarks {
    HandLandmarks::new(vec![Landmark::new(x, y); NUM_HAND_LANDMARKS])
}

/// Poll `reader` until `condition` holds or `timeout` elapses
pub fn wait_for(
    reader: &SnapshotReader,
    timeout: Duration,
    condition: impl Fn(&TrackingSnapshot) -> bool,
) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition(&reader.snapshot()) {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition(&reader.snapshot())
}
