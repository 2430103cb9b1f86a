//! Hand landmark detection.
//!
//! The detector itself is an external model. This module defines the seam
//! the pipeline calls through and a loader that initialises the model once
//! and shares it between every tracking session.

/// ONNX Runtime hand landmark backend
#[cfg(feature = "onnx")]
pub mod onnx;

use crate::frame::Frame;
use crate::landmarks::HandLandmarks;
use crate::Result;
use log::info;
use std::sync::{Arc, Mutex, PoisonError};

/// Per-frame hand landmark detector.
///
/// Implementations report at most one hand. Latency may vary and any call may
/// fail; callers treat a failure as "nothing seen this frame".
pub trait LandmarkDetector: Send + Sync {
    /// Detect a hand in `frame` captured at `timestamp_ms`
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the model output is malformed.
    fn detect(&self, frame: &Frame, timestamp_ms: f64) -> Result<Option<HandLandmarks>>;
}

type DetectorInit = dyn Fn() -> Result<Arc<dyn LandmarkDetector>> + Send + Sync;

/// Lazily loaded, shared landmark model.
///
/// The first successful [`LandmarkModel::get`] runs the initialiser; later
/// calls from any session reuse the same detector. A failed load is not
/// cached, so a later session can try again.
pub struct LandmarkModel {
    init: Box<DetectorInit>,
    loaded: Mutex<Option<Arc<dyn LandmarkDetector>>>,
}

impl LandmarkModel {
    /// Create a model that loads with `init` on first use
    pub fn new<F>(init: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn LandmarkDetector>> + Send + Sync + 'static,
    {
        Self {
            init: Box::new(init),
            loaded: Mutex::new(None),
        }
    }

    /// Wrap an already constructed detector
    #[must_use]
    pub fn preloaded(detector: Arc<dyn LandmarkDetector>) -> Self {
        let shared = Arc::clone(&detector);
        Self {
            init: Box::new(move || Ok(Arc::clone(&shared))),
            loaded: Mutex::new(Some(detector)),
        }
    }

    /// Get the detector, loading it if this is the first request
    ///
    /// # Errors
    ///
    /// Returns the initialiser's error if loading fails.
    pub fn get(&self) -> Result<Arc<dyn LandmarkDetector>> {
        let mut loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(detector) = loaded.as_ref() {
            return Ok(Arc::clone(detector));
        }

        info!("Loading hand landmark model");
        let detector = (self.init)()?;
        *loaded = Some(Arc::clone(&detector));
        Ok(detector)
    }

    /// Whether the model has been loaded
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Blind;

    impl LandmarkDetector for Blind {
        fn detect(&self, _: &Frame, _: f64) -> Result<Option<HandLandmarks>> {
            Ok(None)
        }
    }

    #[test]
    fn test_model_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let model = LandmarkModel::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Blind) as Arc<dyn LandmarkDetector>)
        });

        assert!(!model.is_loaded());
        let a = model.get().unwrap();
        let b = model.get().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(model.is_loaded());
    }

    #[test]
    fn test_failed_load_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let model = LandmarkModel::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::ModelError("download failed".to_string()))
            } else {
                Ok(Arc::new(Blind) as Arc<dyn LandmarkDetector>)
            }
        });

        assert!(model.get().is_err());
        assert!(!model.is_loaded());
        assert!(model.get().is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_preloaded() {
        let model = LandmarkModel::preloaded(Arc::new(Blind));
        assert!(model.is_loaded());
        assert!(model.get().is_ok());
    }
}
