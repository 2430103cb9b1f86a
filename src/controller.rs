//! Device selection glue.
//!
//! Keeps at most one [`TrackingSession`] alive and rebuilds it whenever the
//! selected camera changes. The landmark model is shared across rebuilds.

use crate::camera::{detect_camera_options, CameraOption, CameraSource, DeviceSelection};
use crate::config::Config;
use crate::detector::LandmarkModel;
use crate::session::{SessionState, SnapshotReader, TrackingSession, TrackingSnapshot};
use crate::{Error, Result};
use log::info;
use std::sync::Arc;

/// Owns the active tracking session for the selected camera
pub struct TrackingController {
    source: Arc<dyn CameraSource>,
    model: Arc<LandmarkModel>,
    config: Config,
    profile: Option<String>,
    selected: DeviceSelection,
    session: Option<TrackingSession>,
}

impl TrackingController {
    /// Create a controller with no running session
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` if `config` fails validation or `profile`
    /// names a profile that does not exist.
    pub fn new(
        source: Arc<dyn CameraSource>,
        model: Arc<LandmarkModel>,
        config: Config,
        profile: Option<String>,
    ) -> Result<Self> {
        config.validate()?;
        if let Some(name) = profile.as_deref() {
            if !config.profiles.contains_key(name) {
                return Err(Error::ConfigError(format!("Unknown filter profile: {name}")));
            }
        }

        Ok(Self {
            source,
            model,
            config,
            profile,
            selected: DeviceSelection::Default,
            session: None,
        })
    }

    /// Cameras available for selection
    #[must_use]
    pub fn camera_options(&self) -> Vec<CameraOption> {
        detect_camera_options(self.source.as_ref())
    }

    /// Switch to the camera identified by `id` (`"default"` for the platform default).
    ///
    /// The current session, if any, is torn down before the new one starts,
    /// even when `id` names the camera already in use.
    ///
    /// # Errors
    ///
    /// Returns an error if the new session cannot be started.
    pub fn select_device(&mut self, id: &str) -> Result<SnapshotReader> {
        let device = DeviceSelection::parse(id);
        self.stop();

        info!("Selecting camera '{}'", device);
        self.selected = device.clone();
        let session = TrackingSession::start(
            device,
            Arc::clone(&self.source),
            Arc::clone(&self.model),
            &self.config,
            self.profile.as_deref(),
        )?;
        let reader = session.reader();

        self.session = Some(session);
        Ok(reader)
    }

    /// Currently selected device
    #[must_use]
    pub const fn selected(&self) -> &DeviceSelection {
        &self.selected
    }

    /// Latest snapshot of the active session, or an empty one
    #[must_use]
    pub fn snapshot(&self) -> TrackingSnapshot {
        self.session.as_ref().map(TrackingSession::snapshot).unwrap_or_default()
    }

    /// State of the active session
    #[must_use]
    pub fn state(&self) -> Option<SessionState> {
        self.session.as_ref().map(TrackingSession::state)
    }

    /// Reader for the active session
    #[must_use]
    pub fn reader(&self) -> Option<SnapshotReader> {
        self.session.as_ref().map(TrackingSession::reader)
    }

    /// Tear down the active session, if any
    pub fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraStream, CaptureConstraints};
    use crate::frame::Frame;
    use crate::landmarks::HandLandmarks;
    use crate::detector::LandmarkDetector;

    struct NoCamera;

    impl CameraSource for NoCamera {
        fn open(&self, _: &DeviceSelection, _: &CaptureConstraints) -> Result<Box<dyn CameraStream>> {
            Err(Error::CameraUnavailable("no camera".to_string()))
        }

        fn enumerate(&self) -> Result<Vec<CameraOption>> {
            Ok(Vec::new())
        }
    }

    struct Blind;

    impl LandmarkDetector for Blind {
        fn detect(&self, _: &Frame, _: f64) -> Result<Option<HandLandmarks>> {
            Ok(None)
        }
    }

    #[test]
    fn test_failed_start_still_records_selection() {
        let mut config = Config::default();
        config.filter.kind = "bogus".to_string();
        let mut controller = TrackingController {
            source: Arc::new(NoCamera),
            model: Arc::new(LandmarkModel::preloaded(Arc::new(Blind))),
            config,
            profile: None,
            selected: DeviceSelection::Default,
            session: None,
        };

        assert!(matches!(controller.select_device("cam-b"), Err(Error::FilterError(_))));
        assert_eq!(controller.selected(), &DeviceSelection::Exact("cam-b".to_string()));
        assert!(controller.state().is_none());
    }
}
