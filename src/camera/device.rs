use super::CameraSource;
use crate::constants::{DEFAULT_CAMERA_ID, DEFAULT_CAMERA_LABEL};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which way a requested camera should face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// Toward the user (front/webcam)
    User,
}

/// Camera chosen by the consumer
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum DeviceSelection {
    /// Platform default, preferring a user-facing camera
    #[default]
    Default,
    /// Exactly this device id
    Exact(String),
}

impl DeviceSelection {
    /// Parse a device identifier; blank and `"default"` select the default camera
    #[must_use]
    pub fn parse(id: &str) -> Self {
        let id = id.trim();
        if id.is_empty() || id == DEFAULT_CAMERA_ID {
            Self::Default
        } else {
            Self::Exact(id.to_string())
        }
    }

    /// Facing preference sent with a default request
    #[must_use]
    pub const fn facing_mode(&self) -> Option<FacingMode> {
        match self {
            Self::Default => Some(FacingMode::User),
            Self::Exact(_) => None,
        }
    }

    /// Identifier string, with the sentinel for the default camera
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Default => DEFAULT_CAMERA_ID,
            Self::Exact(id) => id,
        }
    }
}

impl From<&str> for DeviceSelection {
    fn from(id: &str) -> Self {
        Self::parse(id)
    }
}

impl fmt::Display for DeviceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Selectable camera
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraOption {
    /// Identifier accepted by [`DeviceSelection::parse`]
    pub id: String,
    /// Human-readable name
    pub label: String,
}

impl CameraOption {
    /// Option standing in for the platform default camera
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            id: DEFAULT_CAMERA_ID.to_string(),
            label: DEFAULT_CAMERA_LABEL.to_string(),
        }
    }
}

/// List cameras for a device picker.
///
/// Blank labels become `Camera N`, blank ids become `default-N`. When nothing
/// can be listed the single default option is returned, so the picker is
/// never empty.
#[must_use]
pub fn detect_camera_options(source: &dyn CameraSource) -> Vec<CameraOption> {
    let devices = match source.enumerate() {
        Ok(devices) => devices,
        Err(e) => {
            warn!("Camera enumeration failed: {}", e);
            return vec![CameraOption::fallback()];
        }
    };

    if devices.is_empty() {
        return vec![CameraOption::fallback()];
    }

    devices
        .into_iter()
        .enumerate()
        .map(|(index, device)| CameraOption {
            id: if device.id.trim().is_empty() {
                format!("{DEFAULT_CAMERA_ID}-{index}")
            } else {
                device.id
            },
            label: if device.label.trim().is_empty() {
                format!("Camera {}", index + 1)
            } else {
                device.label
            },
        })
        .collect()
}
