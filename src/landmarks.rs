//! Hand landmarks and the control point extracted from them.
//!
//! The detector reports 21 landmarks per hand with coordinates normalized to
//! the frame. The extractor reduces them to one point: the index fingertip
//! when it is visible, otherwise the centroid of the palm base.

use crate::constants::{INDEX_FINGER_TIP, NUM_HAND_LANDMARKS, PALM_LANDMARKS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single detector keypoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position, 0.0 = left edge of the unmirrored frame
    pub x: f32,
    /// Vertical position, 0.0 = top edge
    pub y: f32,
    /// Relative depth, not used for the control point
    pub z: f32,
}

impl Landmark {
    /// Create a landmark on the image plane
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Both image coordinates are usable
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Landmark set for one detected hand. Slots the detector did not fill are `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HandLandmarks {
    points: Vec<Option<Landmark>>,
}

impl HandLandmarks {
    /// Build from a full landmark list
    #[must_use]
    pub fn new(points: Vec<Landmark>) -> Self {
        Self {
            points: points.into_iter().map(Some).collect(),
        }
    }

    /// Build from a list that may have gaps
    #[must_use]
    pub fn from_partial(points: Vec<Option<Landmark>>) -> Self {
        Self { points }
    }

    /// Landmark at `index` if present and finite
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied().flatten().filter(Landmark::is_valid)
    }

    /// Number of landmark slots
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// No landmark slots at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether every slot of a full hand is filled
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.points.len() == NUM_HAND_LANDMARKS && (0..NUM_HAND_LANDMARKS).all(|i| self.get(i).is_some())
    }
}

/// Which landmark strategy produced a control point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureTag {
    /// Index fingertip
    Point,
    /// Palm base centroid
    Palm,
}

impl GestureTag {
    /// Wire name of the tag
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Palm => "palm",
        }
    }
}

impl fmt::Display for GestureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mirrored, normalized control coordinates, both in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    /// Mirrored horizontal position
    pub x: f64,
    /// Vertical position, top to bottom
    pub y: f64,
}

impl NormalizedPoint {
    /// Create a point, clamping both coordinates into [0, 1]
    #[must_use]
    pub fn clamped(x: f64, y: f64) -> Self {
        Self {
            x: clamp01(x),
            y: clamp01(y),
        }
    }

    /// Mirror a raw detector position into control space
    #[must_use]
    pub fn from_raw(raw_x: f64, raw_y: f64) -> Self {
        Self::clamped(1.0 - raw_x, raw_y)
    }
}

/// Point plus the strategy that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    /// Normalized position
    pub point: NormalizedPoint,
    /// Landmark strategy
    pub gesture: GestureTag,
}

/// Clamp into [0, 1]; NaN maps to 0
#[must_use]
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Reduce a landmark set to a single control point.
///
/// Returns `None` when neither the fingertip nor the full palm base is
/// visible. That is a routine miss, not an error.
#[must_use]
pub fn extract_point(hand: &HandLandmarks) -> Option<ControlPoint> {
    if let Some(tip) = hand.get(INDEX_FINGER_TIP) {
        return Some(ControlPoint {
            point: NormalizedPoint::from_raw(f64::from(tip.x), f64::from(tip.y)),
            gesture: GestureTag::Point,
        });
    }

    let palm: Vec<Landmark> = PALM_LANDMARKS.iter().filter_map(|&i| hand.get(i)).collect();
    if palm.len() != PALM_LANDMARKS.len() {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = palm.len() as f64;
    let (sum_x, sum_y) = palm
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + f64::from(p.x), sy + f64::from(p.y)));

    Some(ControlPoint {
        point: NormalizedPoint::from_raw(sum_x / n, sum_y / n),
        gesture: GestureTag::Palm,
    })
}
