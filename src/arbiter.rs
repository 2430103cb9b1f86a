//! Track loss hysteresis and two-axis smoothing of the control point.
//!
//! Detectors miss single frames all the time even with a hand in view. The
//! arbiter bridges gaps up to the hold window so consumers never see the
//! point blink out; longer gaps clear it and restart both filters.

use crate::config::{FilterConfig, TrackingConfig};
use crate::filters::{create_filter, ScalarFilter};
use crate::landmarks::{clamp01, ControlPoint, GestureTag, NormalizedPoint};
use crate::Result;
use log::debug;

/// What to do with the visible point on a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterDecision {
    /// A point was detected: smooth it and publish
    Track,
    /// No point, but the last detection is recent: keep showing the old point
    Hold,
    /// No point for longer than the hold window: clear and reset
    Lost,
}

/// Decides when missing detections become lost tracking
#[derive(Debug, Clone)]
pub struct TrackLossArbiter {
    hold_ms: f64,
    last_detection_ms: Option<f64>,
}

impl TrackLossArbiter {
    /// Create an arbiter with the given hold window in milliseconds
    #[must_use]
    pub const fn new(hold_ms: f64) -> Self {
        Self {
            hold_ms,
            last_detection_ms: None,
        }
    }

    /// Record one frame's outcome
    pub fn observe(&mut self, timestamp_ms: f64, detected: bool) -> ArbiterDecision {
        if detected {
            self.last_detection_ms = Some(timestamp_ms);
            return ArbiterDecision::Track;
        }

        match self.last_detection_ms {
            Some(last) if timestamp_ms - last <= self.hold_ms => ArbiterDecision::Hold,
            _ => ArbiterDecision::Lost,
        }
    }

    /// Timestamp of the most recent detection
    #[must_use]
    pub const fn last_detection_ms(&self) -> Option<f64> {
        self.last_detection_ms
    }

    /// Hold window in milliseconds
    #[must_use]
    pub const fn hold_ms(&self) -> f64 {
        self.hold_ms
    }
}

/// Visible control point after smoothing and hysteresis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedPoint {
    /// Smoothed position
    pub point: NormalizedPoint,
    /// Strategy behind the point; `None` while the point is only being held
    pub gesture: Option<GestureTag>,
}

/// Two per-axis filters plus the arbiter that gates them
pub struct PointSmoother {
    x_filter: Box<dyn ScalarFilter>,
    y_filter: Box<dyn ScalarFilter>,
    arbiter: TrackLossArbiter,
    visible: Option<SmoothedPoint>,
}

impl PointSmoother {
    /// Build from configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::FilterError` if the filter configuration is invalid.
    pub fn new(filter: &FilterConfig, tracking: &TrackingConfig) -> Result<Self> {
        Ok(Self::with_filters(
            create_filter(&filter.kind, filter)?,
            create_filter(&filter.kind, filter)?,
            TrackLossArbiter::new(tracking.loss_hold_ms),
        ))
    }

    /// Build from explicit parts
    #[must_use]
    pub fn with_filters(
        x_filter: Box<dyn ScalarFilter>,
        y_filter: Box<dyn ScalarFilter>,
        arbiter: TrackLossArbiter,
    ) -> Self {
        Self {
            x_filter,
            y_filter,
            arbiter,
            visible: None,
        }
    }

    /// Feed one frame's extraction result and return the visible point
    pub fn update(&mut self, timestamp_ms: f64, detection: Option<ControlPoint>) -> Option<SmoothedPoint> {
        match self.arbiter.observe(timestamp_ms, detection.is_some()) {
            ArbiterDecision::Track => {
                if let Some(cp) = detection {
                    let x = clamp01(self.x_filter.filter(cp.point.x, timestamp_ms));
                    let y = clamp01(self.y_filter.filter(cp.point.y, timestamp_ms));
                    self.visible = Some(SmoothedPoint {
                        point: NormalizedPoint { x, y },
                        gesture: Some(cp.gesture),
                    });
                }
            }
            ArbiterDecision::Hold => {
                // Nothing was seen this frame, so there is no gesture to report
                if let Some(visible) = self.visible.as_mut() {
                    visible.gesture = None;
                }
            }
            ArbiterDecision::Lost => {
                if self.visible.is_some() {
                    debug!("Hand lost at {timestamp_ms:.1} ms, resetting filters");
                }
                self.clear();
            }
        }
        self.visible
    }

    /// Currently visible point
    #[must_use]
    pub const fn visible(&self) -> Option<SmoothedPoint> {
        self.visible
    }

    /// Whether the axis filters hold state from earlier detections
    #[must_use]
    pub fn is_primed(&self) -> bool {
        self.x_filter.is_primed() || self.y_filter.is_primed()
    }

    fn clear(&mut self) {
        self.visible = None;
        self.x_filter.reset();
        self.y_filter.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::NoFilter;

    fn detection(x: f64, y: f64) -> Option<ControlPoint> {
        Some(ControlPoint {
            point: NormalizedPoint { x, y },
            gesture: GestureTag::Point,
        })
    }

    #[test]
    fn test_arbiter_decisions() {
        let mut arbiter = TrackLossArbiter::new(120.0);
        assert_eq!(arbiter.observe(0.0, false), ArbiterDecision::Lost);
        assert_eq!(arbiter.observe(10.0, true), ArbiterDecision::Track);
        assert_eq!(arbiter.observe(60.0, false), ArbiterDecision::Hold);
        assert_eq!(arbiter.observe(130.0, false), ArbiterDecision::Hold);
        assert_eq!(arbiter.observe(131.0, false), ArbiterDecision::Lost);
        assert_eq!(arbiter.last_detection_ms(), Some(10.0));
    }

    #[test]
    fn test_hold_keeps_point_but_not_gesture() {
        let mut smoother = PointSmoother::new(&FilterConfig::default(), &TrackingConfig::default()).unwrap();
        let first = smoother.update(0.0, detection(0.4, 0.6)).unwrap();
        assert_eq!(first.gesture, Some(GestureTag::Point));

        let held = smoother.update(33.0, None).unwrap();
        assert_eq!(held.point, first.point);
        assert_eq!(held.gesture, None);

        let again = smoother.update(50.0, detection(0.4, 0.6)).unwrap();
        assert_eq!(again.gesture, Some(GestureTag::Point));
    }

    #[test]
    fn test_loss_clears_and_resets() {
        let mut smoother = PointSmoother::new(&FilterConfig::default(), &TrackingConfig::default()).unwrap();
        smoother.update(0.0, detection(0.1, 0.1));
        smoother.update(16.0, detection(0.12, 0.1));
        assert!(smoother.is_primed());

        assert!(smoother.update(200.0, None).is_none());
        assert!(!smoother.is_primed());

        // Fresh filter: the next detection passes through with no lag
        let after = smoother.update(216.0, detection(0.9, 0.8)).unwrap();
        assert_eq!(after.point, NormalizedPoint { x: 0.9, y: 0.8 });
    }

    #[test]
    fn test_output_is_clamped() {
        let mut smoother = PointSmoother::with_filters(
            Box::new(NoFilter::default()),
            Box::new(NoFilter::default()),
            TrackLossArbiter::new(120.0),
        );
        let out = smoother.update(0.0, detection(1.5, -0.5)).unwrap();
        assert_eq!(out.point, NormalizedPoint { x: 1.0, y: 0.0 });
    }

    #[test]
    fn test_invalid_filter_config() {
        let filter = FilterConfig {
            kind: "median".to_string(),
            ..FilterConfig::default()
        };
        assert!(PointSmoother::new(&filter, &TrackingConfig::default()).is_err());
    }
}
