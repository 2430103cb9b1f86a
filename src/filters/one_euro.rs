use super::ScalarFilter;
use crate::config::FilterConfig;
use crate::constants::{DEFAULT_BETA, DEFAULT_DERIVATIVE_CUTOFF, DEFAULT_MIN_CUTOFF, MIN_SAMPLE_INTERVAL};
use crate::{Error, Result};

/// Tuning parameters for [`OneEuroFilter`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OneEuroParams {
    /// Cutoff frequency (Hz) when the signal is at rest
    pub min_cutoff: f64,
    /// How fast the cutoff rises with speed
    pub beta: f64,
    /// Cutoff frequency (Hz) of the derivative estimate
    pub derivative_cutoff: f64,
}

impl Default for OneEuroParams {
    fn default() -> Self {
        Self {
            min_cutoff: DEFAULT_MIN_CUTOFF,
            beta: DEFAULT_BETA,
            derivative_cutoff: DEFAULT_DERIVATIVE_CUTOFF,
        }
    }
}

impl OneEuroParams {
    /// Take the parameters from a filter configuration section
    #[must_use]
    pub const fn from_config(config: &FilterConfig) -> Self {
        Self {
            min_cutoff: config.min_cutoff,
            beta: config.beta,
            derivative_cutoff: config.derivative_cutoff,
        }
    }

    /// Check that cutoffs are positive and beta is non-negative
    ///
    /// # Errors
    ///
    /// Returns `Error::FilterError` naming the offending parameter.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_cutoff.is_finite() && self.min_cutoff > 0.0) {
            return Err(Error::FilterError(format!(
                "min_cutoff must be positive, got {}",
                self.min_cutoff
            )));
        }
        if !(self.beta.is_finite() && self.beta >= 0.0) {
            return Err(Error::FilterError(format!("beta must be non-negative, got {}", self.beta)));
        }
        if !(self.derivative_cutoff.is_finite() && self.derivative_cutoff > 0.0) {
            return Err(Error::FilterError(format!(
                "derivative_cutoff must be positive, got {}",
                self.derivative_cutoff
            )));
        }
        Ok(())
    }
}

/// Exponential smoothing factor for a first-order low-pass at `cutoff` Hz
/// sampled every `dt` seconds: `r / (r + 1)` with `r = 2π·cutoff·dt`.
#[must_use]
pub fn smoothing_factor(dt: f64, cutoff: f64) -> f64 {
    let r = 2.0 * std::f64::consts::PI * cutoff * dt;
    r / (r + 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FilterState {
    value: f64,
    derivative: f64,
    last_timestamp: f64,
}

/// One Euro filter for a single scalar channel.
///
/// The cutoff frequency follows the smoothed speed of the signal: at rest it
/// sits at `min_cutoff` and smooths hard, during fast motion it rises by
/// `beta·|derivative|` so the output keeps up with the hand.
#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    params: OneEuroParams,
    state: Option<FilterState>,
}

impl Default for OneEuroFilter {
    fn default() -> Self {
        Self::new(OneEuroParams::default())
    }
}

impl OneEuroFilter {
    /// Create a new One Euro filter
    ///
    /// # Panics
    ///
    /// Panics if a cutoff is not positive or beta is negative
    #[must_use]
    pub fn new(params: OneEuroParams) -> Self {
        assert!(params.min_cutoff > 0.0, "Minimum cutoff must be positive");
        assert!(params.derivative_cutoff > 0.0, "Derivative cutoff must be positive");
        assert!(params.beta >= 0.0, "Beta must be non-negative");
        Self { params, state: None }
    }

    /// Parameters this filter was built with
    #[must_use]
    pub const fn params(&self) -> &OneEuroParams {
        &self.params
    }

    /// Cutoff frequency used for a given smoothed derivative
    #[must_use]
    pub fn adaptive_cutoff(&self, derivative: f64) -> f64 {
        self.params.beta.mul_add(derivative.abs(), self.params.min_cutoff)
    }

    /// Last smoothed value, if primed
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.state.map(|s| s.value)
    }

    /// Last smoothed derivative (units per second), if primed
    #[must_use]
    pub fn derivative(&self) -> Option<f64> {
        self.state.map(|s| s.derivative)
    }
}

impl ScalarFilter for OneEuroFilter {
    fn filter(&mut self, value: f64, timestamp_ms: f64) -> f64 {
        let Some(state) = self.state.as_mut() else {
            self.state = Some(FilterState {
                value,
                derivative: 0.0,
                last_timestamp: timestamp_ms,
            });
            return value;
        };

        let dt = ((timestamp_ms - state.last_timestamp) / 1000.0).max(MIN_SAMPLE_INTERVAL);

        let raw_derivative = (value - state.value) / dt;
        let alpha_d = smoothing_factor(dt, self.params.derivative_cutoff);
        state.derivative = alpha_d.mul_add(raw_derivative - state.derivative, state.derivative);

        let cutoff = self.params.beta.mul_add(state.derivative.abs(), self.params.min_cutoff);
        let alpha = smoothing_factor(dt, cutoff);
        state.value = alpha.mul_add(value - state.value, state.value);
        state.last_timestamp = timestamp_ms;

        state.value
    }

    fn reset(&mut self) {
        self.state = None;
    }

    fn is_primed(&self) -> bool {
        self.state.is_some()
    }

    fn name(&self) -> &str {
        "OneEuroFilter"
    }
}
