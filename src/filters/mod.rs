//! Signal filtering for smoothing the hand control point.
//!
//! Each filter smooths a single scalar channel sampled at irregular
//! timestamps. The tracking pipeline runs one instance per axis.

/// One Euro adaptive low-pass filter
pub mod one_euro;

use crate::config::FilterConfig;
use crate::{Error, Result};

/// Trait for all per-axis filters
pub trait ScalarFilter: Send + Sync {
    /// Filter a sample taken at `timestamp_ms` (milliseconds, arbitrary origin)
    fn filter(&mut self, value: f64, timestamp_ms: f64) -> f64;

    /// Drop all state so the next sample passes through unchanged
    fn reset(&mut self);

    /// Whether the filter has seen a sample since creation or the last reset
    fn is_primed(&self) -> bool;

    /// Get filter name
    fn name(&self) -> &str;
}

/// No-op filter that passes through values unchanged
#[derive(Debug, Default)]
pub struct NoFilter {
    primed: bool,
}

impl ScalarFilter for NoFilter {
    fn filter(&mut self, value: f64, _timestamp_ms: f64) -> f64 {
        self.primed = true;
        value
    }

    fn reset(&mut self) {
        self.primed = false;
    }

    fn is_primed(&self) -> bool {
        self.primed
    }

    fn name(&self) -> &str {
        "NoFilter"
    }
}

/// Create a filter by type name, taking parameters from `config`
///
/// # Errors
///
/// Returns `Error::FilterError` for an unknown name or invalid parameters.
pub fn create_filter(filter_type: &str, config: &FilterConfig) -> Result<Box<dyn ScalarFilter>> {
    match filter_type.to_lowercase().as_str() {
        "none" | "nofilter" => Ok(Box::new(NoFilter::default())),
        "one_euro" | "oneeuro" | "1euro" => {
            let params = one_euro::OneEuroParams::from_config(config);
            params.validate()?;
            Ok(Box::new(one_euro::OneEuroFilter::new(params)))
        }
        _ => Err(Error::FilterError(format!("Unknown filter type: {filter_type}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter() {
        let mut filter = NoFilter::default();
        assert!(!filter.is_primed());
        assert_eq!(filter.filter(0.25, 0.0), 0.25);
        assert!(filter.is_primed());
        filter.reset();
        assert!(!filter.is_primed());
    }

    #[test]
    fn test_create_filter() {
        let config = FilterConfig::default();
        assert!(create_filter("none", &config).is_ok());
        assert!(create_filter("one_euro", &config).is_ok());
        assert!(create_filter("OneEuro", &config).is_ok());
        assert!(create_filter("kalman", &config).is_err());
    }

    #[test]
    fn test_create_filter_rejects_bad_parameters() {
        let config = FilterConfig {
            min_cutoff: 0.0,
            ..FilterConfig::default()
        };
        match create_filter("one_euro", &config) {
            Err(Error::FilterError(msg)) => assert!(msg.contains("min_cutoff")),
            _ => panic!("Expected FilterError"),
        }
    }
}
