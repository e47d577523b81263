//! Tunable parameters for reconstruction, alignment and coaching.
//!
//! Every component takes its constants from a [`CoachConfig`] handed to it at
//! construction. The defaults reproduce the bowling rig's behaviour: 100 Hz
//! samples in g-units, a 10-sample quiet period, and coarse coaching
//! thresholds. Configs can be loaded from JSON; missing fields fall back to
//! the defaults.
//!
//! ```
//! use bowling_coach_rs::CoachConfig;
//!
//! let config = CoachConfig::default().with_thresholds(0.5, 0.5);
//! assert!(config.validate().is_ok());
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoachError, Result};

pub const DEFAULT_DT: f64 = 0.01;
pub const G_TO_MSS: f64 = 9.81;
pub const DEFAULT_MIN_SAMPLES: usize = 10;
pub const DEFAULT_THRESHOLD_X: f64 = 10.0;
pub const DEFAULT_THRESHOLD_Z: f64 = 10.0;
pub const DEFAULT_FOLLOW_THROUGH_TOLERANCE: f64 = 0.1;
pub const SENTINEL_SCORE: f64 = 999.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Sampling interval in seconds.
    pub dt: f64,

    /// Conversion from sensor g-units to m/s².
    pub g_to_mss: f64,

    /// Leading samples averaged into the static bias estimate.
    pub calibration_samples: usize,

    /// Shortest recording accepted for reconstruction.
    pub min_samples: usize,

    /// Lateral (X) deviation above which a segment gets a drift advisory.
    /// Same units as reconstructed position, which drifts with integration;
    /// calibrate against the trajectory scale you actually observe.
    pub threshold_x: f64,

    /// Vertical (Z) deviation above which a segment gets a height advisory.
    pub threshold_z: f64,

    /// Final-point Z tolerance for the follow-through check.
    pub follow_through_tolerance: f64,

    /// Score reported when alignment fails.
    pub sentinel_score: f64,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            dt: DEFAULT_DT,
            g_to_mss: G_TO_MSS,
            calibration_samples: DEFAULT_MIN_SAMPLES,
            min_samples: DEFAULT_MIN_SAMPLES,
            threshold_x: DEFAULT_THRESHOLD_X,
            threshold_z: DEFAULT_THRESHOLD_Z,
            follow_through_tolerance: DEFAULT_FOLLOW_THROUGH_TOLERANCE,
            sentinel_score: SENTINEL_SCORE,
        }
    }
}

impl CoachConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Thresholds sized for positions that really are in meters (5 cm lateral
    /// and vertical), for rigs where drift has been tamed upstream.
    pub fn centimeter_scale() -> Self {
        Self {
            threshold_x: 0.05,
            threshold_z: 0.05,
            ..Self::default()
        }
    }

    /// Check every field is in range.
    ///
    /// # Errors
    ///
    /// Returns [`CoachError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(CoachError::InvalidConfig("dt must be positive".into()));
        }
        if !(self.g_to_mss.is_finite() && self.g_to_mss > 0.0) {
            return Err(CoachError::InvalidConfig(
                "g_to_mss must be positive".into(),
            ));
        }
        if self.calibration_samples == 0 {
            return Err(CoachError::InvalidConfig(
                "calibration_samples must be at least 1".into(),
            ));
        }
        if self.min_samples < self.calibration_samples {
            return Err(CoachError::InvalidConfig(format!(
                "min_samples ({}) must cover calibration_samples ({})",
                self.min_samples, self.calibration_samples
            )));
        }
        if !(self.threshold_x >= 0.0 && self.threshold_z >= 0.0) {
            return Err(CoachError::InvalidConfig(
                "deviation thresholds must be non-negative".into(),
            ));
        }
        if !(self.follow_through_tolerance >= 0.0) {
            return Err(CoachError::InvalidConfig(
                "follow_through_tolerance must be non-negative".into(),
            ));
        }
        if !(self.sentinel_score.is_finite() && self.sentinel_score >= 0.0) {
            return Err(CoachError::InvalidConfig(
                "sentinel_score must be a finite non-negative number".into(),
            ));
        }
        Ok(())
    }

    /// Parse a JSON config; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_thresholds(mut self, threshold_x: f64, threshold_z: f64) -> Self {
        self.threshold_x = threshold_x;
        self.threshold_z = threshold_z;
        self
    }

    pub fn with_follow_through_tolerance(mut self, tolerance: f64) -> Self {
        self.follow_through_tolerance = tolerance;
        self
    }

    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoachConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dt, 0.01);
        assert_eq!(config.g_to_mss, 9.81);
        assert_eq!(config.min_samples, 10);
        assert_eq!(config.threshold_x, 10.0);
        assert_eq!(config.follow_through_tolerance, 0.1);
        assert_eq!(config.sentinel_score, 999.0);
    }

    #[test]
    fn test_validation() {
        let mut config = CoachConfig::default();
        config.dt = 0.0;
        assert!(config.validate().is_err());

        config.dt = 0.01;
        config.calibration_samples = 0;
        assert!(config.validate().is_err());

        config.calibration_samples = 20;
        assert!(config.validate().is_err(), "min_samples below calibration window");

        config.min_samples = 20;
        assert!(config.validate().is_ok());

        config.threshold_z = -1.0;
        assert!(config.validate().is_err());

        config.threshold_z = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CoachConfig::from_json_str(r#"{ "threshold_x": 0.5, "dt": 0.02 }"#).unwrap();
        assert_eq!(config.threshold_x, 0.5);
        assert_eq!(config.dt, 0.02);
        assert_eq!(config.threshold_z, DEFAULT_THRESHOLD_Z);
        assert_eq!(config.min_samples, DEFAULT_MIN_SAMPLES);
    }

    #[test]
    fn test_json_rejects_invalid_values() {
        assert!(CoachConfig::from_json_str(r#"{ "dt": -1.0 }"#).is_err());
        assert!(CoachConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_builder_pattern() {
        let config = CoachConfig::centimeter_scale()
            .with_dt(0.005)
            .with_follow_through_tolerance(0.02)
            .with_min_samples(25);
        assert_eq!(config.threshold_x, 0.05);
        assert_eq!(config.dt, 0.005);
        assert_eq!(config.follow_through_tolerance, 0.02);
        assert_eq!(config.min_samples, 25);
        assert!(config.validate().is_ok());
    }
}
