use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::vegard::EndMembers;
use crate::Result;

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;
pub const DEFAULT_SLOPE_THRESHOLD: f64 = 1e-9;

/// Externally supplied constants for an analysis run: literature end-member
/// volumes plus the statistical options. Nothing in here is ever fitted.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Config {
    /// Unit-cell volume of pure MgO (x = 0), cubic Angstrom.
    pub v_mgo: f64,
    /// Unit-cell volume of pure FeO (x = 1), cubic Angstrom.
    pub v_feo: f64,
    /// Confidence level for all intervals, strictly between 0 and 1.
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    /// Slopes with magnitude below this are treated as flat and refused for
    /// inversion.
    #[serde(default = "default_slope_threshold")]
    pub slope_threshold: f64,
}

const fn default_confidence_level() -> f64 {
    DEFAULT_CONFIDENCE_LEVEL
}

const fn default_slope_threshold() -> f64 {
    DEFAULT_SLOPE_THRESHOLD
}

impl Config {
    #[must_use]
    pub const fn new(v_mgo: f64, v_feo: f64) -> Self {
        Self {
            v_mgo,
            v_feo,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            slope_threshold: DEFAULT_SLOPE_THRESHOLD,
        }
    }

    #[must_use]
    pub const fn with_confidence_level(mut self, confidence_level: f64) -> Self {
        self.confidence_level = confidence_level;
        self
    }

    #[must_use]
    pub const fn with_slope_threshold(mut self, slope_threshold: f64) -> Self {
        self.slope_threshold = slope_threshold;
        self
    }

    /// Read and check a TOML configuration file.
    ///
    /// # Errors
    /// Fails on a missing or unparsable file, or when a checked option is
    /// out of range.
    pub fn from_file(filepath: &Path) -> Result<Self> {
        let raw = fs::read_to_string(filepath)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the option ranges.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] naming the offending option.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("V_MgO", self.v_mgo), ("V_FeO", self.v_feo)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValidationError::InvalidEndMember { name, value }.into());
            }
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ValidationError::ConfidenceLevelOutOfRange {
                value: self.confidence_level,
            }
            .into());
        }
        if !self.slope_threshold.is_finite() || self.slope_threshold <= 0.0 {
            return Err(ValidationError::InvalidSlopeThreshold {
                value: self.slope_threshold,
            }
            .into());
        }
        Ok(())
    }

    #[must_use]
    pub const fn end_members(&self) -> EndMembers {
        EndMembers {
            v_mgo: self.v_mgo,
            v_feo: self.v_feo,
        }
    }
}
