use serde::{Deserialize, Serialize};

use crate::error::DegenerateModelError;
use crate::model::VolumeModel;
use crate::Result;

/// Unit-cell volumes of the pure end members, taken from literature or
/// configuration. Never fitted.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct EndMembers {
    /// Volume of pure MgO (x = 0).
    pub v_mgo: f64,
    /// Volume of pure FeO (x = 1).
    pub v_feo: f64,
}

/// Ideal-mixing model: the unit-cell volume of the (Mg,Fe)O solid solution
/// interpolates linearly between the end-member volumes,
///
/// $$
///     V(x) = (1 - x) V_{MgO} + x V_{FeO}.
/// $$
#[derive(Clone, Copy, Debug)]
pub struct Vegard {
    end_members: EndMembers,
}

impl Vegard {
    #[must_use]
    pub const fn new(end_members: EndMembers) -> Self {
        Self { end_members }
    }

    #[must_use]
    pub const fn end_members(&self) -> EndMembers {
        self.end_members
    }

    /// Interpolated volume at `fraction`. Pure and total: fractions outside
    /// [0, 1] extrapolate beyond the end members.
    #[must_use]
    pub fn predict(&self, fraction: f64) -> f64 {
        (1.0 - fraction) * self.end_members.v_mgo + fraction * self.end_members.v_feo
    }

    /// Fraction at which the Vegard line reaches `volume`.
    ///
    /// # Errors
    /// Fails with [`DegenerateModelError`] when the end-member volumes are
    /// equal, leaving a zero-slope line with no inverse.
    pub fn inverse(&self, volume: f64) -> std::result::Result<f64, DegenerateModelError> {
        let span = self.end_members.v_feo - self.end_members.v_mgo;
        if span == 0.0 {
            return Err(DegenerateModelError {
                volume: self.end_members.v_mgo,
            });
        }
        Ok((volume - self.end_members.v_mgo) / span)
    }
}

impl VolumeModel for Vegard {
    fn predict(&self, fraction: f64) -> f64 {
        Self::predict(self, fraction)
    }

    fn inverse(&self, volume: f64) -> Result<f64> {
        Ok(Self::inverse(self, volume)?)
    }
}
