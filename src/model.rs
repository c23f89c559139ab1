use crate::Result;

/// Common contract shared by the two volume predictors.
///
/// Both the ideal-mixing Vegard line and the empirical least-squares line
/// map a composition to a volume and back, so comparison and estimation
/// code can be written against this trait instead of branching on which
/// model is in play.
pub trait VolumeModel {
    /// Predicted unit-cell volume at Fe fraction `fraction`. Fractions
    /// outside [0, 1] are allowed; flagging extrapolation is the caller's
    /// responsibility.
    fn predict(&self, fraction: f64) -> f64;

    /// Fe fraction whose prediction equals `volume`.
    ///
    /// # Errors
    /// Fails when the model's line is flat and cannot be inverted.
    fn inverse(&self, volume: f64) -> Result<f64>;
}
