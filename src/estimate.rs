use crate::error::EstimationError;
use crate::linfit::LinearFit;
use crate::math::t_critical;

/// One observed unit-cell volume, optionally with its own one-sigma
/// measurement uncertainty.
#[derive(Clone, Copy, Debug)]
pub struct Measurement {
    pub volume: f64,
    pub sigma: Option<f64>,
}

impl Measurement {
    #[must_use]
    pub const fn from_volume(volume: f64) -> Self {
        Self {
            volume,
            sigma: None,
        }
    }

    #[must_use]
    pub const fn with_sigma(volume: f64, sigma: f64) -> Self {
        Self {
            volume,
            sigma: Some(sigma),
        }
    }
}

/// Fe fraction recovered from one volume observation. Ephemeral: computed
/// per query, never stored by the crate.
#[derive(Clone, Copy, Debug)]
pub struct FeEstimate {
    pub fraction: f64,
    pub standard_error: f64,
    /// Confidence interval bounds around `fraction`.
    pub lower: f64,
    pub upper: f64,
    /// Set when the estimate falls outside [0, 1]. The value is still
    /// reported: an unphysical fraction means the sample is not a member of
    /// this solid solution or the fit/measurement is off, and clamping
    /// would hide that.
    pub out_of_range: bool,
    /// Set when the estimate falls outside the composition range the fit
    /// was trained on, so the inversion extrapolates the line.
    pub extrapolated: bool,
}

impl FeEstimate {
    /// The estimated fraction as a percentage of Fe substitution.
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.fraction * 100.0
    }
}

/// Invert the fitted line at an observed volume, `x = (V - a) / b`, and
/// propagate the fit and measurement uncertainties into a confidence
/// interval for the fraction.
///
/// First-order propagation through the implicit-function derivatives
/// `dx/dV = 1/b`, `dx/da = -1/b`, `dx/db = -(V - a)/b^2`, combining
/// `Var(a)`, `Var(b)`, `Cov(a, b)` and, when present, the observation's own
/// `sigma^2`.
///
/// # Errors
/// Fails with [`EstimationError`] when the observation is not finite and
/// positive, or when the fitted slope is statistically indistinguishable
/// from flat (magnitude below `slope_threshold`), which makes the inversion
/// unstable.
///
/// # Panics
/// Panics if `confidence_level` lies outside (0, 1); the level is checked
/// at configuration load.
pub fn estimate(
    measurement: &Measurement,
    fit: &LinearFit,
    confidence_level: f64,
    slope_threshold: f64,
) -> Result<FeEstimate, EstimationError> {
    if !measurement.volume.is_finite() {
        return Err(EstimationError::NonFiniteObservation {
            value: measurement.volume,
        });
    }
    if measurement.volume <= 0.0 {
        return Err(EstimationError::NonPositiveObservation {
            value: measurement.volume,
        });
    }

    let slope = fit.slope();
    if slope.abs() < slope_threshold {
        return Err(EstimationError::NearZeroSlope {
            slope,
            threshold: slope_threshold,
        });
    }

    let fraction = (measurement.volume - fit.intercept()) / slope;

    let d_volume = 1.0 / slope;
    let d_intercept = -1.0 / slope;
    let d_slope = -(measurement.volume - fit.intercept()) / slope.powi(2);

    let sigma_sq = measurement.sigma.map_or(0.0, |s| s.powi(2));
    let variance = d_volume.powi(2) * sigma_sq
        + d_intercept.powi(2) * fit.var_intercept()
        + d_slope.powi(2) * fit.var_slope()
        + 2.0 * d_intercept * d_slope * fit.covar();

    let standard_error = variance.sqrt();
    let halfwidth = t_critical(confidence_level, fit.degrees_of_freedom()) * standard_error;

    Ok(FeEstimate {
        fraction,
        standard_error,
        lower: fraction - halfwidth,
        upper: fraction + halfwidth,
        out_of_range: !(0.0..=1.0).contains(&fraction),
        extrapolated: !fit.window_contains(fraction),
    })
}
