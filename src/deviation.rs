use crate::dataset::ValidatedDataset;
use crate::linfit::LinearFit;
use crate::math::mean;
use crate::model::VolumeModel;
use crate::vegard::Vegard;

/// Disagreement between the two predictors at one measured composition.
#[derive(Clone, Copy, Debug)]
pub struct SampleDeviation {
    pub fraction: f64,
    pub least_squares: f64,
    pub vegard: f64,
    /// Least-squares prediction minus Vegard prediction.
    pub signed: f64,
}

/// Structured comparison of the empirical fit against ideal mixing.
///
/// An R-squared near one together with small deviations indicates
/// near-ideal mixing; a systematic signed deviation indicates non-ideal
/// mixing even when the fit itself is good.
#[derive(Clone, Debug)]
pub struct DeviationReport {
    pub per_sample: Vec<SampleDeviation>,
    pub mean_absolute: f64,
    pub root_mean_square: f64,
    pub max_absolute: f64,
    /// Mean absolute deviation as a percentage of the Vegard prediction.
    pub mean_relative_percent: f64,
    /// R-squared of the least-squares fit, reported alongside as a
    /// standalone goodness-of-fit indicator.
    pub r_squared: f64,
}

fn predictions(model: &dyn VolumeModel, fractions: &[f64]) -> Vec<f64> {
    fractions.iter().map(|&x| model.predict(x)).collect()
}

/// Evaluate both models at every measured composition and aggregate their
/// disagreement. Pure function of its three inputs.
#[must_use]
pub fn compare(data: &ValidatedDataset, vegard: &Vegard, fit: &LinearFit) -> DeviationReport {
    let fractions = data.fractions();
    let least_squares = predictions(fit, &fractions);
    let ideal = predictions(vegard, &fractions);

    let per_sample: Vec<SampleDeviation> = fractions
        .iter()
        .zip(least_squares.iter().zip(&ideal))
        .map(|(&fraction, (&least_squares, &vegard))| SampleDeviation {
            fraction,
            least_squares,
            vegard,
            signed: least_squares - vegard,
        })
        .collect();

    let absolute: Vec<f64> = per_sample.iter().map(|d| d.signed.abs()).collect();
    let relative_percent: Vec<f64> = per_sample
        .iter()
        .map(|d| d.signed.abs() / d.vegard.abs() * 100.0)
        .collect();

    let root_mean_square = (per_sample
        .iter()
        .map(|d| d.signed.powi(2))
        .sum::<f64>()
        / per_sample.len() as f64)
        .sqrt();
    let max_absolute = absolute.iter().copied().fold(0.0, f64::max);

    DeviationReport {
        mean_absolute: mean(&absolute),
        root_mean_square,
        max_absolute,
        mean_relative_percent: mean(&relative_percent),
        r_squared: fit.r_squared(),
        per_sample,
    }
}
