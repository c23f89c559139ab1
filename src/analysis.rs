use crate::config::Config;
use crate::dataset::{Dataset, ValidationWarning};
use crate::deviation::{compare, DeviationReport};
use crate::estimate::{estimate, FeEstimate, Measurement};
use crate::linfit::{linfit, LinearFit};
use crate::vegard::Vegard;
use crate::Result;

/// Completed model comparison for one dataset: the empirical fit, the ideal
/// Vegard model, and the deviation report between them, plus any validation
/// warnings. Exists only when every pipeline stage succeeded, so a partial
/// comparison can never be observed.
#[derive(Clone, Debug)]
pub struct Analysis {
    vegard: Vegard,
    fit: LinearFit,
    report: DeviationReport,
    warnings: Vec<ValidationWarning>,
    confidence_level: f64,
    slope_threshold: f64,
}

/// Run the whole pipeline synchronously: validate the data and the
/// configuration, fit both models, and compare them. Any failure aborts the
/// run before a result is produced.
///
/// # Errors
/// Propagates the first [`ValidationError`](crate::error::ValidationError)
/// or [`FitError`](crate::error::FitError) encountered.
pub fn run(dataset: Dataset, config: &Config) -> Result<Analysis> {
    config.validate()?;
    let validated = dataset.validate()?;
    let fit = linfit(&validated)?;
    let vegard = Vegard::new(config.end_members());
    let report = compare(&validated, &vegard, &fit);

    Ok(Analysis {
        vegard,
        fit,
        report,
        warnings: validated.warnings().to_vec(),
        confidence_level: config.confidence_level,
        slope_threshold: config.slope_threshold,
    })
}

impl Analysis {
    #[must_use]
    pub const fn fit(&self) -> &LinearFit {
        &self.fit
    }

    #[must_use]
    pub const fn vegard(&self) -> &Vegard {
        &self.vegard
    }

    #[must_use]
    pub const fn report(&self) -> &DeviationReport {
        &self.report
    }

    #[must_use]
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    /// Estimate the Fe fraction of an unknown sample from its measured
    /// volume, using this analysis's fit and configured options.
    ///
    /// # Errors
    /// Fails with [`EstimationError`](crate::error::EstimationError) when
    /// the fitted slope is below the configured threshold or the
    /// observation is not finite.
    pub fn estimate(&self, measurement: &Measurement) -> Result<FeEstimate> {
        Ok(estimate(
            measurement,
            &self.fit,
            self.confidence_level,
            self.slope_threshold,
        )?)
    }
}
