use std::fs;
use std::path::Path;

use itertools::Itertools;
use serde::Deserialize;

use crate::error::ValidationError;
use crate::Result;

/// One measured composition-volume pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Mole fraction of Fe substituting for Mg, in [0, 1].
    pub fraction: f64,
    /// Measured unit-cell volume in cubic Angstrom.
    pub volume: f64,
    /// Optional one-sigma uncertainty on the volume.
    pub sigma: Option<f64>,
}

impl Sample {
    #[must_use]
    pub const fn new(fraction: f64, volume: f64) -> Self {
        Self {
            fraction,
            volume,
            sigma: None,
        }
    }

    #[must_use]
    pub const fn with_sigma(fraction: f64, volume: f64, sigma: f64) -> Self {
        Self {
            fraction,
            volume,
            sigma: Some(sigma),
        }
    }
}

/// An ordered collection of samples, as loaded. Replicate compositions are
/// allowed; nothing is checked until [`Dataset::validate`] runs.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    samples: Vec<Sample>,
}

#[derive(Deserialize)]
struct Row(f64, f64, Option<f64>);

impl Dataset {
    #[must_use]
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Build a dataset from bare (fraction, volume) pairs.
    #[must_use]
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        Self {
            samples: pairs
                .iter()
                .map(|&(fraction, volume)| Sample::new(fraction, volume))
                .collect(),
        }
    }

    /// Read a dataset from a headered CSV file with columns
    /// `fraction,volume[,sigma]`.
    ///
    /// # Errors
    /// Fails if the file is missing or a record does not match the schema;
    /// the error names the offending row.
    pub fn from_file(filepath: &Path) -> Result<Self> {
        if !filepath.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("dataset file {} not found", filepath.display()),
            )
            .into());
        }

        let file = fs::read(filepath)?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(&file[..]);

        let mut samples = vec![];
        for (row, result) in rdr.deserialize().enumerate() {
            let record: Row = result.map_err(|source| ValidationError::MalformedRecord {
                row: row + 1,
                source,
            })?;
            samples.push(Sample {
                fraction: record.0,
                volume: record.1,
                sigma: record.2,
            });
        }

        Ok(Self { samples })
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Check every sample against the physical and structural rules.
    ///
    /// Hard rules fail fast with the first violated rule and its row; soft
    /// findings (exact duplicate pairs, a non-monotonic volume trend) are
    /// carried as warnings on the returned view. Rows are numbered from 1.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] naming the rule and the offending value.
    pub fn validate(self) -> Result<ValidatedDataset> {
        if self.samples.is_empty() {
            return Err(ValidationError::Empty.into());
        }

        for (ii, sample) in self.samples.iter().enumerate() {
            let row = ii + 1;
            if !sample.fraction.is_finite() {
                return Err(ValidationError::NonFiniteFraction {
                    row,
                    value: sample.fraction,
                }
                .into());
            }
            if !(0.0..=1.0).contains(&sample.fraction) {
                return Err(ValidationError::FractionOutOfRange {
                    row,
                    value: sample.fraction,
                }
                .into());
            }
            if !sample.volume.is_finite() {
                return Err(ValidationError::NonFiniteVolume {
                    row,
                    value: sample.volume,
                }
                .into());
            }
            if sample.volume <= 0.0 {
                return Err(ValidationError::NonPositiveVolume {
                    row,
                    value: sample.volume,
                }
                .into());
            }
            if let Some(sigma) = sample.sigma {
                if !sigma.is_finite() || sigma < 0.0 {
                    return Err(ValidationError::InvalidUncertainty { row, value: sigma }.into());
                }
            }
        }

        let distinct = self
            .samples
            .iter()
            .map(|s| s.fraction)
            .sorted_by(f64::total_cmp)
            .dedup()
            .count();
        if distinct < 2 {
            return Err(ValidationError::TooFewDistinctCompositions { distinct }.into());
        }

        let mut warnings = duplicate_pair_warnings(&self.samples);
        if !is_monotonic_in_composition(&self.samples) {
            warnings.push(ValidationWarning::NonMonotonicTrend);
        }

        Ok(ValidatedDataset {
            samples: self.samples,
            warnings,
        })
    }
}

/// Soft findings from validation. Scientifically interesting rather than
/// malformed, so they never abort the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationWarning {
    /// An exact (fraction, volume) pair appears more than once; `row` is the
    /// later of the two occurrences.
    DuplicatePair { row: usize },
    /// Mean volume per composition does not move monotonically with the Fe
    /// fraction, which is unexpected for this solid solution.
    NonMonotonicTrend,
}

/// A read-only view of a dataset that passed validation.
#[derive(Clone, Debug)]
pub struct ValidatedDataset {
    samples: Vec<Sample>,
    warnings: Vec<ValidationWarning>,
}

impl ValidatedDataset {
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[must_use]
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn fractions(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.fraction).collect()
    }

    #[must_use]
    pub fn volumes(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.volume).collect()
    }
}

#[cfg(test)]
impl ValidatedDataset {
    /// Test-only escape hatch for exercising defensive re-checks downstream
    /// of validation.
    pub(crate) fn from_samples_unchecked(samples: Vec<Sample>) -> Self {
        Self {
            samples,
            warnings: vec![],
        }
    }
}

fn duplicate_pair_warnings(samples: &[Sample]) -> Vec<ValidationWarning> {
    let mut ordered: Vec<(usize, &Sample)> = samples.iter().enumerate().collect();
    ordered.sort_by(|(_, a), (_, b)| {
        f64::total_cmp(&a.fraction, &b.fraction).then(f64::total_cmp(&a.volume, &b.volume))
    });

    ordered
        .iter()
        .tuple_windows()
        .filter(|((_, a), (_, b))| a.fraction == b.fraction && a.volume == b.volume)
        .map(|(_, (ii, _))| ValidationWarning::DuplicatePair { row: ii + 1 })
        .collect()
}

/// Replicates are averaged per distinct composition before checking the
/// trend, so repeated measurements at one composition cannot trip it.
fn is_monotonic_in_composition(samples: &[Sample]) -> bool {
    let mut ordered: Vec<&Sample> = samples.iter().collect();
    ordered.sort_by(|a, b| f64::total_cmp(&a.fraction, &b.fraction));

    let mut group_means: Vec<f64> = vec![];
    for (_, group) in &ordered.iter().group_by(|s| s.fraction) {
        let volumes: Vec<f64> = group.map(|s| s.volume).collect();
        group_means.push(crate::math::mean(&volumes));
    }

    let non_decreasing = group_means.iter().tuple_windows().all(|(a, b)| a <= b);
    let non_increasing = group_means.iter().tuple_windows().all(|(a, b)| a >= b);
    non_decreasing || non_increasing
}

#[cfg(test)]
mod tests {
    use super::{Dataset, Sample, ValidationWarning};
    use crate::error::{Error, ValidationError};

    fn trend() -> Dataset {
        Dataset::from_pairs(&[(0.05, 74.9), (0.15, 76.4), (0.25, 77.8)])
    }

    #[test]
    fn well_formed_dataset_passes_with_no_warnings() {
        let validated = trend().validate().unwrap();
        assert_eq!(validated.len(), 3);
        assert!(validated.warnings().is_empty());
    }

    #[test]
    fn boundary_fractions_are_accepted() {
        let dataset = Dataset::from_pairs(&[(0.0, 74.33), (1.0, 81.56)]);
        assert!(dataset.validate().is_ok());
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let err = Dataset::default().validate().unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::Empty)));
    }

    #[test]
    fn single_composition_is_rejected() {
        let dataset = Dataset::from_pairs(&[(0.2, 75.0), (0.2, 75.1), (0.2, 75.2)]);
        let err = dataset.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::TooFewDistinctCompositions { distinct: 1 })
        ));
    }

    #[test]
    fn fraction_outside_unit_interval_is_rejected_with_row() {
        let dataset = Dataset::from_pairs(&[(0.1, 75.0), (1.2, 80.0)]);
        let err = dataset.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::FractionOutOfRange { row: 2, .. })
        ));
    }

    #[test]
    fn nan_fraction_is_rejected_as_non_finite() {
        let dataset = Dataset::from_pairs(&[(f64::NAN, 75.0), (0.2, 76.0)]);
        let err = dataset.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NonFiniteFraction { row: 1, .. })
        ));
    }

    #[test]
    fn infinite_volume_is_rejected() {
        let dataset = Dataset::from_pairs(&[(0.1, f64::INFINITY), (0.2, 76.0)]);
        let err = dataset.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NonFiniteVolume { row: 1, .. })
        ));
    }

    #[test]
    fn non_positive_volume_is_rejected() {
        let dataset = Dataset::from_pairs(&[(0.1, 75.0), (0.2, 0.0)]);
        let err = dataset.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::NonPositiveVolume { row: 2, .. })
        ));
    }

    #[test]
    fn negative_uncertainty_is_rejected() {
        let dataset = Dataset::new(vec![
            Sample::with_sigma(0.1, 75.0, -0.1),
            Sample::new(0.2, 76.0),
        ]);
        let err = dataset.validate().unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::InvalidUncertainty { row: 1, .. })
        ));
    }

    #[test]
    fn exact_duplicate_pair_warns_but_passes() {
        let dataset = Dataset::from_pairs(&[(0.1, 75.0), (0.1, 75.0), (0.3, 77.0)]);
        let validated = dataset.validate().unwrap();
        assert!(validated
            .warnings()
            .iter()
            .any(|w| matches!(w, ValidationWarning::DuplicatePair { .. })));
    }

    #[test]
    fn non_monotonic_trend_warns_but_passes() {
        let dataset = Dataset::from_pairs(&[(0.0, 74.3), (0.5, 79.0), (1.0, 76.0)]);
        let validated = dataset.validate().unwrap();
        assert!(validated
            .warnings()
            .contains(&ValidationWarning::NonMonotonicTrend));
    }

    #[test]
    fn replicates_do_not_trip_the_monotonic_check() {
        // At x = 0.1 the replicate volumes straddle their own mean, but the
        // per-composition means still rise with x.
        let dataset =
            Dataset::from_pairs(&[(0.1, 75.2), (0.1, 74.8), (0.2, 76.0), (0.3, 77.0)]);
        let validated = dataset.validate().unwrap();
        assert!(!validated
            .warnings()
            .contains(&ValidationWarning::NonMonotonicTrend));
    }

    #[test]
    fn decreasing_trend_is_still_monotonic() {
        let dataset = Dataset::from_pairs(&[(0.0, 81.0), (0.5, 78.0), (1.0, 74.5)]);
        let validated = dataset.validate().unwrap();
        assert!(!validated
            .warnings()
            .contains(&ValidationWarning::NonMonotonicTrend));
    }
}
