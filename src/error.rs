use thiserror::Error;

/// Rejections raised while checking a dataset or configuration.
///
/// Each variant names the rule that failed and the offending value, so a
/// caller can diagnose the input without re-running the validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("dataset is empty")]
    Empty,

    #[error("dataset has {distinct} distinct composition(s); a linear fit needs at least 2")]
    TooFewDistinctCompositions { distinct: usize },

    #[error("row {row}: Fe fraction {value} is not finite")]
    NonFiniteFraction { row: usize, value: f64 },

    #[error("row {row}: Fe fraction {value} is outside [0, 1]")]
    FractionOutOfRange { row: usize, value: f64 },

    #[error("row {row}: volume {value} is not finite")]
    NonFiniteVolume { row: usize, value: f64 },

    #[error("row {row}: volume {value} is not positive")]
    NonPositiveVolume { row: usize, value: f64 },

    #[error("row {row}: measurement uncertainty {value} must be finite and non-negative")]
    InvalidUncertainty { row: usize, value: f64 },

    #[error("row {row}: malformed record: {source}")]
    MalformedRecord { row: usize, source: csv::Error },

    #[error("confidence level {value} must lie strictly between 0 and 1")]
    ConfidenceLevelOutOfRange { value: f64 },

    #[error("end-member volume {name} = {value} must be finite and positive")]
    InvalidEndMember { name: &'static str, value: f64 },

    #[error("slope threshold {value} must be finite and positive")]
    InvalidSlopeThreshold { value: f64 },
}

/// Failures of the least-squares regression itself.
#[derive(Debug, Error)]
pub enum FitError {
    #[error("{samples} sample(s) leave no degrees of freedom for a 2-parameter fit")]
    InsufficientDegreesOfFreedom { samples: usize },

    #[error("design matrix is singular: all compositions equal {value}")]
    SingularDesign { value: f64 },
}

/// The Vegard model cannot be inverted when both end members share a volume.
#[derive(Debug, Error)]
#[error("Vegard model is not invertible: V_MgO == V_FeO == {volume}")]
pub struct DegenerateModelError {
    pub volume: f64,
}

/// Failures of the inverse composition estimator.
#[derive(Debug, Error)]
pub enum EstimationError {
    #[error("fitted slope {slope} is below the near-zero threshold {threshold}; inversion is unstable")]
    NearZeroSlope { slope: f64, threshold: f64 },

    #[error("observed volume {value} is not finite")]
    NonFiniteObservation { value: f64 },

    #[error("observed volume {value} is not positive")]
    NonPositiveObservation { value: f64 },
}

/// Crate-level error, aggregating the modeling taxonomy with loader failures.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fit(#[from] FitError),

    #[error(transparent)]
    DegenerateModel(#[from] DegenerateModelError),

    #[error(transparent)]
    Estimation(#[from] EstimationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
