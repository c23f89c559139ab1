#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

//! Estimate iron content in (Mg,Fe)O ferropericlase from unit-cell volume.
//!
//! Two competing linear models of the composition-volume relation are fit
//! and compared: ideal mixing between literature end-member volumes
//! (Vegard's law) and an ordinary least-squares line through the measured
//! data. The deviation between them quantifies how ideal the mixing is, and
//! the fitted line is inverted to recover the Fe fraction of unknown
//! samples with a propagated confidence interval.

pub mod analysis;
pub mod config;
pub mod dataset;
pub mod deviation;
pub mod error;
pub mod estimate;
pub mod linfit;
pub mod math;
pub mod model;
pub mod vegard;

pub use error::{Error, Result};
