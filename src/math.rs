use statrs::distribution::{ContinuousCDF, StudentsT};

/// Compute the arithmetic mean of a slice.
///
/// Returns zero for an empty slice; callers fitting or comparing data have
/// already rejected empty datasets during validation.
///
/// # Examples
///
/// ```
/// use vegard_fit::math::mean;
///
/// assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
/// ```
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Two-sided critical value of Student's t for a confidence level and
/// degrees of freedom.
///
/// For `confidence_level` 0.95 and large `dof` this approaches the familiar
/// normal value 1.96.
///
/// # Panics
///
/// Panics if `dof` is zero or `confidence_level` lies outside (0, 1). Both
/// are enforced upstream: a fit always carries at least one degree of
/// freedom and the confidence level is checked at configuration load.
///
/// # Examples
///
/// ```
/// use vegard_fit::math::t_critical;
///
/// let t = t_critical(0.95, 1000);
/// assert!((t - 1.96).abs() < 0.01);
/// ```
#[must_use]
pub fn t_critical(confidence_level: f64, dof: usize) -> f64 {
    assert!(
        confidence_level > 0.0 && confidence_level < 1.0,
        "confidence level {confidence_level} must lie in (0, 1)"
    );
    let student = StudentsT::new(0.0, 1.0, dof as f64)
        .expect("degrees of freedom must be positive");
    student.inverse_cdf(1.0 - (1.0 - confidence_level) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::{mean, t_critical};

    #[test]
    fn mean_of_empty_slice_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn mean_matches_hand_calculation() {
        approx::assert_relative_eq!(mean(&[0.05, 0.15, 0.25]), 0.15);
    }

    #[test]
    fn t_critical_matches_tabulated_values() {
        // Two-sided 95% values from standard t tables.
        approx::assert_relative_eq!(t_critical(0.95, 1), 12.706, max_relative = 1e-3);
        approx::assert_relative_eq!(t_critical(0.95, 5), 2.571, max_relative = 1e-3);
        approx::assert_relative_eq!(t_critical(0.95, 30), 2.042, max_relative = 1e-3);
    }

    #[test]
    fn t_critical_grows_with_confidence() {
        assert!(t_critical(0.99, 10) > t_critical(0.95, 10));
        assert!(t_critical(0.95, 10) > t_critical(0.68, 10));
    }

    #[test]
    #[should_panic(expected = "confidence level")]
    fn t_critical_rejects_confidence_of_one() {
        let _ = t_critical(1.0, 10);
    }
}
