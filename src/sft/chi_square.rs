// Pearson chi-square goodness of fit for categorical allocations
//
// Used where individuals are assigned to one of k groups with configured
// proportions (property values, age bins, node allocation).

use crate::sft::comparison::Comparison;
use crate::sft::error::{Result, SftError};
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Compare observed group counts with expected group proportions
///
/// Proportions are normalised before use. Categories with zero expected
/// proportion must have zero observed count, otherwise the test fails
/// outright (the statistic would be infinite).
pub fn chi_square_test(
    observed: &[u64],
    proportions: &[f64],
    significance: f64,
) -> Result<Comparison> {
    if observed.len() != proportions.len() {
        return Err(SftError::LengthMismatch {
            actual: observed.len(),
            expected: proportions.len(),
        });
    }
    if observed.len() < 2 {
        return Err(SftError::InvalidParameter(
            "chi-square test needs at least 2 categories".to_string(),
        ));
    }
    if proportions.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(SftError::InvalidParameter(
            "proportions must be finite and non-negative".to_string(),
        ));
    }
    let total_weight: f64 = proportions.iter().sum();
    if total_weight <= 0.0 {
        return Err(SftError::InvalidParameter(
            "proportions must not all be zero".to_string(),
        ));
    }
    let total: u64 = observed.iter().sum();
    if total == 0 {
        return Err(SftError::EmptySample("chi-square observed counts".to_string()));
    }

    let mut statistic = 0.0;
    let mut categories = 0usize;
    for (&obs, &weight) in observed.iter().zip(proportions) {
        let expected = total as f64 * weight / total_weight;
        if expected == 0.0 {
            if obs > 0 {
                return Ok(Comparison::bad(format!(
                    "{} observations in a category with zero expected proportion",
                    obs
                ))
                .with_statistic(f64::INFINITY)
                .with_p_value(0.0));
            }
            continue;
        }
        let diff = obs as f64 - expected;
        statistic += diff * diff / expected;
        categories += 1;
    }

    let freedom = categories.saturating_sub(1).max(1) as f64;
    let chi2 = ChiSquared::new(freedom).map_err(|e| SftError::InvalidParameter(e.to_string()))?;
    let pvalue = chi2.sf(statistic);
    let passed = pvalue > significance;

    Ok(Comparison::from_decision(
        passed,
        format!(
            "chi-square over {} categories ({} observations): statistic={:.4}, df={}, p-value={:.5}",
            categories, total, statistic, freedom, pvalue
        ),
    )
    .with_statistic(statistic)
    .with_p_value(pvalue))
}
