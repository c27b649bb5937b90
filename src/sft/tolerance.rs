// Tolerance-based comparison of an actual value against an expected value
//
// The allowed deviation is either a fraction of the expected value or an
// absolute amount (typically a fraction of a population size computed by the
// caller). A relative tolerance degenerates to zero when the expected value
// is zero, so that case is resolved by an explicit `ZeroExpected` policy.

use crate::sft::comparison::Comparison;
use crate::sft::error::{Result, SftError};
use serde::{Deserialize, Serialize};

/// Allowed deviation between actual and expected
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Tolerance {
    /// Deviation allowed as a fraction of `|expected|`
    Relative(f64),
    /// Deviation allowed as a fixed amount
    Absolute(f64),
}

impl Tolerance {
    /// Allowed absolute deviation for a given expected value
    pub fn allowed(&self, expected: f64) -> f64 {
        match *self {
            Tolerance::Relative(fraction) => fraction * expected.abs(),
            Tolerance::Absolute(amount) => amount,
        }
    }

    fn validate(&self) -> Result<()> {
        let value = match *self {
            Tolerance::Relative(v) | Tolerance::Absolute(v) => v,
        };
        if !value.is_finite() || value < 0.0 {
            return Err(SftError::InvalidParameter(format!(
                "tolerance must be finite and non-negative, got {}",
                value
            )));
        }
        Ok(())
    }
}

/// What a relative tolerance does when the expected value is exactly zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZeroExpected {
    /// Require `actual == 0`
    #[default]
    ExactMatch,
    /// Do not decide; emit a warning instead
    Skip,
}

/// Compare `actual` against `expected` within `tolerance`
///
/// Passes iff `|actual - expected| <= allowed`. With a relative tolerance and
/// `expected == 0` the `zero` policy decides instead of the degenerate
/// zero-width band.
///
/// # Example
/// ```
/// use sftcheck::sft::{tolerance_compare, Tolerance, ZeroExpected};
///
/// let ok = tolerance_compare(700.0, 700.0, Tolerance::Relative(0.02), ZeroExpected::ExactMatch).unwrap();
/// assert!(ok.passed);
///
/// let off = tolerance_compare(750.0, 700.0, Tolerance::Relative(0.02), ZeroExpected::ExactMatch).unwrap();
/// assert!(!off.passed); // |750 - 700| = 50 > 14
/// ```
pub fn tolerance_compare(
    actual: f64,
    expected: f64,
    tolerance: Tolerance,
    zero: ZeroExpected,
) -> Result<Comparison> {
    tolerance.validate()?;
    if !actual.is_finite() || !expected.is_finite() {
        return Err(SftError::InvalidParameter(format!(
            "values must be finite, got actual={} expected={}",
            actual, expected
        )));
    }

    let diff = (actual - expected).abs();

    if expected == 0.0 && matches!(tolerance, Tolerance::Relative(_)) {
        return Ok(match zero {
            ZeroExpected::ExactMatch => Comparison::from_decision(
                actual == 0.0,
                format!("actual {} vs expected 0 (exact match required)", actual),
            )
            .with_statistic(diff),
            ZeroExpected::Skip => Comparison::warning(format!(
                "expected value is 0, actual {} not checked",
                actual
            )),
        });
    }

    let allowed = tolerance.allowed(expected);
    let passed = diff <= allowed;
    let message = if passed {
        format!(
            "actual {} is within {} of expected {} (diff {})",
            actual, allowed, expected, diff
        )
    } else {
        format!(
            "actual {} differs from expected {} by {}, more than the allowed {}",
            actual, expected, diff, allowed
        )
    };

    Ok(Comparison::from_decision(passed, message).with_statistic(diff))
}

/// Element-wise tolerance comparison of two series
///
/// Returns one summary comparison; the message names the first few
/// mismatching indices and the total mismatch count.
pub fn series_tolerance_compare(
    actual: &[f64],
    expected: &[f64],
    tolerance: Tolerance,
    zero: ZeroExpected,
) -> Result<Comparison> {
    if actual.len() != expected.len() {
        return Err(SftError::LengthMismatch {
            actual: actual.len(),
            expected: expected.len(),
        });
    }
    if actual.is_empty() {
        return Err(SftError::EmptySample("series comparison".to_string()));
    }

    const MAX_LISTED: usize = 5;
    let mut mismatches = Vec::new();
    let mut skipped = 0usize;

    for (index, (&a, &e)) in actual.iter().zip(expected).enumerate() {
        let cmp = tolerance_compare(a, e, tolerance, zero)?;
        if cmp.is_failure() {
            mismatches.push((index, a, e));
        } else if cmp.outcome == crate::sft::comparison::Outcome::Warning {
            skipped += 1;
        }
    }

    if mismatches.is_empty() {
        let mut message = format!("all {} values within tolerance", actual.len());
        if skipped > 0 {
            message.push_str(&format!(" ({} zero-expected values skipped)", skipped));
        }
        return Ok(Comparison::good(message).with_statistic(0.0));
    }

    let listed: Vec<String> = mismatches
        .iter()
        .take(MAX_LISTED)
        .map(|(i, a, e)| format!("[{}] actual={} expected={}", i, a, e))
        .collect();
    Ok(Comparison::bad(format!(
        "{} of {} values outside tolerance: {}{}",
        mismatches.len(),
        actual.len(),
        listed.join(", "),
        if mismatches.len() > MAX_LISTED { ", ..." } else { "" }
    ))
    .with_statistic(mismatches.len() as f64))
}
