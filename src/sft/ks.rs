// One-sample Kolmogorov-Smirnov goodness-of-fit test
//
// Compares the empirical CDF of an observed sample against the CDF of a
// continuous reference distribution whose parameters were derived from the
// simulation config.
//
// p-values use the asymptotic Kolmogorov distribution with Stephens'
// small-sample correction:
//   lambda = (sqrt(n) + 0.12 + 0.11 / sqrt(n)) * D
//   Q(lambda) = 2 * sum_{j>=1} (-1)^(j-1) * exp(-2 j^2 lambda^2)
// The test is deterministic: the same sample and parameters always give the
// same statistic, p-value, and decision.

use crate::sft::comparison::Comparison;
use crate::sft::distribution::ExpectedDistribution;
use crate::sft::error::{Result, SftError};
use std::f64::consts::PI;

/// Raw output of a KS test before it becomes a report comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsResult {
    /// Sup distance between empirical and reference CDF
    pub statistic: f64,
    /// Probability of a distance at least this large under the reference
    pub pvalue: f64,
    /// Distance that would be rejected at the requested significance
    pub critical_value: f64,
    /// Sample size
    pub n: usize,
}

/// Survival function of the Kolmogorov distribution, Q(lambda) = P(K > lambda)
pub fn kolmogorov_survival(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    let q = if lambda < 1.18 {
        // Small-lambda form converges in a handful of terms
        let y = (-PI * PI / (8.0 * lambda * lambda)).exp();
        let cdf = (2.0 * PI).sqrt() / lambda * (y + y.powi(9) + y.powi(25) + y.powi(49));
        1.0 - cdf
    } else {
        let x = (-2.0 * lambda * lambda).exp();
        2.0 * (x - x.powi(4) + x.powi(9) - x.powi(16))
    };
    q.clamp(0.0, 1.0)
}

/// Asymptotic critical value of D for sample size `n` at significance `alpha`
///
/// `alpha = 0.05` gives the familiar `1.36 / sqrt(n)`.
pub fn ks_critical_value(n: usize, alpha: f64) -> f64 {
    let c = (-(alpha / 2.0).ln() / 2.0).sqrt();
    c / (n as f64).sqrt()
}

/// KS statistic D of `sample` against a CDF
pub fn ks_statistic<F: Fn(f64) -> f64>(sample: &[f64], cdf: F) -> f64 {
    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len() as f64;

    let mut d: f64 = 0.0;
    for (i, &x) in sorted.iter().enumerate() {
        let f = cdf(x);
        let above = (i + 1) as f64 / n - f;
        let below = f - i as f64 / n;
        d = d.max(above).max(below);
    }
    d
}

/// Run the KS test of `sample` against `reference`
pub fn ks_test_raw(
    sample: &[f64],
    reference: &ExpectedDistribution,
    significance: f64,
) -> Result<KsResult> {
    if sample.is_empty() {
        return Err(SftError::EmptySample(format!("KS test against {}", reference)));
    }
    if !(0.0..1.0).contains(&significance) || significance == 0.0 {
        return Err(SftError::InvalidParameter(format!(
            "significance must be in (0, 1), got {}",
            significance
        )));
    }
    if sample.iter().any(|x| !x.is_finite()) {
        return Err(SftError::InvalidParameter(
            "KS sample contains non-finite values".to_string(),
        ));
    }
    if !reference.is_continuous() {
        return Err(SftError::UnsupportedDistribution {
            test: "KS test",
            distribution: reference.to_string(),
        });
    }

    let continuous = reference.continuous()?;
    let statistic = ks_statistic(sample, |x| continuous.cdf(x));

    let n = sample.len();
    let sqrt_n = (n as f64).sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * statistic;

    Ok(KsResult {
        statistic,
        pvalue: kolmogorov_survival(lambda),
        critical_value: ks_critical_value(n, significance),
        n,
    })
}

/// KS goodness-of-fit test rendered as a comparison
///
/// Passes iff the p-value exceeds `significance`. The raw decision is
/// reported as-is; apply a `NoisePolicy` to downgrade failures.
///
/// # Example
/// ```
/// use sftcheck::sft::{ks_test, ExpectedDistribution};
///
/// // Evenly spread quantiles of uniform(0, 1) fit it perfectly
/// let sample: Vec<f64> = (0..200).map(|i| (i as f64 + 0.5) / 200.0).collect();
/// let reference = ExpectedDistribution::Uniform { min: 0.0, max: 1.0 };
/// let c = ks_test(&sample, &reference, 0.05).unwrap();
/// assert!(c.passed);
/// ```
pub fn ks_test(
    sample: &[f64],
    reference: &ExpectedDistribution,
    significance: f64,
) -> Result<Comparison> {
    let result = ks_test_raw(sample, reference, significance)?;
    let passed = result.pvalue > significance;
    let message = format!(
        "KS test of {} samples against {}: D={:.5} (critical {:.5}), p-value={:.5} {} {}",
        result.n,
        reference,
        result.statistic,
        result.critical_value,
        result.pvalue,
        if passed { ">" } else { "<=" },
        significance
    );

    tracing::debug!(
        "KS {} n={} D={} p={}",
        reference.family(),
        result.n,
        result.statistic,
        result.pvalue
    );

    Ok(Comparison::from_decision(passed, message)
        .with_statistic(result.statistic)
        .with_p_value(result.pvalue))
}
