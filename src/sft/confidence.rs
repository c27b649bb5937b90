// Confidence-interval checks for count data
//
// Individual Bernoulli outcomes (vaccine take, migration, broadcast events)
// aggregate to a binomial count; arrival-type counts (imported cases) follow
// a Poisson law. Both checks use the equal-tailed exact quantile interval of
// the reference distribution, so coverage never drops below the nominal level.

use crate::sft::comparison::Comparison;
use crate::sft::distribution::ExpectedDistribution;
use crate::sft::error::{Result, SftError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Two-sided confidence level for interval checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// 95% (alpha = 0.05)
    #[default]
    NinetyFive,
    /// 99.5% (alpha = 0.005)
    NinetyNinePointFive,
}

impl ConfidenceLevel {
    pub fn alpha(self) -> f64 {
        match self {
            ConfidenceLevel::NinetyFive => 0.05,
            ConfidenceLevel::NinetyNinePointFive => 0.005,
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::NinetyFive => write!(f, "95%"),
            ConfidenceLevel::NinetyNinePointFive => write!(f, "99.5%"),
        }
    }
}

/// Closed interval of admissible counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountInterval {
    pub lower: u64,
    pub upper: u64,
}

impl CountInterval {
    pub fn contains(&self, count: u64) -> bool {
        (self.lower..=self.upper).contains(&count)
    }
}

fn interval_for(dist: &ExpectedDistribution, level: ConfidenceLevel) -> Result<CountInterval> {
    let reference = dist.discrete()?;
    let alpha = level.alpha();
    // mean + 12 sigma is far beyond any quantile used here
    let hint = (dist.mean() + 12.0 * dist.variance().sqrt() + 1.0).ceil() as u64;
    Ok(CountInterval {
        lower: reference.quantile(alpha / 2.0, hint),
        upper: reference.quantile(1.0 - alpha / 2.0, hint),
    })
}

/// Exact binomial interval for `Binomial(trials, p)`
pub fn binomial_interval(trials: u64, p: f64, level: ConfidenceLevel) -> Result<CountInterval> {
    let dist = ExpectedDistribution::Binomial { trials, p };
    let mut interval = interval_for(&dist, level)?;
    interval.upper = interval.upper.min(trials);
    Ok(interval)
}

/// Exact Poisson interval for `Poisson(lambda)`
pub fn poisson_interval(lambda: f64, level: ConfidenceLevel) -> Result<CountInterval> {
    interval_for(&ExpectedDistribution::Poisson { lambda }, level)
}

/// Check whether `successes` out of `trials` is consistent with probability `p`
///
/// # Example
/// ```
/// use sftcheck::sft::{binomial_ci_compare, ConfidenceLevel};
///
/// let c = binomial_ci_compare(503, 1000, 0.5, ConfidenceLevel::NinetyFive).unwrap();
/// assert!(c.passed);
/// let c = binomial_ci_compare(600, 1000, 0.5, ConfidenceLevel::NinetyFive).unwrap();
/// assert!(!c.passed);
/// ```
pub fn binomial_ci_compare(
    successes: u64,
    trials: u64,
    p: f64,
    level: ConfidenceLevel,
) -> Result<Comparison> {
    if successes > trials {
        return Err(SftError::InvalidParameter(format!(
            "successes ({}) exceed trials ({})",
            successes, trials
        )));
    }
    let interval = binomial_interval(trials, p, level)?;
    let mean = trials as f64 * p;
    let passed = interval.contains(successes);

    let message = format!(
        "{} successes out of {} trials, expected {:.2} (p={}), {} interval [{}, {}]",
        successes, trials, mean, p, level, interval.lower, interval.upper
    );
    let mut comparison =
        Comparison::from_decision(passed, message).with_statistic(successes as f64);
    if mean < 5.0 || trials as f64 * (1.0 - p) < 5.0 {
        comparison = comparison.with_note(format!(
            "small sample for binomial(n={}, p={}): np={:.2}, n(1-p)={:.2}, exact interval decides",
            trials,
            p,
            mean,
            trials as f64 * (1.0 - p)
        ));
    }
    Ok(comparison)
}

/// Check whether an observed count is consistent with `Poisson(lambda)`
pub fn poisson_ci_compare(count: u64, lambda: f64, level: ConfidenceLevel) -> Result<Comparison> {
    let interval = poisson_interval(lambda, level)?;
    let passed = interval.contains(count);
    let message = format!(
        "count {} vs poisson rate {}, {} interval [{}, {}]",
        count, lambda, level, interval.lower, interval.upper
    );
    Ok(Comparison::from_decision(passed, message).with_statistic(count as f64))
}
