// Expected distribution descriptors
//
// Parameters are derived analytically from simulation config and campaign
// values, never fitted to the observed sample. CDFs come from statrs; means
// and variances are closed-form so they read straight off the parameters.

use crate::sft::error::{Result, SftError};
use serde::{Deserialize, Serialize};
use statrs::distribution::{
    Beta, Binomial, Continuous, ContinuousCDF, DiscreteCDF, Exp, Gamma, LogNormal, Normal,
    Poisson, Uniform,
};
use std::fmt;

/// A theoretical distribution with concrete parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ExpectedDistribution {
    Binomial { trials: u64, p: f64 },
    Poisson { lambda: f64 },
    /// Shape `k`, scale `θ` (mean `kθ`)
    Gamma { shape: f64, scale: f64 },
    /// Rate `λ` (mean `1/λ`)
    Exponential { rate: f64 },
    /// Parameters of the underlying normal
    LogNormal { mu: f64, sigma: f64 },
    Uniform { min: f64, max: f64 },
    Beta { alpha: f64, beta: f64 },
    Gaussian { mean: f64, std_dev: f64 },
}

fn invalid(msg: String) -> SftError {
    SftError::InvalidParameter(msg)
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{} must be finite and > 0, got {}", name, value)))
    }
}

impl ExpectedDistribution {
    /// Exponential distribution from its mean (the simulator configures periods by mean)
    pub fn exponential_with_mean(mean: f64) -> Result<Self> {
        positive("exponential mean", mean)?;
        Ok(ExpectedDistribution::Exponential { rate: 1.0 / mean })
    }

    /// Check that the parameters describe a proper distribution
    pub fn validate(&self) -> Result<()> {
        match *self {
            ExpectedDistribution::Binomial { p, .. } => {
                if !(0.0..=1.0).contains(&p) {
                    return Err(invalid(format!("binomial p must be in [0, 1], got {}", p)));
                }
            }
            ExpectedDistribution::Poisson { lambda } => {
                if !lambda.is_finite() || lambda < 0.0 {
                    return Err(invalid(format!("poisson lambda must be >= 0, got {}", lambda)));
                }
            }
            ExpectedDistribution::Gamma { shape, scale } => {
                positive("gamma shape", shape)?;
                positive("gamma scale", scale)?;
            }
            ExpectedDistribution::Exponential { rate } => positive("exponential rate", rate)?,
            ExpectedDistribution::LogNormal { mu, sigma } => {
                if !mu.is_finite() {
                    return Err(invalid(format!("lognormal mu must be finite, got {}", mu)));
                }
                positive("lognormal sigma", sigma)?;
            }
            ExpectedDistribution::Uniform { min, max } => {
                if !(min.is_finite() && max.is_finite() && min < max) {
                    return Err(invalid(format!(
                        "uniform bounds must satisfy min < max, got [{}, {}]",
                        min, max
                    )));
                }
            }
            ExpectedDistribution::Beta { alpha, beta } => {
                positive("beta alpha", alpha)?;
                positive("beta beta", beta)?;
            }
            ExpectedDistribution::Gaussian { mean, std_dev } => {
                if !mean.is_finite() {
                    return Err(invalid(format!("gaussian mean must be finite, got {}", mean)));
                }
                positive("gaussian std_dev", std_dev)?;
            }
        }
        Ok(())
    }

    /// True for distributions over real numbers (eligible for KS tests)
    pub fn is_continuous(&self) -> bool {
        !matches!(
            self,
            ExpectedDistribution::Binomial { .. } | ExpectedDistribution::Poisson { .. }
        )
    }

    /// Family name used in report text
    pub fn family(&self) -> &'static str {
        match self {
            ExpectedDistribution::Binomial { .. } => "binomial",
            ExpectedDistribution::Poisson { .. } => "poisson",
            ExpectedDistribution::Gamma { .. } => "gamma",
            ExpectedDistribution::Exponential { .. } => "exponential",
            ExpectedDistribution::LogNormal { .. } => "lognormal",
            ExpectedDistribution::Uniform { .. } => "uniform",
            ExpectedDistribution::Beta { .. } => "beta",
            ExpectedDistribution::Gaussian { .. } => "gaussian",
        }
    }

    pub fn mean(&self) -> f64 {
        match *self {
            ExpectedDistribution::Binomial { trials, p } => trials as f64 * p,
            ExpectedDistribution::Poisson { lambda } => lambda,
            ExpectedDistribution::Gamma { shape, scale } => shape * scale,
            ExpectedDistribution::Exponential { rate } => 1.0 / rate,
            ExpectedDistribution::LogNormal { mu, sigma } => (mu + sigma * sigma / 2.0).exp(),
            ExpectedDistribution::Uniform { min, max } => (min + max) / 2.0,
            ExpectedDistribution::Beta { alpha, beta } => alpha / (alpha + beta),
            ExpectedDistribution::Gaussian { mean, .. } => mean,
        }
    }

    pub fn variance(&self) -> f64 {
        match *self {
            ExpectedDistribution::Binomial { trials, p } => trials as f64 * p * (1.0 - p),
            ExpectedDistribution::Poisson { lambda } => lambda,
            ExpectedDistribution::Gamma { shape, scale } => shape * scale * scale,
            ExpectedDistribution::Exponential { rate } => 1.0 / (rate * rate),
            ExpectedDistribution::LogNormal { mu, sigma } => {
                let s2 = sigma * sigma;
                (s2.exp() - 1.0) * (2.0 * mu + s2).exp()
            }
            ExpectedDistribution::Uniform { min, max } => (max - min).powi(2) / 12.0,
            ExpectedDistribution::Beta { alpha, beta } => {
                let sum = alpha + beta;
                alpha * beta / (sum * sum * (sum + 1.0))
            }
            ExpectedDistribution::Gaussian { std_dev, .. } => std_dev * std_dev,
        }
    }

    /// Build the statrs continuous distribution
    pub fn continuous(&self) -> Result<ContinuousReference> {
        self.validate()?;
        let reference = match *self {
            ExpectedDistribution::Gamma { shape, scale } => ContinuousReference::Gamma(
                Gamma::new(shape, 1.0 / scale).map_err(|e| invalid(e.to_string()))?,
            ),
            ExpectedDistribution::Exponential { rate } => {
                ContinuousReference::Exponential(Exp::new(rate).map_err(|e| invalid(e.to_string()))?)
            }
            ExpectedDistribution::LogNormal { mu, sigma } => ContinuousReference::LogNormal(
                LogNormal::new(mu, sigma).map_err(|e| invalid(e.to_string()))?,
            ),
            ExpectedDistribution::Uniform { min, max } => ContinuousReference::Uniform(
                Uniform::new(min, max).map_err(|e| invalid(e.to_string()))?,
            ),
            ExpectedDistribution::Beta { alpha, beta } => ContinuousReference::Beta(
                Beta::new(alpha, beta).map_err(|e| invalid(e.to_string()))?,
            ),
            ExpectedDistribution::Gaussian { mean, std_dev } => ContinuousReference::Gaussian(
                Normal::new(mean, std_dev).map_err(|e| invalid(e.to_string()))?,
            ),
            ExpectedDistribution::Binomial { .. } | ExpectedDistribution::Poisson { .. } => {
                return Err(SftError::UnsupportedDistribution {
                    test: "continuous reference",
                    distribution: self.to_string(),
                })
            }
        };
        Ok(reference)
    }

    /// Build the statrs discrete distribution
    pub fn discrete(&self) -> Result<DiscreteReference> {
        self.validate()?;
        match *self {
            ExpectedDistribution::Binomial { trials, p } => Ok(DiscreteReference::Binomial(
                Binomial::new(p, trials).map_err(|e| invalid(e.to_string()))?,
            )),
            // statrs rejects lambda == 0; that case is a point mass at zero
            ExpectedDistribution::Poisson { lambda } if lambda == 0.0 => {
                Ok(DiscreteReference::PointMass(0))
            }
            ExpectedDistribution::Poisson { lambda } => Ok(DiscreteReference::Poisson(
                Poisson::new(lambda).map_err(|e| invalid(e.to_string()))?,
            )),
            _ => Err(SftError::UnsupportedDistribution {
                test: "discrete reference",
                distribution: self.to_string(),
            }),
        }
    }
}

impl fmt::Display for ExpectedDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ExpectedDistribution::Binomial { trials, p } => write!(f, "binomial(n={}, p={})", trials, p),
            ExpectedDistribution::Poisson { lambda } => write!(f, "poisson(lambda={})", lambda),
            ExpectedDistribution::Gamma { shape, scale } => {
                write!(f, "gamma(k={}, theta={})", shape, scale)
            }
            ExpectedDistribution::Exponential { rate } => write!(f, "exponential(rate={})", rate),
            ExpectedDistribution::LogNormal { mu, sigma } => {
                write!(f, "lognormal(mu={}, sigma={})", mu, sigma)
            }
            ExpectedDistribution::Uniform { min, max } => write!(f, "uniform({}, {})", min, max),
            ExpectedDistribution::Beta { alpha, beta } => {
                write!(f, "beta(alpha={}, beta={})", alpha, beta)
            }
            ExpectedDistribution::Gaussian { mean, std_dev } => {
                write!(f, "gaussian(mean={}, std_dev={})", mean, std_dev)
            }
        }
    }
}

/// Continuous reference distribution backed by statrs
#[derive(Debug, Clone)]
pub enum ContinuousReference {
    Gamma(Gamma),
    Exponential(Exp),
    LogNormal(LogNormal),
    Uniform(Uniform),
    Beta(Beta),
    Gaussian(Normal),
}

impl ContinuousReference {
    pub fn cdf(&self, x: f64) -> f64 {
        match self {
            ContinuousReference::Gamma(d) => d.cdf(x),
            ContinuousReference::Exponential(d) => d.cdf(x),
            ContinuousReference::LogNormal(d) => d.cdf(x),
            ContinuousReference::Uniform(d) => d.cdf(x),
            ContinuousReference::Beta(d) => d.cdf(x),
            ContinuousReference::Gaussian(d) => d.cdf(x),
        }
    }

    pub fn pdf(&self, x: f64) -> f64 {
        match self {
            ContinuousReference::Gamma(d) => d.pdf(x),
            ContinuousReference::Exponential(d) => d.pdf(x),
            ContinuousReference::LogNormal(d) => d.pdf(x),
            ContinuousReference::Uniform(d) => d.pdf(x),
            ContinuousReference::Beta(d) => d.pdf(x),
            ContinuousReference::Gaussian(d) => d.pdf(x),
        }
    }
}

/// Discrete reference distribution backed by statrs
#[derive(Debug, Clone)]
pub enum DiscreteReference {
    Binomial(Binomial),
    Poisson(Poisson),
    PointMass(u64),
}

impl DiscreteReference {
    /// P(X <= k)
    pub fn cdf(&self, k: u64) -> f64 {
        match self {
            DiscreteReference::Binomial(d) => d.cdf(k),
            DiscreteReference::Poisson(d) => d.cdf(k),
            DiscreteReference::PointMass(at) => {
                if k >= *at {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Smallest `k` with `P(X <= k) >= q`
    ///
    /// Bisection over the CDF; `upper_hint` must be a value whose CDF is
    /// already >= q for every q used here (callers pass mean + many sigmas).
    pub fn quantile(&self, q: f64, upper_hint: u64) -> u64 {
        if let DiscreteReference::PointMass(at) = self {
            return *at;
        }
        let mut lo = 0u64;
        let mut hi = upper_hint.max(1);
        while self.cdf(hi) < q {
            hi = hi.saturating_mul(2);
            if hi == u64::MAX {
                break;
            }
        }
        if self.cdf(lo) >= q {
            return lo;
        }
        // invariant: cdf(lo) < q <= cdf(hi)
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if self.cdf(mid) >= q {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        hi
    }
}
