// Statistical Comparison Toolkit
//
// Decides whether observed simulation output is statistically consistent
// with an expectation derived analytically from the simulation config:
// - tolerance bands around an expected value
// - binomial and Poisson confidence intervals for counts
// - one-sample Kolmogorov-Smirnov tests against gamma, exponential,
//   lognormal, uniform, beta and Gaussian references
// - Pearson chi-square for categorical allocations
//
// Every operation is a pure function returning one `Comparison`. Rendering
// into the report and the noise-tolerance policy are separate steps, so a
// failed comparison never aborts a run.

mod chi_square;
mod comparison;
mod confidence;
mod describe;
mod distribution;
mod error;
mod ks;
mod policy;
mod settings;
mod tolerance;

pub use chi_square::chi_square_test;
pub use comparison::{Comparison, Outcome};
pub use confidence::{
    binomial_ci_compare, binomial_interval, poisson_ci_compare, poisson_interval,
    ConfidenceLevel, CountInterval,
};
pub use describe::{describe, SampleSummary};
pub use distribution::{ContinuousReference, DiscreteReference, ExpectedDistribution};
pub use error::{Result, SftError};
pub use ks::{kolmogorov_survival, ks_critical_value, ks_statistic, ks_test, ks_test_raw, KsResult};
pub use policy::{NoisePolicy, RepeatedTrials};
pub use settings::ToolkitSettings;
pub use tolerance::{series_tolerance_compare, tolerance_compare, Tolerance, ZeroExpected};
