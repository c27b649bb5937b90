// Toolkit settings shared by every feature test
//
// Constructed once per run (defaults, a preset, or a TOML file) and passed
// down through the run context; nothing reads global state.

use crate::sft::confidence::ConfidenceLevel;
use crate::sft::policy::NoisePolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for statistical comparisons
///
/// # Example
/// ```
/// use sftcheck::sft::ToolkitSettings;
///
/// let settings = ToolkitSettings::default();
/// assert_eq!(settings.significance_level, 0.05);
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolkitSettings {
    /// Significance level (alpha) for KS and chi-square tests
    ///
    /// A test passes when its p-value exceeds this value.
    /// Default: 0.05
    pub significance_level: f64,

    /// Confidence level for binomial and Poisson interval checks
    ///
    /// Default: 95%
    pub confidence: ConfidenceLevel,

    /// Relative tolerance for aggregate tolerance comparisons
    ///
    /// Default: 0.05 (5% of the expected value)
    pub tolerance_fraction: f64,

    /// Policy for a single goodness-of-fit test
    ///
    /// Default: `Warn` (one KS rejection is expected noise at alpha)
    pub single_test_policy: NoisePolicy,

    /// Policy for per-timestep repeated tests
    ///
    /// Default: `FailureRate { max_fraction: 0.2 }`
    pub repeated_test_policy: NoisePolicy,

    /// Render diagnostic SVG charts next to the report
    pub plots: bool,
}

impl Default for ToolkitSettings {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            confidence: ConfidenceLevel::NinetyFive,
            tolerance_fraction: 0.05,
            single_test_policy: NoisePolicy::Warn,
            repeated_test_policy: NoisePolicy::FailureRate { max_fraction: 0.2 },
            plots: false,
        }
    }
}

impl ToolkitSettings {
    /// Strict settings: every statistical rejection fails the feature test
    pub fn strict() -> Self {
        Self {
            significance_level: 0.01,
            confidence: ConfidenceLevel::NinetyNinePointFive,
            tolerance_fraction: 0.01,
            single_test_policy: NoisePolicy::Fatal,
            repeated_test_policy: NoisePolicy::FailureRate { max_fraction: 0.05 },
            plots: false,
        }
    }

    /// Permissive settings for small or noisy scenarios
    pub fn permissive() -> Self {
        Self {
            significance_level: 0.01,
            confidence: ConfidenceLevel::NinetyNinePointFive,
            tolerance_fraction: 0.1,
            single_test_policy: NoisePolicy::Warn,
            repeated_test_policy: NoisePolicy::FailureRate { max_fraction: 0.3 },
            plots: false,
        }
    }

    /// Load settings from a TOML file; missing keys take their defaults
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = std::fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read settings file {}", path_ref.display()))?;
        let settings: ToolkitSettings = toml::from_str(&contents)
            .with_context(|| format!("Invalid settings TOML in {}", path_ref.display()))?;
        settings.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), String> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            ));
        }

        if !self.tolerance_fraction.is_finite() || self.tolerance_fraction < 0.0 {
            return Err(format!(
                "tolerance_fraction must be non-negative, got {}",
                self.tolerance_fraction
            ));
        }

        self.single_test_policy.validate()?;
        self.repeated_test_policy.validate()?;

        Ok(())
    }
}
