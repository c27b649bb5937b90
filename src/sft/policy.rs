// Noise-tolerance policy for statistical tests
//
// Small-sample goodness-of-fit tests reject valid data at roughly the
// significance rate. Whether a single rejection fails the feature test, is
// only a warning, or counts toward a failure-rate budget over repeated
// trials is chosen explicitly by the caller through `NoisePolicy`.

use crate::sft::comparison::{Comparison, Outcome};
use serde::{Deserialize, Serialize};

/// How a failing statistical test is reported
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum NoisePolicy {
    /// A failing test is `BAD` and fails the feature test
    Fatal,
    /// A failing test is a `WARNING` and never fails the feature test
    Warn,
    /// Each failure is a `WARNING`; the feature test fails only when the
    /// fraction of failed trials exceeds `max_fraction`
    FailureRate { max_fraction: f64 },
}

impl Default for NoisePolicy {
    fn default() -> Self {
        NoisePolicy::FailureRate { max_fraction: 0.2 }
    }
}

impl NoisePolicy {
    /// Rewrite the outcome of a raw comparison according to the policy
    ///
    /// Passing comparisons are untouched. Under `FailureRate` the per-trial
    /// result becomes a warning; the verdict comes from `RepeatedTrials`.
    pub fn apply(&self, mut comparison: Comparison) -> Comparison {
        if comparison.passed || comparison.outcome != Outcome::Bad {
            return comparison;
        }
        match self {
            NoisePolicy::Fatal => comparison,
            NoisePolicy::Warn | NoisePolicy::FailureRate { .. } => {
                comparison.outcome = Outcome::Warning;
                comparison
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let NoisePolicy::FailureRate { max_fraction } = self {
            if !(0.0..=1.0).contains(max_fraction) {
                return Err(format!(
                    "max_fraction must be in [0, 1], got {}",
                    max_fraction
                ));
            }
        }
        Ok(())
    }
}

/// Tracks pass/fail over a series of repeated statistical trials
#[derive(Debug, Clone)]
pub struct RepeatedTrials {
    label: String,
    policy: NoisePolicy,
    trials: usize,
    failures: usize,
    failed_labels: Vec<String>,
}

impl RepeatedTrials {
    pub fn new(label: impl Into<String>, policy: NoisePolicy) -> Self {
        Self {
            label: label.into(),
            policy,
            trials: 0,
            failures: 0,
            failed_labels: Vec::new(),
        }
    }

    /// Count one raw trial result and return it with the policy applied
    pub fn observe(&mut self, trial_label: &str, comparison: Comparison) -> Comparison {
        self.trials += 1;
        tracing::debug!("{} {}: {}", self.label, trial_label, comparison);
        if !comparison.passed {
            self.failures += 1;
            self.failed_labels.push(trial_label.to_string());
        }
        self.policy.apply(comparison).labeled(trial_label)
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn failure_fraction(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.failures as f64 / self.trials as f64
        }
    }

    /// Overall verdict for the series
    pub fn verdict(&self) -> Comparison {
        if self.trials == 0 {
            return Comparison::warning(format!("{}: no trials were run", self.label));
        }

        let fraction = self.failure_fraction();
        let summary = format!(
            "{}: {} of {} trials failed ({:.1}%)",
            self.label,
            self.failures,
            self.trials,
            fraction * 100.0
        );

        match self.policy {
            NoisePolicy::Fatal => Comparison::from_decision(self.failures == 0, summary),
            NoisePolicy::Warn => {
                if self.failures == 0 {
                    Comparison::good(summary)
                } else {
                    Comparison::warning(summary)
                }
            }
            NoisePolicy::FailureRate { max_fraction } => {
                let passed = fraction <= max_fraction;
                let message = format!(
                    "{}, tolerated failure rate {:.1}%",
                    summary,
                    max_fraction * 100.0
                );
                Comparison::from_decision(passed, message).with_statistic(fraction)
            }
        }
    }

    /// Labels of the failed trials, in observation order
    pub fn failed_labels(&self) -> &[String] {
        &self.failed_labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_keeps_bad() {
        let c = NoisePolicy::Fatal.apply(Comparison::bad("p=0.01"));
        assert_eq!(c.outcome, Outcome::Bad);
    }

    #[test]
    fn test_warn_downgrades_bad() {
        let c = NoisePolicy::Warn.apply(Comparison::bad("p=0.01"));
        assert_eq!(c.outcome, Outcome::Warning);
        assert!(!c.passed);
        assert!(!c.is_failure());
    }

    #[test]
    fn test_passing_untouched() {
        let c = NoisePolicy::Warn.apply(Comparison::good("p=0.6"));
        assert_eq!(c.outcome, Outcome::Good);
    }

    #[test]
    fn test_failure_rate_within_budget() {
        let mut trials = RepeatedTrials::new("daily KS", NoisePolicy::default());
        for day in 0..10 {
            let raw = Comparison::from_decision(day != 3, "trial");
            let applied = trials.observe(&format!("day {}", day), raw);
            assert!(!applied.is_failure());
        }
        assert_eq!(trials.failures(), 1);
        assert!(trials.verdict().passed);
        assert_eq!(trials.failed_labels(), ["day 3".to_string()]);
    }

    #[test]
    fn test_failure_rate_exceeded() {
        let mut trials = RepeatedTrials::new("daily KS", NoisePolicy::FailureRate { max_fraction: 0.2 });
        for day in 0..10 {
            trials.observe(&format!("day {}", day), Comparison::from_decision(day % 3 != 0, "trial"));
        }
        // days 0, 3, 6, 9 fail: 40%
        let verdict = trials.verdict();
        assert!(!verdict.passed);
        assert_eq!(verdict.outcome, Outcome::Bad);
        assert!(verdict.message.contains("4 of 10"));
    }

    #[test]
    fn test_no_trials_is_warning() {
        let trials = RepeatedTrials::new("empty", NoisePolicy::Fatal);
        assert_eq!(trials.verdict().outcome, Outcome::Warning);
    }

    #[test]
    fn test_policy_validation() {
        assert!(NoisePolicy::FailureRate { max_fraction: 1.5 }.validate().is_err());
        assert!(NoisePolicy::Warn.validate().is_ok());
    }
}
