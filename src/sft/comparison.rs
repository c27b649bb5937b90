// Result of a single statistical comparison
//
// Every toolkit operation yields exactly one `Comparison`. The report builder
// decides what to do with it (record, downgrade through a noise policy, count
// it in a repeated-trial tracker).

use serde::Serialize;
use std::fmt;

/// How a comparison is rendered in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Observed data is consistent with the expectation
    Good,
    /// Observed data contradicts the expectation; fails the feature test
    Bad,
    /// Inconclusive or tolerated failure; never fails the feature test
    Warning,
}

impl Outcome {
    /// Report line prefix for this outcome
    pub fn prefix(self) -> &'static str {
        match self {
            Outcome::Good => "GOOD",
            Outcome::Bad => "BAD",
            Outcome::Warning => "WARNING",
        }
    }
}

/// One comparison of observed data against a theoretical expectation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// Raw statistical decision (before any noise policy is applied)
    pub passed: bool,

    /// How the comparison is reported
    pub outcome: Outcome,

    /// Human-readable explanation, without the outcome prefix
    pub message: String,

    /// Test statistic (KS D, chi-square, absolute difference, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistic: Option<f64>,

    /// p-value of the underlying test, when the test produces one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,

    /// Caveats reported as separate `WARNING:` lines; they never change the decision
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Comparison {
    /// A passing comparison
    pub fn good(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            outcome: Outcome::Good,
            message: message.into(),
            statistic: None,
            p_value: None,
            notes: Vec::new(),
        }
    }

    /// A failing comparison
    pub fn bad(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            outcome: Outcome::Bad,
            message: message.into(),
            statistic: None,
            p_value: None,
            notes: Vec::new(),
        }
    }

    /// An inconclusive comparison that does not count as a failure
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            outcome: Outcome::Warning,
            message: message.into(),
            statistic: None,
            p_value: None,
            notes: Vec::new(),
        }
    }

    /// Build from a boolean decision
    pub fn from_decision(passed: bool, message: impl Into<String>) -> Self {
        if passed {
            Self::good(message)
        } else {
            Self::bad(message)
        }
    }

    pub fn with_statistic(mut self, statistic: f64) -> Self {
        self.statistic = Some(statistic);
        self
    }

    pub fn with_p_value(mut self, p_value: f64) -> Self {
        self.p_value = Some(p_value);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Prefix the message with a label (e.g. "day 12", "Risk:HIGH")
    pub fn labeled(mut self, label: &str) -> Self {
        self.message = format!("{}: {}", label, self.message);
        for note in &mut self.notes {
            *note = format!("{}: {}", label, note);
        }
        self
    }

    /// True when the comparison fails the feature test as reported
    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Bad
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.outcome.prefix(), self.message)
    }
}
