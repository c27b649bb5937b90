//! Scientific feature report document
//!
//! Lines accumulate during a run; `BAD:` lines clear the overall success flag.
//! `finish` consumes the report, appends the fixed-format summary line and
//! writes the file exactly once.

use crate::sft::{Comparison, Outcome};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Default report file name expected by the regression harness
pub const DEFAULT_REPORT_NAME: &str = "scientific_feature_report.txt";

/// Summary line parsed by the regression harness
pub fn format_success_msg(success: bool) -> String {
    format!("SUMMARY: Success={}", if success { "True" } else { "False" })
}

fn unix_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}", duration.as_secs())
}

/// Report under construction
#[derive(Debug, Clone)]
pub struct Report {
    lines: Vec<String>,
    success: bool,
    bad_count: usize,
    warning_count: usize,
}

impl Report {
    /// Start a report with the standard header line
    pub fn begin(config_name: &str) -> Self {
        let mut report = Self::empty();
        report.info(format!(
            "Beginning validation for {} at time {}.",
            config_name,
            unix_timestamp()
        ));
        report
    }

    /// Report without a header (used by tests and nested builders)
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            success: true,
            bad_count: 0,
            warning_count: 0,
        }
    }

    /// Free-form diagnostic line
    pub fn info(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn good(&mut self, message: impl AsRef<str>) {
        self.lines.push(format!("GOOD: {}", message.as_ref()));
    }

    /// Record a failure; the report will summarise as unsuccessful
    pub fn bad(&mut self, message: impl AsRef<str>) {
        self.success = false;
        self.bad_count += 1;
        self.lines.push(format!("BAD: {}", message.as_ref()));
    }

    pub fn warning(&mut self, message: impl AsRef<str>) {
        self.warning_count += 1;
        self.lines.push(format!("WARNING: {}", message.as_ref()));
    }

    /// Append a comparison; returns false when it failed the report
    pub fn record(&mut self, comparison: &Comparison) -> bool {
        match comparison.outcome {
            Outcome::Good => self.good(&comparison.message),
            Outcome::Bad => self.bad(&comparison.message),
            Outcome::Warning => self.warning(&comparison.message),
        }
        for note in &comparison.notes {
            self.warning(note);
        }
        !comparison.is_failure()
    }

    /// Overall success so far
    pub fn success(&self) -> bool {
        self.success
    }

    pub fn bad_count(&self) -> usize {
        self.bad_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Full report text including the summary line
    pub fn to_report_string(&self) -> String {
        let mut text = String::new();
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(&format_success_msg(self.success));
        text.push('\n');
        text
    }

    /// Write the report and return the overall success
    pub fn finish<P: AsRef<Path>>(self, path: P) -> Result<bool> {
        let path_ref = path.as_ref();
        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create report directory {}", parent.display())
                })?;
            }
        }
        fs::write(path_ref, self.to_report_string())
            .with_context(|| format!("Failed to write report {}", path_ref.display()))?;

        tracing::info!(
            "Wrote {} ({} BAD, {} WARNING, success={})",
            path_ref.display(),
            self.bad_count,
            self.warning_count,
            self.success
        );
        Ok(self.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_begin_writes_header() {
        let report = Report::begin("Incubation_Gamma");
        assert!(report.lines()[0].starts_with("Beginning validation for Incubation_Gamma at time "));
        assert!(report.success());
    }

    #[test]
    fn test_bad_clears_success() {
        let mut report = Report::empty();
        report.good("first check");
        report.bad("second check");
        report.good("third check");
        assert!(!report.success());
        assert_eq!(report.bad_count(), 1);
        assert!(report.to_report_string().ends_with("SUMMARY: Success=False\n"));
    }

    #[test]
    fn test_warning_keeps_success() {
        let mut report = Report::empty();
        report.warning("KS p-value 0.03 within tolerated noise");
        assert!(report.success());
        assert!(report.to_report_string().contains("WARNING: KS p-value"));
        assert!(report.to_report_string().ends_with("SUMMARY: Success=True\n"));
    }

    #[test]
    fn test_record_maps_outcomes() {
        let mut report = Report::empty();
        assert!(report.record(&Comparison::good("a")));
        assert!(report.record(&Comparison::warning("b")));
        assert!(!report.record(&Comparison::bad("c")));
        assert_eq!(report.lines(), ["GOOD: a", "WARNING: b", "BAD: c"]);
    }

    #[test]
    fn test_record_writes_notes_as_warnings() {
        let mut report = Report::empty();
        let cmp = Comparison::good("3 of 20").with_note("small sample").labeled("day 4");
        assert!(report.record(&cmp));
        assert_eq!(report.lines(), ["GOOD: day 4: 3 of 20", "WARNING: day 4: small sample"]);
        assert_eq!(report.warning_count(), 1);
        assert!(report.success());
    }

    #[test]
    fn test_finish_writes_once_to_nested_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("output").join(DEFAULT_REPORT_NAME);

        let mut report = Report::empty();
        report.good("all good");
        assert!(report.finish(&path).unwrap());

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "GOOD: all good\nSUMMARY: Success=True\n");
    }

    #[test]
    fn test_success_msg_format() {
        assert_eq!(format_success_msg(true), "SUMMARY: Success=True");
        assert_eq!(format_success_msg(false), "SUMMARY: Success=False");
    }
}
