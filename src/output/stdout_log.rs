// Stdout log reader
//
// The simulator log is free text. Each "Update(): Time: <t>" line starts a
// new timestep; every line after it is tagged with that time so feature
// tests can bucket diagnostic lines per step.

use anyhow::{bail, Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// One log line with the simulation time in effect when it was written
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub time: Option<f64>,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct StdoutLog {
    lines: Vec<LogLine>,
}

const TIME_MARKER: &str = "Update(): Time:";

/// Float literal at the start of a value: `12`, `-3.5`, `.25`, `4.1e-3`
const NUMBER_PATTERN: &str = r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?";

fn number_regex() -> Option<&'static Regex> {
    static NUMBER: OnceLock<Option<Regex>> = OnceLock::new();
    NUMBER.get_or_init(|| Regex::new(NUMBER_PATTERN).ok()).as_ref()
}

/// Longest prefix of `text` that parses as a float
fn leading_number(text: &str) -> Option<f64> {
    let found = number_regex()?.find(text)?;
    found.as_str().parse().ok()
}

impl StdoutLog {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            bail!("Stdout log not found: {}", path_ref.display());
        }

        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read stdout log {}", path_ref.display()))?;
        let log = Self::parse_str(&contents);

        tracing::info!(
            "Loaded {} ({} lines, last time {:?})",
            path_ref.display(),
            log.lines.len(),
            log.last_time()
        );
        Ok(log)
    }

    pub fn parse_str(contents: &str) -> Self {
        let mut time = None;
        let lines = contents
            .lines()
            .map(|line| {
                if let Some(t) = Self::value_of(line, TIME_MARKER) {
                    time = Some(t);
                }
                LogLine {
                    time,
                    text: line.to_string(),
                }
            })
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines containing `needle`
    pub fn filter<'a>(&'a self, needle: &'a str) -> impl Iterator<Item = &'a LogLine> + 'a {
        self.lines.iter().filter(move |l| l.text.contains(needle))
    }

    pub fn filter_regex<'a>(&'a self, pattern: &'a Regex) -> impl Iterator<Item = &'a LogLine> + 'a {
        self.lines.iter().filter(move |l| pattern.is_match(&l.text))
    }

    /// Numeric values following `key` on every line that contains it
    pub fn values_after(&self, key: &str) -> Vec<f64> {
        self.filter(key)
            .filter_map(|l| Self::value_of(&l.text, key))
            .collect()
    }

    /// Numeric value following `key` in `line`
    ///
    /// Accepts `key=value`, `key: value` and `key value`.
    ///
    /// # Example
    /// ```
    /// use sftcheck::output::StdoutLog;
    ///
    /// let line = "[IndividualHuman] id = 12, Infectious_timer calculated as 4.25";
    /// assert_eq!(StdoutLog::value_of(line, "Infectious_timer calculated as"), Some(4.25));
    /// assert_eq!(StdoutLog::value_of(line, "id"), Some(12.0));
    /// ```
    pub fn value_of(line: &str, key: &str) -> Option<f64> {
        if key.is_empty() {
            return None;
        }
        let mut search_from = 0;
        while let Some(pos) = line[search_from..].find(key) {
            let after = search_from + pos + key.len();
            let rest = line[after..].trim_start();
            let rest = rest
                .strip_prefix('=')
                .or_else(|| rest.strip_prefix(':'))
                .unwrap_or(rest)
                .trim_start();
            if let Some(v) = leading_number(rest) {
                return Some(v);
            }
            search_from = after;
        }
        None
    }

    /// Time of the last `Update(): Time:` marker
    pub fn last_time(&self) -> Option<f64> {
        self.lines.iter().rev().find_map(|l| l.time)
    }

    /// Whether the log contains a completion marker
    pub fn finished(&self) -> bool {
        self.lines.iter().any(|l| is_completion_line(&l.text))
    }

    /// Lines grouped per timestep, in log order
    pub fn per_timestep(&self) -> Vec<(f64, Vec<&LogLine>)> {
        let mut groups: Vec<(f64, Vec<&LogLine>)> = Vec::new();
        for line in &self.lines {
            let Some(t) = line.time else { continue };
            match groups.last_mut() {
                Some((time, bucket)) if *time == t => bucket.push(line),
                _ => groups.push((t, vec![line])),
            }
        }
        groups
    }
}

pub(crate) fn is_completion_line(text: &str) -> bool {
    super::wait::COMPLETION_MARKERS
        .iter()
        .any(|marker| text.split_whitespace().any(|word| word.trim_end_matches('.') == *marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
00:00:00 [0] [I] [Eradication] Loading config
00:00:01 [0] [I] [Simulation] Update(): Time: 1.0 Rank: 0 StatPop: 1000 Infected: 0
00:00:01 [0] [D] [IndividualHuman] id = 5, Incubation_timer calculated as 3.5
00:00:01 [0] [D] [IndividualHuman] id = 9, Incubation_timer calculated as 1.25
00:00:02 [0] [I] [Simulation] Update(): Time: 2.0 Rank: 0 StatPop: 1000 Infected: 2
00:00:02 [0] [D] [IndividualHuman] id = 11, Incubation_timer calculated as 7
00:00:03 [0] [I] [Eradication] Done - 0:00:03
";

    #[test]
    fn test_lines_tagged_with_time() {
        let log = StdoutLog::parse_str(LOG);
        assert_eq!(log.len(), 7);
        assert_eq!(log.lines()[0].time, None);
        assert_eq!(log.lines()[2].time, Some(1.0));
        assert_eq!(log.lines()[5].time, Some(2.0));
        assert_eq!(log.last_time(), Some(2.0));
    }

    #[test]
    fn test_filter_and_values() {
        let log = StdoutLog::parse_str(LOG);
        assert_eq!(log.filter("Incubation_timer").count(), 3);
        assert_eq!(
            log.values_after("Incubation_timer calculated as"),
            vec![3.5, 1.25, 7.0]
        );
    }

    #[test]
    fn test_filter_regex() {
        let log = StdoutLog::parse_str(LOG);
        let pattern = Regex::new(r"id = 1\d,").unwrap();
        let matched: Vec<_> = log.filter_regex(&pattern).collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].time, Some(2.0));
    }

    #[test]
    fn test_value_forms() {
        assert_eq!(StdoutLog::value_of("Infected=17 StatPop=100", "Infected"), Some(17.0));
        assert_eq!(StdoutLog::value_of("Infected: 17", "Infected"), Some(17.0));
        assert_eq!(StdoutLog::value_of("Infected 1.5e2", "Infected"), Some(150.0));
        assert_eq!(StdoutLog::value_of("Infected: none", "Infected"), None);
        assert_eq!(StdoutLog::value_of("no key here", "Infected"), None);
    }

    #[test]
    fn test_value_skips_non_numeric_occurrence() {
        let line = "Infected individuals: Infected: 4";
        assert_eq!(StdoutLog::value_of(line, "Infected"), Some(4.0));
    }

    #[test]
    fn test_finished_and_per_timestep() {
        let log = StdoutLog::parse_str(LOG);
        assert!(log.finished());

        let steps = log.per_timestep();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].0, 1.0);
        assert_eq!(steps[0].1.len(), 3);
        assert_eq!(steps[1].1.len(), 3);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("3.5,"), Some(3.5));
        assert_eq!(leading_number("-2e3 days"), Some(-2000.0));
        assert_eq!(leading_number("7e"), Some(7.0));
        assert_eq!(leading_number(".5"), Some(0.5));
        assert_eq!(leading_number("-"), None);
        assert_eq!(leading_number("abc"), None);
        assert_eq!(leading_number("4. days"), Some(4.0));
        assert_eq!(leading_number("1.2.3"), Some(1.2));
        assert_eq!(leading_number("+6E-1x"), Some(0.6));
        assert_eq!(leading_number(" 5"), None);
    }

    #[test]
    fn test_number_pattern_compiles() {
        assert!(number_regex().is_some());
    }

    #[test]
    fn test_unfinished_log() {
        let log = StdoutLog::parse_str("Update(): Time: 1.0\nsomething\n");
        assert!(!log.finished());
        assert!(StdoutLog::parse_str("").is_empty());
    }
}
