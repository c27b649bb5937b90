// Waiting for the simulator to finish writing its output
//
// The simulator runs as a separate process. Before any parsing starts the
// stdout log is polled at a fixed interval until it carries a completion
// marker or the timeout expires.

use super::stdout_log::{is_completion_line, StdoutLog};
use anyhow::{bail, Result};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// Words that mark the end of a simulation run
pub const COMPLETION_MARKERS: &[&str] = &["Done", "Exiting", "Finished"];

/// Marker written when the simulator stops early
const ABORT_MARKER: &str = "Exiting";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl WaitOptions {
    pub fn with_timeout_secs(secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(secs),
            ..Self::default()
        }
    }
}

/// State of a finished simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationStatus {
    /// Last simulation time seen in the log
    pub last_time: Option<f64>,
    /// Time at which the run stopped early, if it did
    pub aborted_at: Option<f64>,
}

impl SimulationStatus {
    /// Status of a complete log; `None` while the run is still going
    pub fn from_log(log: &StdoutLog) -> Option<Self> {
        if !log.finished() {
            return None;
        }
        let completed_normally = log
            .lines()
            .iter()
            .filter(|l| is_completion_line(&l.text))
            .any(|l| !l.text.contains(ABORT_MARKER));
        let last_time = log.last_time();
        Some(Self {
            last_time,
            aborted_at: if completed_normally { None } else { last_time },
        })
    }
}

/// Poll `stdout_path` until the simulator reports completion
pub fn wait_for_done<P: AsRef<Path>>(stdout_path: P, options: WaitOptions) -> Result<SimulationStatus> {
    let path = stdout_path.as_ref();
    let started = Instant::now();
    let mut polls = 0usize;

    loop {
        polls += 1;
        // the file may not exist yet, or be mid-write
        if let Ok(contents) = std::fs::read_to_string(path) {
            let log = StdoutLog::parse_str(&contents);
            if let Some(status) = SimulationStatus::from_log(&log) {
                tracing::info!(
                    "Simulation finished after {} polls (last time {:?}, aborted at {:?})",
                    polls,
                    status.last_time,
                    status.aborted_at
                );
                return Ok(status);
            }
        }

        if started.elapsed() >= options.timeout {
            bail!(
                "Timed out after {:?} waiting for {} to report completion",
                options.timeout,
                path.display()
            );
        }
        thread::sleep(options.poll_interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fast(timeout_ms: u64) -> WaitOptions {
        WaitOptions {
            timeout: Duration::from_millis(timeout_ms),
            poll_interval: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_finished_log_returns_immediately() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.txt");
        fs::write(&path, "Update(): Time: 1.0\nUpdate(): Time: 2.0\nDone - 0:00:01\n").unwrap();

        let status = wait_for_done(&path, fast(1000)).unwrap();
        assert_eq!(status.last_time, Some(2.0));
        assert_eq!(status.aborted_at, None);
    }

    #[test]
    fn test_abort_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.txt");
        fs::write(&path, "Update(): Time: 1.0\nUpdate(): Time: 7.0\nExiting with error\n").unwrap();

        let status = wait_for_done(&path, fast(1000)).unwrap();
        assert_eq!(status.aborted_at, Some(7.0));
    }

    #[test]
    fn test_timeout_on_unfinished_log() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.txt");
        fs::write(&path, "Update(): Time: 1.0\n").unwrap();

        let err = wait_for_done(&path, fast(50)).unwrap_err();
        assert!(err.to_string().contains("Timed out"));
    }

    #[test]
    fn test_missing_file_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("never.txt");
        assert!(wait_for_done(&path, fast(30)).is_err());
    }

    #[test]
    fn test_log_appearing_later() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.txt");
        let writer_path = path.clone();
        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            fs::write(&writer_path, "Update(): Time: 3.0\nFinished\n").unwrap();
        });

        let status = wait_for_done(&path, fast(5000)).unwrap();
        writer.join().unwrap();
        assert_eq!(status.last_time, Some(3.0));
    }
}
