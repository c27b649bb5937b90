// Simulator output readers
//
// Every reader loads its file completely into memory and exposes read-only
// queries; none of them mutate or re-serialize the input. Missing or
// malformed files are errors that propagate to the caller with the file
// name attached.

mod chart;
mod event_csv;
mod event_db;
mod stdout_log;
mod wait;

pub use chart::{Chart, ChartHeader};
pub use event_csv::{EventRecord, EventRecorder};
pub use event_db::{EventDatabase, SimEvent};
pub use stdout_log::{LogLine, StdoutLog};
pub use wait::{wait_for_done, SimulationStatus, WaitOptions, COMPLETION_MARKERS};

/// Integer day a simulation time falls in (floor)
pub(crate) fn day_of(time: f64) -> i64 {
    // absorb float noise such as 2.9999999999 for day 3
    (time + TIME_EPSILON).floor() as i64
}

pub(crate) const TIME_EPSILON: f64 = 1e-9;
