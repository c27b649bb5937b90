// CSV event recorder reader
//
// One row per recorded individual event. Only the four columns every
// recorder writes are typed; property and age columns are ignored.

use super::day_of;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventRecord {
    #[serde(rename = "Time")]
    pub time: f64,

    #[serde(rename = "Node_ID")]
    pub node_id: u64,

    #[serde(rename = "Event_Name")]
    pub event_name: String,

    #[serde(rename = "Individual_ID")]
    pub individual_id: u64,
}

#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    records: Vec<EventRecord>,
}

impl EventRecorder {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            bail!("Event recorder file not found: {}", path_ref.display());
        }

        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read event recorder {}", path_ref.display()))?;
        let recorder = Self::from_csv_str(&contents)
            .with_context(|| format!("Invalid event recorder {}", path_ref.display()))?;

        tracing::info!(
            "Loaded {} ({} events)",
            path_ref.display(),
            recorder.records.len()
        );
        Ok(recorder)
    }

    pub fn from_csv_str(contents: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(contents.as_bytes());

        let mut records = Vec::new();
        for (row, result) in reader.deserialize::<EventRecord>().enumerate() {
            // row 0 is the first line after the header
            let record = result.with_context(|| format!("Malformed event row {}", row + 2))?;
            records.push(record);
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn events_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a EventRecord> + 'a {
        self.records.iter().filter(move |r| r.event_name == name)
    }

    pub fn count_by_event(&self, name: &str) -> usize {
        self.events_named(name).count()
    }

    /// Events named `name` recorded on the integer day `day`
    pub fn count_on_day(&self, name: &str, day: f64) -> usize {
        let target = day_of(day);
        self.events_named(name)
            .filter(|r| day_of(r.time) == target)
            .count()
    }

    /// Day -> count for events named `name`
    pub fn counts_per_day(&self, name: &str) -> BTreeMap<i64, usize> {
        let mut counts = BTreeMap::new();
        for record in self.events_named(name) {
            *counts.entry(day_of(record.time)).or_insert(0) += 1;
        }
        counts
    }
}
