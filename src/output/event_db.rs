// SQLite event database reader
//
// The simulator writes discrete events to a SIM_EVENTS table. The reader
// pulls the whole table through sqlx on a private single-threaded tokio
// runtime and exposes synchronous count queries over the loaded rows.

use super::day_of;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::BTreeMap;
use std::path::Path;

/// Events table name
pub const SIM_EVENTS_TABLE: &str = "SIM_EVENTS";

/// One row of `SIM_EVENTS`
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SimEvent {
    #[sqlx(rename = "SIM_TIME")]
    pub sim_time: f64,

    #[sqlx(rename = "HUMAN_ID")]
    pub human_id: i64,

    #[sqlx(rename = "LABEL")]
    pub label: String,

    #[sqlx(rename = "INFECTOR")]
    pub infector: Option<i64>,

    #[sqlx(rename = "NODE_ID")]
    pub node_id: i64,

    #[sqlx(rename = "PROPERTIES")]
    pub properties: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EventDatabase {
    events: Vec<SimEvent>,
}

async fn fetch_events(path: &Path) -> Result<Vec<SimEvent>, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .read_only(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    let events = sqlx::query_as::<_, SimEvent>(
        r#"
        SELECT CAST(SIM_TIME AS REAL) AS SIM_TIME, HUMAN_ID, LABEL, INFECTOR, NODE_ID, PROPERTIES
        FROM SIM_EVENTS
        ORDER BY SIM_TIME, HUMAN_ID
        "#,
    )
    .fetch_all(&pool)
    .await?;

    pool.close().await;
    Ok(events)
}

impl EventDatabase {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            bail!("Event database not found: {}", path_ref.display());
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start database runtime")?;
        let events = runtime
            .block_on(fetch_events(path_ref))
            .with_context(|| {
                format!(
                    "Failed to read {} from {}",
                    SIM_EVENTS_TABLE,
                    path_ref.display()
                )
            })?;

        tracing::info!("Loaded {} ({} events)", path_ref.display(), events.len());
        Ok(Self { events })
    }

    /// Database built from already-loaded rows
    pub fn from_events(events: Vec<SimEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events_labeled<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a SimEvent> + 'a {
        self.events.iter().filter(move |e| e.label == label)
    }

    pub fn count_by_label(&self, label: &str) -> usize {
        self.events_labeled(label).count()
    }

    /// Integer time step -> count of `label` events
    pub fn counts_per_time(&self, label: &str) -> BTreeMap<i64, usize> {
        let mut counts = BTreeMap::new();
        for event in self.events_labeled(label) {
            *counts.entry(day_of(event.sim_time)).or_insert(0) += 1;
        }
        counts
    }

    /// Node -> count of `label` events
    pub fn counts_per_node(&self, label: &str) -> BTreeMap<i64, usize> {
        let mut counts = BTreeMap::new();
        for event in self.events_labeled(label) {
            *counts.entry(event.node_id).or_insert(0) += 1;
        }
        counts
    }
}
