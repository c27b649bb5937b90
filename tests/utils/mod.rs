// Integration Test Utilities
//
// Builders for a simulator working directory: config, campaign and stdout log
// in the directory itself, chart and event files under output/.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp, Poisson};
use serde_json::{json, Value};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const REPORT_NAME: &str = "scientific_feature_report.txt";

/// A scratch simulation directory
pub struct SimDir {
    pub dir: TempDir,
}

impl SimDir {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("output")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.dir.path().join("output").join(name)
    }

    pub fn write(&self, name: &str, contents: &str) {
        fs::write(self.dir.path().join(name), contents).unwrap();
    }

    pub fn write_output(&self, name: &str, contents: &str) {
        fs::write(self.output(name), contents).unwrap();
    }

    pub fn config(&self, parameters: Value) {
        self.write("config.json", &json!({ "parameters": parameters }).to_string());
    }

    pub fn campaign(&self, events: Value) {
        self.write("campaign.json", &json!({ "Events": events }).to_string());
    }

    pub fn inset_chart(&self, channels: Value, timesteps: usize) {
        let chart = json!({
            "Header": {"Timesteps": timesteps, "Simulation_Timestep": 1, "Start_Time": 0},
            "Channels": channels
        });
        self.write_output("InsetChart.json", &chart.to_string());
    }

    pub fn report(&self) -> String {
        fs::read_to_string(self.dir.path().join(REPORT_NAME)).unwrap()
    }

    pub fn report_exists(&self) -> bool {
        self.dir.path().join(REPORT_NAME).exists()
    }
}

/// Stdout log with one timer line per sample, spread over timesteps
pub fn timer_log(key: &str, samples: &[f64], finished: bool) -> String {
    let mut log = String::new();
    for (i, value) in samples.iter().enumerate() {
        if i % 10 == 0 {
            log.push_str(&format!(
                "00:00:0{} [0] [I] [Simulation] Update(): Time: {}.0 Rank: 0 StatPop: 1000\n",
                i % 10,
                i / 10 + 1
            ));
        }
        log.push_str(&format!("[0] [V] [Individual] {} {:.4}\n", key, value));
    }
    if finished {
        log.push_str("Done - 0:00:01\n");
    }
    log
}

/// Seeded exponential durations with the given mean
pub fn exponential_samples(mean: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let exp = Exp::new(1.0 / mean).unwrap();
    (0..n).map(|_| exp.sample(&mut rng)).collect()
}

/// Seeded daily Poisson counts
pub fn poisson_counts(rate: f64, days: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let poisson = Poisson::new(rate).unwrap();
    (0..days)
        .map(|_| Distribution::<f64>::sample(&poisson, &mut rng))
        .collect()
}

/// SIM_EVENTS database with the given (time, human, label) rows
pub fn write_event_db(path: &Path, rows: &[(f64, i64, &str)]) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let mut conn = sqlx::SqliteConnection::connect_with(&options).await.unwrap();
        sqlx::query(
            "CREATE TABLE SIM_EVENTS (SIM_TIME REAL, HUMAN_ID INTEGER, LABEL TEXT, \
             INFECTOR INTEGER NULL, NODE_ID INTEGER, PROPERTIES TEXT NULL)",
        )
        .execute(&mut conn)
        .await
        .unwrap();
        for (time, human, label) in rows {
            sqlx::query("INSERT INTO SIM_EVENTS VALUES (?, ?, ?, NULL, 1, NULL)")
                .bind(*time)
                .bind(*human)
                .bind(*label)
                .execute(&mut conn)
                .await
                .unwrap();
        }
        conn.close().await.unwrap();
    });
}
