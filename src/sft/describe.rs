// Descriptive statistics for report lines
//
// Uses trueno::Vector for the SIMD standard deviation and aprender's
// DescriptiveStats for the median, the same pairing the regression statistics
// use. Both work in f32. Mean, min and max stay in f64 so they can sit next to
// an f64 expectation in the report without last-digit drift.

use anyhow::{Context, Result};
use aprender::stats::DescriptiveStats;
use serde::Serialize;
use std::fmt;
use trueno::Vector;

/// Summary of a sample set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSummary {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation (divides by n), f32 precision
    pub std_dev: f32,
    pub min: f64,
    pub max: f64,
    /// f32 precision
    pub median: f32,
}

/// Summarise a sample
pub fn describe(sample: &[f64]) -> Result<SampleSummary> {
    if sample.is_empty() {
        anyhow::bail!("Cannot describe an empty sample");
    }

    let values: Vec<f32> = sample.iter().map(|&x| x as f32).collect();
    let vector = Vector::from_slice(&values);

    let mean = sample.iter().sum::<f64>() / sample.len() as f64;
    let std_dev = vector
        .stddev()
        .context("Failed to compute sample standard deviation")?;
    let median = DescriptiveStats::new(&vector)
        .quantile(0.5)
        .map_err(|e| anyhow::anyhow!("Failed to compute median: {}", e))?;

    let min = sample.iter().copied().fold(f64::INFINITY, f64::min);
    let max = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(SampleSummary {
        count: sample.len(),
        mean,
        std_dev,
        min,
        max,
        median,
    })
}

impl fmt::Display for SampleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={}, mean={:.4}, std_dev={:.4}, median={:.4}, min={:.4}, max={:.4}",
            self.count, self.mean, self.std_dev, self.median, self.min, self.max
        )
    }
}
