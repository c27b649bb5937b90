// Inset chart and property report reader
//
// Both files share one layout: a Header plus a map of named channels, each a
// per-timestep array. Property report channel names carry the property
// group after the base name: "New Infections:QualityOfCare:High".

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct ChartHeader {
    #[serde(rename = "Timesteps", default)]
    pub timesteps: usize,

    #[serde(rename = "Simulation_Timestep", default = "unit_timestep")]
    pub simulation_timestep: f64,

    #[serde(rename = "Start_Time", default)]
    pub start_time: f64,

    #[serde(rename = "Channels", default)]
    pub channels: usize,
}

fn unit_timestep() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
struct Channel {
    #[serde(rename = "Units", default)]
    units: String,

    #[serde(rename = "Data")]
    data: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartFile {
    #[serde(rename = "Header")]
    header: ChartHeader,

    #[serde(rename = "Channels")]
    channels: BTreeMap<String, Channel>,
}

/// Loaded inset chart or property report
#[derive(Debug, Clone)]
pub struct Chart {
    pub header: ChartHeader,
    channels: BTreeMap<String, Channel>,
}

impl Chart {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            bail!("Chart file not found: {}", path_ref.display());
        }

        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read chart {}", path_ref.display()))?;
        let chart = Self::from_json_str(&contents)
            .with_context(|| format!("Invalid chart {}", path_ref.display()))?;

        tracing::info!(
            "Loaded {} ({} channels, {} timesteps)",
            path_ref.display(),
            chart.channels.len(),
            chart.header.timesteps
        );
        Ok(chart)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        let file: ChartFile = serde_json::from_str(contents).context("Invalid chart JSON")?;
        Ok(Self {
            header: file.header,
            channels: file.channels,
        })
    }

    /// Channel data by exact name
    pub fn channel(&self, name: &str) -> Result<&[f64]> {
        self.channels
            .get(name)
            .map(|c| c.data.as_slice())
            .with_context(|| format!("Chart has no channel \"{}\"", name))
    }

    pub fn units(&self, name: &str) -> Result<&str> {
        self.channels
            .get(name)
            .map(|c| c.units.as_str())
            .with_context(|| format!("Chart has no channel \"{}\"", name))
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Value of a channel at a timestep index
    pub fn value_at(&self, name: &str, index: usize) -> Result<f64> {
        let data = self.channel(name)?;
        data.get(index).copied().with_context(|| {
            format!(
                "Channel \"{}\" has {} entries, index {} requested",
                name,
                data.len(),
                index
            )
        })
    }

    /// Timestep index containing simulation time `day`
    ///
    /// Times inside a step belong to the step they fall in (floor), the same
    /// rule the event readers use to bucket times into days.
    pub fn index_of_day(&self, day: f64) -> usize {
        let offset = (day - self.header.start_time) / self.header.simulation_timestep;
        (offset + super::TIME_EPSILON).floor().max(0.0) as usize
    }

    /// Property groups of a base channel: `"<base>:<group>"` -> data
    ///
    /// The group key is everything after the first `':'`, so multi-property
    /// groups keep their `Key:Value,Key:Value` form.
    pub fn property_groups(&self, base: &str) -> BTreeMap<&str, &[f64]> {
        let prefix = format!("{}:", base);
        self.channels
            .iter()
            .filter_map(|(name, channel)| {
                name.strip_prefix(prefix.as_str())
                    .map(|group| (group, channel.data.as_slice()))
            })
            .collect()
    }

    /// Element-wise sum of every property group of `base`
    pub fn sum_over_groups(&self, base: &str) -> Result<Vec<f64>> {
        let groups = self.property_groups(base);
        if groups.is_empty() {
            bail!("Property report has no groups for channel \"{}\"", base);
        }

        let len = groups.values().map(|d| d.len()).max().unwrap_or(0);
        let mut total = vec![0.0; len];
        for (group, data) in &groups {
            if data.len() != len {
                bail!(
                    "Group \"{}:{}\" has {} entries, expected {}",
                    base,
                    group,
                    data.len(),
                    len
                );
            }
            for (sum, v) in total.iter_mut().zip(data.iter()) {
                *sum += v;
            }
        }
        Ok(total)
    }
}
