//! Campaign reader
//!
//! `campaign.json` lists scheduled interventions. The coordinator fields the
//! feature tests rely on are typed; the intervention keeps its free-form
//! parameters and exposes typed accessors over them.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Loaded `campaign.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    #[serde(rename = "Events", default)]
    pub events: Vec<CampaignEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignEvent {
    #[serde(rename = "Start_Day", default)]
    pub start_day: f64,

    #[serde(rename = "Nodeset_Config", default, skip_serializing_if = "Option::is_none")]
    pub nodeset_config: Option<Value>,

    #[serde(rename = "Event_Coordinator_Config")]
    pub coordinator: EventCoordinator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCoordinator {
    #[serde(rename = "Demographic_Coverage", default = "full_coverage")]
    pub demographic_coverage: f64,

    #[serde(rename = "Number_Repetitions", default = "single_repetition")]
    pub number_repetitions: i64,

    #[serde(rename = "Timesteps_Between_Repetitions", default)]
    pub timesteps_between_repetitions: f64,

    #[serde(rename = "Intervention_Config")]
    pub intervention: Intervention,
}

fn full_coverage() -> f64 {
    1.0
}

fn single_repetition() -> i64 {
    1
}

/// Intervention with its class name and untyped parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intervention {
    pub class: String,

    #[serde(flatten)]
    pub parameters: Map<String, Value>,
}

impl Intervention {
    pub fn value(&self, name: &str) -> Result<&Value> {
        self.parameters
            .get(name)
            .with_context(|| format!("{} intervention has no {}", self.class, name))
    }

    pub fn f64(&self, name: &str) -> Result<f64> {
        self.value(name)?
            .as_f64()
            .with_context(|| format!("{}.{} is not a number", self.class, name))
    }

    pub fn str(&self, name: &str) -> Result<&str> {
        self.value(name)?
            .as_str()
            .with_context(|| format!("{}.{} is not a string", self.class, name))
    }

    pub fn f64_list(&self, name: &str) -> Result<Vec<f64>> {
        let values = self
            .value(name)?
            .as_array()
            .with_context(|| format!("{}.{} is not an array", self.class, name))?;
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_f64()
                    .with_context(|| format!("{}.{}[{}] is not a number", self.class, name, i))
            })
            .collect()
    }
}

impl CampaignEvent {
    /// Days on which the event fires, honoring repetitions
    ///
    /// A negative repetition count means "repeat forever"; the caller bounds
    /// the result with the simulation duration.
    pub fn firing_days(&self, until: f64) -> Vec<f64> {
        let c = &self.coordinator;
        let repetitions = if c.number_repetitions < 0 {
            usize::MAX
        } else {
            c.number_repetitions.max(1) as usize
        };
        let step = if c.timesteps_between_repetitions > 0.0 {
            c.timesteps_between_repetitions
        } else {
            // without a spacing only the first firing is meaningful
            return if self.start_day <= until {
                vec![self.start_day]
            } else {
                Vec::new()
            };
        };

        let mut days = Vec::new();
        let mut day = self.start_day;
        while days.len() < repetitions && day <= until {
            days.push(day);
            day += step;
        }
        days
    }
}

impl Campaign {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            bail!("Campaign file not found: {}", path_ref.display());
        }

        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read campaign file {}", path_ref.display()))?;
        let campaign = Self::from_json_str(&contents)
            .with_context(|| format!("Invalid campaign file {}", path_ref.display()))?;

        tracing::info!(
            "Loaded {} ({} events)",
            path_ref.display(),
            campaign.events.len()
        );
        Ok(campaign)
    }

    pub fn from_json_str(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Invalid campaign JSON")
    }

    /// Events whose intervention has the given class
    pub fn events_with_intervention<'a>(
        &'a self,
        class: &'a str,
    ) -> impl Iterator<Item = &'a CampaignEvent> + 'a {
        self.events
            .iter()
            .filter(move |e| e.coordinator.intervention.class == class)
    }
}

/// Typed view of an `ImportPressure` intervention
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportPressure {
    pub start_day: f64,
    pub durations: Vec<f64>,
    pub daily_import_pressures: Vec<f64>,
}

impl ImportPressure {
    pub const CLASS: &'static str = "ImportPressure";

    pub fn from_event(event: &CampaignEvent) -> Result<Self> {
        let intervention = &event.coordinator.intervention;
        if intervention.class != Self::CLASS {
            bail!("Expected {} intervention, got {}", Self::CLASS, intervention.class);
        }

        let durations = intervention.f64_list("Durations")?;
        let daily_import_pressures = intervention.f64_list("Daily_Import_Pressures")?;
        if durations.len() != daily_import_pressures.len() {
            bail!(
                "ImportPressure has {} Durations but {} Daily_Import_Pressures",
                durations.len(),
                daily_import_pressures.len()
            );
        }
        if let Some(rate) = daily_import_pressures.iter().find(|r| **r < 0.0) {
            bail!("Daily_Import_Pressures must be non-negative, got {}", rate);
        }

        Ok(Self {
            start_day: event.start_day,
            durations,
            daily_import_pressures,
        })
    }

    /// Every `ImportPressure` intervention in the campaign
    pub fn all_in(campaign: &Campaign) -> Result<Vec<Self>> {
        campaign
            .events_with_intervention(Self::CLASS)
            .map(Self::from_event)
            .collect()
    }

    /// Expected imported infections on `day`
    ///
    /// Pressure periods follow each other from the start day; outside them
    /// the rate is zero.
    pub fn expected_rate_on(&self, day: f64) -> f64 {
        if day < self.start_day {
            return 0.0;
        }
        let mut period_start = self.start_day;
        for (duration, rate) in self.durations.iter().zip(&self.daily_import_pressures) {
            let period_end = period_start + duration;
            if day < period_end {
                return *rate;
            }
            period_start = period_end;
        }
        0.0
    }

    /// Last day (exclusive) with non-zero pressure
    pub fn end_day(&self) -> f64 {
        self.start_day + self.durations.iter().sum::<f64>()
    }
}
