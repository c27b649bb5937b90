//! Simulation configuration reader
//!
//! `config.json` holds a flat key/value map under `"parameters"`. The generic
//! accessors are pure reads; `SimulationConfig` is the typed view the feature
//! tests compute their expectations from.

use crate::sft::ExpectedDistribution;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Loaded `config.json`
#[derive(Debug, Clone)]
pub struct ConfigFile {
    parameters: Map<String, Value>,
}

impl ConfigFile {
    /// Load and parse a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            bail!("Config file not found: {}", path_ref.display());
        }

        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;
        let config = Self::from_json_str(&contents)
            .with_context(|| format!("Invalid config file {}", path_ref.display()))?;

        tracing::info!(
            "Loaded {} ({} parameters)",
            path_ref.display(),
            config.parameters.len()
        );
        Ok(config)
    }

    /// Parse config JSON text
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let mut root: Value = serde_json::from_str(contents).context("Invalid config JSON")?;
        match root.get_mut("parameters").map(Value::take) {
            Some(Value::Object(parameters)) => Ok(Self { parameters }),
            Some(_) => bail!("\"parameters\" must be a JSON object"),
            None => bail!("Config JSON has no \"parameters\" object"),
        }
    }

    /// Raw parameter value
    pub fn parameter(&self, name: &str) -> Result<&Value> {
        self.parameters
            .get(name)
            .with_context(|| format!("Config parameter {} is missing", name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    pub fn f64(&self, name: &str) -> Result<f64> {
        self.parameter(name)?
            .as_f64()
            .with_context(|| format!("Config parameter {} is not a number", name))
    }

    pub fn f64_or(&self, name: &str, default: f64) -> Result<f64> {
        if self.contains(name) {
            self.f64(name)
        } else {
            Ok(default)
        }
    }

    pub fn u64(&self, name: &str) -> Result<u64> {
        let value = self.parameter(name)?;
        if let Some(v) = value.as_u64() {
            return Ok(v);
        }
        // integers are sometimes written as 1.0
        match value.as_f64() {
            Some(v) if v >= 0.0 && v.fract() == 0.0 => Ok(v as u64),
            _ => bail!("Config parameter {} is not a non-negative integer", name),
        }
    }

    pub fn str(&self, name: &str) -> Result<&str> {
        self.parameter(name)?
            .as_str()
            .with_context(|| format!("Config parameter {} is not a string", name))
    }

    /// Boolean parameter; the simulator writes flags as 0/1
    pub fn bool(&self, name: &str) -> Result<bool> {
        match self.parameter(name)? {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) => match n.as_f64() {
                Some(v) if v == 0.0 => Ok(false),
                Some(v) if v == 1.0 => Ok(true),
                _ => bail!("Config parameter {} must be 0 or 1, got {}", name, n),
            },
            other => bail!("Config parameter {} is not a flag: {}", name, other),
        }
    }
}

/// Distribution of a per-individual duration (incubation, infectious period)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum DurationDistribution {
    /// Every individual gets exactly this duration
    Constant(f64),
    /// Random draw from a reference distribution
    Random(ExpectedDistribution),
}

impl DurationDistribution {
    /// Read `<prefix>_Distribution` and its parameters
    ///
    /// # Example
    /// ```
    /// use sftcheck::sim_config::{ConfigFile, DurationDistribution};
    /// use sftcheck::sft::ExpectedDistribution;
    ///
    /// let config = ConfigFile::from_json_str(r#"{"parameters": {
    ///     "Incubation_Period_Distribution": "GAMMA_DISTRIBUTION",
    ///     "Incubation_Period_Gamma_Shape": 2.0,
    ///     "Incubation_Period_Gamma_Scale": 3.5
    /// }}"#).unwrap();
    /// let dist = DurationDistribution::from_config(&config, "Incubation_Period").unwrap();
    /// assert_eq!(
    ///     dist,
    ///     DurationDistribution::Random(ExpectedDistribution::Gamma { shape: 2.0, scale: 3.5 })
    /// );
    /// ```
    pub fn from_config(config: &ConfigFile, prefix: &str) -> Result<Self> {
        let key = |suffix: &str| format!("{}_{}", prefix, suffix);
        let kind = config.str(&key("Distribution"))?;

        let dist = match kind {
            "CONSTANT_DISTRIBUTION" => DurationDistribution::Constant(config.f64(&key("Constant"))?),
            "EXPONENTIAL_DISTRIBUTION" => DurationDistribution::Random(
                ExpectedDistribution::exponential_with_mean(config.f64(&key("Exponential"))?)?,
            ),
            "GAUSSIAN_DISTRIBUTION" => DurationDistribution::Random(ExpectedDistribution::Gaussian {
                mean: config.f64(&key("Gaussian_Mean"))?,
                std_dev: config.f64(&key("Gaussian_Std_Dev"))?,
            }),
            "GAMMA_DISTRIBUTION" => DurationDistribution::Random(ExpectedDistribution::Gamma {
                shape: config.f64(&key("Gamma_Shape"))?,
                scale: config.f64(&key("Gamma_Scale"))?,
            }),
            "LOG_NORMAL_DISTRIBUTION" => DurationDistribution::Random(ExpectedDistribution::LogNormal {
                mu: config.f64(&key("Log_Normal_Mu"))?,
                sigma: config.f64(&key("Log_Normal_Sigma"))?,
            }),
            "UNIFORM_DISTRIBUTION" => DurationDistribution::Random(ExpectedDistribution::Uniform {
                min: config.f64(&key("Min"))?,
                max: config.f64(&key("Max"))?,
            }),
            other => bail!("Unsupported {}: {}", key("Distribution"), other),
        };

        if let DurationDistribution::Random(reference) = &dist {
            reference
                .validate()
                .with_context(|| format!("Invalid {} parameters", prefix))?;
        }
        Ok(dist)
    }
}

/// Typed view of the parameters the feature tests use
#[derive(Debug, Clone, Serialize)]
pub struct SimulationConfig {
    pub config_name: String,
    pub simulation_duration: f64,
    pub simulation_timestep: f64,
    pub base_infectivity: Option<f64>,
    pub run_number: Option<u64>,
    pub incubation: Option<DurationDistribution>,
    pub infectious: Option<DurationDistribution>,
}

impl SimulationConfig {
    pub fn from_config(config: &ConfigFile) -> Result<Self> {
        let optional_duration = |prefix: &str| -> Result<Option<DurationDistribution>> {
            if config.contains(&format!("{}_Distribution", prefix)) {
                DurationDistribution::from_config(config, prefix).map(Some)
            } else {
                Ok(None)
            }
        };

        let simulation_timestep = config.f64_or("Simulation_Timestep", 1.0)?;
        if simulation_timestep <= 0.0 {
            bail!("Simulation_Timestep must be > 0, got {}", simulation_timestep);
        }

        Ok(Self {
            config_name: if config.contains("Config_Name") {
                config.str("Config_Name")?.to_string()
            } else {
                "unnamed config".to_string()
            },
            simulation_duration: config.f64("Simulation_Duration")?,
            simulation_timestep,
            base_infectivity: if config.contains("Base_Infectivity") {
                Some(config.f64("Base_Infectivity")?)
            } else {
                None
            },
            run_number: if config.contains("Run_Number") {
                Some(config.u64("Run_Number")?)
            } else {
                None
            },
            incubation: optional_duration("Incubation_Period")?,
            infectious: optional_duration("Infectious_Period")?,
        })
    }

    /// Number of timesteps the simulation runs
    pub fn timesteps(&self) -> usize {
        (self.simulation_duration / self.simulation_timestep).round() as usize
    }
}
