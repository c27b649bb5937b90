//! CLI argument parsing for sftcheck

use crate::context::{InputPaths, RunContext};
use crate::features::FeatureKind;
use crate::report::DEFAULT_REPORT_NAME;
use crate::sft::ToolkitSettings;
use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Built-in toolkit settings presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SettingsPreset {
    /// Warn on single KS rejections, tolerate 20% failed repeated trials (default)
    Default,
    /// Every statistical rejection fails the feature test
    Strict,
    /// Wider tolerances for small or noisy scenarios
    Permissive,
}

impl SettingsPreset {
    pub fn settings(self) -> ToolkitSettings {
        match self {
            SettingsPreset::Default => ToolkitSettings::default(),
            SettingsPreset::Strict => ToolkitSettings::strict(),
            SettingsPreset::Permissive => ToolkitSettings::permissive(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "sftcheck")]
#[command(version)]
#[command(about = "Scientific feature test checks for epidemiological simulation output", long_about = None)]
pub struct Cli {
    /// Enable debug tracing to stderr and write DEBUG_<feature>.json dumps
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check simulation output for one feature and write the report
    Run(RunArgs),

    /// Replace ad-hoc campaign event names with GP_EVENT_nnn slot names
    RenameEvents {
        /// Campaign file to read
        #[arg(long, value_name = "FILE")]
        campaign: PathBuf,

        /// Renamed campaign to write (the name mapping is written next to it)
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Feature test to run
    #[arg(value_enum)]
    pub feature: FeatureKind,

    /// Simulator output folder
    #[arg(short, long, value_name = "DIR", default_value = "output")]
    pub output: PathBuf,

    /// Simulation config file
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    pub config: PathBuf,

    /// Simulator stdout log
    #[arg(short, long, value_name = "FILE", default_value = "test.txt")]
    pub stdout: PathBuf,

    /// Report file to write
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_REPORT_NAME)]
    pub reportname: PathBuf,

    /// Campaign file
    #[arg(long, value_name = "FILE", default_value = "campaign.json")]
    pub campaign: PathBuf,

    /// Inset chart, relative to the output folder
    #[arg(long, value_name = "FILE", default_value = "InsetChart.json")]
    pub insetchart: PathBuf,

    /// Property report, relative to the output folder
    #[arg(long, value_name = "FILE", default_value = "PropertyReport.json")]
    pub property_report: PathBuf,

    /// CSV event recorder, relative to the output folder
    #[arg(long, value_name = "FILE", default_value = "ReportEventRecorder.csv")]
    pub events_csv: PathBuf,

    /// SQLite event database, relative to the output folder
    #[arg(long, value_name = "FILE", default_value = "simulation_events.db")]
    pub events_db: PathBuf,

    /// Toolkit settings TOML file (overrides --preset)
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Toolkit settings preset
    #[arg(long, value_enum, default_value = "default")]
    pub preset: SettingsPreset,

    /// Significance level for goodness-of-fit tests
    #[arg(long, value_name = "ALPHA")]
    pub significance: Option<f64>,

    /// Render diagnostic SVG charts next to the report
    #[arg(long)]
    pub plot: bool,

    /// Wait up to SECS for the simulator to finish writing its stdout log
    #[arg(long, value_name = "SECS")]
    pub wait_timeout: Option<u64>,

    /// Only analyse output up to this simulation time
    #[arg(long, value_name = "TIME")]
    pub abort_timestep: Option<f64>,
}

impl RunArgs {
    /// Settings from file or preset, with command-line overrides applied
    pub fn toolkit_settings(&self) -> Result<ToolkitSettings> {
        let mut settings = match &self.settings {
            Some(path) => ToolkitSettings::from_toml_file(path)?,
            None => self.preset.settings(),
        };
        if let Some(alpha) = self.significance {
            settings.significance_level = alpha;
        }
        if self.plot {
            settings.plots = true;
        }
        settings.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(settings)
    }

    /// Run context for these arguments
    pub fn to_context(&self, debug: bool) -> Result<RunContext> {
        let inputs = InputPaths {
            config: self.config.clone(),
            campaign: self.campaign.clone(),
            stdout: self.stdout.clone(),
            inset_chart: self.output.join(&self.insetchart),
            property_report: self.output.join(&self.property_report),
            events_csv: self.output.join(&self.events_csv),
            events_db: self.output.join(&self.events_db),
        };
        Ok(RunContext {
            inputs,
            output_dir: self.output.clone(),
            report_path: self.reportname.clone(),
            debug,
            settings: self.toolkit_settings()?,
            abort_timestep: self.abort_timestep,
        })
    }
}
