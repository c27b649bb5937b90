//! Shared run context
//!
//! Built once per invocation (by `main` or by a test harness) and handed to
//! every stage. It carries resolved input paths, toolkit settings, the debug
//! flag and the timestep at which the simulation stopped early, if it did.

use crate::campaign::Campaign;
use crate::debug_dump::DebugDump;
use crate::output::{Chart, EventDatabase, EventRecorder, StdoutLog};
use crate::report::DEFAULT_REPORT_NAME;
use crate::sft::ToolkitSettings;
use crate::sim_config::{ConfigFile, SimulationConfig};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Locations of every simulator artifact a feature test may read
#[derive(Debug, Clone)]
pub struct InputPaths {
    pub config: PathBuf,
    pub campaign: PathBuf,
    pub stdout: PathBuf,
    pub inset_chart: PathBuf,
    pub property_report: PathBuf,
    pub events_csv: PathBuf,
    pub events_db: PathBuf,
}

impl InputPaths {
    /// Standard file names; chart and event files live in `output_dir`
    pub fn standard(output_dir: &Path) -> Self {
        Self {
            config: PathBuf::from("config.json"),
            campaign: PathBuf::from("campaign.json"),
            stdout: PathBuf::from("test.txt"),
            inset_chart: output_dir.join("InsetChart.json"),
            property_report: output_dir.join("PropertyReport.json"),
            events_csv: output_dir.join("ReportEventRecorder.csv"),
            events_db: output_dir.join("simulation_events.db"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunContext {
    pub inputs: InputPaths,
    pub output_dir: PathBuf,
    pub report_path: PathBuf,
    pub debug: bool,
    pub settings: ToolkitSettings,
    /// Last valid simulation time when the run stopped early
    pub abort_timestep: Option<f64>,
}

impl RunContext {
    /// Context with standard file names under `output_dir`
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        let output_dir = output_dir.as_ref().to_path_buf();
        Self {
            inputs: InputPaths::standard(&output_dir),
            output_dir,
            report_path: PathBuf::from(DEFAULT_REPORT_NAME),
            debug: false,
            settings: ToolkitSettings::default(),
            abort_timestep: None,
        }
    }

    /// Folder for DEBUG dumps and plots: next to the report
    pub fn artifact_dir(&self) -> PathBuf {
        match self.report_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn plot_path(&self, name: &str) -> PathBuf {
        self.artifact_dir().join(format!("{}.svg", name))
    }

    pub fn plots_enabled(&self) -> bool {
        self.settings.plots
    }

    /// Whether `time` falls inside the analysed part of the run
    pub fn in_analysis_window(&self, time: f64) -> bool {
        match self.abort_timestep {
            Some(abort) => time <= abort,
            None => true,
        }
    }

    /// Number of leading timesteps of a series to analyse
    pub fn analysis_len(&self, series_len: usize) -> usize {
        match self.abort_timestep {
            Some(abort) if abort >= 0.0 => series_len.min(abort.floor() as usize + 1),
            Some(_) => 0,
            None => series_len,
        }
    }

    pub fn config_file(&self) -> Result<ConfigFile> {
        ConfigFile::load(&self.inputs.config)
    }

    pub fn simulation_config(&self) -> Result<(ConfigFile, SimulationConfig)> {
        let file = self.config_file()?;
        let sim = SimulationConfig::from_config(&file)?;
        Ok((file, sim))
    }

    pub fn campaign(&self) -> Result<Campaign> {
        Campaign::load(&self.inputs.campaign)
    }

    pub fn stdout_log(&self) -> Result<StdoutLog> {
        StdoutLog::load(&self.inputs.stdout)
    }

    pub fn inset_chart(&self) -> Result<Chart> {
        Chart::load(&self.inputs.inset_chart)
    }

    pub fn property_report(&self) -> Result<Chart> {
        Chart::load(&self.inputs.property_report)
    }

    pub fn events_csv(&self) -> Result<EventRecorder> {
        EventRecorder::load(&self.inputs.events_csv)
    }

    pub fn events_db(&self) -> Result<EventDatabase> {
        EventDatabase::load(&self.inputs.events_db)
    }

    /// Write a DEBUG dump when `--debug` is on
    pub fn write_debug(&self, dump: &DebugDump) -> Result<()> {
        dump.write_if(self.debug, &self.artifact_dir())?;
        Ok(())
    }

    /// Render a chart when plotting is on; failures are only logged
    pub fn plot<F>(&self, name: &str, render: F)
    where
        F: FnOnce(&Path) -> Result<(), Box<dyn std::error::Error>>,
    {
        if self.plots_enabled() {
            crate::plot::render_or_warn(&self.plot_path(name), render);
        }
    }
}
