// Per-feature report builders
//
// Each feature test reads the simulator artifacts it needs through the run
// context, derives its expectation from config and campaign, and records
// every comparison in the report. Missing or malformed inputs are errors;
// mismatches are BAD lines and never stop the remaining checks.

mod demographic_coverage;
mod duration_distribution;
mod event_consistency;
mod import_pressure;
mod transmission;

pub use demographic_coverage::DemographicCoverage;
pub use duration_distribution::{DurationDistributionTest, DurationKind};
pub use event_consistency::EventConsistency;
pub use import_pressure::ImportPressureTest;
pub use transmission::Transmission;

use crate::context::RunContext;
use crate::report::Report;
use anyhow::Result;
use clap::ValueEnum;

/// A scientific feature test
pub trait FeatureTest {
    /// Name used in log lines and DEBUG file names
    fn name(&self) -> &'static str;

    /// Append this test's findings to `report`
    fn run(&self, ctx: &RunContext, report: &mut Report) -> Result<()>;
}

/// Feature tests selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FeatureKind {
    /// Incubation timers follow the configured distribution
    IncubationPeriod,
    /// Infectious timers follow the configured distribution
    InfectiousPeriod,
    /// Broadcast events reach the configured share of the population
    DemographicCoverage,
    /// Imported infections follow the daily import pressure
    ImportPressure,
    /// New infections follow the force of infection
    Transmission,
    /// Event database, inset chart and property report agree
    EventConsistency,
}

/// Look up the feature test for a kind
pub fn by_kind(kind: FeatureKind) -> Box<dyn FeatureTest> {
    match kind {
        FeatureKind::IncubationPeriod => {
            Box::new(DurationDistributionTest::new(DurationKind::Incubation))
        }
        FeatureKind::InfectiousPeriod => {
            Box::new(DurationDistributionTest::new(DurationKind::Infectious))
        }
        FeatureKind::DemographicCoverage => Box::new(DemographicCoverage),
        FeatureKind::ImportPressure => Box::new(ImportPressureTest),
        FeatureKind::Transmission => Box::new(Transmission),
        FeatureKind::EventConsistency => Box::new(EventConsistency),
    }
}

/// Run one feature test end to end and write its report
///
/// Returns the report's overall success. An `Err` means an input could not
/// be read and no report was written.
pub fn run_feature(kind: FeatureKind, ctx: &RunContext) -> Result<bool> {
    let feature = by_kind(kind);
    let (_, sim) = ctx.simulation_config()?;

    tracing::info!("Running {} for {}", feature.name(), sim.config_name);
    let mut report = Report::begin(&sim.config_name);
    if let Some(abort) = ctx.abort_timestep {
        report.info(format!("Simulation stopped early; analysing up to time {}.", abort));
    }

    feature.run(ctx, &mut report)?;
    report.finish(&ctx.report_path)
}

/// Allowed deviation of a sum of independent counts from its expectation
///
/// The larger of the relative tolerance and three standard deviations, so
/// small expected totals are not held to a band narrower than their noise.
pub(crate) fn count_total_tolerance(expected: f64, variance: f64, fraction: f64) -> f64 {
    (fraction * expected.abs()).max(3.0 * variance.max(0.0).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names() {
        let names: Vec<&str> = FeatureKind::value_variants()
            .iter()
            .map(|k| by_kind(*k).name())
            .collect();
        assert_eq!(
            names,
            [
                "incubation-period",
                "infectious-period",
                "demographic-coverage",
                "import-pressure",
                "transmission",
                "event-consistency"
            ]
        );
    }

    #[test]
    fn test_cli_value_names_match_feature_names() {
        for kind in FeatureKind::value_variants() {
            let value = kind.to_possible_value().unwrap();
            assert_eq!(value.get_name(), by_kind(*kind).name());
        }
    }

    #[test]
    fn test_count_total_tolerance() {
        // relative band dominates for large totals
        assert_eq!(count_total_tolerance(10_000.0, 10_000.0, 0.05), 500.0);
        // noise band dominates for small totals
        assert_eq!(count_total_tolerance(100.0, 100.0, 0.05), 30.0);
    }
}
