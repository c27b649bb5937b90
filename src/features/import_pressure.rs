// Imported infections under ImportPressure
//
// With transmission switched off, every new infection is an import. Daily
// new infections are Poisson with the configured daily import pressure, and
// their total is Poisson with the summed rate.

use super::{count_total_tolerance, FeatureTest};
use crate::campaign::ImportPressure;
use crate::context::RunContext;
use crate::debug_dump::DebugDump;
use crate::report::Report;
use crate::sft::{poisson_ci_compare, tolerance_compare, RepeatedTrials, Tolerance, ZeroExpected};
use anyhow::{bail, Result};
use serde::Serialize;

const NEW_INFECTIONS: &str = "New Infections";

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportPressureTest;

#[derive(Debug, Serialize)]
struct DayRow {
    day: f64,
    expected_rate: f64,
    observed: f64,
}

impl FeatureTest for ImportPressureTest {
    fn name(&self) -> &'static str {
        "import-pressure"
    }

    fn run(&self, ctx: &RunContext, report: &mut Report) -> Result<()> {
        let (config, _) = ctx.simulation_config()?;
        let campaign = ctx.campaign()?;
        let inset = ctx.inset_chart()?;

        let pressures = ImportPressure::all_in(&campaign)?;
        if pressures.is_empty() {
            bail!("Campaign has no {} interventions", ImportPressure::CLASS);
        }
        if config.contains("Base_Infectivity") && config.f64("Base_Infectivity")? > 0.0 {
            report.warning("Base_Infectivity > 0: transmission adds infections beyond imports");
        }

        let new_infections = inset.channel(NEW_INFECTIONS)?;
        let steps = ctx.analysis_len(new_infections.len());
        let start = inset.header.start_time;
        let dt = inset.header.simulation_timestep;

        let mut dump = DebugDump::new(self.name());
        dump.insert("pressures", &pressures);

        let mut trials = RepeatedTrials::new("Daily imports", ctx.settings.repeated_test_policy);
        let mut expected_total = 0.0;
        let mut observed_total = 0.0;
        let mut expected_series = Vec::with_capacity(steps);

        for (index, &observed) in new_infections.iter().take(steps).enumerate() {
            let day = start + index as f64 * dt;
            let rate: f64 = pressures.iter().map(|p| p.expected_rate_on(day)).sum::<f64>() * dt;
            expected_series.push(rate);
            expected_total += rate;
            observed_total += observed;
            dump.add_row(&DayRow {
                day,
                expected_rate: rate,
                observed,
            });

            if observed < 0.0 || observed.fract() != 0.0 {
                bail!("{} on day {} is not a count: {}", NEW_INFECTIONS, day, observed);
            }
            let raw = poisson_ci_compare(observed as u64, rate, ctx.settings.confidence)?;
            let applied = trials.observe(&format!("day {}", day), raw);
            if !applied.passed {
                report.record(&applied);
            }
        }

        report.info(format!(
            "Checked {} days of {}: {} outside the {} interval",
            trials.trials(),
            NEW_INFECTIONS,
            trials.failures(),
            ctx.settings.confidence
        ));
        report.record(&trials.verdict());

        // a sum of Poisson counts has variance equal to its mean
        let allowed =
            count_total_tolerance(expected_total, expected_total, ctx.settings.tolerance_fraction);
        let total = tolerance_compare(
            observed_total,
            expected_total,
            Tolerance::Absolute(allowed),
            ZeroExpected::ExactMatch,
        )?;
        report.record(&total.labeled("Total imported infections"));

        dump.insert("expected_total", &expected_total);
        dump.insert("observed_total", &observed_total);
        ctx.write_debug(&dump)?;

        ctx.plot(self.name(), |path| {
            crate::plot::series_comparison(
                path,
                "Imported infections per day",
                &new_infections[..steps],
                &expected_series,
                NEW_INFECTIONS,
            )
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Poisson};
    use std::fs;
    use tempfile::TempDir;

    fn setup(new_infections: &[f64]) -> (TempDir, RunContext) {
        let temp_dir = TempDir::new().unwrap();
        let mut ctx = RunContext::new(temp_dir.path().join("output"));
        ctx.inputs.config = temp_dir.path().join("config.json");
        ctx.inputs.campaign = temp_dir.path().join("campaign.json");
        ctx.report_path = temp_dir.path().join("report.txt");
        fs::create_dir_all(&ctx.output_dir).unwrap();

        fs::write(
            &ctx.inputs.config,
            r#"{"parameters": {"Simulation_Duration": 60, "Base_Infectivity": 0}}"#,
        )
        .unwrap();
        fs::write(
            &ctx.inputs.campaign,
            r#"{"Events": [{"Start_Day": 0, "Event_Coordinator_Config": {
                "Intervention_Config": {"class": "ImportPressure",
                    "Durations": [30, 30], "Daily_Import_Pressures": [4.0, 10.0]}}}]}"#,
        )
        .unwrap();
        let chart = serde_json::json!({
            "Header": {"Timesteps": new_infections.len(), "Start_Time": 0, "Simulation_Timestep": 1},
            "Channels": {"New Infections": {"Units": "", "Data": new_infections}}
        });
        fs::write(&ctx.inputs.inset_chart, chart.to_string()).unwrap();
        (temp_dir, ctx)
    }

    fn simulated(seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let low = Poisson::new(4.0).unwrap();
        let high = Poisson::new(10.0).unwrap();
        (0..60)
            .map(|day| {
                let dist = if day < 30 { &low } else { &high };
                Distribution::<f64>::sample(dist, &mut rng)
            })
            .collect()
    }

    #[test]
    fn test_poisson_imports_pass() {
        let (_dir, ctx) = setup(&simulated(42));
        let mut report = Report::empty();
        ImportPressureTest.run(&ctx, &mut report).unwrap();
        assert!(report.success(), "{}", report.to_report_string());
    }

    #[test]
    fn test_doubled_imports_fail() {
        let doubled: Vec<f64> = simulated(42).iter().map(|v| v * 2.0 + 3.0).collect();
        let (_dir, ctx) = setup(&doubled);
        let mut report = Report::empty();
        ImportPressureTest.run(&ctx, &mut report).unwrap();
        assert!(!report.success());
    }

    #[test]
    fn test_fractional_count_is_error() {
        let mut data = simulated(1);
        data[3] = 2.5;
        let (_dir, ctx) = setup(&data);
        let mut report = Report::empty();
        assert!(ImportPressureTest.run(&ctx, &mut report).is_err());
    }
}
