// Demographic coverage of broadcast events
//
// A BroadcastEvent intervention reaches each individual independently with
// probability Demographic_Coverage. The number of recorded events on the
// distribution day is therefore Binomial(population, coverage).

use super::FeatureTest;
use crate::context::RunContext;
use crate::debug_dump::DebugDump;
use crate::output::day_of;
use crate::report::Report;
use crate::sft::{binomial_ci_compare, Comparison, RepeatedTrials};
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

const BROADCAST_CLASS: &str = "BroadcastEvent";
const POPULATION_CHANNEL: &str = "Statistical Population";

#[derive(Debug, Clone, Copy, Default)]
pub struct DemographicCoverage;

#[derive(Debug, Serialize)]
struct CoverageRow {
    event: String,
    day: f64,
    coverage: f64,
    population: u64,
    observed: u64,
}

impl FeatureTest for DemographicCoverage {
    fn name(&self) -> &'static str {
        "demographic-coverage"
    }

    fn run(&self, ctx: &RunContext, report: &mut Report) -> Result<()> {
        let (_, sim) = ctx.simulation_config()?;
        let campaign = ctx.campaign()?;
        let inset = ctx.inset_chart()?;
        let events = ctx.events_csv()?;

        // (event name, day) -> coverages distributed that day
        let mut schedule: BTreeMap<(String, i64), Vec<f64>> = BTreeMap::new();
        for event in campaign.events_with_intervention(BROADCAST_CLASS) {
            let name = event.coordinator.intervention.str("Broadcast_Event")?;
            for day in event.firing_days(sim.simulation_duration) {
                if ctx.in_analysis_window(day) {
                    schedule
                        .entry((name.to_string(), day_of(day)))
                        .or_default()
                        .push(event.coordinator.demographic_coverage);
                }
            }
        }

        if schedule.is_empty() {
            report.bad(format!(
                "Campaign has no {} interventions inside the simulated period",
                BROADCAST_CLASS
            ));
            return Ok(());
        }

        let mut dump = DebugDump::new(self.name());
        let mut trials = RepeatedTrials::new("Broadcast coverage", ctx.settings.repeated_test_policy);

        for ((name, day), coverages) in &schedule {
            let label = format!("{} on day {}", name, day);
            if coverages.len() > 1 {
                report.warning(format!(
                    "{}: broadcast by {} campaign events, not checked",
                    label,
                    coverages.len()
                ));
                continue;
            }
            let coverage = coverages[0];
            let population = inset
                .value_at(POPULATION_CHANNEL, inset.index_of_day(*day as f64))?
                .round()
                .max(0.0) as u64;
            let observed = events.count_on_day(name, *day as f64) as u64;

            dump.add_row(&CoverageRow {
                event: name.clone(),
                day: *day as f64,
                coverage,
                population,
                observed,
            });

            let raw = if observed > population {
                Comparison::bad(format!(
                    "{} events recorded but the population is only {}",
                    observed, population
                ))
            } else {
                binomial_ci_compare(observed, population, coverage, ctx.settings.confidence)?
            };
            let applied = trials.observe(&label, raw);
            report.record(&applied);
        }

        report.record(&trials.verdict());
        dump.insert("failed", &trials.failed_labels());
        ctx.write_debug(&dump)?;
        Ok(())
    }
}
