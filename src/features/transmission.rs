// Transmission under a homogeneous force of infection
//
// Each susceptible individual is infected during a timestep with
// probability 1 - exp(-beta * I / N), where beta is Base_Infectivity and I,
// N are the infected count and population at the end of the previous step.
// New infections per step are then Binomial(S, p).

use super::{count_total_tolerance, FeatureTest};
use crate::context::RunContext;
use crate::debug_dump::DebugDump;
use crate::output::Chart;
use crate::report::Report;
use crate::sft::{
    binomial_ci_compare, tolerance_compare, Comparison, RepeatedTrials, Tolerance, ZeroExpected,
};
use anyhow::{bail, Context, Result};
use serde::Serialize;

const POPULATION: &str = "Statistical Population";
const INFECTED: &str = "Infected";
const SUSCEPTIBLE: &str = "Susceptible Population";
const NEW_INFECTIONS: &str = "New Infections";

#[derive(Debug, Clone, Copy, Default)]
pub struct Transmission;

#[derive(Debug, Serialize)]
struct StepRow {
    step: usize,
    susceptible: u64,
    infected: f64,
    population: f64,
    probability: f64,
    expected: f64,
    observed: u64,
}

/// Channel as head counts; fraction channels are scaled by the population
fn counts(chart: &Chart, name: &str, population: &[f64]) -> Result<Vec<f64>> {
    let data = chart.channel(name)?;
    if data.len() != population.len() {
        bail!(
            "Channel \"{}\" has {} entries, \"{}\" has {}",
            name,
            data.len(),
            POPULATION,
            population.len()
        );
    }
    let is_fraction = chart.units(name)?.to_lowercase().contains("fraction");
    Ok(if is_fraction {
        data.iter().zip(population).map(|(f, n)| f * n).collect()
    } else {
        data.to_vec()
    })
}

/// Per-step infection probability for one susceptible individual
pub fn infection_probability(beta: f64, infected: f64, population: f64, dt: f64) -> f64 {
    if population <= 0.0 || infected <= 0.0 {
        return 0.0;
    }
    1.0 - (-beta * dt * infected / population).exp()
}

impl FeatureTest for Transmission {
    fn name(&self) -> &'static str {
        "transmission"
    }

    fn run(&self, ctx: &RunContext, report: &mut Report) -> Result<()> {
        let (_, sim) = ctx.simulation_config()?;
        let beta = sim
            .base_infectivity
            .context("Config has no Base_Infectivity")?;
        let inset = ctx.inset_chart()?;
        let dt = inset.header.simulation_timestep;

        let population = inset.channel(POPULATION)?.to_vec();
        let infected = counts(&inset, INFECTED, &population)?;
        let susceptible = counts(&inset, SUSCEPTIBLE, &population)?;
        let new_infections = inset.channel(NEW_INFECTIONS)?;
        let steps = ctx.analysis_len(new_infections.len().min(population.len()));

        report.info(format!(
            "Base_Infectivity {} over {} timesteps of {} days",
            beta, steps, dt
        ));

        let mut dump = DebugDump::new(self.name());
        dump.insert("base_infectivity", &beta);

        let mut trials = RepeatedTrials::new("Per-step infections", ctx.settings.repeated_test_policy);
        let mut expected_series = vec![0.0; steps];
        let mut expected_total = 0.0;
        let mut variance_total = 0.0;
        let mut observed_total = 0.0;

        for step in 1..steps {
            let prev = step - 1;
            let s = susceptible[prev].round().max(0.0) as u64;
            let p = infection_probability(beta, infected[prev], population[prev], dt);
            let observed_raw = new_infections[step];
            if observed_raw < 0.0 || observed_raw.fract() != 0.0 {
                bail!("{} at step {} is not a count: {}", NEW_INFECTIONS, step, observed_raw);
            }
            let observed = observed_raw as u64;
            let expected = s as f64 * p;

            expected_series[step] = expected;
            expected_total += expected;
            variance_total += s as f64 * p * (1.0 - p);
            observed_total += observed_raw;
            dump.add_row(&StepRow {
                step,
                susceptible: s,
                infected: infected[prev],
                population: population[prev],
                probability: p,
                expected,
                observed,
            });

            // nothing to test without susceptibles or infectious pressure
            if s == 0 || p == 0.0 {
                if observed > 0 {
                    let cmp = Comparison::bad(format!(
                        "{} new infections with S={} and p={}",
                        observed, s, p
                    ));
                    let applied = trials.observe(&format!("step {}", step), cmp);
                    report.record(&applied);
                }
                continue;
            }

            let raw = if observed > s {
                Comparison::bad(format!("{} new infections exceed {} susceptibles", observed, s))
            } else {
                binomial_ci_compare(observed, s, p, ctx.settings.confidence)?
            };
            let applied = trials.observe(&format!("step {}", step), raw);
            if !applied.passed {
                report.record(&applied);
            }
        }

        report.record(&trials.verdict());

        let allowed =
            count_total_tolerance(expected_total, variance_total, ctx.settings.tolerance_fraction);
        let total = tolerance_compare(
            observed_total,
            expected_total,
            Tolerance::Absolute(allowed),
            ZeroExpected::ExactMatch,
        )?;
        report.record(&total.labeled("Total new infections"));

        dump.insert("expected_total", &expected_total);
        dump.insert("observed_total", &observed_total);
        ctx.write_debug(&dump)?;

        ctx.plot(self.name(), |path| {
            crate::plot::series_comparison(
                path,
                "New infections per timestep",
                &new_infections[..steps],
                &expected_series,
                NEW_INFECTIONS,
            )
        });
        Ok(())
    }
}
