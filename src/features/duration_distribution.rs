// Incubation and infectious period distributions
//
// The simulator logs every per-individual timer it draws. The drawn values
// must follow the distribution configured under <Prefix>_Distribution: a KS
// test for random distributions, an exact tolerance check for constants.

use super::FeatureTest;
use crate::context::RunContext;
use crate::debug_dump::DebugDump;
use crate::plot;
use crate::report::Report;
use crate::sft::{
    describe, ks_test_raw, series_tolerance_compare, Comparison, Tolerance, ZeroExpected,
};
use crate::sim_config::DurationDistribution;
use anyhow::{Context, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationKind {
    Incubation,
    Infectious,
}

impl DurationKind {
    fn config_prefix(self) -> &'static str {
        match self {
            DurationKind::Incubation => "Incubation_Period",
            DurationKind::Infectious => "Infectious_Period",
        }
    }

    /// Log text preceding each drawn timer value
    pub fn log_key(self) -> &'static str {
        match self {
            DurationKind::Incubation => "Incubation_timer calculated as",
            DurationKind::Infectious => "Infectious_timer calculated as",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DurationDistributionTest {
    kind: DurationKind,
}

impl DurationDistributionTest {
    pub fn new(kind: DurationKind) -> Self {
        Self { kind }
    }
}

impl FeatureTest for DurationDistributionTest {
    fn name(&self) -> &'static str {
        match self.kind {
            DurationKind::Incubation => "incubation-period",
            DurationKind::Infectious => "infectious-period",
        }
    }

    fn run(&self, ctx: &RunContext, report: &mut Report) -> Result<()> {
        let prefix = self.kind.config_prefix();
        let (_, sim) = ctx.simulation_config()?;
        let distribution = match self.kind {
            DurationKind::Incubation => sim.incubation,
            DurationKind::Infectious => sim.infectious,
        }
        .with_context(|| format!("Config has no {}_Distribution", prefix))?;

        let log = ctx.stdout_log()?;
        let key = self.kind.log_key();
        let values: Vec<f64> = log
            .filter(key)
            .filter(|line| line.time.map_or(true, |t| ctx.in_analysis_window(t)))
            .filter_map(|line| crate::output::StdoutLog::value_of(&line.text, key))
            .collect();

        let mut dump = DebugDump::new(self.name());
        dump.insert("distribution", &distribution);
        dump.insert("values", &values);

        if values.is_empty() {
            report.bad(format!("No \"{}\" lines found in {}", key, ctx.inputs.stdout.display()));
            ctx.write_debug(&dump)?;
            return Ok(());
        }

        let summary = describe(&values)?;
        report.info(format!("{} {} values: {}", values.len(), prefix, summary));
        dump.insert("summary", &summary);

        match distribution {
            DurationDistribution::Constant(value) => {
                let expected = vec![value; values.len()];
                let cmp = series_tolerance_compare(
                    &values,
                    &expected,
                    Tolerance::Relative(ctx.settings.tolerance_fraction),
                    ZeroExpected::ExactMatch,
                )?;
                report.record(&cmp.labeled(&format!("{} constant {}", prefix, value)));
            }
            DurationDistribution::Random(reference) => {
                let mean_note = format!(
                    "{}: expected mean {:.4}, observed mean {:.4}",
                    prefix,
                    reference.mean(),
                    summary.mean
                );
                report.info(mean_note);

                let ks = ks_test_raw(&values, &reference, ctx.settings.significance_level)?;
                let passed = ks.pvalue > ctx.settings.significance_level;
                let raw = Comparison::from_decision(
                    passed,
                    format!(
                        "{} follows {}: KS D={:.5} (critical {:.5}), p-value={:.5}, n={}",
                        prefix, reference, ks.statistic, ks.critical_value, ks.pvalue, ks.n
                    ),
                )
                .with_statistic(ks.statistic)
                .with_p_value(ks.pvalue);
                let applied = ctx.settings.single_test_policy.apply(raw);
                if !passed && !applied.is_failure() {
                    tracing::warn!("{} KS rejection downgraded by noise policy", prefix);
                }
                report.record(&applied);
                dump.insert("ks", &applied);

                let continuous = reference.continuous()?;
                let title = format!("{} vs {}", prefix, reference);
                ctx.plot(&format!("{}_cdf", self.name()), |path| {
                    plot::cdf_overlay(path, &title, &values, |x| continuous.cdf(x))
                });
                ctx.plot(&format!("{}_histogram", self.name()), |path| {
                    plot::histogram_with_pdf(path, &title, &values, |x| continuous.pdf(x), 30)
                });
            }
        }

        ctx.write_debug(&dump)?;
        Ok(())
    }
}
