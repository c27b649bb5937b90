// Consistency between the event database and the aggregate reports
//
// Every NewInfection row in SIM_EVENTS is one new infection in the inset
// chart at the same timestep, and the property report splits the same
// counts across property groups. These are bookkeeping identities, so they
// are checked exactly.

use super::FeatureTest;
use crate::context::RunContext;
use crate::debug_dump::DebugDump;
use crate::report::Report;
use crate::sft::{series_tolerance_compare, Tolerance, ZeroExpected};
use anyhow::Result;

const NEW_INFECTION_LABEL: &str = "NewInfection";
const NEW_INFECTIONS: &str = "New Infections";

#[derive(Debug, Clone, Copy, Default)]
pub struct EventConsistency;

impl FeatureTest for EventConsistency {
    fn name(&self) -> &'static str {
        "event-consistency"
    }

    fn run(&self, ctx: &RunContext, report: &mut Report) -> Result<()> {
        let inset = ctx.inset_chart()?;
        let db = ctx.events_db()?;

        let inset_series = inset.channel(NEW_INFECTIONS)?;
        let steps = ctx.analysis_len(inset_series.len());
        let inset_series = &inset_series[..steps];

        let mut db_series = vec![0.0; steps];
        let mut outside = 0usize;
        for event in db.events_labeled(NEW_INFECTION_LABEL) {
            if !ctx.in_analysis_window(event.sim_time) {
                continue;
            }
            match db_series.get_mut(inset.index_of_day(event.sim_time)) {
                Some(slot) => *slot += 1.0,
                None => outside += 1,
            }
        }

        report.info(format!(
            "{} {} events in {}, {} {} in the inset chart",
            db.count_by_label(NEW_INFECTION_LABEL),
            NEW_INFECTION_LABEL,
            ctx.inputs.events_db.display(),
            inset_series.iter().sum::<f64>(),
            NEW_INFECTIONS
        ));
        if outside > 0 {
            report.bad(format!(
                "{} {} events fall after the last inset chart timestep",
                outside, NEW_INFECTION_LABEL
            ));
        }

        let mut dump = DebugDump::new(self.name());
        dump.insert("db_new_infections", &db_series);
        dump.insert("inset_new_infections", &inset_series);

        if steps == 0 {
            report.bad(format!("Inset chart has no {} data", NEW_INFECTIONS));
        } else {
            let cmp = series_tolerance_compare(
                &db_series,
                inset_series,
                Tolerance::Absolute(0.0),
                ZeroExpected::ExactMatch,
            )?;
            report.record(&cmp.labeled("Event database vs inset chart New Infections"));
        }

        if ctx.inputs.property_report.exists() {
            let property = ctx.property_report()?;
            let groups = property.property_groups(NEW_INFECTIONS);
            report.info(format!(
                "Property report splits {} into {} groups",
                NEW_INFECTIONS,
                groups.len()
            ));
            let summed = property.sum_over_groups(NEW_INFECTIONS)?;
            let n = steps.min(summed.len());
            if n == 0 {
                report.bad("Property report has no New Infections data");
            } else {
                // reports are written as floats
                let cmp = series_tolerance_compare(
                    &summed[..n],
                    &inset_series[..n],
                    Tolerance::Absolute(1e-6),
                    ZeroExpected::ExactMatch,
                )?;
                report.record(&cmp.labeled("Property groups vs inset chart New Infections"));
            }
            dump.insert("property_new_infections", &summed);
        } else {
            report.warning(format!(
                "{} not found, property group check skipped",
                ctx.inputs.property_report.display()
            ));
        }

        ctx.write_debug(&dump)?;
        Ok(())
    }
}
