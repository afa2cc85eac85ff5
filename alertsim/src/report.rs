// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::io::{self, Write};

use serde::Serialize;

use crate::error::Result;
use crate::simulation::context::SimulationContext;
use crate::simulation::metrics::MetricKind;
use crate::simulation::models::{ResponderId, UnitId};

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub ticks: u64,
    pub alerts_saved: u64,
    pub alerts_rewritten: u64,
    pub rewrite_ratio: f64,
    /// Admissions plus skipped duplicates.
    pub jobs_created: u64,
    pub jobs_duplicate: u64,
    pub duplicate_ratio: f64,
    pub jobs_finished: u64,
    /// Busy responder-ticks over all responder-ticks.
    pub responder_load: f64,
    pub mean_time_in_system_secs: f64,
    pub units: Vec<UnitRow>,
    pub responders: Vec<ResponderRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitRow {
    pub id: UnitId,
    pub alerts_created: u64,
    pub alerts_rewritten: u64,
    pub time_in_pool_secs: f64,
    pub time_handling_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponderRow {
    pub id: ResponderId,
    pub jobs_handled: u64,
    /// Share of all finished jobs this responder handled.
    pub share_of_finished: f64,
    pub handling_secs: f64,
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

impl Report {
    pub fn from_context(ctx: &SimulationContext) -> Result<Self> {
        let metrics = ctx.metrics();
        let alerts_saved = metrics.get(MetricKind::AlertsBuffered);
        let alerts_rewritten = metrics.get(MetricKind::AlertsRewritten);
        let jobs_duplicate = metrics.get(MetricKind::JobsSkipped);
        let jobs_created = metrics.get(MetricKind::JobsPending) + jobs_duplicate;
        let jobs_finished = metrics.get(MetricKind::JobsUnlocked);
        let busy = metrics.get(MetricKind::RespondersBusy);
        let free = metrics.get(MetricKind::RespondersFree);

        let timings = ctx.dispatcher().pool().timings()?;
        let mean_time_in_system_secs = if timings.released == 0 {
            0.0
        } else {
            timings.time_in_system.as_secs_f64() / timings.released as f64
        };

        let rewritten = ctx.dispatcher().buffer().rewritten_per_unit()?;
        let created = ctx.agents().created();
        let units = (0..ctx.agents().count())
            .map(|id| UnitRow {
                id,
                alerts_created: created[id],
                alerts_rewritten: rewritten[id],
                time_in_pool_secs: timings.time_in_pool[id].as_secs_f64(),
                time_handling_secs: timings.time_handling[id].as_secs_f64(),
            })
            .collect();

        let handled = ctx.responders().handled();
        let handling_time = ctx.responders().handling_time();
        let responders = (0..ctx.responders().count())
            .map(|id| ResponderRow {
                id,
                jobs_handled: handled[id],
                share_of_finished: ratio(handled[id], jobs_finished),
                handling_secs: handling_time[id].as_secs_f64(),
            })
            .collect();

        Ok(Self {
            ticks: ctx.ticks(),
            alerts_saved,
            alerts_rewritten,
            rewrite_ratio: ratio(alerts_rewritten, alerts_saved),
            jobs_created,
            jobs_duplicate,
            duplicate_ratio: ratio(jobs_duplicate, jobs_created),
            jobs_finished,
            responder_load: ratio(busy, busy + free),
            mean_time_in_system_secs,
            units,
            responders,
        })
    }
}

fn write_value(w: &mut impl Write, key: &str, value: impl std::fmt::Display) -> io::Result<()> {
    writeln!(w, "  {:<40}{}", format!("{}:", key), value)
}

/// Renders the report as aligned text tables.
pub fn write_table(report: &Report, w: &mut impl Write) -> io::Result<()> {
    writeln!(w, "Overall:")?;
    write_value(w, "ticks", report.ticks)?;

    writeln!(w, "Alerts:")?;
    write_value(w, "saved", report.alerts_saved)?;
    write_value(w, "rewritten", report.alerts_rewritten)?;
    write_value(w, "rewrite ratio", format!("{:.2}", report.rewrite_ratio))?;

    writeln!(w, "Jobs:")?;
    write_value(w, "created", report.jobs_created)?;
    write_value(w, "duplicates", report.jobs_duplicate)?;
    write_value(w, "duplicate ratio", format!("{:.2}", report.duplicate_ratio))?;

    writeln!(w, "Handling:")?;
    write_value(w, "finished", report.jobs_finished)?;
    write_value(w, "responder load", format!("{:.2}", report.responder_load))?;
    write_value(
        w,
        "mean time in system",
        format!("{:.2} s", report.mean_time_in_system_secs),
    )?;
    writeln!(w)?;

    writeln!(w, "Units:")?;
    writeln!(
        w,
        "{:<8}{:>12}{:>12}{:>12}{:>12}",
        "ID", "created", "rewritten", "T pool", "T handling"
    )?;
    for row in &report.units {
        writeln!(
            w,
            "{:<8}{:>12}{:>12}{:>12.2}{:>12.2}",
            row.id,
            row.alerts_created,
            row.alerts_rewritten,
            row.time_in_pool_secs,
            row.time_handling_secs
        )?;
    }
    writeln!(w)?;

    writeln!(w, "Responders:")?;
    writeln!(
        w,
        "{:<8}{:>12}{:>12}{:>12}",
        "ID", "handled", "share", "T handling"
    )?;
    for row in &report.responders {
        writeln!(
            w,
            "{:<8}{:>12}{:>12.2}{:>12.2}",
            row.id, row.jobs_handled, row.share_of_finished, row.handling_secs
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    fn run(crash: f32, handle: f32, ticks: u64) -> SimulationContext {
        let mut ctx = SimulationContext::new(SimConfig {
            agents: 4,
            responders: 2,
            chance_to_crash: crash,
            chance_to_handle: handle,
            alerts_capacity: 2,
            seed: Some(5),
            ..SimConfig::default()
        })
        .unwrap();
        for _ in 0..ticks {
            ctx.tick().unwrap();
        }
        ctx
    }

    #[test]
    fn test_empty_run_has_zero_ratios() {
        let report = Report::from_context(&run(0.0, 1.0, 3)).unwrap();
        assert_eq!(report.ticks, 3);
        assert_eq!(report.alerts_saved, 0);
        assert_eq!(report.rewrite_ratio, 0.0);
        assert_eq!(report.duplicate_ratio, 0.0);
        assert_eq!(report.responder_load, 0.0);
        assert_eq!(report.mean_time_in_system_secs, 0.0);
        assert!(report.responders.iter().all(|r| r.share_of_finished == 0.0));
    }

    #[test]
    fn test_stuck_run_counts_duplicates_and_rewrites() {
        let report = Report::from_context(&run(1.0, 0.0, 3)).unwrap();
        assert_eq!(report.alerts_saved, 12);
        // capacity 2: the third alert of every unit is rewritten
        assert_eq!(report.alerts_rewritten, 4);
        assert_eq!(report.jobs_created, 12);
        assert_eq!(report.jobs_duplicate, 8);
        assert_eq!(report.jobs_finished, 0);
        assert_eq!(report.responder_load, 1.0);
        assert!(report.units.iter().all(|u| u.alerts_created == 3));
    }

    #[test]
    fn test_shares_add_up() {
        let report = Report::from_context(&run(1.0, 1.0, 4)).unwrap();
        assert_eq!(report.jobs_finished, 8);
        let handled: u64 = report.responders.iter().map(|r| r.jobs_handled).sum();
        assert_eq!(handled, 8);
        let share: f64 = report.responders.iter().map(|r| r.share_of_finished).sum();
        assert!((share - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_table_and_json_output() {
        let report = Report::from_context(&run(1.0, 1.0, 2)).unwrap();
        let mut out = Vec::new();
        write_table(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Responders:"));
        assert!(text.contains("finished:"));
        assert_eq!(text.lines().filter(|l| l.starts_with("3 ")).count(), 1);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["jobs_finished"], 4);
        assert_eq!(json["units"].as_array().unwrap().len(), 4);
    }
}
