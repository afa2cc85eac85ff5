// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use alertsim::config::SimConfig;
use alertsim::report::Report;
use alertsim::SimError;
use alertsim_tests::pipeline::{alerts_for, pipeline, run_ticks, seeded_config};
use alertsim_tests::report_log::parse_report;

#[test]
fn test_all_alarming_stuck_responders() {
    let ctx = run_ticks(seeded_config(4, 2, 1.0, 0.0), 1);
    let snapshot = ctx.snapshot().unwrap();

    assert_eq!(snapshot.pending, vec![0, 1, 2, 3]);
    assert_eq!(snapshot.locked, vec![0, 1]);
    assert_eq!(snapshot.busy, vec![0, 1]);
    assert!(snapshot.free.is_empty());
}

#[test]
fn test_all_alarming_instant_handling() {
    let ctx = run_ticks(seeded_config(4, 2, 1.0, 1.0), 1);
    let snapshot = ctx.snapshot().unwrap();

    assert_eq!(snapshot.free, vec![0, 1]);
    assert!(snapshot.busy.is_empty());
    assert_eq!(snapshot.pending, vec![2, 3]);
    assert_eq!(snapshot.buffered, vec![(0, 0), (1, 0), (2, 1), (3, 1)]);
}

#[test]
fn test_seeded_runs_repeat() {
    let config = SimConfig {
        alerts_capacity: 2,
        ..seeded_config(12, 3, 0.4, 0.3)
    };
    let a = run_ticks(config.clone(), 100);
    let b = run_ticks(config, 100);

    let (sa, sb) = (a.snapshot().unwrap(), b.snapshot().unwrap());
    assert_eq!(sa.pending, sb.pending);
    assert_eq!(sa.locked, sb.locked);
    assert_eq!(sa.buffered, sb.buffered);
    assert_eq!(a.agents().created(), b.agents().created());
    assert_eq!(a.responders().handled(), b.responders().handled());
}

#[test]
fn test_report_json_lists_every_unit_and_responder() {
    let ctx = run_ticks(seeded_config(6, 2, 1.0, 1.0), 5);
    let report = Report::from_context(&ctx).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    let logged = parse_report(&json).unwrap();

    assert_eq!(logged.ticks, 5);
    assert_eq!(logged.units.len(), 6);
    assert_eq!(logged.responders.len(), 2);
    assert_eq!(logged.alerts_saved, 30);
    assert_eq!(logged.jobs_finished, 10);
    assert_eq!(logged.jobs_created, 30);
    assert!(logged.units.iter().all(|u| u.alerts_created == 5));
    let handled: u64 = logged.responders.iter().map(|r| r.jobs_handled).sum();
    assert_eq!(handled, logged.jobs_finished);
}

#[test]
fn test_corruption_is_reported_not_repaired() {
    let (dispatcher, _) = pipeline(4, 4);
    dispatcher.save_alerts(&[1], &alerts_for(&[1], 0)).unwrap();
    let jobs = dispatcher.get_free_jobs(1).unwrap();
    dispatcher.put_busy_jobs(&jobs).unwrap();

    // the same job handed back twice
    let err = dispatcher.put_busy_jobs(&jobs).unwrap_err();
    assert!(matches!(err, SimError::InvariantViolated { .. }));
    assert!(err.is_invariant_violation());
}
