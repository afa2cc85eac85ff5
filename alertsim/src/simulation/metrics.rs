// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters the core publishes. All of them only ever grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    AgentsSilent,
    AgentsAlarming,
    JobsBuffered,
    JobsPending,
    JobsSkipped,
    JobsLocked,
    JobsUnlocked,
    AlertsBuffered,
    AlertsRewritten,
    RespondersFree,
    RespondersBusy,
}

impl MetricKind {
    pub const ALL: [MetricKind; 11] = [
        MetricKind::AgentsSilent,
        MetricKind::AgentsAlarming,
        MetricKind::JobsBuffered,
        MetricKind::JobsPending,
        MetricKind::JobsSkipped,
        MetricKind::JobsLocked,
        MetricKind::JobsUnlocked,
        MetricKind::AlertsBuffered,
        MetricKind::AlertsRewritten,
        MetricKind::RespondersFree,
        MetricKind::RespondersBusy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricKind::AgentsSilent => "agents_silent_total",
            MetricKind::AgentsAlarming => "agents_alarming_total",
            MetricKind::JobsBuffered => "jobs_added_to_buffer_total",
            MetricKind::JobsPending => "jobs_added_to_pool_total",
            MetricKind::JobsSkipped => "jobs_skipped_pool_total",
            MetricKind::JobsLocked => "jobs_locked_total",
            MetricKind::JobsUnlocked => "jobs_unlocked_total",
            MetricKind::AlertsBuffered => "alerts_added_to_buffer_total",
            MetricKind::AlertsRewritten => "alerts_rewritten_total",
            MetricKind::RespondersFree => "responders_free_total",
            MetricKind::RespondersBusy => "responders_busy_total",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub name: &'static str,
    pub value: u64,
}

/// Lock-free counter store, shared between the tick thread, the alert
/// producers and whoever reads the numbers.
#[derive(Debug, Default)]
pub struct Metrics {
    counters: [AtomicU64; MetricKind::ALL.len()],
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, kind: MetricKind, delta: u64) {
        if delta != 0 {
            self.counters[kind.slot()].fetch_add(delta, Ordering::Relaxed);
        }
    }

    pub fn get(&self, kind: MetricKind) -> u64 {
        self.counters[kind.slot()].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> Vec<Metric> {
        MetricKind::ALL
            .iter()
            .map(|kind| Metric {
                name: kind.name(),
                value: self.get(*kind),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_add_from_many_threads() {
        let metrics = Arc::new(Metrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = metrics.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.add(MetricKind::AlertsBuffered, 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.get(MetricKind::AlertsBuffered), 8000);
        assert_eq!(metrics.get(MetricKind::AlertsRewritten), 0);
    }

    #[test]
    fn test_snapshot_lists_every_counter_once() {
        let metrics = Metrics::new();
        metrics.add(MetricKind::JobsSkipped, 3);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.len(), MetricKind::ALL.len());
        let skipped = snapshot
            .iter()
            .find(|m| m.name == "jobs_skipped_pool_total")
            .unwrap();
        assert_eq!(skipped.value, 3);
    }
}
