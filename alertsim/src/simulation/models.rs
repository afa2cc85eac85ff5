// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use smallvec::SmallVec;

/// Index of a monitored unit, dense in `[0, agents)`.
pub type UnitId = usize;

/// Index of a responder, dense in `[0, responders)`.
pub type ResponderId = usize;

/// A single fault signal raised by a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    pub unit: UnitId,
    pub raised_at_tick: u64,
}

/// Alerts of one unit, in arrival order.
pub type AlertBatch = SmallVec<[Alert; 4]>;

/// A unit together with the alerts buffered for it at claim time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: UnitId,
    pub alerts: AlertBatch,
}

impl Job {
    pub fn new(id: UnitId, alerts: AlertBatch) -> Self {
        Self { id, alerts }
    }
}

pub fn job_ids(jobs: &[Job]) -> Vec<UnitId> {
    jobs.iter().map(|job| job.id).collect()
}
