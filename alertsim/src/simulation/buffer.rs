// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info};
use sparse_collections::IndexedMap;

use crate::error::{Ids, Result, SimError};
use crate::simulation::metrics::{MetricKind, Metrics};
use crate::simulation::models::{Alert, AlertBatch, UnitId};

/// Alerts of one unit until its job is finished.
#[derive(Debug, Clone, Default)]
pub struct BufferEntry {
    pub alerts: AlertBatch,
    /// Alerts dropped because the entry was full. Survives resets.
    pub rewritten: u64,
}

#[derive(Debug)]
struct BufferState {
    entries: IndexedMap<BufferEntry>,
}

/// Per-unit alert aggregation store.
///
/// Alerts for a unit coalesce into one entry until the entry is reset, which
/// is what turns a unit that crashes on five ticks in a row into one job.
#[derive(Debug)]
pub struct AlertBuffer {
    state: Mutex<BufferState>,
    units: usize,
    alerts_capacity: usize,
    metrics: Arc<Metrics>,
}

impl AlertBuffer {
    pub fn new(units: usize, alerts_capacity: usize, metrics: Arc<Metrics>) -> Self {
        Self {
            state: Mutex::new(BufferState {
                entries: IndexedMap::with_capacity(units),
            }),
            units,
            alerts_capacity,
            metrics,
        }
    }

    pub fn alerts_capacity(&self) -> usize {
        self.alerts_capacity
    }

    fn lock(&self) -> Result<MutexGuard<'_, BufferState>> {
        self.state
            .lock()
            .map_err(|_| SimError::LockPoisoned("alert buffer"))
    }

    fn check_ids(&self, ids: &[UnitId]) -> Result<()> {
        match ids.iter().find(|id| **id >= self.units) {
            Some(id) => Err(SimError::UnknownUnit {
                id: *id,
                capacity: self.units,
            }),
            None => Ok(()),
        }
    }

    /// Appends every batch to the entry of the id at the same position.
    ///
    /// The whole call is one critical section, so concurrent producers never
    /// interleave inside a unit. Alerts beyond the capacity are counted as
    /// rewritten and dropped.
    pub fn add(&self, ids: &[UnitId], batches: &[AlertBatch]) -> Result<()> {
        if ids.len() != batches.len() {
            return Err(SimError::violated(
                "add into buffer (ids and batches differ in length)",
                ids,
                &[],
            ));
        }
        self.check_ids(ids)?;

        let mut state = self.lock()?;
        let mut units_added = 0u64;
        let mut alerts_added = 0u64;
        let mut alerts_rewritten = 0u64;
        for (id, batch) in ids.iter().zip(batches) {
            if !state.entries.contains_key(*id) {
                units_added += 1;
            }
            let entry = state.entries.get_or_insert_with(*id, BufferEntry::default);
            for alert in batch {
                if entry.alerts.len() < self.alerts_capacity {
                    entry.alerts.push(*alert);
                } else {
                    entry.rewritten += 1;
                    alerts_rewritten += 1;
                }
            }
            alerts_added += batch.len() as u64;
        }
        drop(state);

        self.metrics.add(MetricKind::JobsBuffered, units_added);
        self.metrics.add(MetricKind::AlertsBuffered, alerts_added);
        self.metrics.add(MetricKind::AlertsRewritten, alerts_rewritten);

        let amounts: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        info!(
            "added new alerts into buffer jobs.ids={} jobs.alerts.amounts={:?} alerts.rewritten={}",
            Ids(ids),
            amounts,
            alerts_rewritten
        );
        Ok(())
    }

    /// Copies the current batches of the given ids without touching them.
    ///
    /// Every id must have an entry; the dispatcher only reads units it has
    /// buffered alerts for.
    pub fn read(&self, ids: &[UnitId]) -> Result<Vec<AlertBatch>> {
        self.check_ids(ids)?;
        let state = self.lock()?;

        let present: Vec<bool> = ids.iter().map(|id| state.entries.contains_key(*id)).collect();
        if present.iter().any(|ok| !ok) {
            return Err(SimError::violated("read from buffer", ids, &present));
        }

        let batches: Vec<AlertBatch> = ids
            .iter()
            .filter_map(|id| state.entries.get(*id))
            .map(|entry| entry.alerts.clone())
            .collect();
        drop(state);

        let amounts: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        info!(
            "got alerts from buffer jobs.ids={} jobs.alerts.amounts={:?}",
            Ids(ids),
            amounts
        );
        Ok(batches)
    }

    /// Clears the alerts of the given ids and keeps their entries for reuse.
    pub fn reset(&self, ids: &[UnitId]) -> Result<()> {
        self.check_ids(ids)?;
        let mut state = self.lock()?;

        let present: Vec<bool> = ids.iter().map(|id| state.entries.contains_key(*id)).collect();
        if present.iter().any(|ok| !ok) {
            return Err(SimError::violated("reset alerts in buffer", ids, &present));
        }

        for id in ids {
            if let Some(entry) = state.entries.get_mut(*id) {
                entry.alerts.clear();
            }
        }
        drop(state);

        debug!("reset alerts in buffer jobs.ids={}", Ids(ids));
        Ok(())
    }

    /// Number of alerts stored for `id`, zero if it has no entry yet.
    pub fn stored(&self, id: UnitId) -> Result<usize> {
        let state = self.lock()?;
        Ok(state.entries.get(id).map_or(0, |entry| entry.alerts.len()))
    }

    /// Rewritten count per unit, indexed by unit id.
    pub fn rewritten_per_unit(&self) -> Result<Vec<u64>> {
        let state = self.lock()?;
        let mut rewritten = vec![0; self.units];
        for (id, entry) in state.entries.iter() {
            rewritten[id] = entry.rewritten;
        }
        Ok(rewritten)
    }

    /// `(unit, stored alerts)` for every unit that has an entry.
    pub fn entries(&self) -> Result<Vec<(UnitId, usize)>> {
        let state = self.lock()?;
        let mut entries: Vec<(UnitId, usize)> = state
            .entries
            .iter()
            .map(|(id, entry)| (id, entry.alerts.len()))
            .collect();
        entries.sort_unstable();
        Ok(entries)
    }
}

pub fn single_alert(unit: UnitId, tick: u64) -> AlertBatch {
    let mut batch = AlertBatch::new();
    batch.push(Alert {
        unit,
        raised_at_tick: tick,
    });
    batch
}
