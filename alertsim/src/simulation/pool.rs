// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info};
use sparse_collections::{DenseSet, IndexedMap, NodeIndex, NodeList};

use crate::error::{ensure_all, Ids, Result, SimError};
use crate::simulation::metrics::{MetricKind, Metrics};
use crate::simulation::models::UnitId;

/// Accumulated latencies of the pool, indexed by unit id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolTimings {
    /// Time between admission and claim.
    pub time_in_pool: Vec<Duration>,
    /// Time between claim and release.
    pub time_handling: Vec<Duration>,
    /// Time between admission and release, summed over all released jobs.
    pub time_in_system: Duration,
    pub released: u64,
}

#[derive(Debug)]
struct PoolState {
    queue: NodeList<UnitId>,
    present: IndexedMap<NodeIndex>,
    locked: DenseSet,
    admitted_at: Vec<Option<Instant>>,
    claimed_at: Vec<Option<Instant>>,
    timings: PoolTimings,
}

/// Admissible jobs in admission order, plus the subset that responders hold.
///
/// A unit is present from its admission until its release and locked while a
/// responder works on it. Claims walk the queue from the head, so the earliest
/// admitted unit is always served first.
#[derive(Debug)]
pub struct JobPool {
    state: Mutex<PoolState>,
    units: usize,
    metrics: Arc<Metrics>,
}

impl JobPool {
    pub fn new(units: usize, metrics: Arc<Metrics>) -> Self {
        Self {
            state: Mutex::new(PoolState {
                queue: NodeList::with_capacity(units),
                present: IndexedMap::with_capacity(units),
                locked: DenseSet::with_capacity(units),
                admitted_at: vec![None; units],
                claimed_at: vec![None; units],
                timings: PoolTimings {
                    time_in_pool: vec![Duration::ZERO; units],
                    time_handling: vec![Duration::ZERO; units],
                    ..PoolTimings::default()
                },
            }),
            units,
            metrics,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, PoolState>> {
        self.state
            .lock()
            .map_err(|_| SimError::LockPoisoned("job pool"))
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

    /// Appends every id that is not present yet to the tail of the queue.
    ///
    /// Ids that are already present are skipped; their alerts keep piling up in
    /// the buffer instead. Returns the ids that were newly admitted.
    pub fn admit_if_new(&self, ids: &[UnitId]) -> Result<Vec<UnitId>> {
        self.check_ids(ids)?;
        let now = Instant::now();

        let mut state = self.lock()?;
        let mut admitted = Vec::with_capacity(ids.len());
        for id in ids {
            if state.present.contains_key(*id) {
                continue;
            }
            let node = state.queue.push_back(*id);
            if !state.present.insert(*id, node) {
                return Err(SimError::violated("add into pool", &[*id], &[false]));
            }
            state.admitted_at[*id] = Some(now);
            admitted.push(*id);
        }
        drop(state);

        let skipped = (ids.len() - admitted.len()) as u64;
        self.metrics.add(MetricKind::JobsPending, admitted.len() as u64);
        self.metrics.add(MetricKind::JobsSkipped, skipped);

        info!(
            "added new jobs into pool jobs.ids={} jobs.skipped_amount={}",
            Ids(&admitted),
            skipped
        );
        Ok(admitted)
    }

    /// Locks up to `max_count` present but unlocked ids, oldest first.
    pub fn claim(&self, max_count: usize) -> Result<Vec<UnitId>> {
        let now = Instant::now();
        let mut state = self.lock()?;

        debug!(
            "going to get pending jobs from pool jobs.queued_amount={} jobs.locked_amount={} jobs.requested_amount={}",
            state.queue.len(),
            state.locked.len(),
            max_count
        );

        let claimed: Vec<UnitId> = state
            .queue
            .iter()
            .copied()
            .filter(|id| !state.locked.contains(*id))
            .take(max_count)
            .collect();

        let locked: Vec<bool> = claimed.iter().map(|id| state.locked.insert(*id)).collect();
        ensure_all("lock pool jobs", &claimed, &locked)?;

        for id in &claimed {
            if let Some(admitted_at) = state.admitted_at[*id] {
                state.timings.time_in_pool[*id] += now.saturating_duration_since(admitted_at);
            }
            state.claimed_at[*id] = Some(now);
        }
        drop(state);

        self.metrics.add(MetricKind::JobsLocked, claimed.len() as u64);

        info!("got pending jobs from pool jobs.ids={}", Ids(&claimed));
        Ok(claimed)
    }

    /// Unlocks the given ids and drops them from the pool entirely.
    ///
    /// Every id must be locked. If one is not, nothing is released.
    pub fn release(&self, ids: &[UnitId]) -> Result<()> {
        self.check_ids(ids)?;
        let now = Instant::now();
        let mut state = self.lock()?;

        // a duplicate in `ids` would unlock the same job twice
        let mut seen = DenseSet::with_capacity(self.units);
        let releasable: Vec<bool> = ids
            .iter()
            .map(|id| state.locked.contains(*id) && seen.insert(*id))
            .collect();
        ensure_all("unlock pool jobs", ids, &releasable)?;

        for id in ids {
            state.locked.remove(*id);
            let detached = state
                .present
                .remove(*id)
                .and_then(|node| state.queue.remove(node));
            if detached != Some(*id) {
                return Err(SimError::violated("remove from pool", &[*id], &[false]));
            }

            let admitted_at = state.admitted_at[*id].take();
            let claimed_at = state.claimed_at[*id].take();
            if let Some(claimed_at) = claimed_at {
                state.timings.time_handling[*id] += now.saturating_duration_since(claimed_at);
            }
            if let Some(admitted_at) = admitted_at {
                state.timings.time_in_system += now.saturating_duration_since(admitted_at);
            }
            state.timings.released += 1;
        }
        drop(state);

        self.metrics.add(MetricKind::JobsUnlocked, ids.len() as u64);

        info!("removed finished jobs from pool jobs.ids={}", Ids(ids));
        Ok(())
    }

    pub fn is_present(&self, id: UnitId) -> Result<bool> {
        Ok(self.lock()?.present.contains_key(id))
    }

    pub fn is_locked(&self, id: UnitId) -> Result<bool> {
        Ok(self.lock()?.locked.contains(id))
    }

    /// Present ids in admission order.
    pub fn pending(&self) -> Result<Vec<UnitId>> {
        Ok(self.lock()?.queue.iter().copied().collect())
    }

    pub fn locked(&self) -> Result<Vec<UnitId>> {
        let mut locked: Vec<UnitId> = self.lock()?.locked.iter().collect();
        locked.sort_unstable();
        Ok(locked)
    }

    pub fn timings(&self) -> Result<PoolTimings> {
        Ok(self.lock()?.timings.clone())
    }
}
