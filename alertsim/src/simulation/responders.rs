// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;
use sparse_collections::{DenseSet, IndexedMap};

use crate::error::{ensure_all, Ids, Result, SimError};
use crate::simulation::chance::ChanceSource;
use crate::simulation::dispatcher::Dispatcher;
use crate::simulation::metrics::{MetricKind, Metrics};
use crate::simulation::models::{Job, ResponderId, UnitId};

/// The job a busy responder holds.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub job: Job,
    pub claimed_at: Instant,
}

/// What happened to the responders during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponderTick {
    /// `(responder, unit)` pairs handed out this tick.
    pub assigned: Vec<(ResponderId, UnitId)>,
    pub freed: Vec<ResponderId>,
    pub still_busy: Vec<ResponderId>,
}

/// Fixed pool of workers, each either free or busy with exactly one job.
///
/// Only the tick thread touches this, so it carries no lock.
pub struct Responders {
    count: usize,
    min_chance_to_handle: f32,
    free: DenseSet,
    busy: IndexedMap<Assignment>,
    handled: Vec<u64>,
    handling_time: Vec<Duration>,
    dispatcher: Dispatcher,
    chance: Box<dyn ChanceSource>,
    metrics: Arc<Metrics>,
}

impl Responders {
    pub fn new(
        count: usize,
        min_chance_to_handle: f32,
        dispatcher: Dispatcher,
        chance: Box<dyn ChanceSource>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let mut free = DenseSet::with_capacity(count);
        for id in 0..count {
            free.insert(id);
        }
        Self {
            count,
            min_chance_to_handle,
            free,
            busy: IndexedMap::with_capacity(count),
            handled: vec![0; count],
            handling_time: vec![Duration::ZERO; count],
            dispatcher,
            chance,
            metrics,
        }
    }

    /// Runs one tick: hand out jobs to free responders, then let every busy
    /// responder try to finish.
    pub fn process(&mut self) -> Result<ResponderTick> {
        let mut tick = ResponderTick::default();

        let free_now: Vec<ResponderId> = self.free.iter().collect();
        let jobs = self.dispatcher.get_free_jobs(free_now.len())?;
        self.assign(&free_now, jobs, &mut tick)?;

        let busy_now: Vec<ResponderId> = self.busy.keys().collect();
        for id in busy_now {
            if self.chance.draw() >= self.min_chance_to_handle {
                tick.freed.push(id);
            } else {
                tick.still_busy.push(id);
            }
        }
        let finished = self.complete(&tick.freed)?;
        self.dispatcher.put_busy_jobs(&finished)?;

        self.check_partition()?;

        self.metrics
            .add(MetricKind::RespondersFree, self.free.len() as u64);
        self.metrics
            .add(MetricKind::RespondersBusy, self.busy.len() as u64);

        info!(
            "polled responders for statuses responders.freed.ids={} responders.still_busy.ids={}",
            Ids(&tick.freed),
            Ids(&tick.still_busy)
        );
        Ok(tick)
    }

    /// Moves the first `jobs.len()` free responders to busy. Surplus free
    /// responders stay idle.
    fn assign(
        &mut self,
        free_now: &[ResponderId],
        jobs: Vec<Job>,
        tick: &mut ResponderTick,
    ) -> Result<()> {
        let receiving = &free_now[..jobs.len().min(free_now.len())];
        if jobs.len() > receiving.len() {
            let units: Vec<UnitId> = jobs.iter().map(|job| job.id).collect();
            return Err(SimError::violated("dispatch more jobs than requested", &units, &[]));
        }

        let removed: Vec<bool> = receiving.iter().map(|id| self.free.remove(*id)).collect();
        ensure_all("remove busy responders from free", receiving, &removed)?;

        let now = Instant::now();
        let mut added = Vec::with_capacity(receiving.len());
        for (id, job) in receiving.iter().zip(jobs) {
            tick.assigned.push((*id, job.id));
            added.push(self.busy.insert(
                *id,
                Assignment {
                    job,
                    claimed_at: now,
                },
            ));
        }
        ensure_all("add busy responders", receiving, &added)
    }

    /// Moves the given busy responders back to free and returns their jobs.
    fn complete(&mut self, ids: &[ResponderId]) -> Result<Vec<Job>> {
        let now = Instant::now();
        let mut finished = Vec::with_capacity(ids.len());
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            match self.busy.remove(*id) {
                Some(assignment) => {
                    self.handled[*id] += 1;
                    self.handling_time[*id] += now.saturating_duration_since(assignment.claimed_at);
                    finished.push(assignment.job);
                    removed.push(true);
                }
                None => removed.push(false),
            }
        }
        ensure_all("remove freed responders from busy", ids, &removed)?;

        let added: Vec<bool> = ids.iter().map(|id| self.free.insert(*id)).collect();
        ensure_all("add freed responders", ids, &added)?;
        Ok(finished)
    }

    /// Free and busy are disjoint and together cover every responder.
    pub fn check_partition(&self) -> Result<()> {
        let covered: Vec<bool> = (0..self.count)
            .map(|id| self.free.contains(id) != self.busy.contains_key(id))
            .collect();
        if self.free.len() + self.busy.len() != self.count {
            let ids: Vec<ResponderId> = (0..self.count).collect();
            return Err(SimError::violated("responder partition", &ids, &covered));
        }
        let ids: Vec<ResponderId> = (0..self.count).collect();
        ensure_all("responder partition", &ids, &covered)
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn free(&self) -> Vec<ResponderId> {
        let mut free: Vec<ResponderId> = self.free.iter().collect();
        free.sort_unstable();
        free
    }

    pub fn busy(&self) -> Vec<ResponderId> {
        let mut busy: Vec<ResponderId> = self.busy.keys().collect();
        busy.sort_unstable();
        busy
    }

    pub fn assignment(&self, id: ResponderId) -> Option<&Assignment> {
        self.busy.get(id)
    }

    pub fn handled(&self) -> &[u64] {
        &self.handled
    }

    pub fn handling_time(&self) -> &[Duration] {
        &self.handling_time
    }
}

impl std::fmt::Debug for Responders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responders")
            .field("count", &self.count)
            .field("free", &self.free())
            .field("busy", &self.busy())
            .field("min_chance_to_handle", &self.min_chance_to_handle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::buffer::{single_alert, AlertBuffer};
    use crate::simulation::chance::ScriptedChance;
    use crate::simulation::pool::JobPool;

    fn setup(units: usize, responders: usize, draws: Vec<f32>) -> (Responders, Dispatcher) {
        let metrics = Arc::new(Metrics::new());
        let dispatcher = Dispatcher::new(
            Arc::new(AlertBuffer::new(units, 4, metrics.clone())),
            Arc::new(JobPool::new(units, metrics.clone())),
        );
        let responders = Responders::new(
            responders,
            0.5,
            dispatcher.clone(),
            Box::new(ScriptedChance::new(draws)),
            metrics,
        );
        (responders, dispatcher)
    }

    fn save(dispatcher: &Dispatcher, ids: &[UnitId]) {
        let batches: Vec<_> = ids.iter().map(|id| single_alert(*id, 0)).collect();
        dispatcher.save_alerts(ids, &batches).unwrap();
    }

    #[test]
    fn test_idle_when_no_jobs() {
        let (mut responders, _) = setup(4, 3, vec![0.9]);
        let tick = responders.process().unwrap();
        assert!(tick.assigned.is_empty());
        assert_eq!(responders.free(), vec![0, 1, 2]);
        assert!(responders.busy().is_empty());
    }

    #[test]
    fn test_surplus_responders_stay_free() {
        // below the threshold: nobody finishes
        let (mut responders, dispatcher) = setup(4, 3, vec![0.1]);
        save(&dispatcher, &[2]);

        let tick = responders.process().unwrap();
        assert_eq!(tick.assigned.len(), 1);
        assert_eq!(tick.assigned[0].1, 2);
        assert_eq!(responders.busy().len(), 1);
        assert_eq!(responders.free().len(), 2);
        responders.check_partition().unwrap();
    }

    #[test]
    fn test_completion_returns_job_to_dispatcher() {
        let (mut responders, dispatcher) = setup(4, 1, vec![0.1, 0.7]);
        save(&dispatcher, &[0, 1]);

        // tick 1: responder 0 takes unit 0, draws 0.1 and stays busy
        let tick = responders.process().unwrap();
        assert_eq!(tick.assigned, vec![(0, 0)]);
        assert_eq!(tick.still_busy, vec![0]);
        assert!(dispatcher.pool().is_locked(0).unwrap());

        // tick 2: no free responder, draws 0.7 and finishes
        let tick = responders.process().unwrap();
        assert!(tick.assigned.is_empty());
        assert_eq!(tick.freed, vec![0]);
        assert!(!dispatcher.pool().is_present(0).unwrap());
        assert_eq!(dispatcher.buffer().stored(0).unwrap(), 0);
        assert_eq!(responders.handled(), &[1]);

        // tick 3: unit 1 is next in line
        let tick = responders.process().unwrap();
        assert_eq!(tick.assigned, vec![(0, 1)]);
    }

    #[test]
    fn test_partition_holds_over_many_ticks() {
        let (mut responders, dispatcher) = setup(8, 3, vec![0.2, 0.6, 0.9, 0.4, 0.55]);
        for round in 0..50 {
            save(&dispatcher, &[round % 8, (round * 3) % 8]);
            responders.process().unwrap();
            responders.check_partition().unwrap();
            for id in responders.busy() {
                let unit = responders.assignment(id).unwrap().job.id;
                assert!(dispatcher.pool().is_locked(unit).unwrap());
            }
        }
    }
}
