// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::Arc;

use log::{debug, info};

use crate::error::{Ids, Result, SimError};
use crate::simulation::buffer::AlertBuffer;
use crate::simulation::models::{job_ids, AlertBatch, Job, UnitId};
use crate::simulation::pool::JobPool;

/// Sequences buffer and pool calls for producers and responders.
///
/// Never holds both component locks at once: each step takes and releases
/// one lock before the next step takes the other.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    buffer: Arc<AlertBuffer>,
    pool: Arc<JobPool>,
}

impl Dispatcher {
    pub fn new(buffer: Arc<AlertBuffer>, pool: Arc<JobPool>) -> Self {
        Self { buffer, pool }
    }

    pub fn buffer(&self) -> &AlertBuffer {
        &self.buffer
    }

    pub fn pool(&self) -> &JobPool {
        &self.pool
    }

    /// Buffers the alerts, then advertises the ids as admissible.
    ///
    /// The buffer is filled first so that a claim racing with this call never
    /// reads an empty batch. Safe to call from several producers at once.
    pub fn save_alerts(&self, ids: &[UnitId], batches: &[AlertBatch]) -> Result<()> {
        debug!("going to save jobs jobs.requested_amount={}", ids.len());

        self.buffer.add(ids, batches)?;
        self.pool.admit_if_new(ids)?;

        let amounts: Vec<usize> = batches.iter().map(|b| b.len()).collect();
        info!(
            "saved jobs jobs.ids={} jobs.alerts.amount={:?}",
            Ids(ids),
            amounts
        );
        Ok(())
    }

    /// Claims up to `max_count` jobs and pairs them with their buffered alerts.
    pub fn get_free_jobs(&self, max_count: usize) -> Result<Vec<Job>> {
        debug!("going to dispatch jobs jobs.requested_amount={}", max_count);
        if max_count == 0 {
            return Ok(Vec::new());
        }

        let ids = self.pool.claim(max_count)?;
        let batches = self.buffer.read(&ids)?;
        if batches.len() != ids.len() {
            return Err(SimError::violated("read claimed jobs", &ids, &[]));
        }

        let jobs: Vec<Job> = ids
            .iter()
            .zip(batches)
            .map(|(id, alerts)| Job::new(*id, alerts))
            .collect();

        let amounts: Vec<usize> = jobs.iter().map(|job| job.alerts.len()).collect();
        info!(
            "dispatched jobs jobs.returned_amount={} jobs.ids={} jobs.alerts.amounts={:?}",
            jobs.len(),
            Ids(&ids),
            amounts
        );
        Ok(jobs)
    }

    /// Releases finished jobs from the pool and clears their alerts.
    ///
    /// Release goes first; the reset only touches alert storage, so a unit
    /// that is re-admitted in between just starts a fresh batch.
    pub fn put_busy_jobs(&self, jobs: &[Job]) -> Result<()> {
        debug!("going to return jobs jobs.requested_amount={}", jobs.len());
        if jobs.is_empty() {
            return Ok(());
        }

        let ids = job_ids(jobs);
        self.pool.release(&ids)?;
        self.buffer.reset(&ids)?;

        info!("returned jobs jobs.ids={}", Ids(&ids));
        Ok(())
    }
}
