// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::Arc;
use std::thread;

use log::info;

use crate::error::{Ids, Result, SimError};
use crate::simulation::buffer::single_alert;
use crate::simulation::chance::ChanceSource;
use crate::simulation::dispatcher::Dispatcher;
use crate::simulation::metrics::{MetricKind, Metrics};
use crate::simulation::models::{AlertBatch, UnitId};

/// Outcome of polling the agents once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentTick {
    pub silent: Vec<UnitId>,
    pub alarming: Vec<UnitId>,
}

/// Synthetic fault generator. Every agent draws once per tick and raises one
/// alert when the draw crosses the crash threshold.
pub struct Agents {
    count: usize,
    min_chance_to_crash: f32,
    batches: usize,
    created: Vec<u64>,
    dispatcher: Dispatcher,
    chance: Box<dyn ChanceSource>,
    metrics: Arc<Metrics>,
}

impl Agents {
    pub fn new(
        count: usize,
        min_chance_to_crash: f32,
        batches: usize,
        dispatcher: Dispatcher,
        chance: Box<dyn ChanceSource>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            count,
            min_chance_to_crash,
            batches: batches.max(1),
            created: vec![0; count],
            dispatcher,
            chance,
            metrics,
        }
    }

    pub fn process(&mut self, tick: u64) -> Result<AgentTick> {
        let mut outcome = AgentTick::default();
        for id in 0..self.count {
            if self.chance.draw() >= self.min_chance_to_crash {
                outcome.alarming.push(id);
            } else {
                outcome.silent.push(id);
            }
        }

        let alerts: Vec<AlertBatch> = outcome
            .alarming
            .iter()
            .map(|id| single_alert(*id, tick))
            .collect();
        for (id, batch) in outcome.alarming.iter().zip(&alerts) {
            self.created[*id] += batch.len() as u64;
        }
        self.save(&outcome.alarming, &alerts)?;

        self.metrics
            .add(MetricKind::AgentsSilent, outcome.silent.len() as u64);
        self.metrics
            .add(MetricKind::AgentsAlarming, outcome.alarming.len() as u64);

        info!(
            "polled agents for new statuses agents.silent.ids={} agents.alarming.ids={}",
            Ids(&outcome.silent),
            Ids(&outcome.alarming)
        );
        Ok(outcome)
    }

    /// Hands the alerts to the dispatcher, split into `batches` concurrent
    /// producers.
    fn save(&self, ids: &[UnitId], alerts: &[AlertBatch]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        if self.batches == 1 {
            return self.dispatcher.save_alerts(ids, alerts);
        }

        let chunk = ids.len().div_ceil(self.batches);
        thread::scope(|scope| {
            let handles: Vec<_> = ids
                .chunks(chunk)
                .zip(alerts.chunks(chunk))
                .map(|(ids, alerts)| {
                    let dispatcher = &self.dispatcher;
                    scope.spawn(move || dispatcher.save_alerts(ids, alerts))
                })
                .collect();
            handles
                .into_iter()
                .try_for_each(|handle| match handle.join() {
                    Ok(saved) => saved,
                    Err(_) => Err(SimError::ProducerPanicked),
                })
        })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Alerts raised per unit over the whole run.
    pub fn created(&self) -> &[u64] {
        &self.created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::buffer::AlertBuffer;
    use crate::simulation::chance::ScriptedChance;
    use crate::simulation::pool::JobPool;

    fn agents(count: usize, batches: usize, draws: Vec<f32>) -> (Agents, Dispatcher, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new());
        let dispatcher = Dispatcher::new(
            Arc::new(AlertBuffer::new(count, 8, metrics.clone())),
            Arc::new(JobPool::new(count, metrics.clone())),
        );
        let agents = Agents::new(
            count,
            0.5,
            batches,
            dispatcher.clone(),
            Box::new(ScriptedChance::new(draws)),
            metrics.clone(),
        );
        (agents, dispatcher, metrics)
    }

    #[test]
    fn test_alarming_agents_are_admitted() {
        let (mut agents, dispatcher, metrics) = agents(4, 1, vec![0.9, 0.1]);
        let outcome = agents.process(0).unwrap();

        assert_eq!(outcome.alarming, vec![0, 2]);
        assert_eq!(outcome.silent, vec![1, 3]);
        assert_eq!(dispatcher.pool().pending().unwrap(), vec![0, 2]);
        assert_eq!(agents.created(), &[1, 0, 1, 0]);
        assert_eq!(metrics.get(MetricKind::AgentsAlarming), 2);
        assert_eq!(metrics.get(MetricKind::AgentsSilent), 2);
    }

    #[test]
    fn test_repeated_crashes_coalesce() {
        let (mut agents, dispatcher, metrics) = agents(2, 1, vec![0.9]);
        for tick in 0..5 {
            agents.process(tick).unwrap();
        }
        assert_eq!(dispatcher.pool().pending().unwrap(), vec![0, 1]);
        assert_eq!(dispatcher.buffer().stored(0).unwrap(), 5);
        assert_eq!(metrics.get(MetricKind::JobsPending), 2);
        assert_eq!(metrics.get(MetricKind::JobsSkipped), 8);
    }

    #[test]
    fn test_concurrent_batches_admit_everyone() {
        let (mut agents, dispatcher, _) = agents(64, 4, vec![0.9]);
        agents.process(0).unwrap();

        let mut pending = dispatcher.pool().pending().unwrap();
        pending.sort_unstable();
        assert_eq!(pending, (0..64).collect::<Vec<_>>());
        assert!((0..64).all(|id| dispatcher.buffer().stored(id).unwrap() == 1));
    }
}
