// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use serde::Serialize;

use crate::config::SimConfig;
use crate::error::Result;
use crate::simulation::agents::{AgentTick, Agents};
use crate::simulation::buffer::AlertBuffer;
use crate::simulation::chance::{ChanceSource, SeededChance};
use crate::simulation::clock::FixedStep;
use crate::simulation::dispatcher::Dispatcher;
use crate::simulation::metrics::{Metric, Metrics};
use crate::simulation::models::{ResponderId, UnitId};
use crate::simulation::pool::JobPool;
use crate::simulation::responders::{ResponderTick, Responders};

/// What one logical tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub tick: u64,
    pub agents: AgentTick,
    pub responders: ResponderTick,
}

/// Point-in-time view of the pipeline for status output.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub paused: bool,
    pub tick: u64,
    /// `(unit, stored alerts)` for every unit the buffer knows.
    pub buffered: Vec<(UnitId, usize)>,
    /// Present units in admission order.
    pub pending: Vec<UnitId>,
    pub locked: Vec<UnitId>,
    pub free: Vec<ResponderId>,
    pub busy: Vec<ResponderId>,
    pub metrics: Vec<Metric>,
}

/// Everything one simulation run owns, created once at startup and passed to
/// whoever drives it.
pub struct SimulationContext {
    config: SimConfig,
    metrics: Arc<Metrics>,
    dispatcher: Dispatcher,
    agents: Agents,
    responders: Responders,
    clock: FixedStep,
    ticks: u64,
    paused: bool,
}

impl SimulationContext {
    pub fn new(config: SimConfig) -> Result<Self> {
        let agents_chance = SeededChance::new(config.seed);
        let responders_chance = SeededChance::new(config.seed.map(|seed| seed.wrapping_add(1)));
        Self::with_chance_sources(config, Box::new(agents_chance), Box::new(responders_chance))
    }

    /// Same as [`SimulationContext::new`] with the random draws supplied by
    /// the caller.
    pub fn with_chance_sources(
        config: SimConfig,
        agents_chance: Box<dyn ChanceSource>,
        responders_chance: Box<dyn ChanceSource>,
    ) -> Result<Self> {
        config.validate()?;

        let metrics = Arc::new(Metrics::new());
        let buffer = Arc::new(AlertBuffer::new(
            config.agents,
            config.alerts_capacity,
            metrics.clone(),
        ));
        let pool = Arc::new(JobPool::new(config.agents, metrics.clone()));
        let dispatcher = Dispatcher::new(buffer, pool);

        let agents = Agents::new(
            config.agents,
            config.min_chance_to_crash(),
            config.agent_batches,
            dispatcher.clone(),
            agents_chance,
            metrics.clone(),
        );
        let responders = Responders::new(
            config.responders,
            config.min_chance_to_handle(),
            dispatcher.clone(),
            responders_chance,
            metrics.clone(),
        );

        info!(
            "created simulation agents={} responders={} alerts_capacity={} tick_interval_ms={}",
            config.agents, config.responders, config.alerts_capacity, config.tick_interval_ms
        );

        Ok(Self {
            clock: FixedStep::new(config.tick_interval()),
            paused: config.start_paused,
            config,
            metrics,
            dispatcher,
            agents,
            responders,
            ticks: 0,
        })
    }

    /// Runs exactly one logical tick, paused or not.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        let agents = self.agents.process(self.ticks)?;
        let responders = self.responders.process()?;
        self.ticks += 1;

        if log::log_enabled!(log::Level::Debug) {
            let snapshot = self.snapshot()?;
            debug!(
                "tick={} pending={:?} locked={:?} free={:?} busy={:?}",
                snapshot.tick, snapshot.pending, snapshot.locked, snapshot.free, snapshot.busy
            );
        }

        Ok(TickOutcome {
            tick: self.ticks,
            agents,
            responders,
        })
    }

    /// Feeds wall-clock time into the fixed-step clock and runs the ticks that
    /// became due. Returns how many ticks actually ran.
    ///
    /// While paused the lag still drains, so resuming does not replay the
    /// paused interval.
    pub fn step(&mut self, elapsed: Duration) -> Result<u64> {
        let due = self.clock.advance(elapsed);
        let mut ran = 0;
        for _ in 0..due {
            if self.paused || self.is_finished() {
                continue;
            }
            self.tick()?;
            ran += 1;
        }
        Ok(ran)
    }

    /// True once `max_ticks` ticks have run.
    pub fn is_finished(&self) -> bool {
        self.config
            .max_ticks
            .is_some_and(|max_ticks| self.ticks >= max_ticks)
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        info!("simulation {}", if self.paused { "paused" } else { "resumed" });
        self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Entry point for producers outside the tick thread.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn agents(&self) -> &Agents {
        &self.agents
    }

    pub fn responders(&self) -> &Responders {
        &self.responders
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            paused: self.paused,
            tick: self.ticks,
            buffered: self.dispatcher.buffer().entries()?,
            pending: self.dispatcher.pool().pending()?,
            locked: self.dispatcher.pool().locked()?,
            free: self.responders.free(),
            busy: self.responders.busy(),
            metrics: self.metrics.snapshot(),
        })
    }
}

impl std::fmt::Debug for SimulationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationContext")
            .field("config", &self.config)
            .field("ticks", &self.ticks)
            .field("paused", &self.paused)
            .field("responders", &self.responders)
            .finish()
    }
}
