// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::sync::Arc;

use alertsim::config::SimConfig;
use alertsim::simulation::buffer::{single_alert, AlertBuffer};
use alertsim::simulation::context::SimulationContext;
use alertsim::simulation::dispatcher::Dispatcher;
use alertsim::simulation::metrics::Metrics;
use alertsim::simulation::models::{AlertBatch, UnitId};
use alertsim::simulation::pool::JobPool;

/// Buffer and pool wired to one dispatcher, without agents or responders.
pub fn pipeline(units: usize, alerts_capacity: usize) -> (Dispatcher, Arc<Metrics>) {
    let metrics = Arc::new(Metrics::new());
    let dispatcher = Dispatcher::new(
        Arc::new(AlertBuffer::new(units, alerts_capacity, metrics.clone())),
        Arc::new(JobPool::new(units, metrics.clone())),
    );
    (dispatcher, metrics)
}

/// One single-alert batch per id, all raised at `tick`.
pub fn alerts_for(ids: &[UnitId], tick: u64) -> Vec<AlertBatch> {
    ids.iter().map(|id| single_alert(*id, tick)).collect()
}

pub fn seeded_config(
    agents: usize,
    responders: usize,
    chance_to_crash: f32,
    chance_to_handle: f32,
) -> SimConfig {
    SimConfig {
        agents,
        responders,
        chance_to_crash,
        chance_to_handle,
        seed: Some(42),
        ..SimConfig::default()
    }
}

pub fn run_ticks(config: SimConfig, ticks: u64) -> SimulationContext {
    let mut ctx = SimulationContext::new(config)
        .unwrap_or_else(|e| panic!("failed to create the simulation: {e}"));
    for _ in 0..ticks {
        ctx.tick()
            .unwrap_or_else(|e| panic!("tick {} failed: {e}", ctx.ticks()));
    }
    ctx
}
