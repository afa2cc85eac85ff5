// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Startup configuration of a simulation run.
///
/// Chances are probabilities of the event per tick: `chance_to_crash = 1.0`
/// makes every agent alarm on every tick, `chance_to_handle = 0.0` keeps every
/// responder busy forever.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub agents: usize,
    pub responders: usize,
    pub chance_to_crash: f32,
    pub chance_to_handle: f32,
    /// Maximum number of alerts a unit can hold until its job is finished.
    pub alerts_capacity: usize,
    pub tick_interval_ms: u64,
    /// Number of concurrent producers the alarming agents are split into.
    pub agent_batches: usize,
    pub seed: Option<u64>,
    pub start_paused: bool,
    pub max_ticks: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            agents: 4,
            responders: 2,
            chance_to_crash: 0.5,
            chance_to_handle: 0.5,
            alerts_capacity: 4,
            tick_interval_ms: 1000,
            agent_batches: 1,
            seed: None,
            start_paused: false,
            max_ticks: None,
        }
    }
}

impl SimConfig {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {}", path.display()))?;
        let config: SimConfig = serde_json::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.agents == 0 {
            return Err(SimError::InvalidConfig("agents must be at least 1".into()));
        }
        if self.responders == 0 {
            return Err(SimError::InvalidConfig(
                "responders must be at least 1".into(),
            ));
        }
        if self.alerts_capacity == 0 {
            return Err(SimError::InvalidConfig(
                "alerts_capacity must be at least 1".into(),
            ));
        }
        if self.agent_batches == 0 {
            return Err(SimError::InvalidConfig(
                "agent_batches must be at least 1".into(),
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(SimError::InvalidConfig(
                "tick_interval_ms must be at least 1".into(),
            ));
        }
        for (name, chance) in [
            ("chance_to_crash", self.chance_to_crash),
            ("chance_to_handle", self.chance_to_handle),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(SimError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, chance
                )));
            }
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Draw threshold for a crash. A draw in `[0, 1)` at or above it alarms.
    pub fn min_chance_to_crash(&self) -> f32 {
        min_chance(self.chance_to_crash)
    }

    /// Draw threshold for finishing a job. A draw at or above it completes.
    pub fn min_chance_to_handle(&self) -> f32 {
        min_chance(self.chance_to_handle)
    }
}

fn min_chance(probability: f32) -> f32 {
    1.0 - probability
}
