// SPDX-License-Identifier: MIT
// alertsim: incident-response pipeline simulation
//
// - Agents raise alerts for monitored units.
// - Alerts coalesce per unit in a buffer, units queue up as jobs in a pool.
// - Responders claim the oldest jobs, work on them and hand them back.
//
// Author: Johannes Leupolz <dev@leupolz.eu>

pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod report;
pub mod simulation;

pub use config::SimConfig;
pub use error::{Result, SimError};
pub use simulation::context::SimulationContext;
