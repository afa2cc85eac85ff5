// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

pub mod agents;
pub mod buffer;
pub mod chance;
pub mod clock;
pub mod context;
pub mod dispatcher;
pub mod metrics;
pub mod models;
pub mod pool;
pub mod responders;
