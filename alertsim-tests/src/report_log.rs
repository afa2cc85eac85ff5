// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct LoggedUnit {
    pub id: usize,
    pub alerts_created: u64,
    pub alerts_rewritten: u64,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoggedResponder {
    pub id: usize,
    pub jobs_handled: u64,
    pub share_of_finished: f64,
}

/// The parts of a JSON report the tests look at.
#[derive(Serialize, Deserialize, Debug)]
pub struct LoggedReport {
    pub ticks: u64,
    pub alerts_saved: u64,
    pub alerts_rewritten: u64,
    pub jobs_created: u64,
    pub jobs_duplicate: u64,
    pub jobs_finished: u64,
    pub responder_load: f64,
    pub units: Vec<LoggedUnit>,
    pub responders: Vec<LoggedResponder>,
}

pub fn parse_report(json: &str) -> serde_json::Result<LoggedReport> {
    serde_json::from_str(json)
}
