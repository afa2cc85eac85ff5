// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

use std::fmt;

/// Errors surfaced by the simulation core.
///
/// Empty results (nothing to claim, an id that is already admitted, a reset of
/// an already empty entry) are not errors. Everything here means the pipeline
/// can no longer be trusted and the caller must stop; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invariant violated in {operation}: ids {ids:?}, flags {flags:?}")]
    InvariantViolated {
        operation: &'static str,
        ids: Vec<usize>,
        flags: Vec<bool>,
    },

    #[error("unit {id} is outside of the unit id space {capacity}")]
    UnknownUnit { id: usize, capacity: usize },

    #[error("lock of the {0} was poisoned")]
    LockPoisoned(&'static str),

    #[error("an alert producer panicked")]
    ProducerPanicked,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SimError {
    /// Builds an [`SimError::InvariantViolated`] from the ids of an operation and
    /// the per-id ok flags the underlying containers returned.
    pub fn violated(operation: &'static str, ids: &[usize], flags: &[bool]) -> Self {
        SimError::InvariantViolated {
            operation,
            ids: ids.to_vec(),
            flags: flags.to_vec(),
        }
    }

    pub fn is_invariant_violation(&self) -> bool {
        !matches!(self, SimError::InvalidConfig(_))
    }
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Fails with [`SimError::InvariantViolated`] unless every flag is set.
pub fn ensure_all(operation: &'static str, ids: &[usize], flags: &[bool]) -> Result<()> {
    if flags.iter().all(|ok| *ok) {
        Ok(())
    } else {
        Err(SimError::violated(operation, ids, flags))
    }
}

/// Id list formatter for log lines, `[1 4 7]`.
pub struct Ids<'a>(pub &'a [usize]);

impl fmt::Display for Ids<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", id)?;
        }
        write!(f, "]")
    }
}
