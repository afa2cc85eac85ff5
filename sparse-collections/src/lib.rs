// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

//! Membership containers over a dense id space `[0, capacity)`.
//!
//! None of the types here synchronize themselves. The owning component is
//! expected to wrap them in its own lock and hold it across every call
//! sequence that has to appear atomic.

pub mod dense_set;
pub mod indexed_map;
pub mod node_list;

pub use dense_set::DenseSet;
pub use indexed_map::IndexedMap;
pub use node_list::{NodeIndex, NodeList};
