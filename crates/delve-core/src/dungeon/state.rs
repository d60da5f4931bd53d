//! Runtime-mutable state
//!
//! Topology is never persisted. A save holds only the fields the game loop
//! mutates, keyed by stable ids, and is overlaid on a world regenerated from
//! the same seed.

use serde::{Deserialize, Serialize};

use crate::error::RestoreIssue;
use crate::ids::{ConnectorId, DoorId};

/// Mutable flags of one door
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorRecord {
    pub id: DoorId,
    pub is_open: bool,
    pub is_locked: bool,
}

/// Visibility bits of one connector, encoded as `0`/`1` strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorRecord {
    pub id: ConnectorId,
    pub fog_of_war: String,
    pub light: String,
}

/// Everything the game loop may change after generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeState {
    pub doors: Vec<DoorRecord>,
    pub connectors: Vec<ConnectorRecord>,
}

impl RuntimeState {
    pub fn len(&self) -> usize {
        self.doors.len() + self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doors.is_empty() && self.connectors.is_empty()
    }
}

/// Outcome of overlaying a [`RuntimeState`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Records written
    pub applied: usize,
    pub skipped: Vec<RestoreIssue>,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}
