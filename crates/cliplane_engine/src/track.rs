// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track definitions for the timeline.

use crate::action::{named_id, Action, ActionId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a track
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub String);

impl TrackId {
    /// Create a new random track ID
    pub fn new() -> Self {
        Self(named_id("track"))
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A lane of actions on the timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: TrackId,
    /// Track name
    pub name: String,
    /// Actions on this track
    pub actions: Vec<Action>,
    /// Whether the track is hidden from the render surface
    #[serde(default)]
    pub hidden: bool,
    /// Whether the track is locked for editing
    #[serde(default)]
    pub lock: bool,
}

impl Track {
    /// Create a new empty track
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TrackId::new(),
            name: name.into(),
            actions: Vec::new(),
            hidden: false,
            lock: false,
        }
    }

    /// Create a track holding a single action, named after it
    pub fn single(action: Action) -> Self {
        let mut track = Self::new(action.name.clone());
        track.actions.push(action);
        track
    }

    /// Add an action (builder style)
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Get an action by ID
    pub fn action(&self, id: &ActionId) -> Option<&Action> {
        self.actions.iter().find(|a| &a.id == id)
    }

    /// Get a mutable action by ID
    pub fn action_mut(&mut self, id: &ActionId) -> Option<&mut Action> {
        self.actions.iter_mut().find(|a| &a.id == id)
    }

    /// End time of the last action on this track
    pub fn duration(&self) -> f64 {
        self.actions.iter().map(|a| a.end).fold(0.0, f64::max)
    }
}
