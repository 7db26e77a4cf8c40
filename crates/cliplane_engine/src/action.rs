// SPDX-License-Identifier: MIT OR Apache-2.0
//! Action definitions for the timeline.
//!
//! An action is one placed media clip: a `[start, end)` window on the
//! timeline plus the controller that knows how to play it.

use crate::controller::ControllerRef;
use crate::media_file::MediaFile;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Generate a prefixed unique identifier, e.g. `mediaFile-3f2a…`
pub fn named_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

/// Unique identifier for an action within an engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub String);

impl ActionId {
    /// Create an action ID from any string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a new random action ID
    pub fn generate() -> Self {
        Self(named_id("mediaFile"))
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ActionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ActionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Compositing layer of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Drawn over background media
    #[default]
    Foreground,
    /// Drawn first
    Background,
}

/// Editing and playback flags of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionState {
    /// Whether the action is selected
    pub selected: bool,
    /// Whether the action is prohibited from running
    pub disabled: bool,
    /// Whether the action is hidden from the render surface
    pub hidden: bool,
    /// Whether the action can be resized
    pub flexible: bool,
    /// Whether the action can be moved
    pub movable: bool,
}

/// Volume applied while playback is inside an action-relative window.
///
/// `start`/`end` are seconds from the action start. A missing bound is open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeSection {
    /// Volume (0.0 to 1.0)
    pub volume: f64,
    /// Window start, seconds from action start
    #[serde(default)]
    pub start: Option<f64>,
    /// Window end, seconds from action start
    #[serde(default)]
    pub end: Option<f64>,
}

impl VolumeSection {
    /// Whether `offset` (seconds from action start) falls inside this section
    pub fn contains(&self, offset: f64) -> bool {
        self.start.map_or(true, |s| offset >= s) && self.end.map_or(true, |e| offset < e)
    }
}

/// One placed media clip on the timeline
#[derive(Clone, Serialize, Deserialize)]
pub struct Action {
    /// Unique action ID
    pub id: ActionId,
    /// Display name (file stem)
    pub name: String,
    /// Display name with extension
    #[serde(default)]
    pub full_name: String,
    /// Source reference (URL or path)
    pub src: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Render order, lower draws first
    pub z: i32,
    /// Whether `z` was given explicitly
    #[serde(default)]
    pub static_z: bool,
    /// Controller type tag ("audio", "video", "animation", ...)
    pub controller_name: String,
    /// Compositing layer
    #[serde(default)]
    pub layer: Layer,
    /// Intrinsic media duration, filled in by preload
    #[serde(default)]
    pub duration: Option<f64>,
    /// Flags
    #[serde(default)]
    pub state: ActionState,
    /// Volume sections (audio)
    #[serde(default)]
    pub volume: Vec<VolumeSection>,
    /// Index of the volume section currently applied
    #[serde(skip)]
    pub volume_index: Option<usize>,
    /// Resolved media file
    #[serde(skip)]
    pub file: Option<Arc<MediaFile>>,
    /// Resolved controller
    #[serde(skip)]
    pub controller: Option<ControllerRef>,
}

impl Action {
    /// Create a new action
    pub fn new(
        id: impl Into<ActionId>,
        start: f64,
        end: f64,
        controller_name: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            full_name: id.to_string(),
            id,
            src: String::new(),
            start,
            end: end.max(start),
            z: 0,
            static_z: false,
            controller_name: controller_name.into(),
            layer: Layer::Foreground,
            duration: None,
            state: ActionState::default(),
            volume: Vec::new(),
            volume_index: None,
            file: None,
            controller: None,
        }
    }

    /// Set an explicit z-order
    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self.static_z = true;
        self
    }

    /// Set the source reference
    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = src.into();
        self
    }

    /// Attach a resolved controller
    pub fn with_controller(mut self, controller: ControllerRef) -> Self {
        self.controller = Some(controller);
        self
    }

    /// Set the intrinsic media duration
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Mark the action as disabled
    pub fn disabled(mut self) -> Self {
        self.state.disabled = true;
        self
    }

    /// Whether `time` lies inside `[start, end)`
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time < self.end
    }

    /// Whether the action should be active at `time`
    pub fn is_active_at(&self, time: f64) -> bool {
        !self.state.disabled && self.contains(time)
    }

    /// Length of the action on the timeline
    pub fn placed_duration(&self) -> f64 {
        self.end - self.start
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("start", &self.start)
            .field("end", &self.end)
            .field("z", &self.z)
            .field("controller_name", &self.controller_name)
            .field("duration", &self.duration)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Action descriptor handed to track building
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionInput {
    /// Action ID (generated if absent)
    #[serde(default)]
    pub id: Option<ActionId>,
    /// Display name (derived from `src` if absent)
    #[serde(default)]
    pub name: Option<String>,
    /// Source reference, relative sources resolve against the base URL
    pub src: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Explicit z-order (defaults to the input index)
    #[serde(default)]
    pub z: Option<i32>,
    /// Controller type tag
    pub controller_name: String,
    /// Compositing layer
    #[serde(default)]
    pub layer: Option<Layer>,
    /// Known media duration
    #[serde(default)]
    pub duration: Option<f64>,
    /// Flags
    #[serde(default)]
    pub state: ActionState,
    /// Volume sections
    #[serde(default)]
    pub volume: Vec<VolumeSection>,
}

impl ActionInput {
    /// Create a descriptor for `src` placed at `[start, end)`
    pub fn new(src: impl Into<String>, start: f64, end: f64, controller_name: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            start,
            end,
            controller_name: controller_name.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_window() {
        let action = Action::new("a", 2.0, 5.0, "video");
        assert!(!action.is_active_at(1.0));
        assert!(action.is_active_at(2.0));
        assert!(action.is_active_at(4.999));
        assert!(!action.is_active_at(5.0));
    }

    #[test]
    fn test_disabled_never_active() {
        let action = Action::new("a", 0.0, 5.0, "video").disabled();
        assert!(action.contains(1.0));
        assert!(!action.is_active_at(1.0));
    }

    #[test]
    fn test_end_clamped_to_start() {
        let action = Action::new("a", 3.0, 1.0, "audio");
        assert_eq!(action.end, 3.0);
        assert_eq!(action.placed_duration(), 0.0);
    }

    #[test]
    fn test_volume_section_bounds() {
        let section = VolumeSection { volume: 0.5, start: Some(1.0), end: None };
        assert!(!section.contains(0.5));
        assert!(section.contains(1.0));
        assert!(section.contains(100.0));
    }

    #[test]
    fn test_input_from_json() {
        let input: ActionInput = serde_json::from_str(
            r#"{ "src": "clips/a.mp4", "start": 0, "end": 4, "controller_name": "video", "state": { "hidden": true } }"#,
        )
        .unwrap();
        assert_eq!(input.controller_name, "video");
        assert!(input.state.hidden);
        assert!(input.z.is_none());
    }

    #[test]
    fn test_named_id_prefix() {
        let id = named_id("track");
        assert!(id.starts_with("track-"));
        assert_ne!(id, named_id("track"));
    }
}
