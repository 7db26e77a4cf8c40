// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine construction options and render settings.

use crate::action::named_id;
use crate::controller::ControllerRegistry;
use crate::surface::Viewer;
use serde::{Deserialize, Serialize};

/// Render and scheduling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Base URL prefixed to relative action sources
    pub base_url: Option<String>,
    /// Render surface width in pixels
    pub render_width: u32,
    /// Render surface height in pixels
    pub render_height: u32,
    /// Largest wall-clock gap a single tick may advance, in milliseconds
    pub max_tick_delta_ms: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            render_width: 1920,
            render_height: 1080,
            max_tick_delta_ms: 1000.0,
        }
    }
}

impl EngineSettings {
    /// Tick delta limit, falling back to the default when the configured
    /// value is negative or not finite
    pub fn tick_limit_ms(&self) -> f64 {
        if self.max_tick_delta_ms.is_finite() && self.max_tick_delta_ms >= 0.0 {
            self.max_tick_delta_ms
        } else {
            Self::default().max_tick_delta_ms
        }
    }
}

/// Options for [`Engine::new`](crate::Engine::new)
pub struct EngineOptions {
    /// Engine ID, also the scope used for viewer lookups
    pub id: String,
    /// Host element tree, if already mounted
    pub viewer: Option<Box<dyn Viewer>>,
    /// Controllers keyed by type tag
    pub controllers: ControllerRegistry,
    /// Render and scheduling settings
    pub settings: EngineSettings,
}

impl EngineOptions {
    /// Options with a generated ID and default settings
    pub fn new() -> Self {
        Self::with_id(named_id("engine"))
    }

    /// Options with an explicit ID
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            viewer: None,
            controllers: ControllerRegistry::new(),
            settings: EngineSettings::default(),
        }
    }

    /// Set the viewer
    pub fn viewer(mut self, viewer: impl Viewer + 'static) -> Self {
        self.viewer = Some(Box::new(viewer));
        self
    }

    /// Set the controller registry
    pub fn controllers(mut self, controllers: ControllerRegistry) -> Self {
        self.controllers = controllers;
        self
    }

    /// Set the render and scheduling settings
    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EngineOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineOptions")
            .field("id", &self.id)
            .field("viewer", &self.viewer.is_some())
            .field("controllers", &self.controllers)
            .field("settings", &self.settings)
            .finish()
    }
}
