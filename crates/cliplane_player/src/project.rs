// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project files.
//!
//! A project lists the actions to play plus render and timing settings. It is
//! stored as RON or JSON, picked by file extension.

use crate::error::ProjectError;
use cliplane_engine::{ActionInput, EngineSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Render target size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Default for RenderSize {
    fn default() -> Self {
        Self { width: 1920, height: 1080 }
    }
}

/// Project file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectFile {
    /// Engine ID (generated if absent)
    pub id: Option<String>,
    /// Base URL for relative sources.
    ///
    /// Defaults to the directory holding the project file.
    pub base_url: Option<String>,
    /// Render target size
    pub render: RenderSize,
    /// Frame rate of the playback loop
    pub fps: u32,
    /// Initial play rate
    pub play_rate: f64,
    /// Stop time in seconds
    pub to_time: Option<f64>,
    /// Actions to play, one track each
    pub actions: Vec<ActionInput>,
}

impl Default for ProjectFile {
    fn default() -> Self {
        Self {
            id: None,
            base_url: None,
            render: RenderSize::default(),
            fps: 60,
            play_rate: 1.0,
            to_time: None,
            actions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Ron,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Result<Self, ProjectError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "ron" => Ok(Self::Ron),
            "json" => Ok(Self::Json),
            _ => Err(ProjectError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl ProjectFile {
    /// Parse project text in the format implied by `path`
    pub fn parse(path: &Path, content: &str) -> Result<Self, ProjectError> {
        match Format::from_path(path)? {
            Format::Ron => ron::from_str(content).map_err(|e| ProjectError::Ron(e.to_string())),
            Format::Json => serde_json::from_str(content).map_err(|e| ProjectError::Json(e.to_string())),
        }
    }

    /// Load a project file
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| ProjectError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut project = Self::parse(path, &content)?;

        if project.base_url.is_none() {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                project.base_url = Some(dir.display().to_string());
            }
        }
        tracing::info!(
            "Loaded {:?} project {} with {} actions",
            format,
            path.display(),
            project.actions.len()
        );
        Ok(project)
    }

    /// Save the project, pretty-printed
    pub fn save(&self, path: &Path) -> Result<(), ProjectError> {
        let content = match Format::from_path(path)? {
            Format::Ron => {
                let config = ron::ser::PrettyConfig::default().struct_names(false).enumerate_arrays(false);
                ron::ser::to_string_pretty(self, config).map_err(|e| ProjectError::Ron(e.to_string()))?
            }
            Format::Json => serde_json::to_string_pretty(self).map_err(|e| ProjectError::Json(e.to_string()))?,
        };
        std::fs::write(path, content).map_err(|e| ProjectError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Engine settings for this project
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            base_url: self.base_url.clone(),
            render_width: self.render.width,
            render_height: self.render.height,
            ..Default::default()
        }
    }
}
