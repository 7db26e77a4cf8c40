// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player error types.

use cliplane_engine::{BuildError, EngineError};
use thiserror::Error;

/// Errors loading or saving a project file
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProjectError {
    /// File could not be read or written
    #[error("failed to access '{path}': {reason}")]
    Io {
        /// File path
        path: String,
        /// OS message
        reason: String,
    },
    /// RON syntax or schema error
    #[error("invalid RON project: {0}")]
    Ron(String),
    /// JSON syntax or schema error
    #[error("invalid JSON project: {0}")]
    Json(String),
    /// Extension is neither `.ron` nor `.json`
    #[error("unsupported project format: {0}")]
    UnsupportedFormat(String),
}

/// Top-level player errors
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Project file error
    #[error(transparent)]
    Project(#[from] ProjectError),
    /// Engine setup error
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// Track building error
    #[error(transparent)]
    Build(#[from] BuildError),
    /// Async runtime could not start
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    /// Playback could not start
    #[error("playback did not start")]
    NotStarted,
    /// Frame image could not be written
    #[error("failed to write frame: {0}")]
    Frame(#[from] image::ImageError),
}
