// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the engine crate.

use thiserror::Error;

/// Errors from engine setup
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The viewer has no renderer element for this engine
    #[error("renderer element not found for engine '{0}'")]
    RendererNotFound(String),
}

/// Errors raised by controller hooks
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControllerError {
    /// Media could not be loaded
    #[error("failed to load '{src}': {reason}")]
    Load {
        /// Source reference
        src: String,
        /// Backend message
        reason: String,
    },
    /// Media loaded but is not usable
    #[error("unsupported media '{0}'")]
    Unsupported(String),
    /// Background rendering failed
    #[error("background render failed: {0}")]
    Background(String),
}

/// Errors from materializing a media file
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaFileError {
    /// Local file does not exist
    #[error("file not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

/// Errors that abort a track build
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    /// No controller registered for the tag
    #[error("no controller registered for '{0}'")]
    UnknownController(String),
    /// Action has no source
    #[error("action {index} has no source")]
    MissingSource {
        /// Input index
        index: usize,
    },
    /// Neither the name nor the source yields a display name
    #[error("no name available for action {index}")]
    MissingName {
        /// Input index
        index: usize,
    },
    /// Media file could not be materialized
    #[error(transparent)]
    File(#[from] MediaFileError),
    /// Controller preload failed
    #[error(transparent)]
    Preload(#[from] ControllerError),
}
