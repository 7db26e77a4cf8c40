// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for media backends.

use cliplane_engine::{ControllerError, MediaFileError};
use thiserror::Error;

/// Errors raised by media backends
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    /// Source could not be read
    #[error("failed to load '{src}': {reason}")]
    Load {
        /// Source reference
        src: String,
        /// Backend message
        reason: String,
    },
    /// Format the backend cannot handle
    #[error("unsupported format: {0}")]
    Unsupported(String),
    /// Malformed media data
    #[error("failed to decode: {0}")]
    Decode(String),
    /// Image encoding error
    #[error("image error: {0}")]
    Image(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl From<MediaFileError> for MediaError {
    fn from(e: MediaFileError) -> Self {
        match e {
            MediaFileError::NotFound(src) => Self::Load { src, reason: "not found".to_string() },
            MediaFileError::Io(reason) => Self::Io(reason),
        }
    }
}

impl From<image::ImageError> for MediaError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e.to_string())
    }
}

impl From<MediaError> for ControllerError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::Load { src, reason } => Self::Load { src, reason },
            MediaError::Unsupported(what) | MediaError::Decode(what) => Self::Unsupported(what),
            MediaError::Image(reason) | MediaError::Io(reason) => Self::Background(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_error_mapping() {
        let missing: MediaError = MediaFileError::NotFound("a.wav".to_string()).into();
        assert_eq!(
            ControllerError::from(missing),
            ControllerError::Load { src: "a.wav".to_string(), reason: "not found".to_string() }
        );
        assert_eq!(
            ControllerError::from(MediaError::Decode("bad header".to_string())),
            ControllerError::Unsupported("bad header".to_string())
        );
        assert!(matches!(ControllerError::from(MediaError::Io("denied".to_string())), ControllerError::Background(_)));
    }
}
