// SPDX-License-Identifier: MIT OR Apache-2.0
//! Media file references resolved from action sources.

use crate::action::Action;
use crate::error::MediaFileError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static DUPLICATE_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/{2,}").expect("duplicate slash pattern is valid"));

/// Resolve a source reference against an optional base URL.
///
/// Sources with a scheme are kept as given. Duplicate slashes are collapsed
/// everywhere after the scheme separator.
pub fn resolve_src(src: &str, base_url: Option<&str>) -> String {
    let joined = match base_url {
        Some(base) if !src.contains("://") && !base.is_empty() => format!("{base}/{src}"),
        _ => src.to_string(),
    };
    match joined.split_once("://") {
        Some((scheme, rest)) => format!("{scheme}://{}", DUPLICATE_SLASHES.replace_all(rest, "/")),
        None => DUPLICATE_SLASHES.replace_all(&joined, "/").into_owned(),
    }
}

/// Last path segment of a source, optionally without its extension
pub fn file_name(src: &str, with_ext: bool) -> String {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    let last = path.rsplit('/').next().unwrap_or(path);
    if with_ext {
        return last.to_string();
    }
    match last.rfind('.') {
        Some(dot) if dot > 0 => last[..dot].to_string(),
        _ => last.to_string(),
    }
}

/// Media category, from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Audio clip
    Audio,
    /// Video clip
    Video,
    /// Vector animation (Lottie JSON)
    Animation,
    /// Still image
    Image,
    /// Anything else
    Other,
}

impl MediaKind {
    /// Detect from a path or URL
    pub fn from_src(src: &str) -> Self {
        let name = file_name(src, true).to_lowercase();
        let ext = name.rsplit_once('.').map_or("", |(_, ext)| ext);
        match ext {
            "mp3" | "wav" | "ogg" | "flac" | "m4a" | "aac" => Self::Audio,
            "mp4" | "webm" | "mov" | "mkv" => Self::Video,
            "json" | "lottie" => Self::Animation,
            "png" | "jpg" | "jpeg" | "gif" | "webp" => Self::Image,
            _ => Self::Other,
        }
    }
}

/// A media file backing an action
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    /// Resolved source reference
    pub src: String,
    /// File name without extension
    pub name: String,
    /// File name with extension
    pub full_name: String,
    /// Media category
    pub kind: MediaKind,
    /// Path on disk, for local sources
    pub path: Option<PathBuf>,
    /// Size in bytes, when known
    pub size: Option<u64>,
}

impl MediaFile {
    /// Describe a remote source without touching it
    pub fn remote(src: impl Into<String>) -> Self {
        let src = src.into();
        Self {
            name: file_name(&src, false),
            full_name: file_name(&src, true),
            kind: MediaKind::from_src(&src),
            path: None,
            size: None,
            src,
        }
    }

    /// Materialize the file for an action.
    ///
    /// Local sources (plain paths or `file://` URLs) must exist; other
    /// schemes are described without I/O.
    pub async fn from_action(action: &Action) -> Result<Self, MediaFileError> {
        let Some(path) = local_path(&action.src) else {
            return Ok(Self::remote(action.src.clone()));
        };
        let metadata = tokio::fs::metadata(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => MediaFileError::NotFound(path.display().to_string()),
            _ => MediaFileError::Io(e.to_string()),
        })?;
        let mut file = Self::remote(action.src.clone());
        file.size = Some(metadata.len());
        file.path = Some(path);
        Ok(file)
    }

    /// Point the file at a path on disk
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Whether the file lives on disk
    pub fn is_local(&self) -> bool {
        self.path.is_some()
    }

    /// Read the whole file (local files only)
    pub async fn read(&self) -> Result<Vec<u8>, MediaFileError> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| MediaFileError::NotFound(self.src.clone()))?;
        tokio::fs::read(path).await.map_err(|e| MediaFileError::Io(e.to_string()))
    }
}

fn local_path(src: &str) -> Option<PathBuf> {
    match src.split_once("://") {
        Some(("file", rest)) => Some(Path::new(rest).to_path_buf()),
        Some(_) => None,
        None => Some(PathBuf::from(src)),
    }
}
