// SPDX-License-Identifier: MIT OR Apache-2.0
//! Backend traits for decoding and playing media.
//!
//! Controllers own one native handle per action. Handles are shared with
//! event listeners, so they live behind `Arc<Mutex<..>>`.

use crate::error::MediaError;
use cliplane_engine::MediaFile;
use futures::future::BoxFuture;
use image::RgbaImage;
use parking_lot::Mutex;
use std::sync::Arc;

/// A loaded audio clip
pub trait AudioVoice: Send {
    /// Length in seconds
    fn duration(&self) -> f64;
    /// Start or resume playback
    fn play(&mut self);
    /// Stop playback
    fn stop(&mut self);
    /// Whether playing
    fn is_playing(&self) -> bool;
    /// Jump to `position` seconds
    fn seek(&mut self, position: f64);
    /// Playback position in seconds
    fn position(&self) -> f64;
    /// Set the playback rate
    fn set_rate(&mut self, rate: f64);
    /// Playback rate
    fn rate(&self) -> f64;
    /// Set the volume (0.0 to 1.0)
    fn set_volume(&mut self, volume: f64);
    /// Volume
    fn volume(&self) -> f64;
    /// Mute or unmute
    fn set_muted(&mut self, muted: bool);
    /// Whether muted
    fn is_muted(&self) -> bool;
}

/// Shared audio voice
pub type SharedVoice = Arc<Mutex<Box<dyn AudioVoice>>>;

/// Audio decoder
pub trait AudioBackend: Send + Sync {
    /// Load a clip
    fn load<'a>(&'a self, file: &'a MediaFile) -> BoxFuture<'a, Result<Box<dyn AudioVoice>, MediaError>>;

    /// Peak amplitudes (0.0 to 1.0) in `buckets` equal slices
    fn peaks<'a>(&'a self, file: &'a MediaFile, buckets: usize) -> BoxFuture<'a, Result<Vec<f32>, MediaError>>;
}

/// A loaded video
pub trait VideoElement: Send {
    /// Length in seconds
    fn duration(&self) -> f64;
    /// Start or resume playback
    fn play(&mut self);
    /// Pause playback
    fn pause(&mut self);
    /// Whether playing
    fn is_playing(&self) -> bool;
    /// Jump to `time` seconds
    fn seek(&mut self, time: f64);
    /// Current position in seconds
    fn current_time(&self) -> f64;
    /// Decode the current frame scaled to `width`x`height`
    fn frame(&self, width: u32, height: u32) -> RgbaImage;
}

/// Shared video element
pub type SharedVideo = Arc<Mutex<Box<dyn VideoElement>>>;

/// Video decoder
pub trait VideoBackend: Send + Sync {
    /// Load a video sized for the render surface
    fn load<'a>(
        &'a self,
        file: &'a MediaFile,
        width: u32,
        height: u32,
    ) -> BoxFuture<'a, Result<Box<dyn VideoElement>, MediaError>>;
}

/// A loaded vector animation
pub trait AnimationPlayer: Send {
    /// Length in seconds
    fn duration(&self) -> f64;
    /// Seek to `ms` milliseconds and hold
    fn go_to_and_stop(&mut self, ms: f64);
    /// Held position in milliseconds
    fn position_ms(&self) -> f64;
    /// Frame index at the held position
    fn current_frame(&self) -> f64;
}

/// Shared animation player
pub type SharedPlayer = Arc<Mutex<Box<dyn AnimationPlayer>>>;

/// Animation loader
pub trait AnimationBackend: Send + Sync {
    /// Load an animation
    fn load<'a>(&'a self, file: &'a MediaFile) -> BoxFuture<'a, Result<Box<dyn AnimationPlayer>, MediaError>>;
}
