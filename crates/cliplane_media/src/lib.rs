// SPDX-License-Identifier: MIT OR Apache-2.0
//! Media controllers for Cliplane.
//!
//! Provides the audio, video and animation controllers plus the backend
//! traits they drive. Backends are injected at construction so hosts can
//! plug in a real decoder; the [`headless`] module ships backends that work
//! without any audio or video device.

pub mod animation;
pub mod audio;
pub mod backend;
pub mod error;
pub mod headless;
pub mod video;
pub mod waveform;

pub use animation::AnimationController;
pub use audio::{volume_update, AudioController};
pub use backend::{
    AnimationBackend, AnimationPlayer, AudioBackend, AudioVoice, SharedPlayer, SharedVideo, SharedVoice, VideoBackend,
    VideoElement,
};
pub use error::MediaError;
pub use headless::{HeadlessAudioBackend, HeadlessVideoBackend, LottieBackend, LottieInfo, WavInfo};
pub use video::VideoController;
pub use waveform::{parse_hex_color, WaveformOptions, WaveformRenderer};

use cliplane_engine::ControllerRegistry;
use std::sync::Arc;

/// Registry with the three media controllers on headless backends
pub fn headless_registry(waveforms: Option<WaveformRenderer>) -> ControllerRegistry {
    let audio_backend = Arc::new(HeadlessAudioBackend::new());
    let mut audio = AudioController::new(audio_backend);
    if let Some(renderer) = waveforms {
        audio = audio.with_waveforms(renderer);
    }
    ControllerRegistry::new()
        .with(audio)
        .with(VideoController::new(Arc::new(HeadlessVideoBackend::new())))
        .with(AnimationController::new(Arc::new(LottieBackend)))
}
