// SPDX-License-Identifier: MIT OR Apache-2.0
//! Audio controller.
//!
//! Keeps one voice per action. While an action is active and started, the
//! voice follows explicit time and rate changes through emitter listeners.

use crate::backend::{AudioBackend, SharedVoice};
use crate::waveform::{parse_hex_color, WaveformRenderer};
use cliplane_engine::{
    action_time, Action, ActionId, Controller, ControllerError, ControllerParams, EventKind, ListenerId, MediaFile,
    PreloadParams, VolumeSection,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use image::Rgba;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Largest voice/timeline mismatch tolerated while playing, in seconds
const DRIFT_TOLERANCE: f64 = 0.25;

/// Volume to apply at `offset` seconds into an action.
///
/// Returns the new volume and section index when the containing section
/// differs from `current`. Outside every section the volume is 1.0.
pub fn volume_update(sections: &[VolumeSection], current: Option<usize>, offset: f64) -> Option<(f64, Option<usize>)> {
    if sections.is_empty() {
        return None;
    }
    let index = sections.iter().position(|s| s.contains(offset));
    if index == current {
        return None;
    }
    let volume = index.map_or(1.0, |i| sections[i].volume);
    Some((volume, index))
}

#[derive(Debug, Clone, Copy)]
struct Listeners {
    time: ListenerId,
    rate: ListenerId,
}

/// Controller for audio actions
pub struct AudioController {
    backend: Arc<dyn AudioBackend>,
    voices: Mutex<HashMap<ActionId, SharedVoice>>,
    listeners: Mutex<HashMap<ActionId, Listeners>>,
    waveforms: Option<WaveformRenderer>,
    backgrounds: Mutex<HashMap<String, String>>,
    color: String,
    color_secondary: String,
}

impl AudioController {
    /// Create a controller on `backend`
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            voices: Mutex::new(HashMap::new()),
            listeners: Mutex::new(HashMap::new()),
            waveforms: None,
            backgrounds: Mutex::new(HashMap::new()),
            color: "#666ccc".to_string(),
            color_secondary: "#2e3192".to_string(),
        }
    }

    /// Render waveform backgrounds during preload
    pub fn with_waveforms(mut self, renderer: WaveformRenderer) -> Self {
        self.waveforms = Some(renderer);
        self
    }

    /// Override the display colors
    pub fn with_colors(mut self, color: impl Into<String>, color_secondary: impl Into<String>) -> Self {
        self.color = color.into();
        self.color_secondary = color_secondary.into();
        self
    }

    /// Voice for an action
    pub fn voice(&self, id: &ActionId) -> Option<SharedVoice> {
        self.voices.lock().get(id).cloned()
    }

    /// Background rendered for a source during preload
    pub fn background(&self, src: &str) -> Option<String> {
        self.backgrounds.lock().get(src).cloned()
    }

    /// Whether time/rate listeners are registered for an action
    pub fn is_listening(&self, id: &ActionId) -> bool {
        self.listeners.lock().contains_key(id)
    }

    fn unlisten(&self, params: &mut ControllerParams<'_>) {
        if let Some(listeners) = self.listeners.lock().remove(&params.action.id) {
            params.emitter.off(EventKind::AfterSetTime, Some(listeners.time));
            params.emitter.off(EventKind::AfterSetPlayRate, Some(listeners.rate));
        }
    }

    fn listen(&self, params: &mut ControllerParams<'_>, voice: &SharedVoice) {
        self.unlisten(params);

        let time_voice = Arc::clone(voice);
        let start = params.action.start;
        let duration = params.action.duration;
        let time = params.emitter.observe(EventKind::AfterSetTime, move |event, _| {
            if let Some(time) = event.time() {
                let offset = time - start;
                time_voice.lock().seek(match duration {
                    Some(d) if d > 0.0 => offset % d,
                    _ => offset,
                });
            }
        });
        let rate_voice = Arc::clone(voice);
        let rate = params.emitter.observe(EventKind::AfterSetPlayRate, move |event, _| {
            if let Some(rate) = event.rate() {
                rate_voice.lock().set_rate(rate);
            }
        });
        self.listeners.lock().insert(params.action.id.clone(), Listeners { time, rate });
    }
}

impl Controller for AudioController {
    fn id(&self) -> &str {
        "audio"
    }

    fn name(&self) -> &str {
        "Audio"
    }

    fn color(&self) -> &str {
        &self.color
    }

    fn color_secondary(&self) -> &str {
        &self.color_secondary
    }

    fn preload<'a>(&'a self, params: PreloadParams<'a>) -> BoxFuture<'a, Result<Action, ControllerError>> {
        async move {
            let PreloadParams { mut action, file, .. } = params;
            let voice = self.backend.load(file).await?;
            let duration = voice.duration();
            if duration > 0.0 {
                action.duration = Some(duration);
            }
            self.voices.lock().insert(action.id.clone(), Arc::new(Mutex::new(voice)));

            if self.waveforms.is_some() {
                match self.background_image(file).await {
                    Ok(Some(url)) => {
                        self.backgrounds.lock().insert(file.src.clone(), url);
                    }
                    Ok(None) => {}
                    Err(e) => warn!("No waveform for {}: {e}", file.src),
                }
            }
            Ok::<_, ControllerError>(action)
        }
        .boxed()
    }

    fn enter(&self, params: &mut ControllerParams<'_>) {
        self.start(params);
    }

    fn start(&self, params: &mut ControllerParams<'_>) {
        let Some(voice) = self.voice(&params.action.id) else {
            warn!("Audio action {} was not preloaded", params.action.id);
            return;
        };
        let was_playing = {
            let mut v = voice.lock();
            v.set_rate(params.play_rate);
            v.is_playing()
        };
        if was_playing {
            self.stop(params);
        }
        {
            let mut v = voice.lock();
            v.seek(params.action_time());
            v.set_muted(false);
            if params.is_playing() {
                v.play();
            }
        }
        self.listen(params, &voice);
        debug!("Audio {} started at {:.3}s", params.action.id, params.action_time());
    }

    fn update(&self, params: &mut ControllerParams<'_>) {
        let Some(voice) = self.voice(&params.action.id) else {
            return;
        };
        let mut v = voice.lock();
        if params.is_playing() && v.is_playing() {
            let expected = params.action_time();
            if (v.position() - expected).abs() > DRIFT_TOLERANCE {
                v.seek(expected);
            }
        }
        let offset = action_time(params.time, &*params.action);
        if let Some((volume, index)) = volume_update(&params.action.volume, params.action.volume_index, offset) {
            v.set_volume(volume);
            params.action.volume_index = index;
        }
    }

    fn stop(&self, params: &mut ControllerParams<'_>) {
        if let Some(voice) = self.voice(&params.action.id) {
            let mut v = voice.lock();
            v.stop();
            v.set_muted(true);
        }
        self.unlisten(params);
    }

    fn leave(&self, params: &mut ControllerParams<'_>) {
        self.stop(params);
    }

    fn destroy(&self) {
        for voice in self.voices.lock().drain().map(|(_, v)| v) {
            voice.lock().stop();
        }
        self.listeners.lock().clear();
    }

    fn background_image<'a>(&'a self, file: &'a MediaFile) -> BoxFuture<'a, Result<Option<String>, ControllerError>> {
        async move {
            let Some(renderer) = &self.waveforms else {
                return Ok(None);
            };
            let voice = self.backend.load(file).await?;
            let duration = voice.duration();
            if duration <= 0.0 {
                return Err(ControllerError::Background(format!("unknown duration for {}", file.src)));
            }
            let width = renderer.width_for(duration);
            let peaks = self.backend.peaks(file, width as usize).await?;
            let color = parse_hex_color(&self.color_secondary).unwrap_or(Rgba([255, 255, 255, 255]));
            let url = renderer.render_to_url(&file.full_name, &peaks, duration, color).await?;
            Ok::<_, ControllerError>(Some(url))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::tests::wav_bytes;
    use crate::headless::HeadlessAudioBackend;
    use cliplane_engine::{
        ControllerRef, ControllerRegistry, Engine, EngineOptions, ManualClock, PlayOptions, StaticViewer, Track,
    };

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(future)
    }

    fn setup(dir: &std::path::Path) -> (Engine, Arc<AudioController>, Action) {
        let path = dir.join("tone.wav");
        std::fs::write(&path, wav_bytes(1000, &[8000; 4000])).unwrap();

        let controller = Arc::new(
            AudioController::new(Arc::new(HeadlessAudioBackend::new()))
                .with_waveforms(WaveformRenderer::new(dir.join("waveforms"))),
        );
        let mut registry = ControllerRegistry::new();
        registry.register(ControllerRef::from_arc(controller.clone()));
        let (viewer, _surface) = StaticViewer::headless("audio", 16, 16);
        let engine = Engine::new(EngineOptions::with_id("audio").viewer(viewer).controllers(registry.clone())).unwrap();

        let mut input = cliplane_engine::ActionInput::new(path.to_string_lossy(), 1.0, 9.0, "audio");
        input.id = Some(ActionId::from("tone"));
        input.volume = vec![VolumeSection { volume: 0.25, start: Some(2.0), end: None }];
        let tracks = block_on(engine.try_build_tracks(&registry, vec![input])).unwrap();
        let action = tracks[0].actions[0].clone();
        (engine, controller, action)
    }

    #[test]
    fn test_volume_update() {
        let sections = [
            VolumeSection { volume: 0.5, start: None, end: Some(1.0) },
            VolumeSection { volume: 0.0, start: Some(3.0), end: None },
        ];
        assert_eq!(volume_update(&sections, None, 0.5), Some((0.5, Some(0))));
        assert_eq!(volume_update(&sections, Some(0), 0.5), None);
        assert_eq!(volume_update(&sections, Some(0), 2.0), Some((1.0, None)));
        assert_eq!(volume_update(&sections, None, 4.0), Some((0.0, Some(1))));
        assert_eq!(volume_update(&[], None, 4.0), None);
    }

    #[test]
    fn test_preload_sets_duration_and_background() {
        let dir = tempfile::tempdir().unwrap();
        let (_engine, controller, action) = setup(dir.path());
        assert_eq!(action.duration, Some(4.0));
        let src = action.file.as_ref().unwrap().src.clone();
        let background = controller.background(&src).unwrap();
        assert!(background.starts_with("url("));
        assert!(dir.path().join("waveforms").join("tone_wav.waveform.png").exists());
    }

    #[test]
    fn test_voice_follows_playback() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, controller, action) = setup(dir.path());
        let id = action.id.clone();
        engine.set_tracks(vec![Track::single(action)]);

        engine.set_time(2.5);
        let voice = controller.voice(&id).unwrap();
        assert!((voice.lock().position() - 1.5).abs() < 1e-9);
        assert!(!voice.lock().is_playing());
        assert!(controller.is_listening(&id));

        // explicit seeks reach the voice through the listener
        engine.set_time(4.0);
        assert!((voice.lock().position() - 3.0).abs() < 1e-9);

        let clock = ManualClock::new();
        engine.set_play_rate(2.0);
        assert!(engine.play(PlayOptions::default()));
        assert!(voice.lock().is_playing());
        assert!(!voice.lock().is_muted());
        assert_eq!(voice.lock().rate(), 2.0);

        engine.pump(&clock);
        clock.advance(100.0);
        engine.pump(&clock);
        assert_eq!(voice.lock().volume(), 0.25);

        engine.pause();
        assert!(!voice.lock().is_playing());
        assert!(voice.lock().is_muted());
        assert!(!controller.is_listening(&id));
        assert_eq!(engine.emitter().listener_count(EventKind::AfterSetTime), 0);
    }

    #[test]
    fn test_leave_unregisters_listeners() {
        let dir = tempfile::tempdir().unwrap();
        let (mut engine, controller, action) = setup(dir.path());
        let id = action.id.clone();
        engine.set_tracks(vec![Track::single(action)]);
        engine.set_time(2.0);
        engine.set_time(3.0);
        assert_eq!(engine.emitter().listener_count(EventKind::AfterSetTime), 1);
        engine.set_time(9.5);
        assert!(!controller.is_listening(&id));
        assert_eq!(engine.emitter().listener_count(EventKind::AfterSetPlayRate), 0);
    }
}
