// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame-driven playback engine.
//!
//! The engine keeps a start-sorted list of action IDs and a cursor into it.
//! Each time change resets the cursor, removes actions whose window no
//! longer covers the playhead and enters every action whose window does.
//! While playing, the host forwards animation frames through
//! [`Engine::on_animation_frame`] or [`Engine::pump`]; each frame advances
//! the playhead by the clamped wall-clock delta scaled by the play rate.

use crate::action::{Action, ActionId};
use crate::active_set::ActiveSet;
use crate::clock::Clock;
use crate::config::{EngineOptions, EngineSettings};
use crate::controller::{ControllerParams, ControllerRegistry, TrackFlags};
use crate::emitter::{EngineSnapshot, Emitter, Event, EventKind, EventKinds, ListenerId, Verdict};
use crate::error::EngineError;
use crate::surface::{SharedSurface, Viewer, ViewerRole};
use crate::track::Track;
use std::collections::HashMap;
use tracing::{debug, error, info, trace, warn};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayState {
    /// Not advancing
    #[default]
    Paused,
    /// Advancing with the frame loop
    Playing,
    /// Advancing with the frame loop while recording
    Recording,
}

impl PlayState {
    /// Whether the frame loop advances time in this state
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing | Self::Recording)
    }

    /// Get the state name
    pub fn name(self) -> &'static str {
        match self {
            Self::Paused => "paused",
            Self::Playing => "playing",
            Self::Recording => "recording",
        }
    }
}

/// Options for [`Engine::play`] and [`Engine::record`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayOptions {
    /// Stop when the playhead reaches this time (takes priority over `auto_end`)
    pub to_time: Option<f64>,
    /// Stop once every action has been played through
    pub auto_end: bool,
}

impl PlayOptions {
    /// Play until every action has left
    pub fn auto_end() -> Self {
        Self { to_time: None, auto_end: true }
    }

    /// Play until `time`
    pub fn until(time: f64) -> Self {
        Self { to_time: Some(time), auto_end: false }
    }
}

#[derive(Debug, Clone, Copy)]
enum Hook {
    Enter,
    Update,
    Leave,
    Start,
    Stop,
}

impl Hook {
    fn name(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Update => "update",
            Self::Leave => "leave",
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

/// Timeline playback engine
pub struct Engine {
    id: String,
    settings: EngineSettings,
    controllers: ControllerRegistry,
    emitter: Emitter,
    viewer: Option<Box<dyn Viewer>>,
    renderer: Option<SharedSurface>,
    screener: Option<SharedSurface>,
    stage: Option<SharedSurface>,
    loading: bool,

    state: PlayState,
    time: f64,
    play_rate: f64,
    to_time: Option<f64>,
    auto_end: bool,
    frame_requested: bool,
    prev: Option<f64>,

    tracks: Vec<Track>,
    /// Action ID -> (track index, action index)
    locations: HashMap<ActionId, (usize, usize)>,
    /// Action IDs sorted by start
    sorted: Vec<ActionId>,
    /// Cursor into `sorted` for enter reconciliation
    next: usize,
    active: ActiveSet,
}

impl Engine {
    /// Create an engine.
    ///
    /// Fails if a viewer is given without a renderer element for this engine.
    pub fn new(options: EngineOptions) -> Result<Self, EngineError> {
        let EngineOptions { id, viewer, controllers, settings } = options;
        let mut engine = Self {
            id,
            settings,
            controllers,
            emitter: Emitter::new(),
            viewer: None,
            renderer: None,
            screener: None,
            stage: None,
            loading: true,
            state: PlayState::Paused,
            time: 0.0,
            play_rate: 1.0,
            to_time: None,
            auto_end: false,
            frame_requested: false,
            prev: None,
            tracks: Vec::new(),
            locations: HashMap::new(),
            sorted: Vec::new(),
            next: 0,
            active: ActiveSet::new(),
        };
        if let Some(viewer) = viewer {
            engine.set_viewer(viewer)?;
        }
        Ok(engine)
    }

    /// Engine ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Render and scheduling settings
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Registered controllers
    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    /// Replace the controller registry.
    ///
    /// Actions assigned afterwards resolve against the new registry.
    pub fn set_controllers(&mut self, controllers: ControllerRegistry) {
        self.controllers = controllers;
    }

    // ---- viewer ----

    /// Attach the host element tree.
    ///
    /// The `renderer` element is required; `screener` and `stage` are optional.
    pub fn set_viewer(&mut self, viewer: Box<dyn Viewer>) -> Result<(), EngineError> {
        let renderer = viewer
            .query(&self.id, ViewerRole::Renderer)
            .ok_or_else(|| EngineError::RendererNotFound(self.id.clone()))?;
        renderer.lock().resize(self.settings.render_width, self.settings.render_height);
        self.screener = viewer.query(&self.id, ViewerRole::Screener);
        self.stage = viewer.query(&self.id, ViewerRole::Stage);
        self.renderer = Some(renderer);

        for controller in self.controllers.iter() {
            controller.viewer_update(viewer.as_ref(), &self.id);
        }
        self.viewer = Some(viewer);
        self.loading = false;
        info!("Engine {} attached to viewer", self.id);
        Ok(())
    }

    /// Attached viewer
    pub fn viewer(&self) -> Option<&dyn Viewer> {
        self.viewer.as_deref()
    }

    /// Composited output surface
    pub fn renderer(&self) -> Option<&SharedSurface> {
        self.renderer.as_ref()
    }

    /// Recorded-version playback surface
    pub fn screener(&self) -> Option<&SharedSurface> {
        self.screener.as_ref()
    }

    /// Overlay container
    pub fn stage(&self) -> Option<&SharedSurface> {
        self.stage.as_ref()
    }

    /// Whether the engine is still waiting for its renderer
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Render surface size
    pub fn render_size(&self) -> (u32, u32) {
        (self.settings.render_width, self.settings.render_height)
    }

    /// Change the render surface size
    pub fn set_render_view(&mut self, width: u32, height: u32) {
        self.settings.render_width = width;
        self.settings.render_height = height;
        if let Some(renderer) = &self.renderer {
            renderer.lock().resize(width, height);
        }
    }

    // ---- events ----

    /// Register an event handler; see [`Emitter::on`]
    pub fn on<F>(&mut self, kinds: impl Into<EventKinds>, handler: F) -> ListenerId
    where
        F: FnMut(&Event, &EngineSnapshot) -> Verdict + Send + 'static,
    {
        self.emitter.on(kinds, handler)
    }

    /// Register an observing handler; see [`Emitter::observe`]
    pub fn observe<F>(&mut self, kinds: impl Into<EventKinds>, handler: F) -> ListenerId
    where
        F: FnMut(&Event, &EngineSnapshot) + Send + 'static,
    {
        self.emitter.observe(kinds, handler)
    }

    /// Unregister handlers for `kind`
    pub fn off(&mut self, kind: EventKind, listener: Option<ListenerId>) {
        self.emitter.off(kind, listener);
    }

    /// Unregister every handler
    pub fn off_all(&mut self) {
        self.emitter.off_all();
    }

    /// Engine emitter
    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Current engine state for event handlers
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            engine_id: self.id.clone(),
            time: self.time,
            play_rate: self.play_rate,
            state: self.state,
        }
    }

    fn trigger(&self, event: Event) -> Verdict {
        self.emitter.trigger(event, &self.snapshot())
    }

    /// Announce a timeline scroll
    pub fn set_scroll_left(&mut self, left: f64) {
        self.trigger(Event::ScrollLeft { left });
    }

    // ---- tracks ----

    /// Replace the tracks.
    ///
    /// Active actions leave (against the previous tracks), the index is
    /// rebuilt, then actions covering the current time enter.
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        if self.state.is_playing() {
            self.pause();
        }
        self.clear_active();
        self.tracks = tracks;
        self.resolve_controllers();
        self.rebuild_index();
        self.deal_enter(self.time);
        debug!("Engine {} assigned {} tracks ({} actions)", self.id, self.tracks.len(), self.sorted.len());
    }

    /// Current tracks
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Replace one action, keeping its track.
    ///
    /// Returns `false` if no action has the same ID.
    pub fn set_action(&mut self, mut action: Action) -> bool {
        let Some(&(ti, ai)) = self.locations.get(&action.id) else {
            return false;
        };
        if action.controller.is_none() {
            action.controller = self.controllers.get(&action.controller_name).cloned();
        }
        let Some(slot) = self.tracks.get_mut(ti).and_then(|t| t.actions.get_mut(ai)) else {
            return false;
        };
        let (id, z) = (action.id.clone(), action.z);
        *slot = action;
        if self.active.get(&id).is_some_and(|old| old != z) {
            self.active.remove(&id);
            self.active.insert(id, z);
        }
        self.rebuild_index();
        self.deal_leave(self.time);
        self.deal_enter(self.time);
        true
    }

    fn resolve_controllers(&mut self) {
        for action in self.tracks.iter_mut().flat_map(|t| t.actions.iter_mut()) {
            if action.controller.is_none() {
                action.controller = self.controllers.get(&action.controller_name).cloned();
                if action.controller.is_none() {
                    warn!("No controller '{}' for action {}", action.controller_name, action.id);
                }
            }
        }
    }

    fn rebuild_index(&mut self) {
        self.locations.clear();
        for (ti, track) in self.tracks.iter().enumerate() {
            for (ai, action) in track.actions.iter().enumerate() {
                if self.locations.insert(action.id.clone(), (ti, ai)).is_some() {
                    warn!("Duplicate action ID {}; the later one wins", action.id);
                }
            }
        }
        let mut starts = Vec::with_capacity(self.locations.len());
        for (ti, track) in self.tracks.iter().enumerate() {
            for (ai, action) in track.actions.iter().enumerate() {
                if self.locations.get(&action.id) == Some(&(ti, ai)) {
                    starts.push((action.start, action.id.clone()));
                }
            }
        }
        starts.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.sorted = starts.into_iter().map(|(_, id)| id).collect();
        self.next = 0;
    }

    // ---- queries ----

    /// Look up an action with its owning track
    pub fn action(&self, id: &ActionId) -> Option<(&Action, &Track)> {
        let &(ti, ai) = self.locations.get(id)?;
        let track = self.tracks.get(ti)?;
        Some((track.actions.get(ai)?, track))
    }

    /// Owning track of an action
    pub fn action_track(&self, id: &ActionId) -> Option<&Track> {
        self.action(id).map(|(_, track)| track)
    }

    /// Active actions that are selected, in render order
    pub fn selected_actions(&self) -> Vec<&Action> {
        self.active
            .iter()
            .filter_map(|(id, _)| self.action(id).map(|(action, _)| action))
            .filter(|action| action.state.selected)
            .collect()
    }

    /// Active action IDs in render order
    pub fn active_ids(&self) -> Vec<ActionId> {
        self.active.ids()
    }

    /// All action IDs sorted by start
    pub fn sorted_ids(&self) -> &[ActionId] {
        &self.sorted
    }

    /// End of the last action
    pub fn duration(&self) -> f64 {
        self.tracks.iter().map(Track::duration).fold(0.0, f64::max)
    }

    /// Current play state
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Whether playing or recording
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Whether paused
    pub fn is_paused(&self) -> bool {
        self.state == PlayState::Paused
    }

    /// Whether recording
    pub fn is_recording(&self) -> bool {
        self.state == PlayState::Recording
    }

    // ---- time and rate ----

    /// Current time in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Move the playhead.
    ///
    /// Returns `false` if a `BeforeSetTime` handler denied the change.
    pub fn set_time(&mut self, time: f64) -> bool {
        self.apply_time(time, false)
    }

    fn apply_time(&mut self, time: f64, by_tick: bool) -> bool {
        if !by_tick && !self.trigger(Event::BeforeSetTime { time }).is_allowed() {
            debug!("Engine {} set_time({time}) denied", self.id);
            return false;
        }
        self.time = time;
        self.next = 0;
        self.deal_leave(time);
        self.deal_enter(time);

        if by_tick {
            self.trigger(Event::SetTimeByTick { time });
        } else {
            self.trigger(Event::AfterSetTime { time });
        }
        true
    }

    /// Current play rate
    pub fn play_rate(&self) -> f64 {
        self.play_rate
    }

    /// Change the play rate.
    ///
    /// Rates that are not positive are rejected.
    pub fn set_play_rate(&mut self, rate: f64) -> bool {
        if rate.is_nan() || rate <= 0.0 {
            error!("Play rate must be greater than 0, got {rate}");
            return false;
        }
        if !self.trigger(Event::BeforeSetPlayRate { rate }).is_allowed() {
            return false;
        }
        self.play_rate = rate;
        self.trigger(Event::AfterSetPlayRate { rate });
        true
    }

    // ---- playback ----

    /// Start playing from the current time
    pub fn play(&mut self, options: PlayOptions) -> bool {
        self.begin(PlayState::Playing, options)
    }

    /// Start recording from the current time
    pub fn record(&mut self, options: PlayOptions) -> bool {
        self.begin(PlayState::Recording, options)
    }

    fn begin(&mut self, state: PlayState, options: PlayOptions) -> bool {
        if !self.verify_loaded() {
            return false;
        }
        if self.state.is_playing() || options.to_time.is_some_and(|to| to <= self.time) {
            return false;
        }
        self.state = state;
        self.to_time = options.to_time;
        self.auto_end = options.auto_end;
        self.start_or_stop(Hook::Start);
        self.trigger(match state {
            PlayState::Recording => Event::Record,
            _ => Event::Play,
        });
        self.prev = None;
        self.frame_requested = true;
        info!("Engine {} {} at {:.3}s", self.id, state.name(), self.time);
        true
    }

    /// Pause playback and cancel the pending frame
    pub fn pause(&mut self) {
        if self.state.is_playing() {
            self.state = PlayState::Paused;
            self.start_or_stop(Hook::Stop);
            self.trigger(Event::Paused);
            info!("Engine {} paused at {:.3}s", self.id, self.time);
        }
        self.frame_requested = false;
        self.prev = None;
    }

    fn end(&mut self) {
        self.pause();
        self.trigger(Event::Ended);
        info!("Engine {} ended at {:.3}s", self.id, self.time);
    }

    /// Whether a frame callback is pending
    pub fn has_pending_frame(&self) -> bool {
        self.frame_requested
    }

    /// Frame callback with a monotonic timestamp in milliseconds.
    ///
    /// Does nothing unless a frame was requested. The first frame after
    /// `play` only primes the timestamp.
    pub fn on_animation_frame(&mut self, now_ms: f64) {
        if !self.frame_requested {
            return;
        }
        self.frame_requested = false;
        let prev = *self.prev.get_or_insert(now_ms);
        self.tick(now_ms, prev);
    }

    /// Run the pending frame, if any, at the clock's current time.
    ///
    /// Returns whether a frame ran.
    pub fn pump(&mut self, clock: &dyn Clock) -> bool {
        if !self.frame_requested {
            return false;
        }
        self.on_animation_frame(clock.now_ms());
        true
    }

    fn tick(&mut self, now: f64, prev: f64) {
        if !self.verify_loaded() || !self.state.is_playing() {
            return;
        }
        let delta = (now - prev).max(0.0).min(self.settings.tick_limit_ms());
        self.prev = Some(now);

        let mut time = self.time + delta / 1000.0 * self.play_rate;
        if let Some(to) = self.to_time {
            if to <= time {
                time = to;
            }
        }
        self.apply_time(time, true);
        self.tick_action(time);

        let exhausted = self.next >= self.sorted.len() && self.active.is_empty();
        if self.to_time.is_none() && self.auto_end && exhausted {
            self.end();
            return;
        }
        if self.to_time.is_some_and(|to| to <= time) {
            self.end();
            return;
        }
        if self.state.is_playing() {
            self.frame_requested = true;
        }
    }

    /// Run the render pass at the current time while paused
    pub fn re_render(&mut self) {
        if self.state.is_playing() {
            return;
        }
        self.tick_action(self.time);
    }

    fn tick_action(&mut self, time: f64) {
        if !self.verify_loaded() {
            return;
        }
        let Some(renderer) = self.renderer.clone() else {
            return;
        };
        self.deal_enter(time);
        self.deal_leave(time);
        {
            let mut surface = renderer.lock();
            surface.resize(self.settings.render_width, self.settings.render_height);
            surface.clear();
        }

        let order = self.active.ids();
        for id in &order {
            self.dispatch(id, Hook::Update);
        }
        trace!(
            "Render pass: {}",
            order
                .iter()
                .filter_map(|id| self.action(id))
                .map(|(a, _)| format!("{}:{}:{}", a.z, a.controller_name, a.name))
                .collect::<Vec<_>>()
                .join(" => ")
        );
    }

    fn verify_loaded(&self) -> bool {
        if self.loading {
            error!("Engine {}: start or stop before finished loading", self.id);
            return false;
        }
        true
    }

    fn start_or_stop(&mut self, hook: Hook) {
        if !self.verify_loaded() {
            return;
        }
        for id in self.active.ids() {
            self.dispatch(&id, hook);
        }
    }

    // ---- reconciliation ----

    fn deal_enter(&mut self, time: f64) {
        while let Some(id) = self.sorted.get(self.next).cloned() {
            if let Some((action, _)) = self.action(&id) {
                if !action.state.disabled {
                    if action.start > time {
                        break;
                    }
                    let z = action.z;
                    if action.end > time && !self.active.contains(&id) {
                        self.dispatch(&id, Hook::Enter);
                        self.active.insert(id, z);
                    }
                }
            }
            self.next += 1;
        }
    }

    fn deal_leave(&mut self, time: f64) {
        for id in self.active.ids() {
            let inside = self.action(&id).is_some_and(|(action, _)| action.is_active_at(time));
            if !inside {
                self.dispatch(&id, Hook::Leave);
                self.active.remove(&id);
            }
        }
    }

    fn clear_active(&mut self) {
        while let Some(id) = self.active.first().map(|(id, _)| id.clone()) {
            self.dispatch(&id, Hook::Leave);
            self.active.remove(&id);
        }
        self.next = 0;
    }

    fn dispatch(&mut self, id: &ActionId, hook: Hook) -> bool {
        let Some(&(ti, ai)) = self.locations.get(id) else {
            return false;
        };
        let Some(track) = self.tracks.get_mut(ti) else {
            return false;
        };
        let flags = TrackFlags { hidden: track.hidden, lock: track.lock };
        let Some(action) = track.actions.get_mut(ai) else {
            return false;
        };
        let Some(controller) = action.controller.clone() else {
            return false;
        };
        if !matches!(hook, Hook::Update) {
            debug!("{} {} at {:.3}s", hook.name(), action.id, self.time);
        }

        let mut params = ControllerParams {
            action,
            track: flags,
            engine_id: &self.id,
            time: self.time,
            play_rate: self.play_rate,
            state: self.state,
            render_width: self.settings.render_width,
            render_height: self.settings.render_height,
            surface: self.renderer.clone(),
            emitter: &mut self.emitter,
        };
        match hook {
            Hook::Enter => controller.enter(&mut params),
            Hook::Update => controller.update(&mut params),
            Hook::Leave => controller.leave(&mut params),
            Hook::Start => controller.start(&mut params),
            Hook::Stop => controller.stop(&mut params),
        }
        true
    }

    /// Pause, release active actions and destroy every controller's resources
    pub fn dispose(&mut self) {
        self.pause();
        self.clear_active();
        for controller in self.controllers.iter() {
            controller.destroy();
        }
        self.emitter.off_all();
        info!("Engine {} disposed", self.id);
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("time", &self.time)
            .field("play_rate", &self.play_rate)
            .field("loading", &self.loading)
            .field("actions", &self.sorted.len())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Controller, ControllerRef};
    use crate::surface::StaticViewer;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct Recorder {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Controller for Recorder {
        fn id(&self) -> &str {
            "test"
        }

        fn enter(&self, params: &mut ControllerParams<'_>) {
            self.log.lock().push(format!("enter:{}", params.action.id));
        }

        fn update(&self, params: &mut ControllerParams<'_>) {
            self.log.lock().push(format!("update:{}", params.action.id));
        }

        fn leave(&self, params: &mut ControllerParams<'_>) {
            self.log.lock().push(format!("leave:{}", params.action.id));
        }

        fn start(&self, params: &mut ControllerParams<'_>) {
            self.log.lock().push(format!("start:{}", params.action.id));
        }

        fn stop(&self, params: &mut ControllerParams<'_>) {
            self.log.lock().push(format!("stop:{}", params.action.id));
        }
    }

    fn engine_with_log() -> (Engine, Arc<Mutex<Vec<String>>>) {
        let recorder = Recorder::default();
        let log = Arc::clone(&recorder.log);
        let mut registry = ControllerRegistry::new();
        registry.register(ControllerRef::new(recorder));
        let (viewer, _surface) = StaticViewer::headless("test-engine", 8, 8);
        let options = EngineOptions::with_id("test-engine").viewer(viewer).controllers(registry);
        (Engine::new(options).unwrap(), log)
    }

    fn action(id: &str, start: f64, end: f64) -> Action {
        Action::new(id, start, end, "test")
    }

    #[test]
    fn test_missing_renderer_is_an_error() {
        let options = EngineOptions::with_id("nowhere").viewer(StaticViewer::new());
        let err = Engine::new(options).unwrap_err();
        assert_eq!(err, EngineError::RendererNotFound("nowhere".to_string()));
    }

    #[test]
    fn test_loading_rejects_play() {
        let mut engine = Engine::new(EngineOptions::with_id("x")).unwrap();
        assert!(engine.is_loading());
        assert!(!engine.play(PlayOptions::default()));
        assert!(engine.is_paused());
    }

    #[test]
    fn test_set_tracks_enters_at_current_time() {
        let (mut engine, log) = engine_with_log();
        engine.set_tracks(vec![Track::new("t")
            .with_action(action("a", 0.0, 2.0))
            .with_action(action("b", 1.0, 3.0))]);
        assert_eq!(engine.active_ids(), vec![ActionId::from("a")]);
        assert_eq!(*log.lock(), vec!["enter:a"]);
    }

    #[test]
    fn test_replacing_tracks_leaves_old_actions() {
        let (mut engine, log) = engine_with_log();
        engine.set_tracks(vec![Track::single(action("a", 0.0, 2.0))]);
        engine.set_tracks(vec![Track::single(action("b", 0.0, 2.0))]);
        assert_eq!(*log.lock(), vec!["enter:a", "leave:a", "enter:b"]);
    }

    #[test]
    fn test_play_calls_start_and_pause_calls_stop() {
        let (mut engine, log) = engine_with_log();
        engine.set_tracks(vec![Track::single(action("a", 0.0, 2.0))]);
        assert!(engine.play(PlayOptions::default()));
        assert!(!engine.play(PlayOptions::default()));
        engine.pause();
        assert_eq!(*log.lock(), vec!["enter:a", "start:a", "stop:a"]);
    }

    #[test]
    fn test_play_rejects_past_target() {
        let (mut engine, _log) = engine_with_log();
        engine.set_time(5.0);
        assert!(!engine.play(PlayOptions::until(5.0)));
        assert!(!engine.play(PlayOptions::until(1.0)));
        assert!(engine.play(PlayOptions::until(6.0)));
    }

    #[test]
    fn test_to_time_clamps_and_ends() {
        let (mut engine, _log) = engine_with_log();
        let ended = Arc::new(Mutex::new(0));
        let e = Arc::clone(&ended);
        engine.observe(EventKind::Ended, move |_, _| *e.lock() += 1);
        engine.play(PlayOptions::until(0.5));
        engine.on_animation_frame(0.0);
        engine.on_animation_frame(800.0);
        assert_eq!(engine.time(), 0.5);
        assert!(engine.is_paused());
        assert!(!engine.has_pending_frame());
        assert_eq!(*ended.lock(), 1);
    }

    #[test]
    fn test_frame_without_request_is_ignored() {
        let (mut engine, _log) = engine_with_log();
        engine.on_animation_frame(100.0);
        assert_eq!(engine.time(), 0.0);
    }

    #[test]
    fn test_record_is_a_play_variant() {
        let (mut engine, _log) = engine_with_log();
        let events = Arc::new(Mutex::new(Vec::new()));
        let e = Arc::clone(&events);
        engine.observe([EventKind::Play, EventKind::Record], move |event, _| e.lock().push(event.kind()));
        assert!(engine.record(PlayOptions::default()));
        assert!(engine.is_recording());
        assert!(engine.is_playing());
        engine.on_animation_frame(0.0);
        engine.on_animation_frame(250.0);
        assert!((engine.time() - 0.25).abs() < 1e-9);
        assert_eq!(*events.lock(), vec![EventKind::Record]);
    }

    #[test]
    fn test_set_action_reconciles() {
        let (mut engine, log) = engine_with_log();
        engine.set_tracks(vec![Track::single(action("a", 0.0, 2.0))]);
        assert!(engine.set_action(action("a", 1.0, 2.0)));
        assert!(engine.active_ids().is_empty());
        assert!(!engine.set_action(action("missing", 0.0, 1.0)));
        assert_eq!(*log.lock(), vec!["enter:a", "leave:a"]);
    }

    #[test]
    fn test_queries() {
        let (mut engine, _log) = engine_with_log();
        let mut selected = action("sel", 0.0, 4.0);
        selected.state.selected = true;
        engine.set_tracks(vec![
            Track::new("one").with_action(selected),
            Track::new("two").with_action(action("other", 0.0, 9.0)),
        ]);
        assert_eq!(engine.duration(), 9.0);
        assert_eq!(engine.action_track(&ActionId::from("other")).unwrap().name, "two");
        let ids: Vec<_> = engine.selected_actions().iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec![ActionId::from("sel")]);
        assert!(engine.action(&ActionId::from("nope")).is_none());
    }

    #[test]
    fn test_re_render_updates_while_paused() {
        let (mut engine, log) = engine_with_log();
        engine.set_tracks(vec![Track::single(action("a", 0.0, 2.0))]);
        engine.re_render();
        assert_eq!(*log.lock(), vec!["enter:a", "update:a"]);
    }

    #[test]
    fn test_dispose_leaves_and_clears_listeners() {
        let (mut engine, log) = engine_with_log();
        engine.observe(EventKind::Paused, |_, _| {});
        engine.set_tracks(vec![Track::single(action("a", 0.0, 2.0))]);
        engine.dispose();
        assert!(engine.active_ids().is_empty());
        assert_eq!(engine.emitter().listener_count(EventKind::Paused), 0);
        assert_eq!(log.lock().last().map(String::as_str), Some("leave:a"));
    }

    #[test]
    fn test_render_view_and_scroll() {
        let surface = crate::surface::ImageSurface::shared(8, 8);
        let viewer = StaticViewer::new().with_element("view", ViewerRole::Renderer, surface.clone());
        let mut engine = Engine::new(EngineOptions::with_id("view").viewer(viewer)).unwrap();
        assert_eq!(engine.render_size(), (1920, 1080));
        assert_eq!(surface.lock().canvas().dimensions(), (1920, 1080));

        engine.set_render_view(320, 180);
        assert_eq!(engine.render_size(), (320, 180));
        assert_eq!(surface.lock().canvas().dimensions(), (320, 180));

        let scrolled = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&scrolled);
        engine.observe(EventKind::ScrollLeft, move |event, _| {
            if let Event::ScrollLeft { left } = event {
                seen.lock().push(*left);
            }
        });
        engine.set_scroll_left(42.0);
        assert_eq!(*scrolled.lock(), vec![42.0]);
    }

    #[test]
    fn test_negative_tick_limit_does_not_panic() {
        let (viewer, _surface) = StaticViewer::headless("limit", 8, 8);
        let settings = EngineSettings { max_tick_delta_ms: -1.0, ..Default::default() };
        let mut engine = Engine::new(EngineOptions::with_id("limit").viewer(viewer).settings(settings)).unwrap();
        engine.set_tracks(vec![Track::single(Action::new("a", 0.0, 10.0, "none"))]);
        assert!(engine.play(PlayOptions::default()));
        engine.on_animation_frame(0.0);
        engine.on_animation_frame(5000.0);
        // falls back to the 1000 ms default
        assert_eq!(engine.time(), 1.0);
    }

    #[test]
    fn test_set_action_reorders_active_by_new_z() {
        let (mut engine, log) = engine_with_log();
        engine.set_tracks(vec![
            Track::single(action("a", 0.0, 5.0).with_z(0)),
            Track::single(action("b", 0.0, 5.0).with_z(1)),
        ]);
        engine.re_render();
        let (a, _) = engine.action(&ActionId::from("a")).unwrap();
        let raised = a.clone().with_z(9);
        log.lock().clear();

        assert!(engine.set_action(raised));
        engine.re_render();
        assert_eq!(*log.lock(), vec!["update:b", "update:a"]);
        assert_eq!(engine.active_ids(), vec![ActionId::from("b"), ActionId::from("a")]);
    }

    #[test]
    fn test_duplicate_id_sorts_by_surviving_action() {
        let (mut engine, log) = engine_with_log();
        engine.set_tracks(vec![
            Track::single(action("dup", 0.0, 1.0)),
            Track::single(action("x", 2.0, 3.0)),
            Track::single(action("dup", 4.0, 6.0)),
        ]);
        assert_eq!(engine.sorted_ids(), vec![ActionId::from("x"), ActionId::from("dup")]);
        engine.set_time(5.0);
        assert_eq!(engine.active_ids(), vec![ActionId::from("dup")]);
        assert_eq!(log.lock().last().map(String::as_str), Some("enter:dup"));
    }
}
