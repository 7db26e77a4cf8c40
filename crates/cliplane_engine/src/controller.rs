// SPDX-License-Identifier: MIT OR Apache-2.0
//! Controller contract for per-media-type lifecycle hooks.
//!
//! One controller instance serves every action of its type. Controllers
//! keep their native handles (voices, elements, players) in private
//! caches keyed by action ID; the engine only hands them the action and
//! the playback state for the current call.

use crate::action::Action;
use crate::emitter::Emitter;
use crate::engine::PlayState;
use crate::error::ControllerError;
use crate::media_file::MediaFile;
use crate::surface::{SharedSurface, Viewer};
use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Offset of `time` into an action, looping over its media duration
pub fn action_time(time: f64, action: &Action) -> f64 {
    let offset = time - action.start;
    match action.duration {
        Some(duration) if duration > 0.0 => offset % duration,
        _ => offset,
    }
}

/// Convert an offset in seconds to milliseconds, wrapped into `duration` seconds.
///
/// Returns `None` when the media has no usable duration.
pub fn wrap_offset_ms(offset: f64, duration: f64) -> Option<f64> {
    if !offset.is_finite() || duration.is_nan() || duration <= 0.0 {
        return None;
    }
    let duration_ms = duration * 1000.0;
    let mut ms = offset * 1000.0;
    if ms > duration_ms {
        ms %= duration_ms;
    }
    Some(ms)
}

/// Track flags merged into the render pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackFlags {
    /// Owning track is hidden
    pub hidden: bool,
    /// Owning track is locked
    pub lock: bool,
}

/// Arguments to the lifecycle hooks
pub struct ControllerParams<'a> {
    /// The action being dispatched
    pub action: &'a mut Action,
    /// Flags of the owning track
    pub track: TrackFlags,
    /// Engine ID
    pub engine_id: &'a str,
    /// Current engine time in seconds
    pub time: f64,
    /// Current play rate
    pub play_rate: f64,
    /// Current play state
    pub state: PlayState,
    /// Render surface width
    pub render_width: u32,
    /// Render surface height
    pub render_height: u32,
    /// Render surface, once a viewer is assigned
    pub surface: Option<SharedSurface>,
    /// Engine emitter, for registering listeners
    pub emitter: &'a mut Emitter,
}

impl ControllerParams<'_> {
    /// Whether the engine is playing or recording
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Whether the action or its track is hidden
    pub fn is_hidden(&self) -> bool {
        self.action.state.hidden || self.track.hidden
    }

    /// Looped offset into the action, in seconds
    pub fn action_time(&self) -> f64 {
        action_time(self.time, &*self.action)
    }

    /// Looped offset into the action, in milliseconds
    pub fn action_time_ms(&self) -> Option<f64> {
        wrap_offset_ms(self.action_time(), self.action.duration?)
    }
}

impl fmt::Debug for ControllerParams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerParams")
            .field("action", &self.action.id)
            .field("track", &self.track)
            .field("time", &self.time)
            .field("play_rate", &self.play_rate)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Arguments to [`Controller::preload`]
#[derive(Debug)]
pub struct PreloadParams<'a> {
    /// The action to prepare, returned (possibly modified) on success
    pub action: Action,
    /// Materialized media file
    pub file: &'a MediaFile,
    /// Render surface width
    pub render_width: u32,
    /// Render surface height
    pub render_height: u32,
}

/// Per-media-type lifecycle handler.
///
/// Every hook defaults to a no-op.
pub trait Controller: Send + Sync {
    /// Type tag, also the registry key
    fn id(&self) -> &str;

    /// Display name
    fn name(&self) -> &str {
        self.id()
    }

    /// Primary color for timeline display
    fn color(&self) -> &str {
        "#666666"
    }

    /// Secondary color for timeline display
    fn color_secondary(&self) -> &str {
        "#333333"
    }

    /// Load media for an action and fill in derived fields such as `duration`
    fn preload<'a>(&'a self, params: PreloadParams<'a>) -> BoxFuture<'a, Result<Action, ControllerError>> {
        futures::future::ready(Ok(params.action)).boxed()
    }

    /// The action became active
    fn enter(&self, _params: &mut ControllerParams<'_>) {}

    /// Render pass for an active action
    fn update(&self, _params: &mut ControllerParams<'_>) {}

    /// The action stopped being active
    fn leave(&self, _params: &mut ControllerParams<'_>) {}

    /// Playback started while the action is active
    fn start(&self, _params: &mut ControllerParams<'_>) {}

    /// Playback stopped while the action is active
    fn stop(&self, _params: &mut ControllerParams<'_>) {}

    /// The engine was attached to a viewer
    fn viewer_update(&self, _viewer: &dyn Viewer, _scope: &str) {}

    /// Release every cached resource
    fn destroy(&self) {}

    /// Render a timeline background for a file, as a CSS `url(...)` value
    fn background_image<'a>(&'a self, _file: &'a MediaFile) -> BoxFuture<'a, Result<Option<String>, ControllerError>> {
        futures::future::ready(Ok(None)).boxed()
    }
}

/// Shared handle to a controller
#[derive(Clone)]
pub struct ControllerRef(Arc<dyn Controller>);

impl ControllerRef {
    /// Wrap a controller
    pub fn new(controller: impl Controller + 'static) -> Self {
        Self(Arc::new(controller))
    }

    /// Wrap an already shared controller
    pub fn from_arc(controller: Arc<dyn Controller>) -> Self {
        Self(controller)
    }

    /// Whether two handles point at the same controller
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for ControllerRef {
    type Target = dyn Controller;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Debug for ControllerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ControllerRef").field(&self.0.id()).finish()
    }
}

/// Controllers keyed by type tag, in registration order
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    controllers: IndexMap<String, ControllerRef>,
}

impl ControllerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller under its `id()`, replacing any previous one
    pub fn register(&mut self, controller: ControllerRef) -> Option<ControllerRef> {
        self.controllers.insert(controller.id().to_string(), controller)
    }

    /// Register a controller (builder style)
    pub fn with(mut self, controller: impl Controller + 'static) -> Self {
        self.register(ControllerRef::new(controller));
        self
    }

    /// Look up a controller by tag
    pub fn get(&self, tag: &str) -> Option<&ControllerRef> {
        self.controllers.get(tag)
    }

    /// Iterate controllers in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ControllerRef> {
        self.controllers.values()
    }

    /// Number of registered controllers
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}
