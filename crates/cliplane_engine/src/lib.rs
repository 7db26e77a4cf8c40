// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline playback engine for Cliplane.
//!
//! This crate schedules time-bounded media actions on a timeline:
//! - Action and track data model
//! - Controller contract for per-media-type lifecycle hooks
//! - Active set ordered by z for layered rendering
//! - Typed event emitter with veto support
//! - Frame-driven engine with an injectable clock
//!
//! ## Architecture
//!
//! The engine is single-threaded and cooperative. The host calls
//! [`Engine::on_animation_frame`] (or [`Engine::pump`] with a [`Clock`])
//! once per frame while a frame request is pending. Each frame advances the
//! playhead, reconciles entering/leaving actions and runs the render pass in
//! ascending z order.

pub mod action;
pub mod active_set;
pub mod build;
pub mod clock;
pub mod config;
pub mod controller;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod media_file;
pub mod surface;
pub mod track;

pub use action::{named_id, Action, ActionId, ActionInput, ActionState, Layer, VolumeSection};
pub use active_set::ActiveSet;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{EngineOptions, EngineSettings};
pub use controller::{
    action_time, wrap_offset_ms, Controller, ControllerParams, ControllerRef, ControllerRegistry,
    PreloadParams, TrackFlags,
};
pub use emitter::{EngineSnapshot, Emitter, Event, EventKind, EventKinds, ListenerId, Verdict};
pub use engine::{Engine, PlayOptions, PlayState};
pub use error::{BuildError, ControllerError, EngineError, MediaFileError};
pub use media_file::{file_name, resolve_src, MediaFile, MediaKind};
pub use surface::{ImageSurface, RenderSurface, SharedSurface, StaticViewer, Viewer, ViewerRole};
pub use track::{Track, TrackId};
