// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame loop driving an engine from a clock.

use cliplane_engine::{Clock, Engine, EventKind, PlayOptions};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Frames pumped
    pub frames: u64,
    /// Playhead when the loop stopped
    pub end_time: f64,
    /// Whether playback reached its end (as opposed to the frame limit)
    pub ended: bool,
    /// Playback state events in emission order
    pub events: Vec<EventKind>,
}

/// Plays an engine frame by frame
#[derive(Debug)]
pub struct Runner {
    engine: Engine,
    frame_interval: Duration,
    max_frames: Option<u64>,
}

impl Runner {
    /// Drive `engine` at `fps` frames per second
    pub fn new(engine: Engine, fps: u32) -> Self {
        Self {
            engine,
            frame_interval: Duration::from_nanos(1_000_000_000 / u64::from(fps.max(1))),
            max_frames: None,
        }
    }

    /// Stop after `frames` frames
    pub fn with_max_frames(mut self, frames: Option<u64>) -> Self {
        self.max_frames = frames;
        self
    }

    /// Time between frames
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// The driven engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The driven engine, mutably
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Take the engine back
    pub fn into_engine(self) -> Engine {
        self.engine
    }

    /// Play and pump frames until playback stops.
    ///
    /// `wait` is called with the frame interval between frames. Returns
    /// `None` if the engine refused to start.
    pub fn run(&mut self, clock: &dyn Clock, options: PlayOptions, mut wait: impl FnMut(Duration)) -> Option<RunReport> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let kinds = [EventKind::Play, EventKind::Paused, EventKind::Ended];
        let listeners: Vec<_> = kinds
            .iter()
            .map(|&kind| {
                let events = events.clone();
                (kind, self.engine.observe(kind, move |event, _| events.lock().push(event.kind())))
            })
            .collect();

        let started = self.engine.play(options);
        let mut frames = 0;
        if started {
            while self.engine.has_pending_frame() {
                if self.max_frames.is_some_and(|max| frames >= max) {
                    info!("Frame limit of {frames} reached");
                    self.engine.pause();
                    break;
                }
                self.engine.pump(clock);
                frames += 1;
                if frames % 60 == 0 {
                    debug!("Frame {frames} at {:.3}s", self.engine.time());
                }
                if self.engine.has_pending_frame() {
                    wait(self.frame_interval);
                }
            }
        }

        for (kind, id) in listeners {
            self.engine.off(kind, Some(id));
        }
        if !started {
            return None;
        }
        let events = std::mem::take(&mut *events.lock());
        Some(RunReport {
            frames,
            end_time: self.engine.time(),
            ended: events.contains(&EventKind::Ended),
            events,
        })
    }
}
