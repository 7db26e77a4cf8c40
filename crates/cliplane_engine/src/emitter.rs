// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed publish/subscribe for engine lifecycle events.
//!
//! Handlers run synchronously in registration order. A handler answering
//! [`Verdict::Deny`] to a `Before*` event cancels the change it announces.

use crate::engine::PlayState;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Event kinds consumers can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Before an explicit time change (cancellable)
    BeforeSetTime,
    /// After an explicit time change
    AfterSetTime,
    /// After a time change made by the frame tick
    SetTimeByTick,
    /// Before a play rate change (cancellable)
    BeforeSetPlayRate,
    /// After a play rate change
    AfterSetPlayRate,
    /// Playback started
    Play,
    /// Recording started
    Record,
    /// Playback paused
    Paused,
    /// Playback reached its end
    Ended,
    /// Timeline scroll position changed
    ScrollLeft,
}

impl EventKind {
    /// Get the event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeforeSetTime => "beforeSetTime",
            Self::AfterSetTime => "afterSetTime",
            Self::SetTimeByTick => "setTimeByTick",
            Self::BeforeSetPlayRate => "beforeSetPlayRate",
            Self::AfterSetPlayRate => "afterSetPlayRate",
            Self::Play => "play",
            Self::Record => "record",
            Self::Paused => "paused",
            Self::Ended => "ended",
            Self::ScrollLeft => "setScrollLeft",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Event payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Time is about to change
    BeforeSetTime {
        /// Requested time
        time: f64,
    },
    /// Time changed through `set_time`
    AfterSetTime {
        /// New time
        time: f64,
    },
    /// Time changed by the frame tick
    SetTimeByTick {
        /// New time
        time: f64,
    },
    /// Play rate is about to change
    BeforeSetPlayRate {
        /// Requested rate
        rate: f64,
    },
    /// Play rate changed
    AfterSetPlayRate {
        /// New rate
        rate: f64,
    },
    /// Playback started
    Play,
    /// Recording started
    Record,
    /// Playback paused
    Paused,
    /// Playback ended
    Ended,
    /// Timeline scrolled
    ScrollLeft {
        /// Scroll offset
        left: f64,
    },
}

impl Event {
    /// Get the kind of this event
    pub fn kind(&self) -> EventKind {
        match self {
            Self::BeforeSetTime { .. } => EventKind::BeforeSetTime,
            Self::AfterSetTime { .. } => EventKind::AfterSetTime,
            Self::SetTimeByTick { .. } => EventKind::SetTimeByTick,
            Self::BeforeSetPlayRate { .. } => EventKind::BeforeSetPlayRate,
            Self::AfterSetPlayRate { .. } => EventKind::AfterSetPlayRate,
            Self::Play => EventKind::Play,
            Self::Record => EventKind::Record,
            Self::Paused => EventKind::Paused,
            Self::Ended => EventKind::Ended,
            Self::ScrollLeft { .. } => EventKind::ScrollLeft,
        }
    }

    /// Time carried by time events
    pub fn time(&self) -> Option<f64> {
        match self {
            Self::BeforeSetTime { time }
            | Self::AfterSetTime { time }
            | Self::SetTimeByTick { time } => Some(*time),
            _ => None,
        }
    }

    /// Rate carried by rate events
    pub fn rate(&self) -> Option<f64> {
        match self {
            Self::BeforeSetPlayRate { rate } | Self::AfterSetPlayRate { rate } => Some(*rate),
            _ => None,
        }
    }
}

/// Engine state at the moment an event fired
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSnapshot {
    /// Engine ID
    pub engine_id: String,
    /// Current time in seconds
    pub time: f64,
    /// Current play rate
    pub play_rate: f64,
    /// Current play state
    pub state: PlayState,
}

/// Handler answer to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    /// Let the change happen
    #[default]
    Allow,
    /// Cancel the change (only meaningful for `Before*` events)
    Deny,
}

impl Verdict {
    /// Whether the change may proceed
    pub fn is_allowed(self) -> bool {
        self == Self::Allow
    }
}

impl From<bool> for Verdict {
    fn from(allow: bool) -> Self {
        if allow {
            Self::Allow
        } else {
            Self::Deny
        }
    }
}

/// Handle returned by [`Emitter::on`], used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// One or more event kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventKinds(Vec<EventKind>);

impl From<EventKind> for EventKinds {
    fn from(kind: EventKind) -> Self {
        Self(vec![kind])
    }
}

impl<const N: usize> From<[EventKind; N]> for EventKinds {
    fn from(kinds: [EventKind; N]) -> Self {
        Self(kinds.to_vec())
    }
}

impl From<&[EventKind]> for EventKinds {
    fn from(kinds: &[EventKind]) -> Self {
        Self(kinds.to_vec())
    }
}

type Handler = Arc<Mutex<dyn FnMut(&Event, &EngineSnapshot) -> Verdict + Send>>;

/// Event emitter with per-kind handler lists
#[derive(Default)]
pub struct Emitter {
    handlers: HashMap<EventKind, Vec<(ListenerId, Handler)>>,
    next_id: u64,
}

impl Emitter {
    /// Create an emitter with no handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one or more event kinds.
    ///
    /// A handler registered for several kinds shares one [`ListenerId`].
    pub fn on<F>(&mut self, kinds: impl Into<EventKinds>, handler: F) -> ListenerId
    where
        F: FnMut(&Event, &EngineSnapshot) -> Verdict + Send + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        let handler: Handler = Arc::new(Mutex::new(handler));
        for kind in kinds.into().0 {
            self.handlers.entry(kind).or_default().push((id, Arc::clone(&handler)));
        }
        id
    }

    /// Register a handler that only observes (never vetoes)
    pub fn observe<F>(&mut self, kinds: impl Into<EventKinds>, mut handler: F) -> ListenerId
    where
        F: FnMut(&Event, &EngineSnapshot) + Send + 'static,
    {
        self.on(kinds, move |event, snapshot| {
            handler(event, snapshot);
            Verdict::Allow
        })
    }

    /// Unregister handlers for `kind`: one listener, or all of them
    pub fn off(&mut self, kind: EventKind, listener: Option<ListenerId>) {
        match listener {
            Some(id) => {
                if let Some(list) = self.handlers.get_mut(&kind) {
                    list.retain(|(lid, _)| *lid != id);
                }
            }
            None => {
                self.handlers.remove(&kind);
            }
        }
    }

    /// Unregister every handler
    pub fn off_all(&mut self) {
        self.handlers.clear();
    }

    /// Number of handlers registered for `kind`
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Dispatch an event.
    ///
    /// All handlers run; the result is `Deny` if any of them denied.
    pub fn trigger(&self, event: Event, snapshot: &EngineSnapshot) -> Verdict {
        let Some(list) = self.handlers.get(&event.kind()) else {
            return Verdict::Allow;
        };
        let mut verdict = Verdict::Allow;
        for (_, handler) in list {
            if (&mut *handler.lock())(&event, snapshot) == Verdict::Deny {
                verdict = Verdict::Deny;
            }
        }
        verdict
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self.handlers.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("Emitter").field("handlers", &counts).finish()
    }
}
