// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback behavior driven through the public engine API.

use cliplane_engine::{
    Action, ActionId, Clock, Controller, ControllerParams, ControllerRef, ControllerRegistry, Engine, EngineOptions,
    EventKind, ManualClock, PlayOptions, StaticViewer, Track, Verdict,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

type Log = Arc<Mutex<Vec<String>>>;

struct Recorder {
    log: Log,
}

impl Recorder {
    fn push(&self, hook: &str, params: &ControllerParams<'_>) {
        self.log.lock().push(format!("{hook}:{}", params.action.id));
    }
}

impl Controller for Recorder {
    fn id(&self) -> &str {
        "recorder"
    }

    fn enter(&self, params: &mut ControllerParams<'_>) {
        self.push("enter", params);
    }

    fn update(&self, params: &mut ControllerParams<'_>) {
        self.push("update", params);
    }

    fn leave(&self, params: &mut ControllerParams<'_>) {
        self.push("leave", params);
    }

    fn start(&self, params: &mut ControllerParams<'_>) {
        self.push("start", params);
    }

    fn stop(&self, params: &mut ControllerParams<'_>) {
        self.push("stop", params);
    }
}

fn engine() -> (Engine, Log) {
    let log: Log = Arc::default();
    let mut controllers = ControllerRegistry::new();
    controllers.register(ControllerRef::new(Recorder { log: Arc::clone(&log) }));
    let (viewer, _surface) = StaticViewer::headless("playback", 64, 36);
    let options = EngineOptions::with_id("playback").viewer(viewer).controllers(controllers);
    (Engine::new(options).unwrap(), log)
}

fn action(id: &str, start: f64, end: f64) -> Action {
    Action::new(id, start, end, "recorder")
}

fn entries(log: &Log, hook: &str) -> Vec<String> {
    let prefix = format!("{hook}:");
    log.lock()
        .iter()
        .filter_map(|line| line.strip_prefix(&prefix).map(str::to_string))
        .collect()
}

#[test]
fn sorted_ids_follow_start_times() {
    let (mut engine, _log) = engine();
    engine.set_tracks(vec![
        Track::single(action("five", 5.0, 6.0)),
        Track::single(action("zero", 0.0, 1.0)),
        Track::single(action("three", 3.0, 4.0)),
    ]);
    let starts: Vec<f64> = engine
        .sorted_ids()
        .iter()
        .map(|id| engine.action(id).unwrap().0.start)
        .collect();
    assert_eq!(starts, vec![0.0, 3.0, 5.0]);
}

#[test]
fn active_window_is_half_open() {
    let (mut engine, _log) = engine();
    engine.set_tracks(vec![Track::single(action("a", 2.0, 5.0))]);
    let id = ActionId::from("a");
    for (time, active) in [(1.0, false), (2.0, true), (4.999, true), (5.0, false), (3.0, true), (0.0, false)] {
        assert!(engine.set_time(time));
        assert_eq!(engine.active_ids().contains(&id), active, "at t={time}");
    }
}

#[test]
fn disabled_actions_never_enter() {
    let (mut engine, log) = engine();
    engine.set_tracks(vec![Track::single(action("off", 0.0, 5.0).disabled())]);
    engine.set_time(1.0);
    assert!(engine.active_ids().is_empty());
    assert!(entries(&log, "enter").is_empty());
}

#[test]
fn enter_and_leave_balance() {
    let (mut engine, log) = engine();
    engine.set_tracks(vec![
        Track::single(action("a", 0.0, 2.0)),
        Track::single(action("b", 1.0, 4.0)),
        Track::single(action("c", 3.0, 6.0)),
    ]);
    for time in [1.5, 3.5, 0.5, 5.0, 2.0, 7.0, 1.0] {
        engine.set_time(time);
        let mut open: HashMap<String, i32> = HashMap::new();
        for line in log.lock().iter() {
            if let Some(id) = line.strip_prefix("enter:") {
                *open.entry(id.to_string()).or_default() += 1;
            } else if let Some(id) = line.strip_prefix("leave:") {
                *open.entry(id.to_string()).or_default() -= 1;
            }
        }
        for (id, balance) in &open {
            assert!((0..=1).contains(balance), "{id} has balance {balance} at t={time}");
            assert_eq!(*balance == 1, engine.active_ids().contains(&ActionId::from(id.as_str())));
        }
    }

    engine.set_tracks(Vec::new());
    let mut enters = entries(&log, "enter");
    let mut leaves = entries(&log, "leave");
    enters.sort();
    leaves.sort();
    assert_eq!(enters, leaves);
}

#[test]
fn render_pass_runs_in_z_order() {
    let (mut engine, log) = engine();
    engine.set_tracks(vec![
        Track::single(action("z2", 0.0, 5.0).with_z(2)),
        Track::single(action("z0", 0.0, 5.0).with_z(0)),
        Track::single(action("z1", 0.0, 5.0).with_z(1)),
    ]);
    engine.re_render();
    assert_eq!(entries(&log, "update"), vec!["z0", "z1", "z2"]);
}

#[test]
fn equal_z_renders_in_enter_order() {
    let (mut engine, log) = engine();
    engine.set_tracks(vec![
        Track::single(action("late", 1.0, 5.0).with_z(1)),
        Track::single(action("early", 0.0, 5.0).with_z(1)),
    ]);
    engine.set_time(2.0);
    engine.re_render();
    assert_eq!(entries(&log, "update"), vec!["early", "late"]);
}

#[test]
fn pause_is_idempotent() {
    let (mut engine, _log) = engine();
    let paused = Arc::new(Mutex::new(0));
    let p = Arc::clone(&paused);
    engine.observe(EventKind::Paused, move |_, _| *p.lock() += 1);

    assert!(engine.play(PlayOptions::default()));
    engine.pause();
    engine.pause();
    assert_eq!(*paused.lock(), 1);
    assert!(engine.is_paused());
    assert!(!engine.has_pending_frame());
}

#[test]
fn non_positive_rates_are_rejected() {
    let (mut engine, _log) = engine();
    assert!(!engine.set_play_rate(0.0));
    assert!(!engine.set_play_rate(-1.0));
    assert_eq!(engine.play_rate(), 1.0);

    assert!(engine.set_play_rate(2.0));
    let clock = ManualClock::new();
    engine.play(PlayOptions::default());
    assert!(engine.pump(&clock));
    clock.advance(500.0);
    assert!(engine.pump(&clock));
    assert!((engine.time() - 1.0).abs() < 1e-9);
}

#[test]
fn rate_change_can_be_vetoed() {
    let (mut engine, _log) = engine();
    engine.on(EventKind::BeforeSetPlayRate, |event, _| Verdict::from(event.rate() != Some(3.0)));
    assert!(!engine.set_play_rate(3.0));
    assert_eq!(engine.play_rate(), 1.0);
    assert!(engine.set_play_rate(1.5));
}

#[test]
fn set_time_can_be_vetoed() {
    let (mut engine, _log) = engine();
    let after = Arc::new(Mutex::new(Vec::new()));
    let a = Arc::clone(&after);
    engine.on(EventKind::BeforeSetTime, |_, _| Verdict::Deny);
    engine.observe(EventKind::AfterSetTime, move |event, _| a.lock().push(event.time()));

    assert!(!engine.set_time(10.0));
    assert_eq!(engine.time(), 0.0);
    assert!(after.lock().is_empty());
}

#[test]
fn tick_delta_is_clamped() {
    let (mut engine, _log) = engine();
    let clock = ManualClock::new();
    engine.play(PlayOptions::default());
    engine.pump(&clock);
    clock.advance(5000.0);
    engine.pump(&clock);
    assert!((engine.time() - 1.0).abs() < 1e-9);
}

#[test]
fn ticks_emit_set_time_by_tick() {
    let (mut engine, _log) = engine();
    let kinds = Arc::new(Mutex::new(Vec::new()));
    let k = Arc::clone(&kinds);
    engine.observe([EventKind::AfterSetTime, EventKind::SetTimeByTick], move |event, _| k.lock().push(event.kind()));
    engine.play(PlayOptions::default());
    engine.on_animation_frame(10.0);
    engine.on_animation_frame(26.0);
    engine.set_time(0.0);
    assert_eq!(
        *kinds.lock(),
        vec![EventKind::SetTimeByTick, EventKind::SetTimeByTick, EventKind::AfterSetTime]
    );
}

#[test]
fn two_tracks_play_through_to_the_end() {
    let (mut engine, log) = engine();
    let ended_log = Arc::clone(&log);
    engine.observe(EventKind::Ended, move |_, _| ended_log.lock().push("ended".to_string()));
    engine.set_tracks(vec![
        Track::new("A").with_action(action("a", 0.0, 10.0).with_z(0)),
        Track::new("B").with_action(action("b", 3.0, 6.0).with_z(1)),
    ]);

    let clock = ManualClock::new();
    assert!(engine.play(PlayOptions::auto_end()));
    let advance_to = |engine: &mut Engine, target: f64| {
        while engine.is_playing() && engine.time() < target {
            clock.advance(100.0);
            engine.pump(&clock);
        }
    };

    advance_to(&mut engine, 4.0);
    assert_eq!(entries(&log, "enter"), vec!["a", "b"]);
    assert_eq!(engine.active_ids(), vec![ActionId::from("a"), ActionId::from("b")]);

    advance_to(&mut engine, 7.0);
    assert_eq!(entries(&log, "leave"), vec!["b"]);
    assert_eq!(engine.active_ids(), vec![ActionId::from("a")]);

    advance_to(&mut engine, 11.0);
    assert!(!engine.is_playing());
    assert!(engine.time() <= 11.0);
    assert_eq!(entries(&log, "leave"), vec!["b", "a"]);
    let lines = log.lock().clone();
    let leave_a = lines.iter().position(|l| l == "leave:a").unwrap();
    let ended = lines.iter().position(|l| l == "ended").unwrap();
    assert!(leave_a < ended);
    assert_eq!(lines.iter().filter(|l| *l == "ended").count(), 1);
}

#[test]
fn clock_reports_time() {
    let clock = ManualClock::new();
    clock.advance(42.0);
    assert_eq!(clock.now_ms(), 42.0);
}
