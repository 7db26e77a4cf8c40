// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cliplane headless player.
//!
//! Loads a project file, builds its tracks with the headless media
//! controllers and plays the timeline in real time. The final rendered
//! frame can be written out as a PNG.

use clap::Parser;
use cliplane_engine::{named_id, Engine, EngineOptions, PlayOptions, StaticViewer, SystemClock};
use cliplane_media::{headless_registry, WaveformRenderer};
use cliplane_player::{Cli, PlayerError, ProjectFile, Runner};
use image::ImageFormat;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cliplane=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Cliplane v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(Cli::parse()) {
        tracing::error!("Playback failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), PlayerError> {
    let project = ProjectFile::load(&cli.project)?;
    let id = project.id.clone().unwrap_or_else(|| named_id("engine"));
    let settings = project.engine_settings();

    let registry = headless_registry(cli.waveform_dir.clone().map(WaveformRenderer::new));
    let (viewer, surface) = StaticViewer::headless(&id, settings.render_width, settings.render_height);
    let options = EngineOptions::with_id(id)
        .viewer(viewer)
        .controllers(registry.clone())
        .settings(settings);
    let mut engine = Engine::new(options)?;

    let rt = tokio::runtime::Builder::new_current_thread().build()?;
    let tracks = rt.block_on(engine.try_build_tracks(&registry, project.actions.clone()))?;
    engine.set_tracks(tracks);
    engine.set_play_rate(cli.rate.unwrap_or(project.play_rate));

    let play = PlayOptions {
        to_time: cli.to.or(project.to_time),
        auto_end: !cli.no_auto_end,
    };
    let fps = cli.fps.unwrap_or(project.fps);
    let mut runner = Runner::new(engine, fps).with_max_frames(cli.max_frames);
    let clock = SystemClock::new();
    let report = runner
        .run(&clock, play, std::thread::sleep)
        .ok_or(PlayerError::NotStarted)?;
    tracing::info!(
        "Played {} frames, stopped at {:.3}s{}",
        report.frames,
        report.end_time,
        if report.ended { " (ended)" } else { "" }
    );

    if let Some(path) = &cli.frame_out {
        runner.engine_mut().re_render();
        surface.lock().canvas().save_with_format(path, ImageFormat::Png)?;
        tracing::info!("Wrote frame to {}", path.display());
    }

    runner.engine_mut().dispose();
    Ok(())
}
