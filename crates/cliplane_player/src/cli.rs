// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line arguments.

use clap::Parser;
use std::path::PathBuf;

/// Headless timeline player
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project file to play (.ron or .json)
    #[arg(short = 'p', long = "project", value_name = "FILE")]
    pub project: PathBuf,

    /// Frame rate of the playback loop (overrides the project)
    #[arg(long = "fps", value_name = "N")]
    pub fps: Option<u32>,

    /// Play rate (overrides the project)
    #[arg(short = 'r', long = "rate", value_name = "RATE")]
    pub rate: Option<f64>,

    /// Stop at this time in seconds (overrides the project)
    #[arg(long = "to", value_name = "SECONDS")]
    pub to: Option<f64>,

    /// Keep playing after every action has left
    #[arg(long = "no-auto-end")]
    pub no_auto_end: bool,

    /// Render audio waveforms into this directory
    #[arg(long = "waveform-dir", value_name = "DIR")]
    pub waveform_dir: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long = "max-frames", value_name = "N")]
    pub max_frames: Option<u64>,

    /// Write the last rendered frame as PNG
    #[arg(short = 'o', long = "frame-out", value_name = "FILE")]
    pub frame_out: Option<PathBuf>,
}
