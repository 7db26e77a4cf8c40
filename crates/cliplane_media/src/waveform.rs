// SPDX-License-Identifier: MIT OR Apache-2.0
//! Waveform background images for audio actions.

use crate::error::MediaError;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Parse `#rrggbb` or `#rrggbbaa`
pub fn parse_hex_color(color: &str) -> Option<Rgba<u8>> {
    let hex = color.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Rgba([channel(0)?, channel(2)?, channel(4)?, 255])),
        8 => Some(Rgba([channel(0)?, channel(2)?, channel(4)?, channel(6)?])),
        _ => None,
    }
}

/// Waveform image layout
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformOptions {
    /// Image height in pixels
    pub height: u32,
    /// Horizontal pixels per second of audio
    pub pixels_per_second: f64,
    /// Widest image produced
    pub max_width: u32,
    /// Background fill
    pub background: Rgba<u8>,
}

impl Default for WaveformOptions {
    fn default() -> Self {
        Self {
            height: 300,
            pixels_per_second: 100.0,
            max_width: 8192,
            background: Rgba([0, 0, 0, 0]),
        }
    }
}

/// Renders peak data to PNG files in a cache directory
#[derive(Debug, Clone)]
pub struct WaveformRenderer {
    dir: PathBuf,
    options: WaveformOptions,
}

impl WaveformRenderer {
    /// Create a renderer writing into `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), options: WaveformOptions::default() }
    }

    /// Set the layout options
    pub fn with_options(mut self, options: WaveformOptions) -> Self {
        self.options = options;
        self
    }

    /// Cache directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Layout options
    pub fn options(&self) -> &WaveformOptions {
        &self.options
    }

    /// Image width for a clip of `duration` seconds
    pub fn width_for(&self, duration: f64) -> u32 {
        let width = (duration.max(0.0) * self.options.pixels_per_second).ceil();
        (width as u32).clamp(1, self.options.max_width.max(1))
    }

    /// Draw mirrored peak bars around the horizontal center line
    pub fn render(&self, peaks: &[f32], width: u32, color: Rgba<u8>) -> RgbaImage {
        let height = self.options.height.max(1);
        let mut image = RgbaImage::from_pixel(width.max(1), height, self.options.background);
        let mid = height / 2;
        for x in 0..image.width() {
            let peak = match peaks.len() {
                0 => 0.0,
                n => peaks[(x as usize * n / image.width() as usize).min(n - 1)],
            };
            let half = ((peak.clamp(0.0, 1.0) * height as f32 / 2.0) as u32).max(1);
            for y in mid.saturating_sub(half)..(mid + half).min(height) {
                image.put_pixel(x, y, color);
            }
        }
        image
    }

    /// Encode `image` as PNG under the cache directory
    pub async fn save(&self, name: &str, image: &RgbaImage) -> Result<PathBuf, MediaError> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;
        let path = self.dir.join(format!("{}.waveform.png", sanitize(name)));
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;
        Ok(path)
    }

    /// Render and save, returning a CSS `url(...)` value
    pub async fn render_to_url(
        &self,
        name: &str,
        peaks: &[f32],
        duration: f64,
        color: Rgba<u8>,
    ) -> Result<String, MediaError> {
        let image = self.render(peaks, self.width_for(duration), color);
        let path = self.save(name, &image).await?;
        Ok(format!("url({})", path.display()))
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
