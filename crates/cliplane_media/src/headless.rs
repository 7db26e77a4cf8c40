// SPDX-License-Identifier: MIT OR Apache-2.0
//! Device-free media backends.
//!
//! - Audio: probes RIFF/WAVE headers for duration and peaks. Voices keep
//!   transport state only.
//! - Video: elements produce a solid frame tinted by playback position.
//! - Animation: reads Lottie JSON timing (`fr`, `ip`, `op`, `w`, `h`).
//!
//! Sources that cannot be probed report a duration of 0 (unknown) unless
//! a duration was registered for them.

use crate::backend::{AnimationBackend, AnimationPlayer, AudioBackend, AudioVoice, VideoBackend, VideoElement};
use crate::error::MediaError;
use cliplane_engine::{MediaFile, MediaKind};
use futures::future::BoxFuture;
use futures::FutureExt;
use image::{Rgba, RgbaImage};
use serde::Deserialize;
use std::collections::HashMap;

// ============================================================================
// WAV probing
// ============================================================================

/// PCM layout of a WAV file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    /// Channel count
    pub channels: u16,
    /// Samples per second
    pub sample_rate: u32,
    /// Bits per sample
    pub bits_per_sample: u16,
    /// Byte offset of the sample data
    pub data_offset: usize,
    /// Length of the sample data in bytes
    pub data_len: usize,
}

impl WavInfo {
    /// Parse the RIFF header
    pub fn parse(bytes: &[u8]) -> Result<Self, MediaError> {
        if bytes.get(0..4) != Some(b"RIFF".as_slice()) || bytes.get(8..12) != Some(b"WAVE".as_slice()) {
            return Err(MediaError::Decode("not a RIFF/WAVE file".to_string()));
        }
        let mut format = None;
        let mut pos = 12;
        while let (Some(id), Some(size)) = (bytes.get(pos..pos + 4), read_u32(bytes, pos + 4)) {
            let body = pos + 8;
            let size = size as usize;
            match id {
                b"fmt " => {
                    let channels = read_u16(bytes, body + 2);
                    let sample_rate = read_u32(bytes, body + 4);
                    let bits = read_u16(bytes, body + 14);
                    if let (Some(channels), Some(sample_rate), Some(bits)) = (channels, sample_rate, bits) {
                        format = Some((channels, sample_rate, bits));
                    }
                }
                b"data" => {
                    let (channels, sample_rate, bits_per_sample) =
                        format.ok_or_else(|| MediaError::Decode("data chunk before fmt chunk".to_string()))?;
                    if channels == 0 || sample_rate == 0 || bits_per_sample == 0 {
                        return Err(MediaError::Decode("empty sample format".to_string()));
                    }
                    return Ok(Self {
                        channels,
                        sample_rate,
                        bits_per_sample,
                        data_offset: body,
                        data_len: size.min(bytes.len().saturating_sub(body)),
                    });
                }
                _ => {}
            }
            pos = body + size + (size & 1);
        }
        Err(MediaError::Decode("no data chunk".to_string()))
    }

    /// Bytes per second of audio
    pub fn byte_rate(&self) -> f64 {
        f64::from(self.sample_rate) * f64::from(self.channels) * f64::from(self.bits_per_sample) / 8.0
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        self.data_len as f64 / self.byte_rate()
    }

    /// Peak amplitude per slice, across all channels.
    ///
    /// Supports 8-bit unsigned and 16-bit signed PCM.
    pub fn peaks(&self, bytes: &[u8], buckets: usize) -> Result<Vec<f32>, MediaError> {
        let data = bytes
            .get(self.data_offset..self.data_offset + self.data_len)
            .ok_or_else(|| MediaError::Decode("truncated sample data".to_string()))?;
        let samples: Vec<f32> = match self.bits_per_sample {
            8 => data.iter().map(|&b| (f32::from(b) - 128.0) / 128.0).collect(),
            16 => data
                .chunks_exact(2)
                .map(|c| f32::from(i16::from_le_bytes([c[0], c[1]])) / 32768.0)
                .collect(),
            bits => return Err(MediaError::Unsupported(format!("{bits}-bit PCM"))),
        };
        if buckets == 0 {
            return Ok(Vec::new());
        }
        let per_bucket = samples.len().div_ceil(buckets).max(1);
        let mut peaks: Vec<f32> = samples
            .chunks(per_bucket)
            .map(|chunk| chunk.iter().fold(0.0f32, |max, s| max.max(s.abs())))
            .collect();
        peaks.resize(buckets, 0.0);
        Ok(peaks)
    }
}

fn read_u16(bytes: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes(bytes.get(at..at + 2)?.try_into().ok()?))
}

fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_le_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
}

// ============================================================================
// Audio
// ============================================================================

/// Audio backend that probes WAV files
#[derive(Debug, Clone, Default)]
pub struct HeadlessAudioBackend {
    durations: HashMap<String, f64>,
}

impl HeadlessAudioBackend {
    /// Create a backend with no registered durations
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the duration of a source that cannot be probed
    pub fn with_duration(mut self, src: impl Into<String>, seconds: f64) -> Self {
        self.durations.insert(src.into(), seconds);
        self
    }

    async fn probe(&self, file: &MediaFile) -> Result<Option<(WavInfo, Vec<u8>)>, MediaError> {
        if !file.is_local() || file.kind != MediaKind::Audio {
            return Ok(None);
        }
        if !file.full_name.to_lowercase().ends_with(".wav") {
            return Ok(None);
        }
        let bytes = file.read().await?;
        let info = WavInfo::parse(&bytes)?;
        Ok(Some((info, bytes)))
    }
}

impl AudioBackend for HeadlessAudioBackend {
    fn load<'a>(&'a self, file: &'a MediaFile) -> BoxFuture<'a, Result<Box<dyn AudioVoice>, MediaError>> {
        async move {
            let duration = match self.durations.get(&file.src) {
                Some(duration) => *duration,
                None => self.probe(file).await?.map_or(0.0, |(info, _)| info.duration()),
            };
            Ok::<_, MediaError>(Box::new(HeadlessVoice::new(duration)) as Box<dyn AudioVoice>)
        }
        .boxed()
    }

    fn peaks<'a>(&'a self, file: &'a MediaFile, buckets: usize) -> BoxFuture<'a, Result<Vec<f32>, MediaError>> {
        async move {
            match self.probe(file).await? {
                Some((info, bytes)) => info.peaks(&bytes, buckets),
                None => Err(MediaError::Unsupported(file.src.clone())),
            }
        }
        .boxed()
    }
}

/// Transport state of a headless audio clip
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessVoice {
    duration: f64,
    playing: bool,
    position: f64,
    rate: f64,
    volume: f64,
    muted: bool,
}

impl HeadlessVoice {
    /// Create a stopped voice
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            playing: false,
            position: 0.0,
            rate: 1.0,
            volume: 1.0,
            muted: false,
        }
    }
}

impl AudioVoice for HeadlessVoice {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn seek(&mut self, position: f64) {
        self.position = if self.duration > 0.0 {
            position.clamp(0.0, self.duration)
        } else {
            position.max(0.0)
        };
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn is_muted(&self) -> bool {
        self.muted
    }
}

// ============================================================================
// Video
// ============================================================================

/// Video backend producing position-tinted frames
#[derive(Debug, Clone, Default)]
pub struct HeadlessVideoBackend {
    durations: HashMap<String, f64>,
}

impl HeadlessVideoBackend {
    /// Create a backend with no registered durations
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the duration of a source
    pub fn with_duration(mut self, src: impl Into<String>, seconds: f64) -> Self {
        self.durations.insert(src.into(), seconds);
        self
    }
}

impl VideoBackend for HeadlessVideoBackend {
    fn load<'a>(
        &'a self,
        file: &'a MediaFile,
        _width: u32,
        _height: u32,
    ) -> BoxFuture<'a, Result<Box<dyn VideoElement>, MediaError>> {
        let duration = self.durations.get(&file.src).copied().unwrap_or(0.0);
        futures::future::ready(Ok(Box::new(HeadlessVideo::new(duration)) as Box<dyn VideoElement>)).boxed()
    }
}

/// Headless video element
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessVideo {
    duration: f64,
    playing: bool,
    time: f64,
}

impl HeadlessVideo {
    /// Create a paused element
    pub fn new(duration: f64) -> Self {
        Self { duration, playing: false, time: 0.0 }
    }
}

impl VideoElement for HeadlessVideo {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn seek(&mut self, time: f64) {
        self.time = time.max(0.0);
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn frame(&self, width: u32, height: u32) -> RgbaImage {
        let progress = if self.duration > 0.0 {
            (self.time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let red = (progress * 255.0).round() as u8;
        RgbaImage::from_pixel(width, height, Rgba([red, 96, 255 - red, 255]))
    }
}

// ============================================================================
// Animation
// ============================================================================

/// Timing fields of a Lottie document
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LottieInfo {
    /// Frame rate
    #[serde(rename = "fr")]
    pub frame_rate: f64,
    /// First frame
    #[serde(rename = "ip")]
    pub in_point: f64,
    /// Last frame
    #[serde(rename = "op")]
    pub out_point: f64,
    /// Composition width
    #[serde(rename = "w", default)]
    pub width: u32,
    /// Composition height
    #[serde(rename = "h", default)]
    pub height: u32,
    /// Composition name
    #[serde(rename = "nm", default)]
    pub name: Option<String>,
}

impl LottieInfo {
    /// Parse a Lottie JSON document
    pub fn parse(bytes: &[u8]) -> Result<Self, MediaError> {
        let info: Self = serde_json::from_slice(bytes).map_err(|e| MediaError::Decode(e.to_string()))?;
        if info.frame_rate <= 0.0 || info.out_point < info.in_point {
            return Err(MediaError::Decode("invalid animation timing".to_string()));
        }
        Ok(info)
    }

    /// Length in seconds
    pub fn duration(&self) -> f64 {
        (self.out_point - self.in_point) / self.frame_rate
    }
}

/// Animation backend for local Lottie JSON files
#[derive(Debug, Clone, Copy, Default)]
pub struct LottieBackend;

impl AnimationBackend for LottieBackend {
    fn load<'a>(&'a self, file: &'a MediaFile) -> BoxFuture<'a, Result<Box<dyn AnimationPlayer>, MediaError>> {
        async move {
            let bytes = file.read().await?;
            let info = LottieInfo::parse(&bytes)?;
            Ok::<_, MediaError>(Box::new(LottiePlayer::new(info)) as Box<dyn AnimationPlayer>)
        }
        .boxed()
    }
}

/// Lottie timeline position
#[derive(Debug, Clone, PartialEq)]
pub struct LottiePlayer {
    info: LottieInfo,
    position_ms: f64,
}

impl LottiePlayer {
    /// Create a player held at the first frame
    pub fn new(info: LottieInfo) -> Self {
        Self { info, position_ms: 0.0 }
    }

    /// Document timing
    pub fn info(&self) -> &LottieInfo {
        &self.info
    }
}

impl AnimationPlayer for LottiePlayer {
    fn duration(&self) -> f64 {
        self.info.duration()
    }

    fn go_to_and_stop(&mut self, ms: f64) {
        self.position_ms = ms.clamp(0.0, self.info.duration() * 1000.0);
    }

    fn position_ms(&self) -> f64 {
        self.position_ms
    }

    fn current_frame(&self) -> f64 {
        (self.info.in_point + self.position_ms / 1000.0 * self.info.frame_rate).min(self.info.out_point)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a 16-bit mono WAV from samples
    pub(crate) fn wav_bytes(sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        out.extend_from_slice(&2u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            out.extend_from_slice(&s.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_wav_duration_and_peaks() {
        let mut samples = vec![0i16; 8000];
        samples[100] = i16::MAX;
        samples[6000] = -16384;
        let bytes = wav_bytes(8000, &samples);
        let info = WavInfo::parse(&bytes).unwrap();
        assert_eq!(info.channels, 1);
        assert!((info.duration() - 1.0).abs() < 1e-9);

        let peaks = info.peaks(&bytes, 4).unwrap();
        assert_eq!(peaks.len(), 4);
        assert!(peaks[0] > 0.99);
        assert_eq!(peaks[1], 0.0);
        assert!((peaks[3] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_wav_rejects_garbage() {
        assert!(matches!(WavInfo::parse(b"not audio"), Err(MediaError::Decode(_))));
        let mut bytes = wav_bytes(8000, &[0; 4]);
        bytes.truncate(20);
        assert!(WavInfo::parse(&bytes).is_err());
    }

    #[test]
    fn test_lottie_timing() {
        let info = LottieInfo::parse(br#"{"v":"5.7.0","fr":30,"ip":0,"op":90,"w":512,"h":256,"nm":"spin","layers":[]}"#)
            .unwrap();
        assert_eq!(info.duration(), 3.0);
        assert_eq!((info.width, info.height), (512, 256));

        let mut player = LottiePlayer::new(info);
        player.go_to_and_stop(1500.0);
        assert_eq!(player.current_frame(), 45.0);
        player.go_to_and_stop(10_000.0);
        assert_eq!(player.position_ms(), 3000.0);

        assert!(LottieInfo::parse(br#"{"fr":0,"ip":0,"op":10}"#).is_err());
    }

    #[test]
    fn test_headless_audio_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        std::fs::write(&path, wav_bytes(1000, &[0; 2500])).unwrap();
        let local = MediaFile::remote(path.to_string_lossy()).with_local_path(path.clone());
        let remote = MediaFile::remote("https://cdn.test/song.mp3");

        let backend = HeadlessAudioBackend::new().with_duration("https://cdn.test/song.mp3", 42.0);
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let voice = backend.load(&local).await.unwrap();
            assert!((voice.duration() - 2.5).abs() < 1e-9);
            assert_eq!(backend.load(&remote).await.unwrap().duration(), 42.0);
            assert!(backend.peaks(&remote, 10).await.is_err());
            assert_eq!(backend.peaks(&local, 10).await.unwrap().len(), 10);
        });
    }

    #[test]
    fn test_video_frame_tint_follows_position() {
        let mut video = HeadlessVideo::new(10.0);
        assert_eq!(video.frame(2, 2).get_pixel(0, 0), &Rgba([0, 96, 255, 255]));
        video.seek(10.0);
        assert_eq!(video.frame(2, 2).get_pixel(1, 1), &Rgba([255, 96, 0, 255]));
    }
}
