// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render surfaces and the viewer that hosts them.
//!
//! The engine owns the `renderer` surface: it is cleared once per frame
//! before controllers draw into it in ascending z order.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A sized 2D drawing target
pub trait RenderSurface: Send {
    /// Current size in pixels
    fn size(&self) -> (u32, u32);

    /// Resize, discarding content
    fn resize(&mut self, width: u32, height: u32);

    /// Clear to transparent
    fn clear(&mut self);

    /// Draw `image` scaled into the `width`x`height` box at `(x, y)`
    fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64, width: u32, height: u32);
}

/// Render surface shared between the host, the engine and controllers
pub type SharedSurface = Arc<Mutex<dyn RenderSurface>>;

/// In-memory RGBA surface
#[derive(Debug, Clone)]
pub struct ImageSurface {
    canvas: RgbaImage,
    draw_calls: u64,
}

impl ImageSurface {
    /// Create a transparent surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: RgbaImage::new(width, height),
            draw_calls: 0,
        }
    }

    /// Wrap into a [`SharedSurface`]
    pub fn shared(width: u32, height: u32) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::new(width, height)))
    }

    /// Current pixels
    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Pixel at `(x, y)`, if inside the surface
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.canvas.get_pixel_checked(x, y).copied()
    }

    /// Number of draws since the last clear
    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }
}

impl RenderSurface for ImageSurface {
    fn size(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    fn resize(&mut self, width: u32, height: u32) {
        if self.canvas.dimensions() != (width, height) {
            self.canvas = RgbaImage::new(width, height);
        }
    }

    fn clear(&mut self) {
        for pixel in self.canvas.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
        self.draw_calls = 0;
    }

    fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if image.dimensions() == (width, height) {
            imageops::overlay(&mut self.canvas, image, x, y);
        } else {
            let scaled = imageops::resize(image, width, height, FilterType::Nearest);
            imageops::overlay(&mut self.canvas, &scaled, x, y);
        }
        self.draw_calls += 1;
    }
}

/// Roles of the elements a viewer exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerRole {
    /// Composited output surface (required)
    Renderer,
    /// Playback surface for recorded versions
    Screener,
    /// Container for overlay elements
    Stage,
}

impl ViewerRole {
    /// Get the role attribute name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Renderer => "renderer",
            Self::Screener => "screener",
            Self::Stage => "stage",
        }
    }
}

/// Host element tree the engine renders into
pub trait Viewer: Send {
    /// Find the element with `role` scoped under the engine `scope`
    fn query(&self, scope: &str, role: ViewerRole) -> Option<SharedSurface>;
}

/// Viewer backed by a fixed table of elements
#[derive(Default)]
pub struct StaticViewer {
    elements: HashMap<(String, ViewerRole), SharedSurface>,
}

impl StaticViewer {
    /// Create a viewer with no elements
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewer with an [`ImageSurface`] renderer for `scope`
    pub fn headless(scope: &str, width: u32, height: u32) -> (Self, Arc<Mutex<ImageSurface>>) {
        let surface = ImageSurface::shared(width, height);
        let viewer = Self::new().with_element(scope, ViewerRole::Renderer, surface.clone());
        (viewer, surface)
    }

    /// Register an element
    pub fn with_element(mut self, scope: &str, role: ViewerRole, surface: SharedSurface) -> Self {
        self.elements.insert((scope.to_string(), role), surface);
        self
    }
}

impl Viewer for StaticViewer {
    fn query(&self, scope: &str, role: ViewerRole) -> Option<SharedSurface> {
        self.elements.get(&(scope.to_string(), role)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_and_clear() {
        let mut surface = ImageSurface::new(4, 4);
        let red = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
        surface.draw_image(&red, 0, 0, 4, 4);
        assert_eq!(surface.pixel(3, 3), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(surface.draw_calls(), 1);

        surface.clear();
        assert_eq!(surface.pixel(3, 3), Some(Rgba([0, 0, 0, 0])));
        assert_eq!(surface.draw_calls(), 0);
    }

    #[test]
    fn test_resize_discards_content() {
        let mut surface = ImageSurface::new(2, 2);
        surface.resize(8, 6);
        assert_eq!(surface.size(), (8, 6));
        assert_eq!(surface.pixel(7, 5), Some(Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn test_viewer_lookup_is_scoped() {
        let (viewer, _surface) = StaticViewer::headless("editor-a", 16, 9);
        assert!(viewer.query("editor-a", ViewerRole::Renderer).is_some());
        assert!(viewer.query("editor-b", ViewerRole::Renderer).is_none());
        assert!(viewer.query("editor-a", ViewerRole::Stage).is_none());
    }
}
