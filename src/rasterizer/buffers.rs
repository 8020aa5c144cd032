//! Per-pixel storage: depth buffer, color cache and the displayable framebuffer

use super::types::Color;
use super::BUFFER_MARGIN;

/// Value every depth slot is reset to; any finite depth beats it
pub const DEPTH_EMPTY: f32 = f32::NEG_INFINITY;

/// Per-pixel depth, larger values are nearer the viewer
#[derive(Debug, Clone)]
pub struct DepthBuffer {
    width: usize,
    height: usize,
    depth: Vec<f32>,
}

impl DepthBuffer {
    /// Buffer covering a `width × height` canvas plus the margin
    pub fn new(width: usize, height: usize) -> Self {
        let width = width + BUFFER_MARGIN;
        let height = height + BUFFER_MARGIN;
        Self {
            width,
            height,
            depth: vec![DEPTH_EMPTY; width * height],
        }
    }

    pub fn clear(&mut self) {
        self.depth.fill(DEPTH_EMPTY);
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.depth[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, z: f32) {
        self.depth[y * self.width + x] = z;
    }

    /// Store `z` if it is strictly nearer than what is there. Returns whether it was stored.
    pub fn test_and_set(&mut self, x: usize, y: usize, z: f32) -> bool {
        let idx = y * self.width + x;
        if self.depth[idx] < z {
            self.depth[idx] = z;
            true
        } else {
            false
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

/// Staging colors for the current frame
#[derive(Debug, Clone)]
pub struct ColorCache {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl ColorCache {
    pub fn new(width: usize, height: usize, background: Color) -> Self {
        let width = width + BUFFER_MARGIN;
        let height = height + BUFFER_MARGIN;
        Self {
            width,
            height,
            pixels: vec![background; width * height],
        }
    }

    pub fn clear(&mut self, background: Color) {
        self.pixels.fill(background);
    }

    pub fn get(&self, x: usize, y: usize) -> Color {
        self.pixels[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, color: Color) {
        self.pixels[y * self.width + x] = color;
    }
}

/// Destination for finished frames.
///
/// Rows are addressed in viewport order: `y = 0` is the bottom edge of the projected
/// scene. Presenters that draw top-down flip when displaying.
pub trait Canvas {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    /// Reset every pixel to `color`
    fn fill(&mut self, color: Color);
    fn set(&mut self, x: usize, y: usize, color: Color);
    /// Called once the whole frame has been written
    fn flush(&mut self) {}
}

/// RGBA framebuffer for software rendering
pub struct Framebuffer {
    pub pixels: Vec<u8>, // RGBA, 4 bytes per pixel
    pub width: usize,
    pub height: usize,
    frames: u64,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height * 4],
            width,
            height,
            frames: 0,
        }
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Color {
        let idx = (y * self.width + x) * 4;
        Color::with_alpha(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        )
    }

    /// Number of completed frames flushed into this buffer
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Copy with rows reordered top-down, ready for image files or screen textures
    pub fn to_top_down_rgba(&self) -> Vec<u8> {
        let row = self.width * 4;
        self.pixels
            .chunks_exact(row)
            .rev()
            .flatten()
            .copied()
            .collect()
    }

    /// Write the frame as a PNG, top row first
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        use image::error::{ParameterError, ParameterErrorKind};

        let img = image::RgbaImage::from_raw(
            self.width as u32,
            self.height as u32,
            self.to_top_down_rgba(),
        )
        .ok_or_else(|| {
            image::ImageError::Parameter(ParameterError::from_kind(
                ParameterErrorKind::DimensionMismatch,
            ))
        })?;
        img.save_with_format(path, image::ImageFormat::Png)
    }
}

impl Canvas for Framebuffer {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn fill(&mut self, color: Color) {
        let bytes = color.to_bytes();
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&bytes);
        }
    }

    fn set(&mut self, x: usize, y: usize, color: Color) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) * 4;
            self.pixels[idx..idx + 4].copy_from_slice(&color.to_bytes());
        }
    }

    fn flush(&mut self) {
        self.frames += 1;
    }
}
