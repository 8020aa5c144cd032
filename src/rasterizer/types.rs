//! Core types for the rasterizer

use serde::{Serialize, Deserialize};

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Multiply each RGB channel by `intensity`, clamping the product to 0-255.
    /// Intensities above 1.0 brighten; alpha is left alone.
    pub fn shade(self, intensity: f32) -> Self {
        let channel = |c: u8| (c as f32 * intensity).clamp(0.0, 255.0) as u8;
        Self {
            r: channel(self.r),
            g: channel(self.g),
            b: channel(self.b),
            a: self.a,
        }
    }

    /// Convert to [u8; 4] for framebuffer
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Which projection matrix feeds the main draw path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectionMode {
    /// Identity with a single `-1/distance` entry in the last row
    Minimal,
    /// Full symmetric perspective (`fovy` in degrees)
    Perspective { fovy: f32, near: f32, far: f32 },
}

impl Default for ProjectionMode {
    fn default() -> Self {
        ProjectionMode::Minimal
    }
}

/// Rasterizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Output image width in pixels
    pub width: usize,
    /// Output image height in pixels
    pub height: usize,
    /// Color every pixel starts each frame with
    pub background: Color,
    pub projection: ProjectionMode,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            background: Color::new(30, 30, 35),
            projection: ProjectionMode::Minimal,
        }
    }
}
