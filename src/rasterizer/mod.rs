//! Scanline software rasterizer
//!
//! Features:
//! - Look-at camera with viewport and projection matrices
//! - Half-triangle scanline fill with linear (not perspective-correct) interpolation
//! - Per-vertex point-light intensity, interpolated across each triangle
//! - Depth buffer where larger depth values are nearer the viewer

mod buffers;
mod camera;
mod light;
mod math;
mod render;
mod types;

pub use buffers::*;
pub use camera::*;
pub use light::*;
pub use math::*;
pub use render::*;
pub use types::*;

/// Depth range the viewport matrix maps onto
pub const DEPTH: f32 = 255.0;

/// Pixels a projected vertex may sit outside the canvas and still be rasterized
pub const FAULT: i32 = 5;

/// Ambient intensity floor
pub const BG_LIGHT: f32 = 0.3;

/// Reflectivity applied to every light's power
pub const LIGHT_REFLECT: f32 = 1.0;

/// Extra row/column allocated on each axis of the per-pixel buffers
pub const BUFFER_MARGIN: usize = 1;
