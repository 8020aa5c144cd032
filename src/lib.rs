//! Depthcast: scanline software rasterizer
//!
//! Turns a scene of triangle meshes, a look-at camera and point lights into a
//! depth-tested color image without a hardware pipeline:
//! - Camera, projection and viewport matrices
//! - Half-triangle scanline fill with a depth buffer
//! - Per-vertex point-light intensity, interpolated across faces
//!
//! Presentation is left to the caller through the [`rasterizer::Canvas`] trait.

pub mod config;
pub mod rasterizer;
pub mod world;

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
