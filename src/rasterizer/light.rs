//! Point lights and per-vertex intensity

use serde::{Serialize, Deserialize};
use super::math::Vec3;
use super::{BG_LIGHT, LIGHT_REFLECT};

/// Power given to lights created without an explicit value
pub const DEFAULT_LIGHT_POWER: f32 = 500.0;

/// Omnidirectional light at a point in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightSourcePoint {
    position: Vec3,
    power: f32,
}

impl LightSourcePoint {
    pub fn new(position: Vec3, power: f32) -> Self {
        Self { position, power }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn power(&self) -> f32 {
        self.power
    }

    pub fn set_power(&mut self, power: f32) {
        self.power = power;
    }
}

impl Default for LightSourcePoint {
    fn default() -> Self {
        Self::new(Vec3::ZERO, DEFAULT_LIGHT_POWER)
    }
}

/// Lighting intensity of a vertex, in `[BG_LIGHT, 1]`.
///
/// Each light contributes `(d · n) / |d|²` scaled by its power, where `d` points from the
/// light to the vertex. Contributions are clamped to [0, 1], lifted into [BG_LIGHT, 1]
/// and averaged over all lights. No lights gives the ambient floor.
pub fn compute_intensity(vertex: Vec3, normal: Vec3, lights: &[LightSourcePoint]) -> f32 {
    let mut whole = 0.0;

    for light in lights {
        let dir = vertex - light.position;
        let mut intensity = dir.dot(normal) / dir.dot(dir);
        intensity *= light.power * LIGHT_REFLECT;

        // max/min rather than clamp: a NaN contribution (vertex on the light) becomes 0
        intensity = intensity.max(0.0).min(1.0);

        whole += BG_LIGHT + intensity * (1.0 - BG_LIGHT);
    }

    if whole == 0.0 {
        BG_LIGHT
    } else {
        whole / lights.len() as f32
    }
}
