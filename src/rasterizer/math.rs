//! Vector and matrix math for the render pipeline
//!
//! Row-major 4x4 matrices acting on column vectors, so `a * b` applies `b` first.

use std::ops::{Add, Index, IndexMut, Mul, Neg, Sub};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Failure modes of the vector math
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    /// A zero-length (or non-finite) vector was normalized
    #[error("cannot normalize a degenerate direction vector")]
    DegenerateDirection,
}

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const UP: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };
    pub const X: Vec3 = Vec3 { x: 1.0, y: 0.0, z: 0.0 };
    pub const Z: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 1.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Euclidean length
    pub fn norm(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction.
    ///
    /// Returns [`MathError::DegenerateDirection`] for zero-length input instead of
    /// producing NaN components.
    pub fn normalize(self) -> Result<Vec3, MathError> {
        let l = self.norm();
        if l == 0.0 || !l.is_finite() {
            return Err(MathError::DegenerateDirection);
        }
        Ok(Vec3 {
            x: self.x / l,
            y: self.y / l,
            z: self.z / l,
        })
    }

    pub fn scale(self, s: f32) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }

    /// Component-wise product
    pub fn mul_elem(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: f32) -> Vec3 {
        self.scale(s)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl Index<usize> for Vec3 {
    type Output = f32;
    fn index(&self, i: usize) -> &f32 {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Vec3 index out of range: {}", i),
        }
    }
}

/// Integer screen-space point: pixel x/y plus quantized depth
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vec3i {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Vec3i {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Quantize a float point: each component is offset by 0.5 then truncated toward zero.
    /// Non-finite components saturate (`as` semantics), which the visibility test rejects.
    pub fn from_vec3(v: Vec3) -> Self {
        Self {
            x: (v.x + 0.5) as i32,
            y: (v.y + 0.5) as i32,
            z: (v.z + 0.5) as i32,
        }
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }
}

/// 4x4 homogeneous matrix, stored as rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    pub m: [[f32; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn zero() -> Self {
        Self { m: [[0.0; 4]; 4] }
    }

    /// Multiply `(x, y, z, 1)` and return the raw homogeneous result
    pub fn transform_homogeneous(&self, v: Vec3) -> [f32; 4] {
        let p = [v.x, v.y, v.z, 1.0];
        let mut out = [0.0; 4];
        for (i, row) in self.m.iter().enumerate() {
            out[i] = row.iter().zip(p.iter()).map(|(a, b)| a * b).sum();
        }
        out
    }

    /// Transform a point and read it back as a 3-vector, dividing by the resulting `w`.
    ///
    /// The divide is where the projection's last row takes effect; a zero `w` yields
    /// non-finite components rather than an error.
    pub fn project_point(&self, v: Vec3) -> Vec3 {
        let [x, y, z, w] = self.transform_homogeneous(v);
        Vec3::new(x / w, y / w, z / w)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, other: Mat4) -> Mat4 {
        let mut out = Mat4::zero();
        for i in 0..4 {
            for j in 0..4 {
                out.m[i][j] = (0..4).map(|k| self.m[i][k] * other.m[k][j]).sum();
            }
        }
        out
    }
}

impl Index<usize> for Mat4 {
    type Output = [f32; 4];
    fn index(&self, row: usize) -> &[f32; 4] {
        &self.m[row]
    }
}

impl IndexMut<usize> for Mat4 {
    fn index_mut(&mut self, row: usize) -> &mut [f32; 4] {
        &mut self.m[row]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vec3_dot() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert!((a.dot(b) - 32.0).abs() < 0.001);
    }

    #[test]
    fn test_vec3_cross() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 1.0, 0.0);
        let c = a.cross(b);
        assert!((c.z - 1.0).abs() < 0.001);
    }

    #[test]
    fn normalize_rejects_zero_vector() {
        assert_eq!(Vec3::ZERO.normalize(), Err(MathError::DegenerateDirection));
    }

    #[test]
    fn normalize_returns_unit_length() {
        let n = Vec3::new(3.0, 0.0, 4.0).normalize().unwrap();
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(n.x, 0.6, epsilon = 1e-6);
    }

    #[test]
    fn quantize_rounds_half_up_and_truncates_negatives() {
        assert_eq!(Vec3i::from_vec3(Vec3::new(1.5, 2.4, 0.0)), Vec3i::new(2, 2, 0));
        // -1.2 + 0.5 = -0.7 truncates toward zero
        assert_eq!(Vec3i::from_vec3(Vec3::new(-1.2, -0.4, 254.6)), Vec3i::new(0, 0, 255));
    }

    #[test]
    fn identity_is_neutral() {
        let mut a = Mat4::identity();
        a[0][3] = 2.0;
        a[1][1] = 3.0;
        assert_eq!(a * Mat4::identity(), a);
        assert_eq!(Mat4::identity() * a, a);
    }

    #[test]
    fn multiply_applies_right_operand_first() {
        let mut translate = Mat4::identity();
        translate[0][3] = 1.0;
        let mut scale = Mat4::identity();
        scale[0][0] = 2.0;

        let p = Vec3::new(1.0, 0.0, 0.0);
        assert_relative_eq!((scale * translate).project_point(p).x, 4.0);
        assert_relative_eq!((translate * scale).project_point(p).x, 3.0);
    }

    #[test]
    fn project_point_divides_by_w() {
        let mut m = Mat4::identity();
        m[3][2] = -0.5;
        // w = 1 - 0.5 * 1 = 0.5
        let p = m.project_point(Vec3::new(1.0, 2.0, 1.0));
        assert_relative_eq!(p.x, 2.0);
        assert_relative_eq!(p.y, 4.0);
        assert_relative_eq!(p.z, 2.0);
    }
}
