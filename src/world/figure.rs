//! Mesh records ("figures") consumed by the renderer
//!
//! Pure data with a few edit operations. Vertices are object-local; the figure's
//! center is added to every vertex when it is drawn.

use serde::{Serialize, Deserialize};
use crate::rasterizer::{Color, Vec3};
use super::SceneError;

/// A triangle mesh with a single display color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub name: String,
    vertices: Vec<Vec3>,
    /// Vertex indices, three per face
    faces: Vec<[usize; 3]>,
    /// One normal per face corner, parallel to `faces`
    normals: Vec<[Vec3; 3]>,
    color: Color,
    center: Vec3,
}

impl Figure {
    /// Build a figure, checking that every face index and normal slot is present
    pub fn from_parts(
        name: &str,
        vertices: Vec<Vec3>,
        faces: Vec<[usize; 3]>,
        normals: Vec<[Vec3; 3]>,
        color: Color,
        center: Vec3,
    ) -> Result<Self, SceneError> {
        let figure = Self {
            name: name.to_string(),
            vertices,
            faces,
            normals,
            color,
            center,
        };
        figure.validate()?;
        Ok(figure)
    }

    /// Check index validity. Rendering assumes this holds.
    pub fn validate(&self) -> Result<(), SceneError> {
        if self.normals.len() != self.faces.len() {
            return Err(SceneError::InvalidMesh {
                name: self.name.clone(),
                reason: format!(
                    "{} faces but {} normal triples",
                    self.faces.len(),
                    self.normals.len()
                ),
            });
        }

        for (i, face) in self.faces.iter().enumerate() {
            if let Some(&bad) = face.iter().find(|&&v| v >= self.vertices.len()) {
                return Err(SceneError::InvalidMesh {
                    name: self.name.clone(),
                    reason: format!(
                        "face {} references vertex {} of {}",
                        i,
                        bad,
                        self.vertices.len()
                    ),
                });
            }
        }

        Ok(())
    }

    /// Axis-aligned cube with edge length `size`, two triangles per side
    pub fn cube(size: f32, color: Color, center: Vec3) -> Self {
        let h = size / 2.0;

        let corners = [
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
        ];

        // (quad corners, outward normal)
        let sides: [([usize; 4], Vec3); 6] = [
            ([4, 5, 6, 7], Vec3::new(0.0, 0.0, 1.0)),  // Front
            ([1, 0, 3, 2], Vec3::new(0.0, 0.0, -1.0)), // Back
            ([7, 6, 2, 3], Vec3::new(0.0, 1.0, 0.0)),  // Top
            ([0, 1, 5, 4], Vec3::new(0.0, -1.0, 0.0)), // Bottom
            ([5, 1, 2, 6], Vec3::new(1.0, 0.0, 0.0)),  // Right
            ([0, 4, 7, 3], Vec3::new(-1.0, 0.0, 0.0)), // Left
        ];

        let mut faces = Vec::with_capacity(12);
        let mut normals = Vec::with_capacity(12);
        for (q, n) in sides {
            faces.push([q[0], q[1], q[2]]);
            faces.push([q[0], q[2], q[3]]);
            normals.push([n; 3]);
            normals.push([n; 3]);
        }

        Self {
            name: "cube".to_string(),
            vertices: corners.to_vec(),
            faces,
            normals,
            color,
            center,
        }
    }

    pub fn count_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn count_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Vertex indices of face `i`
    pub fn face(&self, i: usize) -> [usize; 3] {
        self.faces[i]
    }

    /// Object-local position of vertex `i`
    pub fn vert(&self, i: usize) -> Vec3 {
        self.vertices[i]
    }

    /// Normal at corner `corner` (0..3) of face `face`
    pub fn norm(&self, face: usize, corner: usize) -> Vec3 {
        self.normals[face][corner]
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn set_center(&mut self, center: Vec3) {
        self.center = center;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Scale local vertices per axis. Normals follow the inverse scale and are renormalized.
    pub fn scale(&mut self, k: Vec3) -> Result<(), SceneError> {
        if !k.is_finite() || k.x == 0.0 || k.y == 0.0 || k.z == 0.0 {
            return Err(SceneError::InvalidEdit(format!(
                "scale factors must be finite and non-zero, got ({}, {}, {})",
                k.x, k.y, k.z
            )));
        }

        for v in &mut self.vertices {
            *v = v.mul_elem(k);
        }

        let inv = Vec3::new(1.0 / k.x, 1.0 / k.y, 1.0 / k.z);
        for tri in &mut self.normals {
            for n in tri.iter_mut() {
                // zero normals stay zero
                if let Ok(scaled) = n.mul_elem(inv).normalize() {
                    *n = scaled;
                }
            }
        }
        Ok(())
    }

    /// Rotate local vertices and normals by Euler angles in degrees, X then Y then Z.
    pub fn rotate(&mut self, degrees: Vec3) {
        let (sx, cx) = degrees.x.to_radians().sin_cos();
        let (sy, cy) = degrees.y.to_radians().sin_cos();
        let (sz, cz) = degrees.z.to_radians().sin_cos();

        let rotate = |v: Vec3| {
            let v = Vec3::new(v.x, cx * v.y - sx * v.z, sx * v.y + cx * v.z);
            let v = Vec3::new(cy * v.x + sy * v.z, v.y, -sy * v.x + cy * v.z);
            Vec3::new(cz * v.x - sz * v.y, sz * v.x + cz * v.y, v.z)
        };

        for v in &mut self.vertices {
            *v = rotate(*v);
        }
        for tri in &mut self.normals {
            for n in tri.iter_mut() {
                *n = rotate(*n);
            }
        }
    }
}
