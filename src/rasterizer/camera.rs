//! Look-at camera with incremental controls, plus the pure matrix builders
//! that turn its pose into screen coordinates.

use serde::{Serialize, Deserialize};
use super::math::{Mat4, MathError, Vec3};
use super::DEPTH;

/// Camera state
///
/// `strafe` is a cache derived from the other three vectors. It is only valid after
/// [`Camera::update`] has run following a change to `pos`, `view` or `up`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub pos: Vec3,
    pub view: Vec3,
    pub up: Vec3,
    #[serde(skip)]
    strafe: Vec3,
}

impl Camera {
    pub fn new(pos: Vec3, view: Vec3, up: Vec3) -> Self {
        Self {
            pos,
            view,
            up,
            strafe: Vec3::ZERO,
        }
    }

    pub fn set_position(&mut self, pos: Vec3, view: Vec3, up: Vec3) {
        self.pos = pos;
        self.view = view;
        self.up = up;
    }

    pub fn set_view(&mut self, view: Vec3) {
        self.view = view;
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
    }

    /// Cached strafe direction (see [`Camera::update`])
    pub fn strafe_vector(&self) -> Vec3 {
        self.strafe
    }

    /// Turn the view target around the camera position in the XZ plane by `speed` radians.
    pub fn rotate_view(&mut self, speed: f32) {
        let v = self.view - self.pos;
        let (sin, cos) = speed.sin_cos();

        self.view.z = self.pos.z + sin * v.x + cos * v.z;
        self.view.x = self.pos.x + cos * v.x - sin * v.z;
    }

    /// Orbit the camera position around the view target by `angle` degrees about the
    /// unit `axis` (Rodrigues rotation).
    pub fn rotate_position(&mut self, angle: f32, axis: Vec3) {
        let v = self.pos - self.view;
        let (sin_a, cos_a) = angle.to_radians().sin_cos();
        let t = 1.0 - cos_a;
        let (ax, ay, az) = (axis.x, axis.y, axis.z);

        let rotated = Vec3::new(
            (cos_a + t * ax * ax) * v.x
                + (t * ax * ay - az * sin_a) * v.y
                + (t * ax * az + ay * sin_a) * v.z,
            (t * ax * ay + az * sin_a) * v.x
                + (cos_a + t * ay * ay) * v.y
                + (t * ay * az - ax * sin_a) * v.z,
            (t * ax * az - ay * sin_a) * v.x
                + (t * ay * az + ax * sin_a) * v.y
                + (cos_a + t * az * az) * v.z,
        );

        self.pos = self.view + rotated;
    }

    /// Dolly along the horizontal projection of the view direction; height is kept.
    pub fn move_forward(&mut self, speed: f32) -> Result<(), MathError> {
        let mut v = self.view - self.pos;
        v.y = 0.0;
        let v = v.normalize()?;

        self.pos.x += v.x * speed;
        self.pos.z += v.z * speed;
        self.view.x += v.x * speed;
        self.view.z += v.z * speed;
        Ok(())
    }

    /// Slide sideways along the cached strafe vector (X/Z only).
    pub fn strafe(&mut self, speed: f32) {
        self.pos.x += self.strafe.x * speed;
        self.pos.z += self.strafe.z * speed;
        self.view.x += self.strafe.x * speed;
        self.view.z += self.strafe.z * speed;
    }

    /// Raise or lower the camera; the view target stays put.
    pub fn up_down(&mut self, speed: f32) {
        self.pos.y += speed;
    }

    /// Recompute the strafe vector from the current pose.
    pub fn update(&mut self) -> Result<(), MathError> {
        self.strafe = cross(self.view, self.pos, self.up).normalize()?;
        Ok(())
    }

    /// Distance between position and view target
    pub fn focal_distance(&self) -> f32 {
        (self.pos - self.view).norm()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::ZERO, Vec3::UP)
    }
}

/// `(a - b) × c`
pub fn cross(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (a - b).cross(c)
}

/// View matrix from an orthonormal basis built around `eye - center`.
///
/// The translation part moves `center` (not `eye`) to the origin.
pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Result<Mat4, MathError> {
    let z = (eye - center).normalize()?;
    let x = up.cross(z).normalize()?;
    let y = z.cross(x);

    let mut minv = Mat4::identity();
    let mut tr = Mat4::identity();

    for i in 0..3 {
        minv[0][i] = x[i];
        minv[1][i] = y[i];
        minv[2][i] = z[i];
        tr[i][3] = -center[i];
    }

    Ok(minv * tr)
}

/// Map the [-1, 1] cube onto the pixel rectangle at (x, y) of size w×h, and depth onto [0, DEPTH].
pub fn viewport(x: i32, y: i32, w: i32, h: i32) -> Mat4 {
    let mut m = Mat4::identity();

    m[0][3] = x as f32 + w as f32 / 2.0;
    m[1][3] = y as f32 + h as f32 / 2.0;
    m[2][3] = DEPTH / 2.0;

    m[0][0] = w as f32 / 2.0;
    m[1][1] = h as f32 / 2.0;
    m[2][2] = DEPTH / 2.0;

    m
}

/// Symmetric right-handed perspective projection; `fovy` is in degrees.
pub fn perspective(fovy: f32, aspect: f32, z_near: f32, z_far: f32) -> Mat4 {
    let tan_half_fovy = (fovy / 2.0).to_radians().tan();

    let mut m = Mat4::zero();
    m[0][0] = 1.0 / (aspect * tan_half_fovy);
    m[1][1] = 1.0 / tan_half_fovy;
    m[2][2] = -(z_far + z_near) / (z_far - z_near);
    m[2][3] = -(2.0 * z_far * z_near) / (z_far - z_near);
    m[3][2] = -1.0;
    m
}
