//! Core rendering functions
//! Frame orchestration, per-object projection and lighting, scanline triangle fill

use std::ops::AddAssign;
use thiserror::Error;
use tracing::{debug, trace};

use super::buffers::{Canvas, ColorCache, DepthBuffer};
use super::camera::{look_at, perspective, viewport, Camera};
use super::light::{compute_intensity, LightSourcePoint};
use super::math::{Mat4, MathError, Vec3i};
use super::types::{Color, ProjectionMode, RenderSettings};
use super::{BG_LIGHT, FAULT};
use crate::world::{Figure, Scene};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("camera pose is degenerate: {0}")]
    Camera(#[from] MathError),
    #[error("canvas is {got_w}x{got_h} but the renderer draws {want_w}x{want_h}")]
    CanvasSize {
        got_w: usize,
        got_h: usize,
        want_w: usize,
        want_h: usize,
    },
}

/// Counters for one frame (or one object)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub objects: usize,
    pub triangles_drawn: usize,
    /// Skipped by the Z window around the camera
    pub triangles_clipped: usize,
    /// Skipped because a vertex projected outside the tolerance rectangle
    pub triangles_offscreen: usize,
    pub pixels_written: usize,
}

impl AddAssign for FrameStats {
    fn add_assign(&mut self, o: FrameStats) {
        self.objects += o.objects;
        self.triangles_drawn += o.triangles_drawn;
        self.triangles_clipped += o.triangles_clipped;
        self.triangles_offscreen += o.triangles_offscreen;
        self.pixels_written += o.pixels_written;
    }
}

/// Edge endpoints for one scanline, ordered so `a.x <= b.x`
#[derive(Debug, Clone, Copy)]
struct Span {
    a: Vec3i,
    ia: f32,
    b: Vec3i,
    ib: f32,
}

/// Software render pipeline. Owns the depth buffer and color cache.
pub struct Renderer {
    settings: RenderSettings,
    depth: DepthBuffer,
    colors: ColorCache,
}

impl Renderer {
    pub fn new(settings: RenderSettings) -> Self {
        let depth = DepthBuffer::new(settings.width, settings.height);
        let colors = ColorCache::new(settings.width, settings.height, settings.background);
        Self {
            settings,
            depth,
            colors,
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn width(&self) -> usize {
        self.settings.width
    }

    pub fn height(&self) -> usize {
        self.settings.height
    }

    pub fn set_projection(&mut self, projection: ProjectionMode) {
        self.settings.projection = projection;
    }

    pub fn set_background(&mut self, background: Color) {
        self.settings.background = background;
    }

    /// Reallocate buffers for a new canvas size. No-op when the size is unchanged.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.settings.width && height == self.settings.height {
            return;
        }
        debug!("resizing render buffers to {}x{}", width, height);
        self.settings.width = width;
        self.settings.height = height;
        self.depth = DepthBuffer::new(width, height);
        self.colors = ColorCache::new(width, height, self.settings.background);
    }

    pub fn depth_buffer(&self) -> &DepthBuffer {
        &self.depth
    }

    pub fn color_cache(&self) -> &ColorCache {
        &self.colors
    }

    /// Reset depth and color for a new frame
    pub fn clear(&mut self) {
        self.depth.clear();
        self.colors.clear(self.settings.background);
    }

    /// Draw every figure of `scene` and publish the result to `canvas`.
    ///
    /// An empty scene produces a background-only frame. A degenerate camera aborts the
    /// frame before anything is published.
    pub fn render_frame<C: Canvas>(
        &mut self,
        scene: &Scene,
        canvas: &mut C,
    ) -> Result<FrameStats, RenderError> {
        if canvas.width() != self.width() || canvas.height() != self.height() {
            return Err(RenderError::CanvasSize {
                got_w: canvas.width(),
                got_h: canvas.height(),
                want_w: self.width(),
                want_h: self.height(),
            });
        }

        self.clear();
        canvas.fill(self.settings.background);

        // Lights are read once per frame
        let lights: Vec<LightSourcePoint> = scene.lights().copied().collect();

        let mut stats = FrameStats::default();
        for figure in scene.figures() {
            stats += self.process_object(figure, &scene.camera, &lights)?;
        }

        for y in 0..self.height() {
            for x in 0..self.width() {
                canvas.set(x, y, self.colors.get(x, y));
            }
        }
        canvas.flush();

        debug!(
            "frame: {} objects, {} triangles drawn, {} clipped, {} offscreen, {} pixels",
            stats.objects,
            stats.triangles_drawn,
            stats.triangles_clipped,
            stats.triangles_offscreen,
            stats.pixels_written
        );
        Ok(stats)
    }

    /// Projection matrix for the configured mode.
    ///
    /// `look_at` leaves the eye at `+focal_distance` on the view axis, so the perspective
    /// variant first shifts it to the origin. Its depth row is negated so that, like the
    /// minimal variant, larger depth means nearer.
    pub fn projection(&self, camera: &Camera) -> Mat4 {
        match self.settings.projection {
            ProjectionMode::Minimal => {
                let mut p = Mat4::identity();
                p[3][2] = -1.0 / camera.focal_distance();
                p
            }
            ProjectionMode::Perspective { fovy, near, far } => {
                let aspect = self.width() as f32 / self.height() as f32;
                let mut p = perspective(fovy, aspect, near, far);
                for v in p[2].iter_mut() {
                    *v = -*v;
                }
                let mut to_eye = Mat4::identity();
                to_eye[2][3] = -camera.focal_distance();
                p * to_eye
            }
        }
    }

    /// viewport * projection * modelView. The viewport covers the middle 3/4 of the canvas.
    pub fn mvp(&self, camera: &Camera) -> Result<Mat4, MathError> {
        let w = self.width() as i32;
        let h = self.height() as i32;

        let model_view = look_at(camera.pos, camera.view, camera.up)?;
        let view_port = viewport(w / 8, h / 8, w * 3 / 4, h * 3 / 4);

        Ok(view_port * self.projection(camera) * model_view)
    }

    /// Project, light and rasterize every face of one figure
    pub fn process_object(
        &mut self,
        figure: &Figure,
        camera: &Camera,
        lights: &[LightSourcePoint],
    ) -> Result<FrameStats, RenderError> {
        let mvp = self.mvp(camera)?;

        let cam_z_inc = camera.pos.z.abs() + 1.0;
        let cam_z_dec = camera.pos.z.abs() - 1.0;

        let center = figure.center();
        let color = figure.color();

        let mut stats = FrameStats {
            objects: 1,
            ..Default::default()
        };

        'faces: for i in 0..figure.count_faces() {
            let face = figure.face(i);

            let mut screen = [Vec3i::default(); 3];
            let mut intensity = [BG_LIGHT; 3];

            for j in 0..3 {
                let v = center + figure.vert(face[j]);

                if v.z > cam_z_dec && v.z > cam_z_inc {
                    trace!("face {} of '{}' outside Z window", i, figure.name);
                    stats.triangles_clipped += 1;
                    continue 'faces;
                }

                let p = mvp.project_point(v);
                if !p.is_finite() {
                    // vertex on the projection plane
                    stats.triangles_offscreen += 1;
                    continue 'faces;
                }

                screen[j] = Vec3i::from_vec3(p);
                intensity[j] = compute_intensity(v, figure.norm(i, j), lights);
            }

            if !screen.iter().all(|p| self.is_visible(*p)) {
                trace!("face {} of '{}' off screen", i, figure.name);
                stats.triangles_offscreen += 1;
                continue;
            }

            stats.pixels_written += self.rasterize_triangle(screen, color, intensity);
            stats.triangles_drawn += 1;
        }

        Ok(stats)
    }

    /// Whether a projected point lies within the canvas grown by `FAULT` on every side
    pub fn is_visible(&self, p: Vec3i) -> bool {
        let w = self.width() as i32;
        let h = self.height() as i32;
        !(p.x < -FAULT || p.x > w + FAULT || p.y < -FAULT || p.y > h + FAULT)
    }

    /// Scanline fill of one triangle with linearly interpolated depth and intensity.
    /// Returns the number of fragments that passed the depth test.
    pub fn rasterize_triangle(
        &mut self,
        points: [Vec3i; 3],
        color: Color,
        intensity: [f32; 3],
    ) -> usize {
        let [mut t0, mut t1, mut t2] = points;
        let [mut i0, mut i1, mut i2] = intensity;

        if t0.y == t1.y && t0.y == t2.y {
            return 0;
        }

        if t0.y > t1.y {
            std::mem::swap(&mut t0, &mut t1);
            std::mem::swap(&mut i0, &mut i1);
        }
        if t0.y > t2.y {
            std::mem::swap(&mut t0, &mut t2);
            std::mem::swap(&mut i0, &mut i2);
        }
        if t1.y > t2.y {
            std::mem::swap(&mut t1, &mut t2);
            std::mem::swap(&mut i1, &mut i2);
        }

        let sorted = [t0, t1, t2];
        let sorted_i = [i0, i1, i2];
        let w = self.width() as i32;
        let h = self.height() as i32;
        let mut written = 0;

        for row in 0..(t2.y - t0.y) {
            let Span { mut a, ia, mut b, ib } = scan_span(&sorted, &sorted_i, row);

            a.x = a.x.max(0);
            b.x = b.x.min(w);

            for j in a.x..=b.x {
                let phi = if b.x == a.x {
                    1.0
                } else {
                    (j - a.x) as f32 / (b.x - a.x) as f32
                };

                let (fa, fb) = (a.to_vec3(), b.to_vec3());
                let p = Vec3i::from_vec3(fa + (fb - fa) * phi);
                let ip = ia + (ib - ia) * phi;

                if p.x >= w || p.y >= h || p.x < 0 || p.y < 0 {
                    continue;
                }

                let (px, py) = (p.x as usize, p.y as usize);
                if self.depth.test_and_set(px, py, p.z as f32) {
                    self.colors.set(px, py, color.shade(ip));
                    written += 1;
                }
            }
        }

        written
    }
}

/// Long-edge and short-edge points for scanline `row` of a triangle sorted by ascending y
fn scan_span(t: &[Vec3i; 3], i: &[f32; 3], row: i32) -> Span {
    let [t0, t1, t2] = *t;
    let [i0, i1, i2] = *i;

    let total_height = t2.y - t0.y;
    let second_half = row > t1.y - t0.y || t1.y == t0.y;
    let segment_height = if second_half { t2.y - t1.y } else { t1.y - t0.y };

    let alpha = row as f32 / total_height as f32;
    let beta = (row - if second_half { t1.y - t0.y } else { 0 }) as f32 / segment_height as f32;

    // Interpolate in float: saturated depths near the eye plane span the whole i32 range
    let (f0, f1, f2) = (t0.to_vec3(), t1.to_vec3(), t2.to_vec3());
    let mut a = Vec3i::from_vec3(f0 + (f2 - f0) * alpha);
    let mut b = if second_half {
        Vec3i::from_vec3(f1 + (f2 - f1) * beta)
    } else {
        Vec3i::from_vec3(f0 + (f1 - f0) * beta)
    };

    let mut ia = i0 + (i2 - i0) * alpha;
    let mut ib = if second_half {
        i1 + (i2 - i1) * beta
    } else {
        i0 + (i1 - i0) * beta
    };

    if a.x > b.x {
        std::mem::swap(&mut a, &mut b);
        std::mem::swap(&mut ia, &mut ib);
    }

    Span { a, ia, b, ib }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::{Framebuffer, Vec3, DEPTH, DEPTH_EMPTY};
    use proptest::prelude::*;

    fn renderer(width: usize, height: usize) -> Renderer {
        Renderer::new(RenderSettings {
            width,
            height,
            background: Color::BLACK,
            projection: ProjectionMode::Minimal,
        })
    }

    fn tri(a: (i32, i32, i32), b: (i32, i32, i32), c: (i32, i32, i32)) -> [Vec3i; 3] {
        [
            Vec3i::new(a.0, a.1, a.2),
            Vec3i::new(b.0, b.1, b.2),
            Vec3i::new(c.0, c.1, c.2),
        ]
    }

    #[test]
    fn fills_small_triangle_with_unshaded_color() {
        let mut r = renderer(5, 5);
        let written = r.rasterize_triangle(tri((0, 0, 1), (4, 0, 1), (2, 4, 1)), Color::RED, [1.0; 3]);
        assert!(written > 0);

        let mut touched = 0;
        for y in 0..5 {
            for x in 0..5 {
                let z = r.depth_buffer().get(x, y);
                if z == DEPTH_EMPTY {
                    assert_eq!(r.color_cache().get(x, y), Color::BLACK);
                } else {
                    assert_eq!(z, 1.0);
                    assert_eq!(r.color_cache().get(x, y), Color::RED);
                    touched += 1;
                }
            }
        }
        assert_eq!(touched, written);

        // whole bottom edge and the middle column up to the apex row
        for x in 0..5 {
            assert_eq!(r.depth_buffer().get(x, 0), 1.0);
        }
        for y in 0..4 {
            assert_eq!(r.depth_buffer().get(2, y), 1.0);
        }
        // apex row itself is not scanned
        assert_eq!(r.depth_buffer().get(2, 4), DEPTH_EMPTY);
    }

    #[test]
    fn vertex_order_does_not_matter() {
        let mut a = renderer(8, 8);
        let mut b = renderer(8, 8);
        let na = a.rasterize_triangle(tri((0, 0, 3), (6, 2, 3), (3, 7, 3)), Color::RED, [1.0; 3]);
        let nb = b.rasterize_triangle(tri((3, 7, 3), (0, 0, 3), (6, 2, 3)), Color::RED, [1.0; 3]);
        assert_eq!(na, nb);
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(a.depth_buffer().get(x, y), b.depth_buffer().get(x, y));
            }
        }
    }

    #[test]
    fn flat_triangle_writes_nothing() {
        let mut r = renderer(10, 10);
        let n = r.rasterize_triangle(tri((0, 3, 5), (9, 3, 5), (4, 3, 5)), Color::RED, [1.0; 3]);
        assert_eq!(n, 0);
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(r.depth_buffer().get(x, y), DEPTH_EMPTY);
            }
        }
    }

    #[test]
    fn nearer_triangle_wins_regardless_of_order() {
        let near = tri((0, 0, 10), (7, 0, 10), (0, 7, 10));
        let far = tri((0, 0, 2), (7, 0, 2), (0, 7, 2));

        let mut r = renderer(8, 8);
        r.rasterize_triangle(far, Color::BLUE, [1.0; 3]);
        r.rasterize_triangle(near, Color::RED, [1.0; 3]);
        assert_eq!(r.color_cache().get(1, 1), Color::RED);

        let mut r = renderer(8, 8);
        r.rasterize_triangle(near, Color::RED, [1.0; 3]);
        let overwritten = r.rasterize_triangle(far, Color::BLUE, [1.0; 3]);
        assert_eq!(overwritten, 0);
        assert_eq!(r.color_cache().get(1, 1), Color::RED);
        assert_eq!(r.depth_buffer().get(1, 1), 10.0);
    }

    #[test]
    fn equal_depth_does_not_overwrite() {
        let t = tri((0, 0, 4), (7, 0, 4), (0, 7, 4));
        let mut r = renderer(8, 8);
        r.rasterize_triangle(t, Color::RED, [1.0; 3]);
        assert_eq!(r.rasterize_triangle(t, Color::GREEN, [1.0; 3]), 0);
        assert_eq!(r.color_cache().get(0, 0), Color::RED);
    }

    #[test]
    fn intensity_is_interpolated_linearly() {
        // uniform ramp along x: left edge 0.0, right edge 1.0
        let mut r = renderer(12, 12);
        r.rasterize_triangle(
            tri((0, 0, 1), (10, 0, 1), (0, 10, 1)),
            Color::new(200, 200, 200),
            [0.0, 1.0, 0.0],
        );
        let left = r.color_cache().get(0, 0).r;
        let mid = r.color_cache().get(5, 0).r;
        let right = r.color_cache().get(10, 0).r;
        assert_eq!(left, 0);
        assert_eq!(mid, 100);
        assert_eq!(right, 200);
    }

    #[test]
    fn fragments_outside_canvas_are_dropped() {
        let mut r = renderer(4, 4);
        let n = r.rasterize_triangle(tri((-3, -2, 1), (8, -2, 1), (2, 7, 1)), Color::RED, [1.0; 3]);
        assert!(n > 0);
        assert!(n <= 16);
    }

    #[test]
    fn visibility_accepts_exact_tolerance_rectangle() {
        let r = renderer(20, 10);
        let (w, h) = (20, 10);
        assert!(r.is_visible(Vec3i::new(-FAULT, -FAULT, 0)));
        assert!(r.is_visible(Vec3i::new(w + FAULT, h + FAULT, 0)));
        assert!(!r.is_visible(Vec3i::new(-FAULT - 1, 0, 0)));
        assert!(!r.is_visible(Vec3i::new(w + FAULT + 1, 0, 0)));
        assert!(!r.is_visible(Vec3i::new(0, -FAULT - 1, 0)));
        assert!(!r.is_visible(Vec3i::new(0, h + FAULT + 1, 0)));
    }

    #[test]
    fn empty_scene_renders_background() {
        let mut r = renderer(16, 12);
        r.set_background(Color::BLUE);
        let mut fb = Framebuffer::new(16, 12);
        let stats = r.render_frame(&Scene::default(), &mut fb).unwrap();
        assert_eq!(stats, FrameStats::default());
        assert_eq!(fb.frames(), 1);
        for y in 0..12 {
            for x in 0..16 {
                assert_eq!(fb.get_pixel(x, y), Color::BLUE);
            }
        }
    }

    #[test]
    fn object_behind_z_window_draws_nothing() {
        let mut scene = Scene::default();
        scene.add_figure(Figure::cube(1.0, Color::RED, Vec3::new(0.0, 0.0, 10.0)));

        let mut r = renderer(64, 48);
        let mut fb = Framebuffer::new(64, 48);
        let stats = r.render_frame(&scene, &mut fb).unwrap();

        assert_eq!(stats.objects, 1);
        assert_eq!(stats.triangles_clipped, 12);
        assert_eq!(stats.pixels_written, 0);
        for y in 0..48 {
            for x in 0..64 {
                assert_eq!(fb.get_pixel(x, y), Color::BLACK);
            }
        }
    }

    #[test]
    fn cube_in_front_of_camera_is_drawn() {
        let color = Color::new(200, 100, 50);
        let mut scene = Scene::default();
        scene.add_figure(Figure::cube(1.0, color, Vec3::ZERO));

        let mut r = renderer(640, 480);
        let mut fb = Framebuffer::new(640, 480);
        let stats = r.render_frame(&scene, &mut fb).unwrap();

        assert_eq!(stats.triangles_drawn, 12);
        assert!(stats.pixels_written > 0);
        // the default light sits on the side the outward normals face, so d·n < 0
        assert_eq!(fb.get_pixel(280, 250), color.shade(BG_LIGHT));
        // front face (z = 0.5) is nearer than the back face at this pixel
        let front = r.depth_buffer().get(280, 250);
        assert!(front > DEPTH / 2.0, "depth {} should be in the near half", front);
        // corners lie outside the projected cube
        assert_eq!(fb.get_pixel(5, 5), Color::BLACK);
    }

    #[test]
    fn saturated_depths_do_not_overflow() {
        let mut r = renderer(64, 64);
        let written = r.rasterize_triangle(
            tri((32, 32, i32::MAX), (32, 32, i32::MIN), (32, 42, 128)),
            Color::RED,
            [1.0; 3],
        );
        assert!(written > 0);
        for y in 32..42 {
            assert!(r.depth_buffer().get(32, y).is_finite());
        }
    }

    #[test]
    fn sliver_through_eye_plane_renders() {
        let n = Vec3::new(0.0, 0.0, 1.0);
        let sliver = Figure::from_parts(
            "sliver",
            vec![
                Vec3::new(0.0, 0.0, 3.9999998),
                Vec3::new(0.0, 0.0, 4.0000005),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
            vec![[n, n, n]],
            Color::RED,
            Vec3::ZERO,
        )
        .unwrap();
        let mut scene = Scene::default();
        scene.add_figure(sliver);

        let mut r = renderer(64, 64);
        let mut fb = Framebuffer::new(64, 64);
        let stats = r.render_frame(&scene, &mut fb).unwrap();
        assert_eq!(stats.objects, 1);
        assert_eq!(fb.frames(), 1);
    }

    #[test]
    fn perspective_mode_also_draws_nearest_surface() {
        let mut scene = Scene::default();
        scene.add_figure(Figure::cube(1.0, Color::WHITE, Vec3::ZERO));

        let mut r = renderer(320, 240);
        r.set_projection(ProjectionMode::Perspective { fovy: 60.0, near: 0.1, far: 100.0 });
        let mut fb = Framebuffer::new(320, 240);
        let stats = r.render_frame(&scene, &mut fb).unwrap();
        assert!(stats.pixels_written > 0);
        assert_ne!(fb.get_pixel(160, 120), Color::BLACK);
    }

    #[test]
    fn degenerate_camera_fails_the_frame() {
        let mut scene = Scene::default();
        scene.add_figure(Figure::cube(1.0, Color::RED, Vec3::ZERO));
        scene.camera.set_position(Vec3::ZERO, Vec3::ZERO, Vec3::UP);

        let mut r = renderer(32, 32);
        let mut fb = Framebuffer::new(32, 32);
        let err = r.render_frame(&scene, &mut fb);
        assert!(matches!(err, Err(RenderError::Camera(MathError::DegenerateDirection))));
        assert_eq!(fb.frames(), 0);
    }

    #[test]
    fn canvas_size_mismatch_is_rejected() {
        let mut r = renderer(32, 32);
        let mut fb = Framebuffer::new(16, 32);
        assert!(matches!(
            r.render_frame(&Scene::default(), &mut fb),
            Err(RenderError::CanvasSize { got_w: 16, .. })
        ));
    }

    #[test]
    fn resize_reallocates_buffers() {
        let mut r = renderer(8, 8);
        r.resize(16, 4);
        assert_eq!((r.width(), r.height()), (16, 4));
        assert_eq!(r.depth_buffer().width(), 16 + crate::rasterizer::BUFFER_MARGIN);
    }

    fn point() -> impl Strategy<Value = Vec3i> {
        (-10i32..40, -10i32..40, -50i32..300).prop_map(|(x, y, z)| Vec3i::new(x, y, z))
    }

    proptest! {
        #[test]
        fn span_is_ordered_left_to_right(a in point(), b in point(), c in point(), row_frac in 0.0f64..1.0) {
            let mut t = [a, b, c];
            t.sort_by_key(|p| p.y);
            let total = t[2].y - t[0].y;
            prop_assume!(total > 0);
            let row = ((total as f64 * row_frac) as i32).min(total - 1);
            let span = scan_span(&t, &[0.2, 0.5, 0.9], row);
            prop_assert!(span.a.x <= span.b.x);
        }

        #[test]
        fn final_depth_is_order_independent(a in point(), b in point(), c in point(),
                                            d in point(), e in point(), f in point()) {
            let t1 = [a, b, c];
            let t2 = [d, e, f];

            let mut fwd = renderer(32, 32);
            fwd.rasterize_triangle(t1, Color::RED, [1.0; 3]);
            fwd.rasterize_triangle(t2, Color::BLUE, [1.0; 3]);

            let mut rev = renderer(32, 32);
            rev.rasterize_triangle(t2, Color::BLUE, [1.0; 3]);
            rev.rasterize_triangle(t1, Color::RED, [1.0; 3]);

            for y in 0..32 {
                for x in 0..32 {
                    prop_assert_eq!(fwd.depth_buffer().get(x, y), rev.depth_buffer().get(x, y));
                }
            }
        }

        #[test]
        fn depth_never_decreases(a in point(), b in point(), c in point(),
                                 d in point(), e in point(), f in point()) {
            let mut r = renderer(32, 32);
            r.rasterize_triangle([a, b, c], Color::RED, [1.0; 3]);
            let before = r.depth_buffer().clone();
            r.rasterize_triangle([d, e, f], Color::BLUE, [1.0; 3]);

            for y in 0..32 {
                for x in 0..32 {
                    prop_assert!(r.depth_buffer().get(x, y) >= before.get(x, y));
                }
            }
        }
    }
}
