//! Depthcast viewer: interactive window around the software rasterizer
//!
//! The renderer draws into a CPU framebuffer every frame; macroquad only uploads
//! and displays it.
//!
//! Controls:
//! - W/S dolly, A/D strafe, Q/E down/up
//! - Left/Right turn the view, R/F orbit around the target (1/2/3 pick the X/Y/Z axis)
//! - Backspace removes the newest figure, L the newest light
//! - F5 saves the scene, P writes a PNG screenshot

use std::path::PathBuf;

use depthcast::config::ViewerConfig;
use depthcast::rasterizer::{self, Framebuffer, FrameStats, Renderer, Vec3};
use depthcast::world::{load_scene, save_scene, Figure, Scene, SceneError};
use depthcast::VERSION;
use macroquad::prelude::*;
use tracing::{error, info, warn};

const CONFIG_PATH: &str = "depthcast.ron";
const SCREENSHOT_PATH: &str = "screenshot.png";
const DEFAULT_SCENE_PATH: &str = "scene.ron";

fn window_conf() -> Conf {
    let config = ViewerConfig::load(CONFIG_PATH).unwrap_or_default();
    Conf {
        window_title: format!("Depthcast v{}", VERSION),
        window_width: (config.render.width as f32 * config.display_scale) as i32,
        window_height: (config.render.height as f32 * config.display_scale) as i32,
        window_resizable: false,
        high_dpi: true,
        ..Default::default()
    }
}

/// Built-in scene shown when no scene file is configured
fn demo_scene() -> Scene {
    let mut scene = Scene::default();
    scene.add_figure(Figure::cube(1.0, rasterizer::Color::new(200, 60, 60), Vec3::ZERO));
    scene.add_figure(Figure::cube(0.5, rasterizer::Color::new(60, 200, 90), Vec3::new(1.2, 0.0, -1.0)));
    scene.add_figure(Figure::cube(0.6, rasterizer::Color::new(70, 110, 220), Vec3::new(-1.3, 0.4, -0.5)));
    scene.add_light(Vec3::new(-3.0, -2.0, -6.0), 40.0);
    scene
}

fn open_scene(config: &ViewerConfig) -> Scene {
    match &config.scene {
        Some(path) => match load_scene(path) {
            Ok(scene) => {
                info!("Loaded scene {}", path.display());
                scene
            }
            Err(e) => {
                error!("Failed to load {}: {}, using demo scene", path.display(), e);
                demo_scene()
            }
        },
        None => demo_scene(),
    }
}

/// Per-frame keyboard handling. Camera commands that hit a degenerate pose are reported
/// and otherwise ignored.
fn handle_input(scene: &mut Scene, config: &ViewerConfig, axis: &mut Vec3) {
    let speed = config.move_speed;
    let mut commands: Vec<Result<(), SceneError>> = Vec::new();

    if is_key_down(KeyCode::W) {
        commands.push(scene.move_camera(speed));
    }
    if is_key_down(KeyCode::S) {
        commands.push(scene.move_camera(-speed));
    }
    if is_key_down(KeyCode::A) {
        commands.push(scene.strafe_camera(-speed));
    }
    if is_key_down(KeyCode::D) {
        commands.push(scene.strafe_camera(speed));
    }
    if is_key_down(KeyCode::E) {
        commands.push(scene.up_down_camera(speed));
    }
    if is_key_down(KeyCode::Q) {
        commands.push(scene.up_down_camera(-speed));
    }
    if is_key_down(KeyCode::Left) {
        commands.push(scene.rotate_camera(-config.turn_speed));
    }
    if is_key_down(KeyCode::Right) {
        commands.push(scene.rotate_camera(config.turn_speed));
    }
    if is_key_down(KeyCode::R) {
        commands.push(scene.rotate_camera_position(config.orbit_speed, *axis));
    }
    if is_key_down(KeyCode::F) {
        commands.push(scene.rotate_camera_position(-config.orbit_speed, *axis));
    }

    for result in commands {
        if let Err(e) = result {
            warn!("camera command ignored: {}", e);
        }
    }

    if is_key_pressed(KeyCode::Key1) {
        *axis = Vec3::X;
    }
    if is_key_pressed(KeyCode::Key2) {
        *axis = Vec3::UP;
    }
    if is_key_pressed(KeyCode::Key3) {
        *axis = Vec3::Z;
    }

    if is_key_pressed(KeyCode::Backspace) {
        if let Some((id, figure)) = scene.remove_last_figure() {
            info!("Removed figure {:?} ({})", id, figure.name);
        }
    }
    if is_key_pressed(KeyCode::L) {
        if let Some((id, _)) = scene.remove_last_light() {
            info!("Removed light {:?}", id);
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .without_time()
        .init();

    let config = match ViewerConfig::load(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load {}: {}, using defaults", CONFIG_PATH, e);
            ViewerConfig::default()
        }
    };

    let mut scene = open_scene(&config);
    let mut renderer = Renderer::new(config.render.clone());
    let mut fb = Framebuffer::new(config.render.width, config.render.height);

    let mut axis = Vec3::UP;
    let mut stats = FrameStats::default();
    let mut last_error: Option<String> = None;

    info!("=== Depthcast v{} ===", VERSION);

    loop {
        handle_input(&mut scene, &config, &mut axis);

        match renderer.render_frame(&scene, &mut fb) {
            Ok(frame) => {
                stats = frame;
                last_error = None;
            }
            Err(e) => {
                // Report once per distinct failure rather than every frame
                let msg = e.to_string();
                if last_error.as_deref() != Some(msg.as_str()) {
                    warn!("frame skipped: {}", msg);
                    last_error = Some(msg);
                }
            }
        }

        if is_key_pressed(KeyCode::F5) {
            let path = config.scene.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_SCENE_PATH));
            match save_scene(&scene, &path) {
                Ok(()) => info!("Saved scene to {}", path.display()),
                Err(e) => error!("Save failed: {}", e),
            }
        }
        if is_key_pressed(KeyCode::P) {
            match fb.save_png(SCREENSHOT_PATH) {
                Ok(()) => info!("Wrote {}", SCREENSHOT_PATH),
                Err(e) => error!("Screenshot failed: {}", e),
            }
        }

        clear_background(BLACK);

        // Convert framebuffer to texture and draw it scaled to the window
        let texture = Texture2D::from_rgba8(fb.width as u16, fb.height as u16, &fb.to_top_down_rgba());
        texture.set_filter(FilterMode::Nearest);
        draw_texture_ex(
            &texture,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(screen_width(), screen_height())),
                ..Default::default()
            },
        );

        let cam = &scene.camera;
        draw_text(
            &format!(
                "Cam: ({:.2}, {:.2}, {:.2}) -> ({:.2}, {:.2}, {:.2}) | {} tris, {} px",
                cam.pos.x, cam.pos.y, cam.pos.z,
                cam.view.x, cam.view.y, cam.view.z,
                stats.triangles_drawn, stats.pixels_written,
            ),
            8.0,
            18.0,
            16.0,
            WHITE,
        );

        next_frame().await;
    }
}
