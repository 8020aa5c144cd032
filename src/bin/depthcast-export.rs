//! Headless renderer: draws one frame of a scene to a PNG file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use depthcast::config::ViewerConfig;
use depthcast::rasterizer::{Framebuffer, ProjectionMode, Renderer};
use depthcast::world::{load_scene, Scene};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "depthcast-export", version, about = "Render one frame of a scene to PNG")]
struct Args {
    /// Scene file (RON). The default scene is used when omitted.
    #[arg(short, long)]
    scene: Option<PathBuf>,

    /// Output PNG path
    #[arg(short, long, default_value = "render.png")]
    output: PathBuf,

    /// Viewer config supplying render settings
    #[arg(short, long, default_value = "depthcast.ron")]
    config: PathBuf,

    /// Override the output width
    #[arg(long)]
    width: Option<usize>,

    /// Override the output height
    #[arg(long)]
    height: Option<usize>,

    /// Use a full perspective projection with this vertical field of view (degrees)
    #[arg(long)]
    fovy: Option<f32>,

    /// Near plane for --fovy
    #[arg(long, default_value_t = 0.1)]
    near: f32,

    /// Far plane for --fovy
    #[arg(long, default_value_t = 100.0)]
    far: f32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .without_time()
        .init();

    let args = Args::parse();

    let config = ViewerConfig::load(&args.config)
        .with_context(|| format!("reading config {}", args.config.display()))?;

    let mut settings = config.render;
    if let Some(w) = args.width {
        settings.width = w;
    }
    if let Some(h) = args.height {
        settings.height = h;
    }
    if let Some(fovy) = args.fovy {
        settings.projection = ProjectionMode::Perspective {
            fovy,
            near: args.near,
            far: args.far,
        };
    }
    anyhow::ensure!(
        settings.width > 0 && settings.height > 0,
        "output size must be non-zero"
    );

    let scene = match args.scene.as_ref().or(config.scene.as_ref()) {
        Some(path) => load_scene(path).with_context(|| format!("loading scene {}", path.display()))?,
        None => Scene::default(),
    };

    let mut fb = Framebuffer::new(settings.width, settings.height);
    let mut renderer = Renderer::new(settings);
    let stats = renderer.render_frame(&scene, &mut fb)?;

    fb.save_png(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;

    info!(
        "Wrote {} ({}x{}): {} triangles, {} pixels",
        args.output.display(),
        fb.width,
        fb.height,
        stats.triangles_drawn,
        stats.pixels_written
    );
    Ok(())
}
