//! Scene loading and saving
//!
//! Uses RON (Rusty Object Notation) for human-readable scene files.

use std::fs;
use std::path::Path;
use tracing::debug;
use super::{Scene, SceneError};

/// Load a scene from a RON file
pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, SceneError> {
    let contents = fs::read_to_string(path.as_ref())?;
    let scene = load_scene_from_str(&contents)?;
    debug!(
        "loaded scene {}: {} figures, {} lights",
        path.as_ref().display(),
        scene.figure_count(),
        scene.light_count()
    );
    Ok(scene)
}

/// Save a scene to a RON file
pub fn save_scene<P: AsRef<Path>>(scene: &Scene, path: P) -> Result<(), SceneError> {
    let path = path.as_ref();
    // Figures nest four levels deep; anything below stays on one line per vertex
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    fs::write(path, ron::ser::to_string_pretty(scene, pretty)?)?;
    debug!(
        "saved scene {}: {} figures, {} lights",
        path.display(),
        scene.figure_count(),
        scene.light_count()
    );
    Ok(())
}

/// Load a scene from a RON string (for embedded scenes or testing)
pub fn load_scene_from_str(s: &str) -> Result<Scene, SceneError> {
    let mut scene: Scene = ron::from_str(s)?;

    for figure in scene.figures() {
        figure.validate()?;
    }
    scene.reconcile_ids()?;
    // Strafe vector is not serialized
    scene.refresh_camera()?;

    Ok(scene)
}
