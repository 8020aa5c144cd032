//! World module - the scene the renderer reads
//!
//! - Figures (triangle meshes) and point lights keyed by stable ids
//! - The active camera and its incremental controls
//! - RON persistence

mod figure;
mod io;
mod scene;

pub use figure::*;
pub use io::*;
pub use scene::*;

use thiserror::Error;
use crate::rasterizer::MathError;

/// Error type for scene editing and persistence
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("Camera error: {0}")]
    Math(#[from] MathError),
    #[error("no figure with id {0:?}")]
    UnknownFigure(FigureId),
    #[error("no light with id {0:?}")]
    UnknownLight(LightId),
    #[error("figure '{name}' is malformed: {reason}")]
    InvalidMesh { name: String, reason: String },
    #[error("id {0:?} is used by more than one figure")]
    DuplicateFigure(FigureId),
    #[error("id {0:?} is used by more than one light")]
    DuplicateLight(LightId),
    #[error("invalid edit: {0}")]
    InvalidEdit(String),
}
