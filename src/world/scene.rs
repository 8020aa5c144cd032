//! Scene: the ordered figures, lights and active camera the renderer reads each frame
//!
//! Entries are keyed by stable integer ids so edits and removals never shift the
//! identity of other entries. Draw order is insertion order.

use std::collections::HashSet;
use serde::{Serialize, Deserialize};
use tracing::warn;
use crate::rasterizer::{Camera, LightSourcePoint, MathError, Vec3};
use super::{Figure, SceneError};

/// Stable handle to a figure in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FigureId(pub u32);

/// Stable handle to a light in a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LightId(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub camera: Camera,
    figures: Vec<(FigureId, Figure)>,
    lights: Vec<(LightId, LightSourcePoint)>,
    next_id: u32,
}

impl Scene {
    /// Scene with no figures or lights. The camera's strafe vector is refreshed.
    pub fn new(mut camera: Camera) -> Result<Self, SceneError> {
        camera.update()?;
        Ok(Self::with_camera(camera))
    }

    fn with_camera(camera: Camera) -> Self {
        Self {
            camera,
            figures: Vec::new(),
            lights: Vec::new(),
            next_id: 0,
        }
    }

    /// Reject repeated ids and move the id counter past every id in use.
    /// Needed after deserializing, where `next_id` may be stale.
    pub(crate) fn reconcile_ids(&mut self) -> Result<(), SceneError> {
        let mut seen = HashSet::new();
        for (id, _) in &self.figures {
            if !seen.insert(id.0) {
                return Err(SceneError::DuplicateFigure(*id));
            }
        }
        for (id, _) in &self.lights {
            if !seen.insert(id.0) {
                return Err(SceneError::DuplicateLight(*id));
            }
        }
        if let Some(max) = seen.into_iter().max() {
            self.next_id = self.next_id.max(max + 1);
        }
        Ok(())
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // Figures

    pub fn add_figure(&mut self, figure: Figure) -> FigureId {
        let id = FigureId(self.alloc_id());
        self.figures.push((id, figure));
        id
    }

    /// Move a figure to `center`, then scale and rotate (degrees) its local geometry
    pub fn edit_figure(
        &mut self,
        id: FigureId,
        center: Vec3,
        scale: Vec3,
        rotate: Vec3,
    ) -> Result<(), SceneError> {
        let figure = self.figure_mut(id).ok_or(SceneError::UnknownFigure(id))?;
        figure.scale(scale)?;
        figure.rotate(rotate);
        figure.set_center(center);
        Ok(())
    }

    pub fn remove_figure(&mut self, id: FigureId) -> Result<Figure, SceneError> {
        let idx = self
            .figures
            .iter()
            .position(|(fid, _)| *fid == id)
            .ok_or(SceneError::UnknownFigure(id))?;
        Ok(self.figures.remove(idx).1)
    }

    /// Remove the most recently added figure
    pub fn remove_last_figure(&mut self) -> Option<(FigureId, Figure)> {
        self.figures.pop()
    }

    pub fn figure(&self, id: FigureId) -> Option<&Figure> {
        self.figures.iter().find(|(fid, _)| *fid == id).map(|(_, f)| f)
    }

    pub fn figure_mut(&mut self, id: FigureId) -> Option<&mut Figure> {
        self.figures.iter_mut().find(|(fid, _)| *fid == id).map(|(_, f)| f)
    }

    /// Figures in draw order
    pub fn figures(&self) -> impl Iterator<Item = &Figure> {
        self.figures.iter().map(|(_, f)| f)
    }

    pub fn figure_ids(&self) -> impl Iterator<Item = FigureId> + '_ {
        self.figures.iter().map(|(id, _)| *id)
    }

    pub fn figure_count(&self) -> usize {
        self.figures.len()
    }

    // Lights

    pub fn add_light(&mut self, position: Vec3, power: f32) -> LightId {
        let id = LightId(self.alloc_id());
        self.lights.push((id, LightSourcePoint::new(position, power)));
        id
    }

    pub fn edit_light(&mut self, id: LightId, position: Vec3, power: f32) -> Result<(), SceneError> {
        let light = self
            .lights
            .iter_mut()
            .find(|(lid, _)| *lid == id)
            .map(|(_, l)| l)
            .ok_or(SceneError::UnknownLight(id))?;
        light.set_position(position);
        light.set_power(power);
        Ok(())
    }

    pub fn remove_light(&mut self, id: LightId) -> Result<LightSourcePoint, SceneError> {
        let idx = self
            .lights
            .iter()
            .position(|(lid, _)| *lid == id)
            .ok_or(SceneError::UnknownLight(id))?;
        Ok(self.lights.remove(idx).1)
    }

    /// Remove the most recently added light
    pub fn remove_last_light(&mut self) -> Option<(LightId, LightSourcePoint)> {
        self.lights.pop()
    }

    pub fn light(&self, id: LightId) -> Option<&LightSourcePoint> {
        self.lights.iter().find(|(lid, _)| *lid == id).map(|(_, l)| l)
    }

    pub fn lights(&self) -> impl Iterator<Item = &LightSourcePoint> {
        self.lights.iter().map(|(_, l)| l)
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    // Camera commands. Each refreshes the strafe vector afterwards and leaves the
    // camera untouched if the new pose is degenerate.

    fn camera_command<F>(&mut self, command: F) -> Result<(), SceneError>
    where
        F: FnOnce(&mut Camera) -> Result<(), MathError>,
    {
        let previous = self.camera.clone();
        let result = command(&mut self.camera).and_then(|()| self.camera.update());
        if let Err(e) = result {
            self.camera = previous;
            return Err(e.into());
        }
        Ok(())
    }

    pub fn move_camera(&mut self, speed: f32) -> Result<(), SceneError> {
        self.camera_command(|cam| cam.move_forward(speed))
    }

    pub fn strafe_camera(&mut self, speed: f32) -> Result<(), SceneError> {
        self.camera_command(|cam| {
            cam.strafe(speed);
            Ok(())
        })
    }

    pub fn up_down_camera(&mut self, speed: f32) -> Result<(), SceneError> {
        self.camera_command(|cam| {
            cam.up_down(speed);
            Ok(())
        })
    }

    pub fn rotate_camera(&mut self, speed: f32) -> Result<(), SceneError> {
        self.camera_command(|cam| {
            cam.rotate_view(speed);
            Ok(())
        })
    }

    pub fn rotate_camera_position(&mut self, angle: f32, axis: Vec3) -> Result<(), SceneError> {
        self.camera_command(|cam| {
            cam.rotate_position(angle, axis);
            Ok(())
        })
    }

    /// Recompute derived camera state, e.g. after deserializing
    pub fn refresh_camera(&mut self) -> Result<(), SceneError> {
        self.camera.update()?;
        Ok(())
    }
}

impl Default for Scene {
    /// Camera at (0, 0, 4) looking at the origin, lit by one distant overhead light
    fn default() -> Self {
        let camera = Camera::new(Vec3::new(0.0, 0.0, 4.0), Vec3::ZERO, Vec3::UP);
        let mut scene = Self::with_camera(camera);
        if let Err(e) = scene.refresh_camera() {
            warn!("default camera pose rejected: {}", e);
        }
        scene.add_light(Vec3::new(100.0, 1000.0, 100.0), 1300.0);
        scene
    }
}
