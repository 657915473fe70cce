//! Scene management
//!
//! The [`Scene`] owns the camera and the object list. Every mutation goes
//! through a method that raises the dirty flag, which tells the render loop
//! that the raytraced image is stale.

mod camera;
mod object;
mod presets;

pub use camera::*;
pub use object::*;
pub use presets::{Preset, PresetScene, PresetView};

use rand::Rng;

/// Maximum number of objects the raytracing shader can hold
pub const MAX_OBJECTS: usize = 128;

/// The scene containing the camera and all renderable objects
#[derive(Debug, Clone)]
pub struct Scene {
    camera: Camera,
    objects: Vec<SceneObject>,
    dirty: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene with a default camera
    pub fn new() -> Self {
        Self {
            camera: Camera::default(),
            objects: Vec::with_capacity(MAX_OBJECTS),
            dirty: true,
        }
    }

    /// Create a scene with a preset already applied
    pub fn with_preset(preset: Preset, rng: &mut impl Rng) -> Self {
        let mut scene = Self::new();
        scene.apply_preset(preset, rng);
        scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Mutable camera access; marks the scene dirty
    pub fn camera_mut(&mut self) -> &mut Camera {
        self.dirty = true;
        &mut self.camera
    }

    /// Fit the camera basis to the render target size.
    ///
    /// This is part of rendering itself and does not mark the scene dirty.
    pub(crate) fn fit_camera(&mut self, width: f32, height: f32) {
        if self.camera.window_size() != (width, height) {
            self.camera.update_window(width, height);
        }
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.objects.len() >= MAX_OBJECTS
    }

    /// Replace all objects and the camera view with a preset
    pub fn apply_preset(&mut self, preset: Preset, rng: &mut impl Rng) {
        let PresetScene { mut objects, view } = presets::build(preset, rng);
        objects.truncate(MAX_OBJECTS);

        self.objects = objects;
        self.camera.set_view(view.look_from, view.look_at, view.vfov);
        self.dirty = true;

        log::info!(
            "Applied {} with {} objects",
            preset.label(),
            self.objects.len()
        );
    }

    /// Append a default object; returns false when the scene is full
    pub fn add_object(&mut self) -> bool {
        if self.is_full() {
            log::debug!("Scene is full ({} objects), add ignored", MAX_OBJECTS);
            return false;
        }
        self.objects.push(SceneObject::default());
        self.dirty = true;
        true
    }

    /// Remove the object at `index`, keeping the order of the rest
    pub fn remove_object(&mut self, index: usize) -> Option<SceneObject> {
        if index >= self.objects.len() {
            return None;
        }
        self.dirty = true;
        Some(self.objects.remove(index))
    }

    /// Overwrite the object at `index`; the scene only becomes dirty on change
    pub fn set_object(&mut self, index: usize, object: SceneObject) -> bool {
        match self.objects.get_mut(index) {
            Some(slot) if *slot != object => {
                *slot = object;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Return the dirty flag and clear it
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}
