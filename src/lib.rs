//! Raytrace Viewer - interactive real-time raytracing of sphere scenes
//!
//! A fragment-shader raytracer renders a scene of spheres with diffuse,
//! metal and glass materials. The user flies the camera through the scene
//! and edits it live through an egui overlay.
//!
//! # Features
//! - Pinhole camera with a viewport basis recomputed after every change
//! - Edit and play interaction modes with pointer capture
//! - Two scene presets and per-object editing (up to 128 objects)
//! - Dirty-flag render loop: the scene is re-traced only when something
//!   changed, into a low-resolution target that is stretched over the window
//! - Headless [`DummyBackend`](backend::dummy::DummyBackend) for testing the
//!   render loop without a GPU

pub mod app;
pub mod args;
pub mod backend;
pub mod egui_integration;
pub mod engine;
pub mod error;
pub mod input;
pub mod pipeline;
pub mod scene;
pub mod shader;
pub mod ui;
pub mod window;

use std::path::PathBuf;

pub use egui_integration::WgpuEguiIntegration;
pub use engine::{Engine, RenderSettings};
pub use error::{ViewerError, ViewerResult};
pub use window::Window;

// Re-export wgpu backend for direct access
pub use backend::wgpu_backend::WgpuBackend;

/// Configuration for the viewer
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Window title
    pub title: String,
    /// Initial window width
    pub width: u32,
    /// Initial window height
    pub height: u32,
    /// Start in borderless fullscreen
    pub fullscreen: bool,
    /// Enable vsync
    pub vsync: bool,
    /// Raytracer quality settings
    pub render: RenderSettings,
    /// Show the controls window
    pub show_tooltip: bool,
    /// Seed for randomized presets; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Directory with shader overrides
    pub shader_dir: Option<PathBuf>,
    /// Exit after this many frames
    pub max_frames: Option<u64>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "Raytrace Viewer".to_string(),
            width: 1280,
            height: 800,
            fullscreen: false,
            vsync: true,
            render: RenderSettings::default(),
            show_tooltip: true,
            seed: None,
            shader_dir: None,
            max_frames: None,
        }
    }
}
