//! egui GUI integration
//!
//! Provides egui input handling and rendering for the wgpu backend.

mod wgpu;

pub use self::wgpu::{zoom_for_width, WgpuEguiIntegration, REFERENCE_WIDTH};
