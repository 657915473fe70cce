//! Raytracing pipeline
//!
//! Two full-screen passes:
//! 1. Raytrace pass - Traces the scene into a low-resolution offscreen target
//! 2. Composite pass - Stretches that target over the swapchain
//!
//! Both draw a single triangle generated from `vertex_index`, so neither
//! needs vertex buffers.

pub mod composite_pass;
pub mod raytrace_pass;

pub use composite_pass::{CompositeParams, CompositePass};
pub use raytrace_pass::{FrameUniforms, GpuMaterial, GpuObject, RaytracePass, RAYTRACE_TARGET_FORMAT};

use crate::backend::traits::*;
use crate::backend::types::*;

/// Build a full-screen pipeline, logging instead of failing when the shader
/// does not compile.
fn create_fullscreen_pipeline(
    backend: &mut dyn GraphicsBackend,
    label: &str,
    shader: &str,
    layout: LayoutHandle,
    format: ColorFormat,
) -> Option<PipelineHandle> {
    let desc = FullscreenPipelineDesc {
        label,
        shader,
        layout,
        format,
    };
    match backend.create_pipeline(&desc) {
        Ok(pipeline) => {
            log::debug!("Created pipeline '{}'", label);
            Some(pipeline)
        }
        Err(e) => {
            log::error!("Pipeline '{}' unavailable: {}", label, e);
            None
        }
    }
}

/// Replace `slot` with a freshly built pipeline. The old pipeline survives
/// when the new shader fails.
fn rebuild_fullscreen_pipeline(
    backend: &mut dyn GraphicsBackend,
    slot: &mut Option<PipelineHandle>,
    label: &str,
    shader: &str,
    layout: LayoutHandle,
    format: ColorFormat,
) -> bool {
    let Some(pipeline) = create_fullscreen_pipeline(backend, label, shader, layout, format) else {
        return false;
    };
    if let Some(old) = slot.replace(pipeline) {
        backend.destroy_pipeline(old);
    }
    true
}
