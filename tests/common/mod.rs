//! Shared helpers for the headless render loop tests.

use rand::rngs::StdRng;
use rand::SeedableRng;

use raytrace_viewer::backend::dummy::{DummyBackend, DummyCommand};
use raytrace_viewer::pipeline::{FrameUniforms, RaytracePass};
use raytrace_viewer::scene::{Preset, Scene};
use raytrace_viewer::shader::ShaderLibrary;
use raytrace_viewer::{Engine, RenderSettings};

pub const WIDTH: u32 = 1280;
pub const HEIGHT: u32 = 800;

/// Engine on a dummy surface with default settings
pub fn engine() -> Engine<DummyBackend> {
    engine_with(DummyBackend::new(WIDTH, HEIGHT))
}

pub fn engine_with(backend: DummyBackend) -> Engine<DummyBackend> {
    Engine::new(backend, RenderSettings::default(), &ShaderLibrary::embedded())
        .expect("dummy engine")
}

/// Preset A scene
#[allow(dead_code)]
pub fn scene() -> Scene {
    Scene::with_preset(Preset::A, &mut StdRng::seed_from_u64(1))
}

/// Whether the raytrace pass was recorded
#[allow(dead_code)]
pub fn traced(commands: &[DummyCommand]) -> bool {
    commands.iter().any(|c| {
        matches!(c, DummyCommand::Pass { label, pipeline: Some(_), .. } if label == RaytracePass::LABEL)
    })
}

/// Sizes of the offscreen targets created, in order
#[allow(dead_code)]
pub fn created_textures(commands: &[DummyCommand]) -> Vec<(u32, u32)> {
    commands
        .iter()
        .filter_map(|c| match c {
            DummyCommand::CreateTarget { width, height } => Some((*width, *height)),
            _ => None,
        })
        .collect()
}

/// The last frame uniforms uploaded
#[allow(dead_code)]
pub fn uploaded_uniforms(commands: &[DummyCommand]) -> Option<FrameUniforms> {
    commands.iter().rev().find_map(|c| match c {
        DummyCommand::WriteUniform { data, .. }
            if data.len() == std::mem::size_of::<FrameUniforms>() =>
        {
            Some(bytemuck::pod_read_unaligned(data))
        }
        _ => None,
    })
}
