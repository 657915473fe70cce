//! Render-update loop tests on the dummy backend.
//!
//! These check when the scene is re-traced, how the offscreen target is
//! (re)allocated and what happens when resources cannot be created.

mod common;

use common::{created_textures, engine, engine_with, scene, traced, uploaded_uniforms, HEIGHT, WIDTH};
use raytrace_viewer::backend::dummy::{DummyBackend, DummyCommand};
use raytrace_viewer::engine::FrameState;
use raytrace_viewer::pipeline::{CompositePass, FrameUniforms, RaytracePass};
use raytrace_viewer::shader::ShaderLibrary;
use raytrace_viewer::RenderSettings;

#[test]
fn first_frame_traces_into_reduced_target() {
    let mut engine = engine();
    let mut scene = scene();

    let report = engine.render_scene(&mut scene, false).unwrap();
    engine.end_frame().unwrap();

    assert!(report.traced);
    assert!(report.composited);
    assert_eq!(engine.state(), FrameState::Idle);
    assert_eq!(engine.target_size(), Some((WIDTH / 2, HEIGHT / 2)));

    let commands = engine.backend_mut().take_commands();
    assert!(traced(&commands));
    assert_eq!(created_textures(&commands), vec![(640, 400)]);
    // Traced offscreen, then composited onto the swapchain
    let passes: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            DummyCommand::Pass { label, target, .. } => Some((label.as_str(), *target)),
            _ => None,
        })
        .collect();
    assert_eq!(passes.len(), 2);
    assert_eq!(passes[0].0, RaytracePass::LABEL);
    assert_ne!(passes[0].1, report.frame.swapchain);
    assert_eq!(passes[1], (CompositePass::LABEL, report.frame.swapchain));
    assert_eq!(commands.last(), Some(&DummyCommand::EndFrame));
}

#[test]
fn clean_scene_is_only_composited() {
    let mut engine = engine();
    let mut scene = scene();
    engine.render_scene(&mut scene, false).unwrap();
    engine.end_frame().unwrap();
    engine.backend_mut().take_commands();

    let report = engine.render_scene(&mut scene, false).unwrap();
    engine.end_frame().unwrap();

    assert!(!report.traced);
    assert!(report.composited);
    let commands = engine.backend_mut().take_commands();
    assert!(!traced(&commands));
    assert!(created_textures(&commands).is_empty());
    assert!(commands.iter().any(|c| matches!(
        c,
        DummyCommand::Pass { label, target, pipeline: Some(_) }
            if label == CompositePass::LABEL && *target == report.frame.swapchain
    )));
}

#[test]
fn scene_edit_triggers_one_retrace() {
    let mut engine = engine();
    let mut scene = scene();
    engine.render_scene(&mut scene, false).unwrap();

    scene.camera_mut().zoom(1.0);
    assert!(engine.render_scene(&mut scene, false).unwrap().traced);
    assert!(!engine.render_scene(&mut scene, false).unwrap().traced);
}

#[test]
fn play_mode_traces_every_frame() {
    let mut engine = engine();
    let mut scene = scene();

    for _ in 0..3 {
        let report = engine.render_scene(&mut scene, true).unwrap();
        engine.end_frame().unwrap();
        assert!(report.traced);
    }
    // One target for all three frames
    assert_eq!(created_textures(engine.backend().commands()).len(), 1);
}

#[test]
fn target_is_reallocated_only_on_size_change() {
    let mut engine = engine();
    let mut scene = scene();
    engine.render_scene(&mut scene, false).unwrap();
    engine.end_frame().unwrap();

    engine.resize(800, 600);
    assert_eq!(engine.state(), FrameState::Dirty);
    engine.backend_mut().take_commands();

    let report = engine.render_scene(&mut scene, false).unwrap();
    engine.end_frame().unwrap();
    assert!(report.traced);
    assert_eq!(engine.target_size(), Some((400, 300)));

    let commands = engine.backend_mut().take_commands();
    assert_eq!(created_textures(&commands), vec![(400, 300)]);
    assert!(commands
        .iter()
        .any(|c| matches!(c, DummyCommand::DestroyTarget(_))));
    assert_eq!(engine.backend().live_texture_count(), 1);

    // Same window, same factor: the target is reused
    scene.mark_dirty();
    engine.render_scene(&mut scene, false).unwrap();
    engine.end_frame().unwrap();
    assert!(created_textures(engine.backend().commands()).is_empty());
}

#[test]
fn resolution_factor_change_retraces_at_new_size() {
    let mut engine = engine();
    let mut scene = scene();
    engine.render_scene(&mut scene, false).unwrap();

    engine.set_settings(RenderSettings::default());
    assert_eq!(engine.state(), FrameState::Idle);

    engine.set_settings(RenderSettings {
        resolution_factor: 1.0,
        ..RenderSettings::default()
    });
    assert_eq!(engine.state(), FrameState::Dirty);

    let report = engine.render_scene(&mut scene, false).unwrap();
    assert!(report.traced);
    assert_eq!(engine.target_size(), Some((WIDTH, HEIGHT)));
    assert_eq!(scene.camera().window_size(), (WIDTH as f32, HEIGHT as f32));
}

#[test]
fn uploaded_uniforms_match_scene() {
    let mut engine = engine();
    let mut scene = scene();
    engine.render_scene(&mut scene, false).unwrap();

    let uploaded = uploaded_uniforms(engine.backend().commands()).expect("frame uniforms");
    let settings = engine.settings();
    let expected = FrameUniforms {
        time: uploaded.time,
        ..FrameUniforms::new(
            scene.camera(),
            settings.samples_per_pixel,
            settings.light_bounces,
            0.0,
            scene.len(),
        )
    };

    assert_eq!(uploaded, expected);
    assert_eq!(uploaded.object_count, 5);
    assert_eq!(uploaded.window_width, (WIDTH / 2) as f32);
    assert_eq!(uploaded.window_height, (HEIGHT / 2) as f32);
}

#[test]
fn failed_allocation_keeps_frame_dirty() {
    let mut backend = DummyBackend::new(WIDTH, HEIGHT);
    backend.fail_texture_creation = true;
    let mut engine = engine_with(backend);
    let mut scene = scene();

    for _ in 0..2 {
        let report = engine.render_scene(&mut scene, false).unwrap();
        engine.end_frame().unwrap();
        assert!(!report.traced);
        // Nothing to show yet, the window is only cleared
        assert!(!report.composited);
        assert!(engine.backend().commands().contains(&DummyCommand::Pass {
            label: CompositePass::LABEL.to_string(),
            target: report.frame.swapchain,
            pipeline: None,
        }));
        assert_eq!(engine.state(), FrameState::Dirty);
    }
    assert_eq!(engine.target_size(), None);

    engine.backend_mut().fail_texture_creation = false;
    let report = engine.render_scene(&mut scene, false).unwrap();
    assert!(report.traced);
    assert_eq!(engine.state(), FrameState::Idle);
}

#[test]
fn failed_reallocation_keeps_previous_image() {
    let mut engine = engine();
    let mut scene = scene();
    engine.render_scene(&mut scene, false).unwrap();
    engine.end_frame().unwrap();

    engine.backend_mut().fail_texture_creation = true;
    engine.resize(1000, 600);

    let report = engine.render_scene(&mut scene, false).unwrap();
    engine.end_frame().unwrap();
    assert!(!report.traced);
    assert!(report.composited);
    assert_eq!(engine.state(), FrameState::Dirty);
    assert_eq!(engine.target_size(), Some((640, 400)));
    assert_eq!(engine.backend().live_texture_count(), 1);
}

#[test]
fn missing_pipelines_still_present_frames() {
    let mut backend = DummyBackend::new(WIDTH, HEIGHT);
    backend.fail_pipeline_creation = true;
    let mut engine = engine_with(backend);
    let mut scene = scene();

    let report = engine.render_scene(&mut scene, false).unwrap();
    engine.end_frame().unwrap();
    assert!(!report.traced);
    assert!(!report.composited);
    assert_eq!(engine.state(), FrameState::Idle);
    assert!(engine.backend().commands().contains(&DummyCommand::EndFrame));

    // A successful reload brings the passes back
    engine.backend_mut().fail_pipeline_creation = false;
    assert!(engine.reload_shaders(&ShaderLibrary::embedded()));
    assert_eq!(engine.state(), FrameState::Dirty);

    let report = engine.render_scene(&mut scene, false).unwrap();
    assert!(report.traced);
    assert!(report.composited);
}

#[test]
fn failed_reload_keeps_previous_pipelines() {
    let mut engine = engine();
    let mut scene = scene();
    engine.render_scene(&mut scene, false).unwrap();
    engine.end_frame().unwrap();

    engine.backend_mut().fail_pipeline_creation = true;
    assert!(!engine.reload_shaders(&ShaderLibrary::embedded()));
    assert_eq!(engine.state(), FrameState::Dirty);

    let report = engine.render_scene(&mut scene, false).unwrap();
    assert!(report.traced);
    assert!(report.composited);
}

#[test]
fn only_idle_or_dirty_is_seen_between_frames() {
    let mut backend = DummyBackend::new(WIDTH, HEIGHT);
    backend.fail_texture_creation = true;
    let mut engine = engine_with(backend);
    let mut scene = scene();

    let mut seen = Vec::new();
    for (play, fail) in [(false, true), (false, false), (false, false), (true, false)] {
        engine.backend_mut().fail_texture_creation = fail;
        engine.render_scene(&mut scene, play).unwrap();
        engine.end_frame().unwrap();
        seen.push(engine.state());
    }
    assert_eq!(
        seen,
        vec![
            FrameState::Dirty,
            FrameState::Idle,
            FrameState::Idle,
            FrameState::Idle
        ]
    );
}
