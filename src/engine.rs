//! Render-update loop
//!
//! Each frame the engine decides whether the raytraced image is stale. When
//! it is, the scene is traced into a low-resolution offscreen target. The
//! target is then always composited over the full window, so an idle viewer
//! costs one texture blit per frame.
//!
//! Between frames the loop is either [`FrameState::Idle`] or
//! [`FrameState::Dirty`]. Tracing happens inside
//! [`Engine::render_scene`], so no caller can observe a frame mid-trace.

use std::ops::RangeInclusive;
use std::time::Instant;

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::pipeline::{CompositePass, FrameUniforms, GpuObject, RaytracePass, RAYTRACE_TARGET_FORMAT};
use crate::scene::Scene;
use crate::shader::{ShaderKind, ShaderLibrary};

pub const LIGHT_BOUNCES_RANGE: RangeInclusive<u32> = 1..=128;
pub const SAMPLES_PER_PIXEL_RANGE: RangeInclusive<u32> = 1..=256;
pub const RESOLUTION_FACTOR_RANGE: RangeInclusive<f32> = 0.1..=1.0;

/// Quality knobs of the raytracer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    /// Maximum number of bounces per ray
    pub light_bounces: u32,
    /// Rays per pixel, averaged
    pub samples_per_pixel: u32,
    /// Offscreen target size relative to the window
    pub resolution_factor: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            light_bounces: 20,
            samples_per_pixel: 64,
            resolution_factor: 0.5,
        }
    }
}

impl RenderSettings {
    /// Copy with every field clamped into its range
    pub fn clamped(self) -> Self {
        let factor = if self.resolution_factor.is_nan() {
            Self::default().resolution_factor
        } else {
            self.resolution_factor
        };
        Self {
            light_bounces: self
                .light_bounces
                .clamp(*LIGHT_BOUNCES_RANGE.start(), *LIGHT_BOUNCES_RANGE.end()),
            samples_per_pixel: self
                .samples_per_pixel
                .clamp(*SAMPLES_PER_PIXEL_RANGE.start(), *SAMPLES_PER_PIXEL_RANGE.end()),
            resolution_factor: factor
                .clamp(*RESOLUTION_FACTOR_RANGE.start(), *RESOLUTION_FACTOR_RANGE.end()),
        }
    }
}

/// Whether the raytraced image still matches the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Nothing to re-trace
    Idle,
    /// The next frame re-traces
    Dirty,
}

/// What happened during one call to [`Engine::render_scene`]
#[derive(Debug, Clone, Copy)]
pub struct FrameReport {
    pub frame: FrameContext,
    /// The raytrace pass was drawn this frame
    pub traced: bool,
    /// The offscreen image was composited (false means the window was only cleared)
    pub composited: bool,
}

/// Offscreen size for a window size: floor(size * factor), at least 1x1
pub fn reduced_size(width: u32, height: u32, factor: f32) -> (u32, u32) {
    let scale = |value: u32| ((value as f32 * factor).floor() as u32).max(1);
    (scale(width), scale(height))
}

struct OffscreenTarget {
    handle: TargetHandle,
    width: u32,
    height: u32,
}

enum TraceOutcome {
    Traced,
    NoPipeline,
    TargetUnavailable,
}

/// The raytracing render loop
pub struct Engine<B: GraphicsBackend> {
    backend: B,
    settings: RenderSettings,
    raytrace: RaytracePass,
    composite: CompositePass,
    target: Option<OffscreenTarget>,
    state: FrameState,
    target_failure_logged: bool,
    start: Instant,
}

impl<B: GraphicsBackend> Engine<B> {
    /// Create the engine on an initialized backend. Shader failures leave the
    /// affected pass disabled; only resource creation errors are returned.
    pub fn new(mut backend: B, settings: RenderSettings, shaders: &ShaderLibrary) -> BackendResult<Self> {
        let raytrace = RaytracePass::new(&mut backend, &shaders.source(ShaderKind::Raytracing))?;
        let swapchain_format = backend.swapchain_format();
        let composite = CompositePass::new(
            &mut backend,
            &shaders.source(ShaderKind::Composite),
            swapchain_format,
        )?;

        if !raytrace.has_pipeline() || !composite.has_pipeline() {
            log::warn!("Starting without a complete pipeline set, press F5 after fixing the shaders");
        }

        Ok(Self {
            backend,
            settings: settings.clamped(),
            raytrace,
            composite,
            target: None,
            state: FrameState::Dirty,
            target_failure_logged: false,
            start: Instant::now(),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn settings(&self) -> RenderSettings {
        self.settings
    }

    /// Replace the render settings; a change forces a re-render
    pub fn set_settings(&mut self, settings: RenderSettings) {
        let settings = settings.clamped();
        if settings != self.settings {
            log::debug!("Render settings changed: {:?}", settings);
            self.settings = settings;
            self.state = FrameState::Dirty;
        }
    }

    /// Size of the current offscreen target, if one exists
    pub fn target_size(&self) -> Option<(u32, u32)> {
        self.target.as_ref().map(|t| (t.width, t.height))
    }

    /// Handle window resize
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.backend.resize(width, height);
            self.state = FrameState::Dirty;
        }
    }

    /// Rebuild both pipelines. A pass whose shader fails keeps its previous pipeline.
    pub fn reload_shaders(&mut self, shaders: &ShaderLibrary) -> bool {
        let raytrace_ok = self
            .raytrace
            .reload(&mut self.backend, &shaders.source(ShaderKind::Raytracing));
        let composite_ok = self
            .composite
            .reload(&mut self.backend, &shaders.source(ShaderKind::Composite));

        if raytrace_ok && composite_ok {
            log::info!("Shaders reloaded");
        } else {
            log::warn!("Shader reload incomplete, keeping previous pipelines where needed");
        }
        self.state = FrameState::Dirty;
        raytrace_ok && composite_ok
    }

    /// Begin a frame, re-trace the scene if needed and composite the result
    /// onto the swapchain. Call [`end_frame`](Self::end_frame) afterwards, once
    /// overlays are drawn.
    ///
    /// In `play` mode the scene is traced every frame.
    pub fn render_scene(&mut self, scene: &mut Scene, play: bool) -> BackendResult<FrameReport> {
        let frame = self.backend.begin_frame()?;

        if scene.take_dirty() || play {
            self.state = FrameState::Dirty;
        }

        let mut traced = false;
        if self.state == FrameState::Dirty {
            self.state = match self.trace(scene, &frame) {
                TraceOutcome::Traced => {
                    traced = true;
                    FrameState::Idle
                }
                // Nothing to draw with until the shaders are reloaded
                TraceOutcome::NoPipeline => FrameState::Idle,
                TraceOutcome::TargetUnavailable => FrameState::Dirty,
            };
        }

        let composited = self.composite.execute(&mut self.backend, &frame);

        Ok(FrameReport {
            frame,
            traced,
            composited,
        })
    }

    /// End the frame and present to the screen.
    pub fn end_frame(&mut self) -> BackendResult<()> {
        self.backend.end_frame()
    }

    fn trace(&mut self, scene: &mut Scene, frame: &FrameContext) -> TraceOutcome {
        let (width, height) =
            reduced_size(frame.width, frame.height, self.settings.resolution_factor);

        let Some(target) = self.ensure_target(width, height) else {
            return TraceOutcome::TargetUnavailable;
        };

        scene.fit_camera(width as f32, height as f32);

        let uniforms = FrameUniforms::new(
            scene.camera(),
            self.settings.samples_per_pixel,
            self.settings.light_bounces,
            self.start.elapsed().as_secs_f32(),
            scene.len(),
        );
        let objects = GpuObject::pack(scene.objects());
        self.raytrace.upload(&mut self.backend, &uniforms, &objects);

        if self.raytrace.execute(&mut self.backend, target) {
            log::trace!("Traced {} objects at {}x{}", scene.len(), width, height);
            TraceOutcome::Traced
        } else {
            TraceOutcome::NoPipeline
        }
    }

    /// Return a target of the requested size, reallocating only on a size
    /// change. On failure the previous target stays bound for compositing.
    fn ensure_target(&mut self, width: u32, height: u32) -> Option<TargetHandle> {
        if let Some(target) = &self.target {
            if (target.width, target.height) == (width, height) {
                return Some(target.handle);
            }
        }

        match self.allocate_target(width, height) {
            Ok(target) => {
                let handle = target.handle;
                if let Some(old) = self.target.replace(target) {
                    self.backend.destroy_target(old.handle);
                }
                if self.target_failure_logged {
                    log::info!("Offscreen target allocated at {}x{}", width, height);
                    self.target_failure_logged = false;
                }
                Some(handle)
            }
            Err(e) => {
                if !self.target_failure_logged {
                    log::warn!(
                        "Could not allocate {}x{} offscreen target, keeping the previous image: {}",
                        width,
                        height,
                        e
                    );
                    self.target_failure_logged = true;
                }
                None
            }
        }
    }

    fn allocate_target(&mut self, width: u32, height: u32) -> BackendResult<OffscreenTarget> {
        log::debug!(
            "Allocating {}x{} offscreen target ({} KiB)",
            width,
            height,
            (width as u64 * height as u64 * RAYTRACE_TARGET_FORMAT.bytes_per_pixel() as u64) / 1024
        );

        let handle = self.backend.create_target(
            "Raytrace Target",
            width,
            height,
            RAYTRACE_TARGET_FORMAT,
        )?;

        if let Err(e) = self.composite.set_source(&mut self.backend, handle) {
            self.backend.destroy_target(handle);
            return Err(e);
        }

        Ok(OffscreenTarget {
            handle,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduced_size_floors_and_never_hits_zero() {
        assert_eq!(reduced_size(1280, 800, 0.5), (640, 400));
        assert_eq!(reduced_size(1001, 7, 0.5), (500, 3));
        assert_eq!(reduced_size(1, 1, 0.1), (1, 1));
        assert_eq!(reduced_size(640, 480, 1.0), (640, 480));
    }

    #[test]
    fn settings_are_clamped() {
        let settings = RenderSettings {
            light_bounces: 0,
            samples_per_pixel: 1000,
            resolution_factor: 4.0,
        }
        .clamped();
        assert_eq!(settings.light_bounces, 1);
        assert_eq!(settings.samples_per_pixel, 256);
        assert_eq!(settings.resolution_factor, 1.0);

        let nan = RenderSettings {
            resolution_factor: f32::NAN,
            ..Default::default()
        }
        .clamped();
        assert_eq!(nan.resolution_factor, 0.5);
    }
}
