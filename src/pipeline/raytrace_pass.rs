//! Raytrace pass
//!
//! Uploads the camera basis and the object array, then shades every pixel
//! of the offscreen target with `shaders/raytracing.wgsl`.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use super::{create_fullscreen_pipeline, rebuild_fullscreen_pipeline};
use crate::backend::traits::*;
use crate::backend::types::*;
use crate::scene::{Camera, Material, SceneObject, MAX_OBJECTS};

/// Format of the offscreen raytracing target
pub const RAYTRACE_TARGET_FORMAT: ColorFormat = ColorFormat::Rgba16Float;

/// Material as laid out in the shader
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    pub albedo: Vec3,
    pub kind: u32,
    pub fuzz: f32,
    pub refraction_index: f32,
    pub _padding: [f32; 2],
}

impl From<&Material> for GpuMaterial {
    fn from(material: &Material) -> Self {
        Self {
            albedo: material.albedo,
            kind: material.kind.gpu_tag(),
            fuzz: material.fuzz,
            refraction_index: material.refraction_index,
            _padding: [0.0; 2],
        }
    }
}

/// Scene object as laid out in the shader; `scale.x` carries the radius
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct GpuObject {
    pub position: Vec3,
    pub kind: u32,
    pub scale: Vec3,
    pub _padding: f32,
    pub material: GpuMaterial,
}

impl From<&SceneObject> for GpuObject {
    fn from(object: &SceneObject) -> Self {
        Self {
            position: object.position,
            kind: object.kind.gpu_tag(),
            scale: Vec3::splat(object.radius),
            _padding: 0.0,
            material: GpuMaterial::from(&object.material),
        }
    }
}

impl GpuObject {
    /// Pack objects into the fixed-size shader array; unused slots are zeroed
    pub fn pack(objects: &[SceneObject]) -> Vec<GpuObject> {
        let mut packed: Vec<GpuObject> = objects
            .iter()
            .take(MAX_OBJECTS)
            .map(GpuObject::from)
            .collect();
        packed.resize(MAX_OBJECTS, GpuObject::zeroed());
        packed
    }
}

/// Per-frame uniforms for the raytracing shader
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub pixel00_loc: Vec3,
    pub window_width: f32,
    pub pixel_delta_u: Vec3,
    pub window_height: f32,
    pub pixel_delta_v: Vec3,
    pub time: f32,
    pub camera_center: Vec3,
    pub samples_per_pixel: u32,
    pub light_bounces: u32,
    pub object_count: u32,
    pub _padding: [u32; 2],
}

impl FrameUniforms {
    pub fn new(
        camera: &Camera,
        samples_per_pixel: u32,
        light_bounces: u32,
        time: f32,
        object_count: usize,
    ) -> Self {
        let viewport = camera.viewport();
        let (window_width, window_height) = camera.window_size();
        Self {
            pixel00_loc: viewport.pixel00_loc,
            window_width,
            pixel_delta_u: viewport.pixel_delta_u,
            window_height,
            pixel_delta_v: viewport.pixel_delta_v,
            time,
            camera_center: viewport.camera_center,
            samples_per_pixel,
            light_bounces,
            object_count: object_count.min(MAX_OBJECTS) as u32,
            _padding: [0; 2],
        }
    }
}

/// Raytrace pass
pub struct RaytracePass {
    layout: LayoutHandle,
    frame_buffer: UniformBufferHandle,
    objects_buffer: UniformBufferHandle,
    bind_group: BindGroupHandle,
    pipeline: Option<PipelineHandle>,
}

impl RaytracePass {
    pub const LABEL: &'static str = "Raytrace";

    /// Create the uniform buffers and try to build the pipeline. A shader
    /// that fails to compile leaves the pass without a pipeline.
    pub fn new(backend: &mut dyn GraphicsBackend, shader: &str) -> BackendResult<Self> {
        let layout = backend.create_layout(Self::LABEL, &[SlotKind::Uniform, SlotKind::Uniform])?;

        let frame_buffer = backend.create_uniform_buffer(
            "Raytrace Frame Uniforms",
            std::mem::size_of::<FrameUniforms>() as u64,
        )?;
        let objects_buffer = backend.create_uniform_buffer(
            "Raytrace Objects",
            (std::mem::size_of::<GpuObject>() * MAX_OBJECTS) as u64,
        )?;

        let bind_group = backend.create_bind_group(
            layout,
            &[
                SlotResource::Uniform(frame_buffer),
                SlotResource::Uniform(objects_buffer),
            ],
        )?;

        let pipeline = create_fullscreen_pipeline(
            backend,
            Self::LABEL,
            shader,
            layout,
            RAYTRACE_TARGET_FORMAT,
        );

        Ok(Self {
            layout,
            frame_buffer,
            objects_buffer,
            bind_group,
            pipeline,
        })
    }

    pub fn has_pipeline(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Rebuild the pipeline from new shader source; the old one stays on failure
    pub fn reload(&mut self, backend: &mut dyn GraphicsBackend, shader: &str) -> bool {
        rebuild_fullscreen_pipeline(
            backend,
            &mut self.pipeline,
            Self::LABEL,
            shader,
            self.layout,
            RAYTRACE_TARGET_FORMAT,
        )
    }

    pub fn upload(
        &self,
        backend: &mut dyn GraphicsBackend,
        uniforms: &FrameUniforms,
        objects: &[GpuObject],
    ) {
        backend.write_uniform(self.frame_buffer, bytemuck::bytes_of(uniforms));
        backend.write_uniform(self.objects_buffer, bytemuck::cast_slice(objects));
    }

    /// Trace into `target`. Returns false when there is no pipeline to draw with.
    pub fn execute(&self, backend: &mut dyn GraphicsBackend, target: TargetHandle) -> bool {
        let Some(pipeline) = self.pipeline else {
            return false;
        };

        backend.record_pass(&FullscreenPass {
            label: Self::LABEL,
            target,
            draw: Some((pipeline, self.bind_group)),
        });
        true
    }
}
