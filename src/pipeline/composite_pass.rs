//! Composite pass

use bytemuck::{Pod, Zeroable};

use super::{create_fullscreen_pipeline, rebuild_fullscreen_pipeline};
use crate::backend::traits::*;
use crate::backend::types::*;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct CompositeParams {
    pub screen_resolution: [f32; 2],
    pub _padding: [f32; 2],
}

/// Draws the offscreen target over the whole swapchain image with linear
/// filtering. With no source bound it only clears.
pub struct CompositePass {
    layout: LayoutHandle,
    sampler: SamplerHandle,
    params_buffer: UniformBufferHandle,
    bind_group: Option<BindGroupHandle>,
    pipeline: Option<PipelineHandle>,
    format: ColorFormat,
}

impl CompositePass {
    pub const LABEL: &'static str = "Composite";

    pub fn new(
        backend: &mut dyn GraphicsBackend,
        shader: &str,
        format: ColorFormat,
    ) -> BackendResult<Self> {
        let layout = backend.create_layout(
            Self::LABEL,
            &[SlotKind::Image, SlotKind::Sampler, SlotKind::Uniform],
        )?;
        let sampler = backend.create_sampler("Composite Sampler")?;
        let params_buffer = backend.create_uniform_buffer(
            "Composite Params",
            std::mem::size_of::<CompositeParams>() as u64,
        )?;

        let pipeline = create_fullscreen_pipeline(backend, Self::LABEL, shader, layout, format);

        Ok(Self {
            layout,
            sampler,
            params_buffer,
            bind_group: None,
            pipeline,
            format,
        })
    }

    pub fn has_pipeline(&self) -> bool {
        self.pipeline.is_some()
    }

    pub fn reload(&mut self, backend: &mut dyn GraphicsBackend, shader: &str) -> bool {
        rebuild_fullscreen_pipeline(
            backend,
            &mut self.pipeline,
            Self::LABEL,
            shader,
            self.layout,
            self.format,
        )
    }

    /// Sample from a new offscreen target from now on
    pub fn set_source(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        source: TargetHandle,
    ) -> BackendResult<()> {
        let bind_group = backend.create_bind_group(
            self.layout,
            &[
                SlotResource::Image(source),
                SlotResource::Sampler(self.sampler),
                SlotResource::Uniform(self.params_buffer),
            ],
        )?;

        if let Some(old) = self.bind_group.replace(bind_group) {
            backend.destroy_bind_group(old);
        }
        Ok(())
    }

    /// Composite onto the frame's swapchain image. Returns true when the
    /// offscreen image was drawn.
    pub fn execute(&self, backend: &mut dyn GraphicsBackend, frame: &FrameContext) -> bool {
        let draw = self.pipeline.zip(self.bind_group);

        if draw.is_some() {
            let params = CompositeParams {
                screen_resolution: [frame.width as f32, frame.height as f32],
                _padding: [0.0; 2],
            };
            backend.write_uniform(self.params_buffer, bytemuck::bytes_of(&params));
        }

        backend.record_pass(&FullscreenPass {
            label: Self::LABEL,
            target: frame.swapchain,
            draw,
        });
        draw.is_some()
    }
}
