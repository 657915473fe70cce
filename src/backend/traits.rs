//! The interface the render loop draws through

use thiserror::Error;

use super::types::*;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("No usable GPU adapter: {0}")]
    NoAdapter(String),
    #[error("Cannot present to the window: {0}")]
    Surface(String),
    #[error("GPU device request failed: {0}")]
    Device(String),
    #[error("Offscreen target rejected: {0}")]
    Target(String),
    #[error("Uniform buffer rejected: {0}")]
    Uniforms(String),
    #[error("Bind group rejected: {0}")]
    Bindings(String),
    #[error("Shader rejected: {0}")]
    Shader(String),
    #[error("Swapchain image lost")]
    SurfaceLost,
    #[error("Swapchain out of date")]
    SurfaceOutdated,
    #[error("Timed out waiting for a swapchain image")]
    Timeout,
    #[error("GPU out of memory")]
    OutOfMemory,
}

impl BackendError {
    /// Errors after which the next frame can simply try again
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::SurfaceLost | BackendError::SurfaceOutdated | BackendError::Timeout
        )
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// GPU access for the raytrace and composite passes.
///
/// A frame is `begin_frame`, any number of `record_pass` calls, then
/// `end_frame` which submits and presents.
pub trait GraphicsBackend {
    /// Resize the swapchain; zero sizes are ignored
    fn resize(&mut self, width: u32, height: u32);

    /// Current swapchain size in pixels
    fn surface_size(&self) -> (u32, u32);

    fn swapchain_format(&self) -> ColorFormat;

    fn begin_frame(&mut self) -> BackendResult<FrameContext>;

    fn end_frame(&mut self) -> BackendResult<()>;

    fn create_uniform_buffer(&mut self, label: &str, size: u64) -> BackendResult<UniformBufferHandle>;

    fn write_uniform(&mut self, buffer: UniformBufferHandle, data: &[u8]);

    /// Allocate an offscreen target that can be drawn into and sampled
    fn create_target(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        format: ColorFormat,
    ) -> BackendResult<TargetHandle>;

    fn destroy_target(&mut self, target: TargetHandle);

    fn create_sampler(&mut self, label: &str) -> BackendResult<SamplerHandle>;

    fn create_layout(&mut self, label: &str, slots: &[SlotKind]) -> BackendResult<LayoutHandle>;

    /// Bind one resource per slot of `layout`, in slot order
    fn create_bind_group(
        &mut self,
        layout: LayoutHandle,
        resources: &[SlotResource],
    ) -> BackendResult<BindGroupHandle>;

    fn destroy_bind_group(&mut self, bind_group: BindGroupHandle);

    fn create_pipeline(&mut self, desc: &FullscreenPipelineDesc) -> BackendResult<PipelineHandle>;

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle);

    /// Clear the pass target to [`CLEAR_COLOR`] and draw the full-screen triangle, if any
    fn record_pass(&mut self, pass: &FullscreenPass);
}
