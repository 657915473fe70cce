//! Resources the two full-screen passes are built from
//!
//! The raytrace pass draws into an offscreen HDR target and the composite
//! pass samples that target onto the swapchain image. Every binding is read
//! by the fragment stage only, and every pass starts by clearing its target
//! to [`CLEAR_COLOR`].

/// Color every pass clears its target to before drawing
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Formats a color target can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    /// Half-float HDR, used for the raytraced image
    Rgba16Float,
}

impl ColorFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            ColorFormat::Rgba16Float => 8,
            _ => 4,
        }
    }
}

/// A uniform buffer, rewritten whole each time it is updated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformBufferHandle(pub(crate) u64);

/// Something a pass can render into. Offscreen targets can also be sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetHandle(pub(crate) u64);

impl TargetHandle {
    /// The swapchain image of the frame in flight
    pub const SWAPCHAIN: TargetHandle = TargetHandle(0);
}

/// Bilinear sampler clamped to the edges of the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerHandle(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutHandle(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindGroupHandle(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineHandle(pub(crate) u64);

/// What a shader expects at one binding slot. Slots are numbered by their
/// position in the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Uniform,
    /// Filterable float image
    Image,
    Sampler,
}

/// What gets bound to a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotResource {
    Uniform(UniformBufferHandle),
    Image(TargetHandle),
    Sampler(SamplerHandle),
}

impl SlotResource {
    pub fn kind(&self) -> SlotKind {
        match self {
            SlotResource::Uniform(_) => SlotKind::Uniform,
            SlotResource::Image(_) => SlotKind::Image,
            SlotResource::Sampler(_) => SlotKind::Sampler,
        }
    }
}

/// A pipeline that draws one screen-covering triangle from `vertex_index`.
/// The shader provides `vs_main` and `fs_main` and reads bind group 0.
#[derive(Debug, Clone, Copy)]
pub struct FullscreenPipelineDesc<'a> {
    pub label: &'a str,
    pub shader: &'a str,
    pub layout: LayoutHandle,
    pub format: ColorFormat,
}

/// One pass over a target. Without `draw` the target is only cleared.
#[derive(Debug, Clone, Copy)]
pub struct FullscreenPass<'a> {
    pub label: &'a str,
    pub target: TargetHandle,
    pub draw: Option<(PipelineHandle, BindGroupHandle)>,
}

/// Per-frame information returned by `begin_frame`
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    pub swapchain: TargetHandle,
    pub width: u32,
    pub height: u32,
}
