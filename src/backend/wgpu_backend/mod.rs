//! GPU backend on wgpu
//!
//! Every trait call maps onto the device right away: passes are encoded
//! into the frame's command encoder as they are recorded, and the encoder
//! is submitted in `end_frame`. Resources live in per-kind maps keyed by
//! the id inside their handle.

use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::traits::*;
use crate::backend::types::*;

/// Offscreen target with the view both passes use
struct GpuTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Swapchain image acquired for the frame in flight
struct Frame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

/// What `init_native` hands back. The surface and device keep the instance
/// context alive on their own, so the instance is not stored.
struct NativeGpu {
    surface: wgpu::Surface<'static>,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

pub struct WgpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    surface_format: ColorFormat,
    adapter_info: wgpu::AdapterInfo,
    frame: Option<Frame>,

    uniform_buffers: HashMap<u64, wgpu::Buffer>,
    targets: HashMap<u64, GpuTarget>,
    samplers: HashMap<u64, wgpu::Sampler>,
    layouts: HashMap<u64, wgpu::BindGroupLayout>,
    bind_groups: HashMap<u64, wgpu::BindGroup>,
    pipelines: HashMap<u64, wgpu::RenderPipeline>,
    // 0 is reserved for the swapchain
    next_id: u64,
}

fn to_wgpu_format(format: ColorFormat) -> wgpu::TextureFormat {
    match format {
        ColorFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        ColorFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        ColorFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
        ColorFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
        ColorFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
    }
}

fn from_wgpu_format(format: wgpu::TextureFormat) -> Option<ColorFormat> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm => Some(ColorFormat::Rgba8Unorm),
        wgpu::TextureFormat::Rgba8UnormSrgb => Some(ColorFormat::Rgba8UnormSrgb),
        wgpu::TextureFormat::Bgra8Unorm => Some(ColorFormat::Bgra8Unorm),
        wgpu::TextureFormat::Bgra8UnormSrgb => Some(ColorFormat::Bgra8UnormSrgb),
        wgpu::TextureFormat::Rgba16Float => Some(ColorFormat::Rgba16Float),
        _ => None,
    }
}

/// First sRGB format the surface offers that the passes can target,
/// otherwise the first one they can target at all
fn pick_surface_format(offered: &[wgpu::TextureFormat]) -> Option<(wgpu::TextureFormat, ColorFormat)> {
    let usable = || {
        offered
            .iter()
            .filter_map(|&native| from_wgpu_format(native).map(|format| (native, format)))
    };
    usable()
        .find(|(native, _)| native.is_srgb())
        .or_else(|| usable().next())
}

/// Shrink a requested surface size into `max_dimension`, keeping the aspect ratio
fn fit_surface_size(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width.max(1), height.max(1));
    }
    let scale = (max_dimension as f32 / width as f32).min(max_dimension as f32 / height as f32);
    (
        ((width as f32 * scale) as u32).clamp(1, max_dimension),
        ((height as f32 * scale) as u32).clamp(1, max_dimension),
    )
}

fn slot_layout_entry(binding: u32, kind: SlotKind) -> wgpu::BindGroupLayoutEntry {
    let ty = match kind {
        SlotKind::Uniform => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        SlotKind::Image => wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        SlotKind::Sampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
    };
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty,
        count: None,
    }
}

/// Run `f` inside validation and out-of-memory error scopes and report
/// whatever the device rejected.
fn scoped<T>(device: &wgpu::Device, f: impl FnOnce() -> T) -> Result<T, wgpu::Error> {
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = f();
    let validation = pollster::block_on(device.pop_error_scope());
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    match validation.or(out_of_memory) {
        Some(error) => Err(error),
        None => Ok(value),
    }
}

impl WgpuBackend {
    /// Create the backend for a window, blocking on adapter and device requests
    pub fn new(window: Arc<winit::window::Window>, vsync: bool) -> BackendResult<Self> {
        pollster::block_on(Self::new_async(window, vsync))
    }

    pub async fn new_async(window: Arc<winit::window::Window>, vsync: bool) -> BackendResult<Self> {
        let NativeGpu {
            surface,
            adapter,
            device,
            queue,
        } = Self::init_native(window.clone()).await?;

        device.on_uncaptured_error(Box::new(|error| {
            log::error!("Uncaptured wgpu error: {}", error);
        }));

        let caps = surface.get_capabilities(&adapter);
        let (native_format, surface_format) = pick_surface_format(&caps.formats).ok_or_else(|| {
            BackendError::Surface(format!("no supported format among {:?}", caps.formats))
        })?;
        log::debug!("Swapchain format: {:?}", native_format);

        let size = window.inner_size();
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: native_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let mut backend = Self {
            surface,
            device,
            queue,
            surface_config,
            surface_format,
            adapter_info: adapter.get_info(),
            frame: None,
            uniform_buffers: HashMap::new(),
            targets: HashMap::new(),
            samplers: HashMap::new(),
            layouts: HashMap::new(),
            bind_groups: HashMap::new(),
            pipelines: HashMap::new(),
            next_id: 1,
        };

        // Configures the surface, fitted to the device limits
        backend.resize(size.width, size.height);
        Ok(backend)
    }

    async fn init_native(window: Arc<winit::window::Window>) -> BackendResult<NativeGpu> {
        // Vulkan first on Windows, where the D3D12 debug layer is noisy
        let preferred = if std::env::var("WGPU_BACKEND").is_ok() {
            wgpu::util::backend_bits_from_env().unwrap_or(wgpu::Backends::all())
        } else if cfg!(target_os = "windows") {
            wgpu::Backends::VULKAN
        } else {
            wgpu::Backends::all()
        };

        let (surface, adapter) = match Self::request_adapter(&window, preferred).await? {
            Some(found) => found,
            None if preferred != wgpu::Backends::all() => {
                log::warn!("No adapter on {:?}, trying every backend", preferred);
                Self::request_adapter(&window, wgpu::Backends::all())
                    .await?
                    .ok_or_else(|| BackendError::NoAdapter("no backend offered one".into()))?
            }
            None => return Err(BackendError::NoAdapter("no backend offered one".into())),
        };

        let info = adapter.get_info();
        log::info!("Selected GPU: {} ({:?} backend)", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Raytrace Viewer Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults()
                        .using_resolution(adapter.limits()),
                },
                None,
            )
            .await
            .map_err(|e| BackendError::Device(e.to_string()))?;

        Ok(NativeGpu {
            surface,
            adapter,
            device,
            queue,
        })
    }

    /// A surface for the window and an adapter that can present to it
    async fn request_adapter(
        window: &Arc<winit::window::Window>,
        backends: wgpu::Backends,
    ) -> BackendResult<Option<(wgpu::Surface<'static>, wgpu::Adapter)>> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| BackendError::Surface(e.to_string()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await;
        Ok(adapter.map(|adapter| (surface, adapter)))
    }

    /// Name and API of the GPU in use
    pub fn adapter_summary(&self) -> String {
        format!("{} ({:?})", self.adapter_info.name, self.adapter_info.backend)
    }

    fn next_handle(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn resolve(&self, resource: &SlotResource) -> BackendResult<wgpu::BindingResource<'_>> {
        let missing = || BackendError::Bindings(format!("{:?} does not exist", resource));
        Ok(match resource {
            SlotResource::Uniform(buffer) => self
                .uniform_buffers
                .get(&buffer.0)
                .ok_or_else(missing)?
                .as_entire_binding(),
            SlotResource::Image(target) => wgpu::BindingResource::TextureView(
                &self.targets.get(&target.0).ok_or_else(missing)?.view,
            ),
            SlotResource::Sampler(sampler) => {
                wgpu::BindingResource::Sampler(self.samplers.get(&sampler.0).ok_or_else(missing)?)
            }
        })
    }
}

impl GraphicsBackend for WgpuBackend {
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let max_dimension = self.device.limits().max_texture_dimension_2d;
        let (width, height) = fit_surface_size(width, height, max_dimension);
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    fn swapchain_format(&self) -> ColorFormat {
        self.surface_format
    }

    fn begin_frame(&mut self) -> BackendResult<FrameContext> {
        let surface_texture = self.surface.get_current_texture().map_err(|e| match e {
            wgpu::SurfaceError::Lost => BackendError::SurfaceLost,
            wgpu::SurfaceError::Outdated => BackendError::SurfaceOutdated,
            wgpu::SurfaceError::Timeout => BackendError::Timeout,
            wgpu::SurfaceError::OutOfMemory => BackendError::OutOfMemory,
        })?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.frame = Some(Frame {
            surface_texture,
            view,
            encoder,
        });
        Ok(FrameContext {
            swapchain: TargetHandle::SWAPCHAIN,
            width: self.surface_config.width,
            height: self.surface_config.height,
        })
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        if let Some(frame) = self.frame.take() {
            self.queue.submit(std::iter::once(frame.encoder.finish()));
            frame.surface_texture.present();
        }
        Ok(())
    }

    fn create_uniform_buffer(&mut self, label: &str, size: u64) -> BackendResult<UniformBufferHandle> {
        let buffer = scoped(&self.device, || {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        })
        .map_err(|e| BackendError::Uniforms(e.to_string()))?;

        let id = self.next_handle();
        self.uniform_buffers.insert(id, buffer);
        Ok(UniformBufferHandle(id))
    }

    fn write_uniform(&mut self, buffer: UniformBufferHandle, data: &[u8]) {
        if let Some(buffer) = self.uniform_buffers.get(&buffer.0) {
            self.queue.write_buffer(buffer, 0, data);
        }
    }

    fn create_target(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        format: ColorFormat,
    ) -> BackendResult<TargetHandle> {
        let max_dimension = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max_dimension || height > max_dimension {
            return Err(BackendError::Target(format!(
                "{}x{} is outside 1..={}",
                width, height, max_dimension
            )));
        }

        let texture = scoped(&self.device, || {
            self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: to_wgpu_format(format),
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            })
        })
        .map_err(|e| BackendError::Target(e.to_string()))?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let id = self.next_handle();
        self.targets.insert(id, GpuTarget { texture, view });
        Ok(TargetHandle(id))
    }

    fn destroy_target(&mut self, target: TargetHandle) {
        if let Some(target) = self.targets.remove(&target.0) {
            target.texture.destroy();
        }
    }

    fn create_sampler(&mut self, label: &str) -> BackendResult<SamplerHandle> {
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let id = self.next_handle();
        self.samplers.insert(id, sampler);
        Ok(SamplerHandle(id))
    }

    fn create_layout(&mut self, label: &str, slots: &[SlotKind]) -> BackendResult<LayoutHandle> {
        let entries: Vec<_> = slots
            .iter()
            .zip(0u32..)
            .map(|(&kind, binding)| slot_layout_entry(binding, kind))
            .collect();
        let layout = self
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &entries,
            });

        let id = self.next_handle();
        self.layouts.insert(id, layout);
        Ok(LayoutHandle(id))
    }

    fn create_bind_group(
        &mut self,
        layout: LayoutHandle,
        resources: &[SlotResource],
    ) -> BackendResult<BindGroupHandle> {
        let bind_group = {
            let layout = self
                .layouts
                .get(&layout.0)
                .ok_or_else(|| BackendError::Bindings(format!("{:?} does not exist", layout)))?;
            let entries = resources
                .iter()
                .zip(0u32..)
                .map(|(resource, binding)| -> BackendResult<wgpu::BindGroupEntry> {
                    Ok(wgpu::BindGroupEntry {
                        binding,
                        resource: self.resolve(resource)?,
                    })
                })
                .collect::<BackendResult<Vec<_>>>()?;

            scoped(&self.device, || {
                self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: None,
                    layout,
                    entries: &entries,
                })
            })
            .map_err(|e| BackendError::Bindings(e.to_string()))?
        };

        let id = self.next_handle();
        self.bind_groups.insert(id, bind_group);
        Ok(BindGroupHandle(id))
    }

    fn destroy_bind_group(&mut self, bind_group: BindGroupHandle) {
        self.bind_groups.remove(&bind_group.0);
    }

    fn create_pipeline(&mut self, desc: &FullscreenPipelineDesc) -> BackendResult<PipelineHandle> {
        let layout = self
            .layouts
            .get(&desc.layout.0)
            .ok_or_else(|| BackendError::Shader(format!("{:?} does not exist", desc.layout)))?;

        let pipeline = scoped(&self.device, || {
            let module = self
                .device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(desc.label),
                    source: wgpu::ShaderSource::Wgsl(desc.shader.into()),
                });
            let pipeline_layout = self
                .device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some(desc.label),
                    bind_group_layouts: &[layout],
                    push_constant_ranges: &[],
                });

            self.device
                .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(desc.label),
                    layout: Some(&pipeline_layout),
                    vertex: wgpu::VertexState {
                        module: &module,
                        entry_point: "vs_main",
                        buffers: &[],
                        compilation_options: Default::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &module,
                        entry_point: "fs_main",
                        targets: &[Some(to_wgpu_format(desc.format).into())],
                        compilation_options: Default::default(),
                    }),
                    primitive: wgpu::PrimitiveState::default(),
                    depth_stencil: None,
                    multisample: wgpu::MultisampleState::default(),
                    multiview: None,
                })
        })
        .map_err(|e| BackendError::Shader(e.to_string()))?;

        let id = self.next_handle();
        self.pipelines.insert(id, pipeline);
        Ok(PipelineHandle(id))
    }

    fn destroy_pipeline(&mut self, pipeline: PipelineHandle) {
        self.pipelines.remove(&pipeline.0);
    }

    fn record_pass(&mut self, pass: &FullscreenPass) {
        let Some(frame) = self.frame.as_mut() else {
            return;
        };
        let view = if pass.target == TargetHandle::SWAPCHAIN {
            &frame.view
        } else if let Some(target) = self.targets.get(&pass.target.0) {
            &target.view
        } else {
            log::warn!("Skipping pass '{}': {:?} is gone", pass.label, pass.target);
            return;
        };
        let draw = pass.draw.and_then(|(pipeline, bind_group)| {
            Some((self.pipelines.get(&pipeline.0)?, self.bind_groups.get(&bind_group.0)?))
        });

        let [r, g, b, a] = CLEAR_COLOR.map(f64::from);
        let mut render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(pass.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Some((pipeline, bind_group)) = draw {
            render_pass.set_pipeline(pipeline);
            render_pass.set_bind_group(0, bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }
    }
}

// egui draws through wgpu directly
impl WgpuBackend {
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn wgpu_surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    /// Device, queue and the frame's encoder at once, for uploading egui buffers
    pub fn device_queue_encoder(
        &mut self,
    ) -> (&wgpu::Device, &wgpu::Queue, Option<&mut wgpu::CommandEncoder>) {
        let encoder = self.frame.as_mut().map(|frame| &mut frame.encoder);
        (&self.device, &self.queue, encoder)
    }

    /// Paint egui over the composited swapchain image
    pub fn render_egui(
        &mut self,
        renderer: &egui_wgpu::Renderer,
        paint_jobs: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        let Some(frame) = self.frame.as_mut() else {
            return;
        };

        let mut render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("egui Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        renderer.render(&mut render_pass, paint_jobs, screen_descriptor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_format_prefers_srgb() {
        let offered = [
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Bgra8UnormSrgb,
        ];
        assert_eq!(
            pick_surface_format(&offered),
            Some((wgpu::TextureFormat::Bgra8UnormSrgb, ColorFormat::Bgra8UnormSrgb))
        );
    }

    #[test]
    fn surface_format_skips_what_passes_cannot_target() {
        let offered = [
            wgpu::TextureFormat::Rgb10a2Unorm,
            wgpu::TextureFormat::Rgba8Unorm,
        ];
        assert_eq!(
            pick_surface_format(&offered),
            Some((wgpu::TextureFormat::Rgba8Unorm, ColorFormat::Rgba8Unorm))
        );
        assert_eq!(pick_surface_format(&[wgpu::TextureFormat::Rgb10a2Unorm]), None);
    }

    #[test]
    fn oversized_surface_keeps_aspect() {
        assert_eq!(fit_surface_size(1280, 800, 8192), (1280, 800));
        assert_eq!(fit_surface_size(16384, 8192, 8192), (8192, 4096));
        assert_eq!(fit_surface_size(0, 0, 8192), (1, 1));
    }

    #[test]
    fn formats_convert_both_ways() {
        for format in [
            ColorFormat::Rgba8Unorm,
            ColorFormat::Rgba8UnormSrgb,
            ColorFormat::Bgra8Unorm,
            ColorFormat::Bgra8UnormSrgb,
            ColorFormat::Rgba16Float,
        ] {
            assert_eq!(from_wgpu_format(to_wgpu_format(format)), Some(format));
        }
    }
}
