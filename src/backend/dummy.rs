//! Headless backend for exercising the render loop without a GPU.
//!
//! Hands out handles, records what the engine asks for as [`DummyCommand`]s
//! and can be told to reject offscreen targets or shaders. Bind groups are
//! checked against their layout so a stale target handle shows up as an
//! error, the way the real device would reject it.

use std::collections::{HashMap, HashSet};

use crate::backend::traits::*;
use crate::backend::types::*;

/// A command recorded by [`DummyBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum DummyCommand {
    BeginFrame,
    EndFrame,
    CreateTarget { width: u32, height: u32 },
    DestroyTarget(TargetHandle),
    WriteUniform { buffer: UniformBufferHandle, data: Vec<u8> },
    Pass {
        label: String,
        target: TargetHandle,
        pipeline: Option<PipelineHandle>,
    },
}

#[derive(Debug)]
pub struct DummyBackend {
    width: u32,
    height: u32,
    next_id: u64,
    live_targets: HashSet<u64>,
    layouts: HashMap<u64, Vec<SlotKind>>,
    commands: Vec<DummyCommand>,
    /// Reject every offscreen target while set
    pub fail_texture_creation: bool,
    /// Reject every shader while set
    pub fail_pipeline_creation: bool,
}

impl DummyBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            // 0 is the swapchain
            next_id: 1,
            live_targets: HashSet::new(),
            layouts: HashMap::new(),
            commands: Vec::new(),
            fail_texture_creation: false,
            fail_pipeline_creation: false,
        }
    }

    pub fn commands(&self) -> &[DummyCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the log empty
    pub fn take_commands(&mut self) -> Vec<DummyCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Offscreen targets created and not yet destroyed
    pub fn live_texture_count(&self) -> usize {
        self.live_targets.len()
    }

    fn next_handle(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl GraphicsBackend for DummyBackend {
    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            log::trace!("DummyBackend: surface now {}x{}", width, height);
            self.width = width;
            self.height = height;
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn swapchain_format(&self) -> ColorFormat {
        ColorFormat::Bgra8UnormSrgb
    }

    fn begin_frame(&mut self) -> BackendResult<FrameContext> {
        self.commands.push(DummyCommand::BeginFrame);
        Ok(FrameContext {
            swapchain: TargetHandle::SWAPCHAIN,
            width: self.width,
            height: self.height,
        })
    }

    fn end_frame(&mut self) -> BackendResult<()> {
        self.commands.push(DummyCommand::EndFrame);
        Ok(())
    }

    fn create_uniform_buffer(&mut self, label: &str, size: u64) -> BackendResult<UniformBufferHandle> {
        log::trace!("DummyBackend: uniform buffer '{}' ({} bytes)", label, size);
        Ok(UniformBufferHandle(self.next_handle()))
    }

    fn write_uniform(&mut self, buffer: UniformBufferHandle, data: &[u8]) {
        self.commands.push(DummyCommand::WriteUniform {
            buffer,
            data: data.to_vec(),
        });
    }

    fn create_target(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        _format: ColorFormat,
    ) -> BackendResult<TargetHandle> {
        if self.fail_texture_creation {
            return Err(BackendError::Target(format!(
                "'{}' refused at {}x{}",
                label, width, height
            )));
        }
        let id = self.next_handle();
        self.live_targets.insert(id);
        self.commands.push(DummyCommand::CreateTarget { width, height });
        Ok(TargetHandle(id))
    }

    fn destroy_target(&mut self, target: TargetHandle) {
        self.live_targets.remove(&target.0);
        self.commands.push(DummyCommand::DestroyTarget(target));
    }

    fn create_sampler(&mut self, _label: &str) -> BackendResult<SamplerHandle> {
        Ok(SamplerHandle(self.next_handle()))
    }

    fn create_layout(&mut self, _label: &str, slots: &[SlotKind]) -> BackendResult<LayoutHandle> {
        let id = self.next_handle();
        self.layouts.insert(id, slots.to_vec());
        Ok(LayoutHandle(id))
    }

    fn create_bind_group(
        &mut self,
        layout: LayoutHandle,
        resources: &[SlotResource],
    ) -> BackendResult<BindGroupHandle> {
        let slots = self
            .layouts
            .get(&layout.0)
            .ok_or_else(|| BackendError::Bindings("unknown layout".into()))?;
        let kinds: Vec<SlotKind> = resources.iter().map(SlotResource::kind).collect();
        if &kinds != slots {
            return Err(BackendError::Bindings(format!(
                "layout expects {:?}, got {:?}",
                slots, kinds
            )));
        }
        for resource in resources {
            if let SlotResource::Image(target) = resource {
                if !self.live_targets.contains(&target.0) {
                    return Err(BackendError::Bindings(format!("{:?} was destroyed", target)));
                }
            }
        }
        Ok(BindGroupHandle(self.next_handle()))
    }

    fn destroy_bind_group(&mut self, _bind_group: BindGroupHandle) {}

    fn create_pipeline(&mut self, desc: &FullscreenPipelineDesc) -> BackendResult<PipelineHandle> {
        if self.fail_pipeline_creation {
            return Err(BackendError::Shader(format!("'{}' refused", desc.label)));
        }
        Ok(PipelineHandle(self.next_handle()))
    }

    fn destroy_pipeline(&mut self, _pipeline: PipelineHandle) {}

    fn record_pass(&mut self, pass: &FullscreenPass) {
        self.commands.push(DummyCommand::Pass {
            label: pass.label.to_string(),
            target: pass.target,
            pipeline: pass.draw.map(|(pipeline, _)| pipeline),
        });
    }
}
