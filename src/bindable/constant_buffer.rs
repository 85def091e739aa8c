use std::marker::PhantomData;

use bytemuck::Pod;

use crate::{
    bindable::Bindable,
    rendering::{context::GpuBuffer, GraphicsError, RenderContext, ShaderStage},
};

/// Pipeline stage a constant buffer attaches to.
pub trait StageMarker {
    const STAGE: ShaderStage;
}

pub enum VertexStage {}
pub enum PixelStage {}

impl StageMarker for VertexStage {
    const STAGE: ShaderStage = ShaderStage::Vertex;
}

impl StageMarker for PixelStage {
    const STAGE: ShaderStage = ShaderStage::Pixel;
}

pub type VertexConstantBuffer<C> = ConstantBuffer<C, VertexStage>;
pub type PixelConstantBuffer<C> = ConstantBuffer<C, PixelStage>;

/// A constant buffer holding one `C`. The GPU resource is created once and
/// fully rewritten by every [`ConstantBuffer::update`].
pub struct ConstantBuffer<C, S> {
    buffer: GpuBuffer,
    _marker: PhantomData<(fn() -> C, S)>,
}

impl<C: Pod, S: StageMarker> ConstantBuffer<C, S> {
    pub fn new(ctx: &mut dyn RenderContext, constants: &C) -> Result<Self, GraphicsError> {
        log::trace!(
            "Creating {:?} constant buffer of {} bytes",
            S::STAGE,
            std::mem::size_of::<C>()
        );

        let buffer = ctx.create_constant_buffer(S::STAGE, bytemuck::bytes_of(constants))?;
        Ok(Self {
            buffer,
            _marker: PhantomData,
        })
    }

    /// Zero-filled, to be written later with [`ConstantBuffer::update`].
    pub fn zeroed(ctx: &mut dyn RenderContext) -> Result<Self, GraphicsError> {
        Self::new(ctx, &C::zeroed())
    }

    pub fn update(&self, ctx: &mut dyn RenderContext, constants: &C) -> Result<(), GraphicsError> {
        ctx.update_constant_buffer(&self.buffer, bytemuck::bytes_of(constants))
    }

    /// A bind-list entry aliasing this buffer, so the owner can keep updating it.
    pub fn binding(&self) -> ConstantBinding {
        ConstantBinding {
            stage: S::STAGE,
            buffer: self.buffer.clone(),
        }
    }

    pub fn gpu_buffer(&self) -> &GpuBuffer {
        &self.buffer
    }
}

impl<C: Pod, S: StageMarker> Bindable for ConstantBuffer<C, S> {
    fn bind(&self, ctx: &mut dyn RenderContext) {
        ctx.set_constant_buffer(S::STAGE, &self.buffer);
    }
}

/// Stage-tagged handle to a constant buffer, stored in bind lists.
#[derive(Debug)]
pub struct ConstantBinding {
    stage: ShaderStage,
    buffer: GpuBuffer,
}

impl ConstantBinding {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl Bindable for ConstantBinding {
    fn bind(&self, ctx: &mut dyn RenderContext) {
        ctx.set_constant_buffer(self.stage, &self.buffer);
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec4;

    use super::*;
    use crate::rendering::headless::{Command, HeadlessContext};

    #[test]
    fn zeroed_buffer_is_all_zero_bytes() {
        let mut ctx = HeadlessContext::new();
        let buffer = PixelConstantBuffer::<Vec4>::zeroed(&mut ctx).unwrap();

        assert_eq!(ctx.read_buffer(buffer.gpu_buffer()), &[0u8; 16]);
        assert_eq!(ctx.stats().constant_buffers, 1);
    }

    #[test]
    fn update_keeps_the_same_resource() {
        let mut ctx = HeadlessContext::new();
        let buffer = VertexConstantBuffer::new(&mut ctx, &Vec4::ONE).unwrap();

        buffer.update(&mut ctx, &Vec4::splat(2.0)).unwrap();
        buffer.update(&mut ctx, &Vec4::splat(3.0)).unwrap();

        let stats = ctx.stats();
        assert_eq!(stats.constant_buffers, 1);
        assert_eq!(stats.constant_updates, 2);
        assert_eq!(
            ctx.read_buffer(buffer.gpu_buffer()),
            bytemuck::bytes_of(&Vec4::splat(3.0))
        );
    }

    #[test]
    fn binding_attaches_to_the_marker_stage() {
        let mut ctx = HeadlessContext::new();
        let buffer = PixelConstantBuffer::<Vec4>::zeroed(&mut ctx).unwrap();

        let binding = buffer.binding();
        assert_eq!(binding.stage(), ShaderStage::Pixel);

        binding.bind(&mut ctx);
        assert!(matches!(
            ctx.commands(),
            [Command::SetConstantBuffer {
                stage: ShaderStage::Pixel,
                ..
            }]
        ));
    }
}
