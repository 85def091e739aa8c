use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::{
    bindable::{constant_buffer::VertexConstantBuffer, Bindable},
    rendering::{context::GpuBuffer, GraphicsError, RenderContext},
};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TransformUniform {
    pub model_view_projection: Mat4,
}

/// Per-instance vertex constant buffer holding the object-to-clip transform.
pub struct TransformConstantBuffer {
    buffer: VertexConstantBuffer<TransformUniform>,
}

impl TransformConstantBuffer {
    pub fn new(ctx: &mut dyn RenderContext) -> Result<Self, GraphicsError> {
        Ok(Self {
            buffer: VertexConstantBuffer::zeroed(ctx)?,
        })
    }

    /// Uploads `projection * parent_transform` and binds the buffer.
    ///
    /// glam matrices are column-major and multiply column vectors, so this
    /// is the matrix a row-vector convention would write as `transpose(M * P)`.
    /// Recomputed on every call.
    pub fn bind_with(
        &self,
        ctx: &mut dyn RenderContext,
        parent_transform: Mat4,
    ) -> Result<(), GraphicsError> {
        let uniform = TransformUniform {
            model_view_projection: ctx.projection() * parent_transform,
        };

        self.buffer.update(ctx, &uniform)?;
        self.buffer.bind(ctx);
        Ok(())
    }

    pub fn gpu_buffer(&self) -> &GpuBuffer {
        self.buffer.gpu_buffer()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::rendering::headless::HeadlessContext;

    fn uploaded(ctx: &HeadlessContext, cbuf: &TransformConstantBuffer) -> Mat4 {
        bytemuck::pod_read_unaligned::<TransformUniform>(ctx.read_buffer(cbuf.gpu_buffer()))
            .model_view_projection
    }

    #[test]
    fn model_is_applied_before_projection() {
        let mut ctx = HeadlessContext::new();
        let projection = Mat4::perspective_lh(1.2, 4.0 / 3.0, 0.5, 40.0);
        ctx.set_projection(projection);

        let cbuf = TransformConstantBuffer::new(&mut ctx).unwrap();
        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 20.0));
        cbuf.bind_with(&mut ctx, model).unwrap();

        let point = Vec3::new(0.5, -0.5, 0.0).extend(1.0);
        let expected = projection * (model * point);
        assert!((uploaded(&ctx, &cbuf) * point).abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn every_bind_recomputes() {
        let mut ctx = HeadlessContext::new();
        let cbuf = TransformConstantBuffer::new(&mut ctx).unwrap();

        cbuf.bind_with(&mut ctx, Mat4::from_scale(Vec3::splat(2.0))).unwrap();
        cbuf.bind_with(&mut ctx, Mat4::IDENTITY).unwrap();

        assert_eq!(uploaded(&ctx, &cbuf), Mat4::IDENTITY);
        assert_eq!(ctx.stats().constant_updates, 2);
    }
}
