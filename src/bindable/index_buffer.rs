use crate::{
    bindable::Bindable,
    rendering::{context::GpuBuffer, GraphicsError, RenderContext},
};

/// 16-bit index source for a drawable.
///
/// Has no conversion into [`Bind`](crate::bindable::Bind); index
/// buffers are attached with `add_index_buffer` or `add_shared_index_buffer`.
pub struct IndexBuffer {
    buffer: GpuBuffer,
    count: u32,
}

impl IndexBuffer {
    pub fn new(ctx: &mut dyn RenderContext, indices: &[u16]) -> Result<Self, GraphicsError> {
        log::debug!("Creating index buffer: {} indices", indices.len());

        let buffer = ctx.create_index_buffer(indices)?;
        Ok(Self {
            buffer,
            count: indices.len() as u32,
        })
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

impl Bindable for IndexBuffer {
    fn bind(&self, ctx: &mut dyn RenderContext) {
        ctx.set_index_buffer(&self.buffer);
    }
}
