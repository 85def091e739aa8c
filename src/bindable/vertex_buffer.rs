use bytemuck::Pod;

use crate::{
    bindable::Bindable,
    rendering::{context::GpuBuffer, GraphicsError, RenderContext},
};

pub struct VertexBuffer {
    buffer: GpuBuffer,
    stride: u32,
}

impl VertexBuffer {
    pub fn new<V: Pod>(ctx: &mut dyn RenderContext, vertices: &[V]) -> Result<Self, GraphicsError> {
        let stride = std::mem::size_of::<V>() as u32;
        log::debug!("Creating vertex buffer: {} vertices, stride {}", vertices.len(), stride);

        let buffer = ctx.create_vertex_buffer(bytemuck::cast_slice(vertices), stride)?;
        Ok(Self { buffer, stride })
    }
}

impl Bindable for VertexBuffer {
    fn bind(&self, ctx: &mut dyn RenderContext) {
        ctx.set_vertex_buffer(0, &self.buffer, self.stride);
    }
}
