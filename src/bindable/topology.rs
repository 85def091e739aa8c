use crate::{bindable::Bindable, rendering::RenderContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology(wgpu::PrimitiveTopology);

impl Topology {
    pub const TRIANGLE_LIST: Self = Self(wgpu::PrimitiveTopology::TriangleList);

    pub fn new(topology: wgpu::PrimitiveTopology) -> Self {
        Self(topology)
    }

    pub fn get(self) -> wgpu::PrimitiveTopology {
        self.0
    }
}

impl Bindable for Topology {
    fn bind(&self, ctx: &mut dyn RenderContext) {
        ctx.set_topology(self.0);
    }
}
