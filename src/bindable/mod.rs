//! Units of pipeline state that are activated before a draw.

use glam::Mat4;

use crate::rendering::{GraphicsError, RenderContext};

pub mod constant_buffer;
pub mod index_buffer;
pub mod input_layout;
pub mod shader;
pub mod topology;
pub mod transform_cbuf;
pub mod vertex_buffer;

pub use constant_buffer::{ConstantBinding, ConstantBuffer, PixelConstantBuffer, VertexConstantBuffer};
pub use index_buffer::IndexBuffer;
pub use input_layout::InputLayout;
pub use shader::{PixelShader, VertexShader};
pub use topology::Topology;
pub use transform_cbuf::{TransformConstantBuffer, TransformUniform};
pub use vertex_buffer::VertexBuffer;

/// Sets one piece of pipeline state. Safe to call every frame.
pub trait Bindable {
    fn bind(&self, ctx: &mut dyn RenderContext);
}

/// Everything that may go into a drawable's or a type's bind list.
///
/// There is no index buffer variant, so an index buffer cannot
/// be added through the generic path:
///
/// ```compile_fail
/// use boxdance::bindable::{Bind, IndexBuffer};
/// use boxdance::rendering::headless::HeadlessContext;
///
/// let mut ctx = HeadlessContext::new();
/// let indices = IndexBuffer::new(&mut ctx, &[0, 1, 2]).unwrap();
/// let bind = Bind::from(indices);
/// ```
pub enum Bind {
    VertexBuffer(VertexBuffer),
    VertexShader(VertexShader),
    PixelShader(PixelShader),
    InputLayout(InputLayout),
    Topology(Topology),
    Constants(ConstantBinding),
    Transform(TransformConstantBuffer),
}

impl Bind {
    /// `parent_transform` is the owning drawable's current world transform,
    /// consumed by [`Bind::Transform`] only.
    pub fn bind(
        &self,
        ctx: &mut dyn RenderContext,
        parent_transform: Mat4,
    ) -> Result<(), GraphicsError> {
        match self {
            Bind::VertexBuffer(bind) => bind.bind(ctx),
            Bind::VertexShader(bind) => bind.bind(ctx),
            Bind::PixelShader(bind) => bind.bind(ctx),
            Bind::InputLayout(bind) => bind.bind(ctx),
            Bind::Topology(bind) => bind.bind(ctx),
            Bind::Constants(bind) => bind.bind(ctx),
            Bind::Transform(bind) => return bind.bind_with(ctx, parent_transform),
        }

        Ok(())
    }
}

macro_rules! impl_from_bindable {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Bind {
                fn from(bind: $ty) -> Self {
                    Bind::$variant(bind)
                }
            }
        )*
    };
}

impl_from_bindable!(
    VertexBuffer(VertexBuffer),
    VertexShader(VertexShader),
    PixelShader(PixelShader),
    InputLayout(InputLayout),
    Topology(Topology),
    Constants(ConstantBinding),
    Transform(TransformConstantBuffer),
);
