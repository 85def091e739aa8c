//! Entities that own bind lists and draw themselves.

use std::{
    any::TypeId,
    rc::{Rc, Weak},
};

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

use crate::{
    bindable::{Bind, Bindable, IndexBuffer},
    rendering::{BindError, GraphicsError, InputElement, RenderContext},
};

pub mod orbiting_box;
pub mod shared;
pub mod sheet;

pub use orbiting_box::{Motion, MotionDistributions, OrbitingBox};
pub use shared::{SharedBindRegistry, SharedBinds};
pub use sheet::{Sheet, SheetDesc};

pub const TRANSFORM_VS: &str = "transform_vs.wgsl";
pub const TINT_PS: &str = "tint_ps.wgsl";

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
}

impl Vertex {
    pub const LAYOUT: [InputElement; 1] = [InputElement::new(
        "Position",
        0,
        wgpu::VertexFormat::Float32x3,
    )];
}

/// Pixel-stage colour constants read by `tint_ps.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Tint {
    pub color: Vec4,
}

enum IndexSource {
    Owned(IndexBuffer),
    Shared(Weak<IndexBuffer>),
}

/// Instance-owned binds of a drawable plus its single index buffer.
pub struct DrawBinds {
    binds: Vec<Bind>,
    index_buffer: Option<IndexSource>,
    shared_key: Option<TypeId>,
}

impl DrawBinds {
    /// Bind list of a drawable that owns all of its state.
    pub fn new() -> Self {
        Self {
            binds: Vec::new(),
            index_buffer: None,
            shared_key: None,
        }
    }

    /// Bind list of a drawable that also binds the shared binds of `T`.
    pub fn sharing<T: 'static>() -> Self {
        Self {
            shared_key: Some(TypeId::of::<T>()),
            ..Self::new()
        }
    }

    pub fn add_bind(&mut self, bind: impl Into<Bind>) {
        self.binds.push(bind.into());
    }

    pub fn add_index_buffer(&mut self, index_buffer: IndexBuffer) -> Result<(), BindError> {
        if self.index_buffer.is_some() {
            return Err(BindError::IndexBufferAlreadySet);
        }

        self.index_buffer = Some(IndexSource::Owned(index_buffer));
        Ok(())
    }

    /// Takes a non-owning reference to the index buffer of `shared`.
    pub fn adopt_shared_index_buffer(&mut self, shared: &SharedBinds) -> Result<(), BindError> {
        if self.index_buffer.is_some() {
            return Err(BindError::IndexBufferAlreadySet);
        }

        let index_buffer = shared
            .index_buffer()
            .ok_or(BindError::SharedIndexBufferMissing)?;
        self.index_buffer = Some(IndexSource::Shared(Rc::downgrade(index_buffer)));
        Ok(())
    }

    pub fn binds(&self) -> &[Bind] {
        &self.binds
    }

    pub fn shared_key(&self) -> Option<TypeId> {
        self.shared_key
    }

    /// Element count of the index buffer.
    pub fn index_count(&self) -> Result<u32, BindError> {
        match &self.index_buffer {
            Some(IndexSource::Owned(index_buffer)) => Ok(index_buffer.count()),
            Some(IndexSource::Shared(index_buffer)) => index_buffer
                .upgrade()
                .map(|index_buffer| index_buffer.count())
                .ok_or(BindError::SharedIndexBufferReleased),
            None => Err(BindError::MissingIndexBuffer),
        }
    }

    fn owns_index_buffer(&self) -> bool {
        matches!(self.index_buffer, Some(IndexSource::Owned(_)))
    }

    /// Binds the index buffer and returns its element count.
    fn bind_index_buffer(&self, ctx: &mut dyn RenderContext) -> Result<u32, BindError> {
        match &self.index_buffer {
            Some(IndexSource::Owned(index_buffer)) => {
                index_buffer.bind(ctx);
                Ok(index_buffer.count())
            }
            Some(IndexSource::Shared(index_buffer)) => {
                let index_buffer = index_buffer
                    .upgrade()
                    .ok_or(BindError::SharedIndexBufferReleased)?;
                index_buffer.bind(ctx);
                Ok(index_buffer.count())
            }
            None => Err(BindError::MissingIndexBuffer),
        }
    }
}

impl Default for DrawBinds {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Drawable {
    /// Advances animation state by `dt` seconds.
    fn update(&mut self, dt: f32);

    /// Current world transform, derived from the animation state.
    fn transform(&self) -> Mat4;

    fn binds(&self) -> &DrawBinds;

    /// Binds instance binds in insertion order, then the shared binds of the
    /// drawable's type, then the index buffer, and issues one indexed draw.
    ///
    /// A drawable owning an index buffer while its type also shares one is
    /// rejected with [`BindError::IndexBufferAlreadySet`].
    fn draw(
        &self,
        ctx: &mut dyn RenderContext,
        registry: &SharedBindRegistry,
    ) -> Result<(), GraphicsError> {
        let binds = self.binds();
        let shared = binds.shared_key().and_then(|key| registry.get(key));

        if binds.owns_index_buffer() && shared.is_some_and(|s| s.index_buffer().is_some()) {
            return Err(BindError::IndexBufferAlreadySet.into());
        }

        let transform = self.transform();
        for bind in binds.binds() {
            bind.bind(ctx, transform)?;
        }

        if let Some(shared) = shared {
            for bind in shared.binds() {
                bind.bind(ctx, transform)?;
            }
        }

        let count = binds.bind_index_buffer(ctx)?;
        ctx.draw_indexed(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::headless::HeadlessContext;

    #[test]
    fn second_index_buffer_is_rejected() {
        let mut ctx = HeadlessContext::new();
        let mut binds = DrawBinds::new();

        binds
            .add_index_buffer(IndexBuffer::new(&mut ctx, &[0, 1, 2]).unwrap())
            .unwrap();
        let second = IndexBuffer::new(&mut ctx, &[0, 1, 2, 2, 1, 3]).unwrap();

        assert_eq!(
            binds.add_index_buffer(second),
            Err(BindError::IndexBufferAlreadySet)
        );
        assert_eq!(binds.index_count(), Ok(3));
    }

    struct Owning(DrawBinds);

    impl Drawable for Owning {
        fn update(&mut self, _dt: f32) {}

        fn transform(&self) -> Mat4 {
            Mat4::IDENTITY
        }

        fn binds(&self) -> &DrawBinds {
            &self.0
        }
    }

    #[test]
    fn owned_and_shared_index_buffers_do_not_mix() {
        let mut ctx = HeadlessContext::new();
        let mut registry = SharedBindRegistry::new();
        registry
            .shared_mut::<Owning>()
            .add_shared_index_buffer(IndexBuffer::new(&mut ctx, &[0, 1, 2]).unwrap())
            .unwrap();

        let mut binds = DrawBinds::sharing::<Owning>();
        binds
            .add_index_buffer(IndexBuffer::new(&mut ctx, &[0, 2, 1]).unwrap())
            .unwrap();
        let drawable = Owning(binds);

        let err = drawable.draw(&mut ctx, &registry).unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::Bind(BindError::IndexBufferAlreadySet)
        ));
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn adopting_requires_a_shared_index_buffer() {
        let mut binds = DrawBinds::sharing::<Tint>();

        assert_eq!(
            binds.adopt_shared_index_buffer(&SharedBinds::new()),
            Err(BindError::SharedIndexBufferMissing)
        );
        assert_eq!(binds.index_count(), Err(BindError::MissingIndexBuffer));
    }

    #[test]
    fn adopted_index_buffer_does_not_outlive_its_owner() {
        let mut ctx = HeadlessContext::new();
        let mut shared = SharedBinds::new();
        shared
            .add_shared_index_buffer(IndexBuffer::new(&mut ctx, &[0, 1, 2]).unwrap())
            .unwrap();

        let mut binds = DrawBinds::sharing::<Tint>();
        binds.adopt_shared_index_buffer(&shared).unwrap();
        assert_eq!(binds.index_count(), Ok(3));

        drop(shared);
        assert_eq!(binds.index_count(), Err(BindError::SharedIndexBufferReleased));
    }
}
