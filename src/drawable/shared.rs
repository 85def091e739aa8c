use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    rc::Rc,
};

use crate::{
    bindable::{Bind, IndexBuffer},
    rendering::BindError,
};

/// Binds identical across every instance of one drawable type.
#[derive(Default)]
pub struct SharedBinds {
    binds: Vec<Bind>,
    index_buffer: Option<Rc<IndexBuffer>>,
}

impl SharedBinds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        !self.binds.is_empty() || self.index_buffer.is_some()
    }

    pub fn add_shared_bind(&mut self, bind: impl Into<Bind>) {
        self.binds.push(bind.into());
    }

    pub fn add_shared_index_buffer(&mut self, index_buffer: IndexBuffer) -> Result<(), BindError> {
        if self.index_buffer.is_some() {
            return Err(BindError::SharedIndexBufferAlreadySet);
        }

        self.index_buffer = Some(Rc::new(index_buffer));
        Ok(())
    }

    pub fn binds(&self) -> &[Bind] {
        &self.binds
    }

    pub fn index_buffer(&self) -> Option<&Rc<IndexBuffer>> {
        self.index_buffer.as_ref()
    }
}

/// Owns the [`SharedBinds`] of every drawable type, keyed by type.
///
/// Entries live until [`SharedBindRegistry::release`] or
/// [`SharedBindRegistry::clear`]; instances only hold weak references into
/// them.
#[derive(Default)]
pub struct SharedBindRegistry {
    entries: HashMap<TypeId, SharedBinds>,
}

impl SharedBindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared<T: 'static>(&self) -> Option<&SharedBinds> {
        self.get(TypeId::of::<T>())
    }

    /// The entry for `T`, created empty on first access.
    pub fn shared_mut<T: 'static>(&mut self) -> &mut SharedBinds {
        self.entries.entry(TypeId::of::<T>()).or_default()
    }

    pub fn get(&self, key: TypeId) -> Option<&SharedBinds> {
        self.entries.get(&key)
    }

    /// Drops the shared binds of `T`. Returns whether there were any.
    pub fn release<T: 'static>(&mut self) -> bool {
        let released = self.entries.remove(&TypeId::of::<T>()).is_some();
        if released {
            log::info!("Released shared binds of {}", type_name::<T>());
        }
        released
    }

    pub fn clear(&mut self) {
        log::info!("Releasing shared binds of {} drawable types", self.entries.len());
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bindable::Topology, rendering::headless::HeadlessContext};

    struct Marker;

    #[test]
    fn entries_are_created_lazily_per_type() {
        let mut registry = SharedBindRegistry::new();
        assert!(registry.shared::<Marker>().is_none());

        let shared = registry.shared_mut::<Marker>();
        assert!(!shared.is_initialized());
        shared.add_shared_bind(Topology::TRIANGLE_LIST);

        assert!(registry.shared::<Marker>().unwrap().is_initialized());
        assert!(registry.shared::<u32>().is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn second_shared_index_buffer_is_rejected() {
        let mut ctx = HeadlessContext::new();
        let mut shared = SharedBinds::new();

        shared
            .add_shared_index_buffer(IndexBuffer::new(&mut ctx, &[0, 1, 2]).unwrap())
            .unwrap();
        let second = IndexBuffer::new(&mut ctx, &[0, 2, 1]).unwrap();

        assert_eq!(
            shared.add_shared_index_buffer(second),
            Err(BindError::SharedIndexBufferAlreadySet)
        );
        assert_eq!(shared.index_buffer().unwrap().count(), 3);
    }

    #[test]
    fn release_drops_only_the_named_type() {
        let mut registry = SharedBindRegistry::new();
        registry.shared_mut::<Marker>().add_shared_bind(Topology::TRIANGLE_LIST);
        registry.shared_mut::<u32>().add_shared_bind(Topology::TRIANGLE_LIST);

        assert!(registry.release::<Marker>());
        assert!(!registry.release::<Marker>());
        assert_eq!(registry.len(), 1);

        registry.clear();
        assert!(registry.is_empty());
    }
}
