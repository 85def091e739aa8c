use glam::Vec3;

use crate::{
    drawable::{Drawable, SharedBindRegistry},
    rendering::{GraphicsError, RenderContext},
};

/// Owns the live drawables and the shared binds they draw with, and drives
/// them once per frame.
pub struct Scene {
    drawables: Vec<Box<dyn Drawable>>,
    registry: SharedBindRegistry,
    clear_color: Vec3,
}

impl Scene {
    pub fn new(clear_color: Vec3) -> Self {
        Self {
            drawables: Vec::new(),
            registry: SharedBindRegistry::new(),
            clear_color,
        }
    }

    pub fn spawn(&mut self, drawable: impl Drawable + 'static) {
        self.drawables.push(Box::new(drawable));
    }

    /// Live drawables in draw order.
    pub fn drawables(&self) -> &[Box<dyn Drawable>] {
        &self.drawables
    }

    pub fn len(&self) -> usize {
        self.drawables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    pub fn registry(&self) -> &SharedBindRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SharedBindRegistry {
        &mut self.registry
    }

    /// Clears, updates and draws every drawable in insertion order, then
    /// presents.
    pub fn frame(&mut self, ctx: &mut dyn RenderContext, dt: f32) -> Result<(), GraphicsError> {
        let Vec3 { x, y, z } = self.clear_color;
        ctx.clear_buffer(x, y, z);

        for drawable in &mut self.drawables {
            drawable.update(dt);
            drawable.draw(ctx, &self.registry)?;
        }

        ctx.swap_buffer()
    }

    /// Drops every drawable, then every shared bind.
    pub fn teardown(&mut self) {
        log::info!("Tearing down scene with {} drawables", self.drawables.len());
        self.drawables.clear();
        self.registry.clear();
    }
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;
    use crate::{
        drawable::DrawBinds,
        rendering::headless::{Command, HeadlessContext},
    };

    struct Bare {
        binds: DrawBinds,
    }

    impl Drawable for Bare {
        fn update(&mut self, _dt: f32) {}

        fn transform(&self) -> Mat4 {
            Mat4::IDENTITY
        }

        fn binds(&self) -> &DrawBinds {
            &self.binds
        }
    }

    #[test]
    fn failed_draw_stops_the_frame() {
        let mut ctx = HeadlessContext::new();
        let mut scene = Scene::new(Vec3::ZERO);
        scene.spawn(Bare {
            binds: DrawBinds::new(),
        });

        // No index buffer.
        assert!(scene.frame(&mut ctx, 0.1).is_err());
        assert_eq!(ctx.frames_presented(), 0);
    }

    #[test]
    fn empty_scene_still_clears_and_presents() {
        let mut ctx = HeadlessContext::new();
        let mut scene = Scene::new(Vec3::new(0.5, 0.25, 0.0));

        scene.frame(&mut ctx, 0.016).unwrap();

        assert_eq!(
            ctx.commands(),
            [Command::Clear([0.5, 0.25, 0.0]), Command::Present]
        );
    }
}
