use glam::{Vec3, Vec4};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::AppConfig,
    drawable::{MotionDistributions, OrbitingBox, Sheet, SheetDesc},
    rendering::{GraphicsError, RenderContext},
    scene::Scene,
};

/// Spawns the configured boxes and sheets into `scene`.
pub fn populate(
    scene: &mut Scene,
    ctx: &mut dyn RenderContext,
    config: &AppConfig,
) -> Result<(), GraphicsError> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let dist = MotionDistributions::default();

    for _ in 0..config.box_count {
        let orbiting_box = OrbitingBox::new(ctx, scene.registry_mut(), &mut rng, &dist)?;
        scene.spawn(orbiting_box);
    }

    for i in 0..config.sheet_count {
        let offset = i as f32;
        let sheet = Sheet::new(
            ctx,
            SheetDesc {
                position: Vec3::new(0.0, -6.0 - 2.0 * offset, 22.0 + 4.0 * offset),
                spin_rate: if i % 2 == 0 { 0.25 } else { -0.25 },
                color: Vec4::new(0.2, 0.45 + 0.1 * offset, 0.9, 1.0),
                ..SheetDesc::default()
            },
        )?;
        scene.spawn(sheet);
    }

    log::info!(
        "Populated scene with {} drawables, {} shared bind sets",
        scene.len(),
        scene.registry().len()
    );

    Ok(())
}
