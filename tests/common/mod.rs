#![allow(dead_code)]

use boxdance::{
    config::AppConfig,
    demo,
    rendering::{headless::HeadlessContext, RenderContext},
    scene::Scene,
};
use glam::Vec3;

pub const SEED: u64 = 0x5eed;

pub fn box_config(box_count: usize) -> AppConfig {
    AppConfig {
        box_count,
        sheet_count: 0,
        seed: Some(SEED),
        ..AppConfig::default()
    }
}

/// A headless context with the default projection and a scene of
/// `box_count` seeded boxes.
pub fn box_scene(box_count: usize) -> (HeadlessContext, Scene) {
    let config = box_config(box_count);
    let mut ctx = HeadlessContext::new();
    ctx.set_projection(config.projection.matrix());

    let mut scene = Scene::new(Vec3::splat(0.5));
    demo::populate(&mut scene, &mut ctx, &config).unwrap();

    (ctx, scene)
}
