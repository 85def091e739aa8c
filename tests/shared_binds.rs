mod common;

use boxdance::{
    drawable::{Drawable, Motion, MotionDistributions, OrbitingBox, SharedBindRegistry},
    rendering::{
        headless::{BufferKind, Command, HeadlessContext},
        BindError, GraphicsError, ShaderStage,
    },
};
use rand::{rngs::StdRng, SeedableRng};
use rstest::rstest;

fn motion() -> Motion {
    Motion::random(&mut StdRng::seed_from_u64(1), &MotionDistributions::default())
}

#[rstest]
#[case::single(1)]
#[case::pair(2)]
#[case::full_scene(48)]
fn shared_resources_are_uploaded_once(#[case] box_count: usize) {
    let (ctx, scene) = common::box_scene(box_count);
    let stats = ctx.stats();

    assert_eq!(scene.len(), box_count);
    assert_eq!(scene.registry().len(), 1);

    assert_eq!(stats.vertex_buffers, 1);
    assert_eq!(stats.index_buffers, 1);
    assert_eq!(stats.vertex_shaders, 1);
    assert_eq!(stats.pixel_shaders, 1);
    assert_eq!(stats.input_layouts, 1);
    // One shared tint plus one transform buffer per box.
    assert_eq!(stats.constant_buffers, 1 + box_count);
}

#[test]
fn each_box_draws_the_whole_cube() {
    let (mut ctx, mut scene) = common::box_scene(48);

    scene.frame(&mut ctx, 1.0 / 60.0).unwrap();

    assert_eq!(ctx.draw_counts(), vec![36; 48]);
    assert_eq!(ctx.frames_presented(), 1);
}

#[test]
fn instance_binds_precede_shared_binds() {
    let (mut ctx, mut scene) = common::box_scene(1);

    scene.frame(&mut ctx, 0.0).unwrap();

    assert!(matches!(
        ctx.commands(),
        [
            Command::Clear(_),
            Command::SetConstantBuffer {
                stage: ShaderStage::Vertex,
                ..
            },
            Command::SetVertexBuffer { slot: 0, .. },
            Command::SetShader {
                stage: ShaderStage::Vertex,
                ..
            },
            Command::SetShader {
                stage: ShaderStage::Pixel,
                ..
            },
            Command::SetInputLayout(_),
            Command::SetTopology(wgpu::PrimitiveTopology::TriangleList),
            Command::SetConstantBuffer {
                stage: ShaderStage::Pixel,
                ..
            },
            Command::SetIndexBuffer(_),
            Command::DrawIndexed(36),
            Command::Present,
        ]
    ));
}

#[test]
fn bound_resources_match_their_stage() {
    let (mut ctx, mut scene) = common::box_scene(2);

    scene.frame(&mut ctx, 0.0).unwrap();

    for command in ctx.commands() {
        match *command {
            Command::SetShader { stage, shader } => {
                let shader = ctx.shader(shader);
                assert_eq!(shader.stage, stage);
                let file = match stage {
                    ShaderStage::Vertex => "transform_vs.wgsl",
                    ShaderStage::Pixel => "tint_ps.wgsl",
                };
                assert!(shader.name.ends_with(file), "{} bound as {:?}", shader.name, stage);
            }
            Command::SetConstantBuffer { stage, buffer } => {
                assert_eq!(ctx.buffer_kind(buffer), BufferKind::Constant(stage));
            }
            Command::SetVertexBuffer { buffer, stride, .. } => {
                assert_eq!(ctx.buffer_kind(buffer), BufferKind::Vertex { stride });
            }
            Command::SetIndexBuffer(buffer) => {
                assert_eq!(ctx.buffer_kind(buffer), BufferKind::Index);
            }
            _ => (),
        }
    }
}

#[test]
fn every_box_draws_with_the_same_index_buffer() {
    let (mut ctx, mut scene) = common::box_scene(8);

    scene.frame(&mut ctx, 0.0).unwrap();

    let index_buffers: Vec<_> = ctx
        .commands()
        .iter()
        .filter_map(|command| match command {
            Command::SetIndexBuffer(buffer) => Some(*buffer),
            _ => None,
        })
        .collect();

    assert_eq!(index_buffers.len(), 8);
    assert!(index_buffers.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn drawing_after_teardown_is_an_error() {
    let mut ctx = HeadlessContext::new();
    let mut registry = SharedBindRegistry::new();
    let orbiting_box = OrbitingBox::with_motion(&mut ctx, &mut registry, motion()).unwrap();

    orbiting_box.draw(&mut ctx, &registry).unwrap();
    registry.clear();

    let err = orbiting_box.draw(&mut ctx, &registry).unwrap_err();
    assert!(matches!(
        err,
        GraphicsError::Bind(BindError::SharedIndexBufferReleased)
    ));
    assert_eq!(ctx.draw_counts(), [36]);
}

#[test]
fn released_type_is_rebuilt_by_the_next_instance() {
    let mut ctx = HeadlessContext::new();
    let mut registry = SharedBindRegistry::new();

    let first = OrbitingBox::with_motion(&mut ctx, &mut registry, motion()).unwrap();
    assert!(registry.release::<OrbitingBox>());
    drop(first);

    let second = OrbitingBox::with_motion(&mut ctx, &mut registry, motion()).unwrap();
    second.draw(&mut ctx, &registry).unwrap();

    assert_eq!(ctx.stats().vertex_buffers, 2);
    assert_eq!(ctx.stats().index_buffers, 2);
}
