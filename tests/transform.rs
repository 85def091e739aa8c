use boxdance::{
    bindable::{Bind, PixelConstantBuffer, TransformConstantBuffer, TransformUniform},
    rendering::{headless::HeadlessContext, RenderContext},
};
use glam::{Mat4, Quat, Vec3};
use rstest::rstest;

fn uploaded(ctx: &HeadlessContext, cbuf: &TransformConstantBuffer) -> Mat4 {
    bytemuck::pod_read_unaligned::<TransformUniform>(ctx.read_buffer(cbuf.gpu_buffer()))
        .model_view_projection
}

#[test]
fn identity_transform_and_projection_upload_identity() {
    let mut ctx = HeadlessContext::new();
    ctx.set_projection(Mat4::IDENTITY);

    let bind = Bind::from(TransformConstantBuffer::new(&mut ctx).unwrap());
    bind.bind(&mut ctx, Mat4::IDENTITY).unwrap();

    let Bind::Transform(cbuf) = &bind else {
        unreachable!();
    };
    assert_eq!(uploaded(&ctx, cbuf), Mat4::IDENTITY);
}

#[rstest]
#[case::translated(Mat4::from_translation(Vec3::new(3.0, -2.0, 15.0)))]
#[case::rotated(Mat4::from_quat(Quat::from_rotation_y(0.7)))]
#[case::scaled(Mat4::from_scale(Vec3::new(2.0, 1.0, 0.5)))]
fn upload_composes_model_then_projection(#[case] model: Mat4) {
    let mut ctx = HeadlessContext::new();
    let projection = Mat4::perspective_lh(1.0, 4.0 / 3.0, 0.5, 40.0);
    ctx.set_projection(projection);

    let cbuf = TransformConstantBuffer::new(&mut ctx).unwrap();
    cbuf.bind_with(&mut ctx, model).unwrap();

    assert!(uploaded(&ctx, &cbuf).abs_diff_eq(projection * model, 1e-6));
}

#[test]
fn update_replaces_every_byte() {
    let mut ctx = HeadlessContext::new();
    let buffer = PixelConstantBuffer::new(&mut ctx, &[0xAAu8; 32]).unwrap();

    let mut partial = [0u8; 32];
    partial[..4].copy_from_slice(&[1, 2, 3, 4]);
    buffer.update(&mut ctx, &partial).unwrap();

    assert_eq!(ctx.read_buffer(buffer.gpu_buffer()), &partial);
}
