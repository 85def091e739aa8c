use std::f32::consts::{PI, TAU};

use glam::{EulerRot, Mat4, Quat, Vec3, Vec4};
use rand::{distributions::Uniform, Rng};

use crate::{
    bindable::{
        IndexBuffer, InputLayout, PixelConstantBuffer, PixelShader, Topology,
        TransformConstantBuffer, VertexBuffer, VertexShader,
    },
    drawable::{
        DrawBinds, Drawable, SharedBindRegistry, SharedBinds, Tint, Vertex, TINT_PS, TRANSFORM_VS,
    },
    geometry,
    rendering::{shader_loader::ShaderDefValue, GraphicsError, RenderContext},
};

/// Distance of the orbit centre along +Z.
const ORBIT_DEPTH: f32 = 20.0;

const BOX_COLOR: Vec4 = Vec4::new(1.0, 0.55, 0.2, 1.0);

/// Ranges the random motion parameters are drawn from.
#[derive(Debug, Clone)]
pub struct MotionDistributions {
    pub angle: Uniform<f32>,
    pub spin: Uniform<f32>,
    pub orbit: Uniform<f32>,
    pub radius: Uniform<f32>,
}

impl Default for MotionDistributions {
    fn default() -> Self {
        Self {
            angle: Uniform::new(0.0, TAU),
            spin: Uniform::new(0.0, TAU),
            orbit: Uniform::new(0.0, 0.3 * PI),
            radius: Uniform::new(6.0, 20.0),
        }
    }
}

/// Spin about the box's own centre combined with an orbit around a point
/// [`ORBIT_DEPTH`] in front of the camera. Angles are radians, rates radians
/// per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    pub r: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub theta: f32,
    pub phi: f32,
    pub chi: f32,
    pub droll: f32,
    pub dpitch: f32,
    pub dyaw: f32,
    pub dtheta: f32,
    pub dphi: f32,
    pub dchi: f32,
}

impl Motion {
    pub fn random(rng: &mut impl Rng, dist: &MotionDistributions) -> Self {
        // Draw order is part of the seeded behaviour.
        let r = rng.sample(&dist.radius);
        let theta = rng.sample(&dist.angle);
        let phi = rng.sample(&dist.angle);
        let chi = rng.sample(&dist.angle);
        let droll = rng.sample(&dist.spin);
        let dpitch = rng.sample(&dist.spin);
        let dyaw = rng.sample(&dist.spin);
        let dtheta = rng.sample(&dist.orbit);
        let dphi = rng.sample(&dist.orbit);
        let dchi = rng.sample(&dist.orbit);

        Self {
            r,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            theta,
            phi,
            chi,
            droll,
            dpitch,
            dyaw,
            dtheta,
            dphi,
            dchi,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.roll += self.droll * dt;
        self.pitch += self.dpitch * dt;
        self.yaw += self.dyaw * dt;
        self.theta += self.dtheta * dt;
        self.phi += self.dphi * dt;
        self.chi += self.dchi * dt;
    }

    /// State after `elapsed` seconds, in closed form.
    pub fn advanced(&self, elapsed: f32) -> Self {
        let mut motion = *self;
        motion.advance(elapsed);
        motion
    }

    pub fn transform(&self) -> Mat4 {
        let spin = Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, self.roll);
        let orbit = Quat::from_euler(EulerRot::YXZ, self.phi, self.theta, self.chi);

        Mat4::from_translation(Vec3::Z * ORBIT_DEPTH)
            * Mat4::from_quat(orbit)
            * Mat4::from_translation(Vec3::X * self.r)
            * Mat4::from_quat(spin)
    }
}

/// A cube spinning in place while orbiting the scene centre. All instances
/// share geometry, shaders and colour; each owns its transform buffer.
pub struct OrbitingBox {
    motion: Motion,
    binds: DrawBinds,
}

impl OrbitingBox {
    pub fn new(
        ctx: &mut dyn RenderContext,
        registry: &mut SharedBindRegistry,
        rng: &mut impl Rng,
        dist: &MotionDistributions,
    ) -> Result<Self, GraphicsError> {
        Self::with_motion(ctx, registry, Motion::random(rng, dist))
    }

    pub fn with_motion(
        ctx: &mut dyn RenderContext,
        registry: &mut SharedBindRegistry,
        motion: Motion,
    ) -> Result<Self, GraphicsError> {
        if !registry.shared_mut::<Self>().is_initialized() {
            let shared = build_shared(ctx)?;
            *registry.shared_mut::<Self>() = shared;
        }

        let mut binds = DrawBinds::sharing::<Self>();
        binds.adopt_shared_index_buffer(registry.shared_mut::<Self>())?;
        binds.add_bind(TransformConstantBuffer::new(ctx)?);

        Ok(Self { motion, binds })
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }
}

fn build_shared(ctx: &mut dyn RenderContext) -> Result<SharedBinds, GraphicsError> {
    log::info!("Creating shared binds for OrbitingBox");

    let model = geometry::cube(1.0).map_vertices(|position| Vertex { position });

    let vertex_shader = VertexShader::new(ctx, TRANSFORM_VS, &[])?;
    let pixel_shader = PixelShader::new(ctx, TINT_PS, &[("DEPTH_FADE", ShaderDefValue::Bool(true))])?;
    let layout = InputLayout::new(ctx, &Vertex::LAYOUT, vertex_shader.bytecode())?;
    let tint = PixelConstantBuffer::new(ctx, &Tint { color: BOX_COLOR })?;

    let mut shared = SharedBinds::new();
    shared.add_shared_bind(VertexBuffer::new(ctx, &model.vertices)?);
    shared.add_shared_bind(vertex_shader);
    shared.add_shared_bind(pixel_shader);
    shared.add_shared_index_buffer(IndexBuffer::new(ctx, &model.indices)?)?;
    shared.add_shared_bind(layout);
    shared.add_shared_bind(Topology::TRIANGLE_LIST);
    shared.add_shared_bind(tint.binding());

    Ok(shared)
}

impl Drawable for OrbitingBox {
    fn update(&mut self, dt: f32) {
        self.motion.advance(dt);
    }

    fn transform(&self) -> Mat4 {
        self.motion.transform()
    }

    fn binds(&self) -> &DrawBinds {
        &self.binds
    }
}
