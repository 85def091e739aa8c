use glam::{Mat4, Quat, Vec3, Vec4};

use crate::{
    bindable::{
        IndexBuffer, InputLayout, PixelConstantBuffer, PixelShader, Topology,
        TransformConstantBuffer, VertexBuffer, VertexShader,
    },
    drawable::{DrawBinds, Drawable, Tint, Vertex, TINT_PS, TRANSFORM_VS},
    geometry,
    rendering::{
        error::{DiagnosticInfo, ErrorCode},
        GraphicsError, RenderContext,
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetDesc {
    pub divisions: (u16, u16),
    pub position: Vec3,
    /// Half the edge length.
    pub size: f32,
    /// Radians per second about the vertical axis.
    pub spin_rate: f32,
    pub color: Vec4,
}

impl Default for SheetDesc {
    fn default() -> Self {
        Self {
            divisions: (8, 8),
            position: Vec3::new(0.0, -6.0, 22.0),
            size: 4.0,
            spin_rate: 0.25,
            color: Vec4::new(0.2, 0.45, 0.9, 1.0),
        }
    }
}

/// A tessellated square that owns every one of its binds.
pub struct Sheet {
    desc: SheetDesc,
    angle: f32,
    tint: PixelConstantBuffer<Tint>,
    binds: DrawBinds,
}

impl Sheet {
    pub fn new(ctx: &mut dyn RenderContext, desc: SheetDesc) -> Result<Self, GraphicsError> {
        let (divisions_x, divisions_y) = desc.divisions;
        let model = geometry::plane_tessellated(divisions_x, divisions_y)
            .map_err(|e| {
                GraphicsError::device(ErrorCode::VALIDATION, DiagnosticInfo::single(e.to_string()))
            })?
            .map_vertices(|position| Vertex { position });

        let vertex_shader = VertexShader::new(ctx, TRANSFORM_VS, &[])?;
        let layout = InputLayout::new(ctx, &Vertex::LAYOUT, vertex_shader.bytecode())?;
        let tint = PixelConstantBuffer::new(ctx, &Tint { color: desc.color })?;

        let mut binds = DrawBinds::new();
        binds.add_bind(VertexBuffer::new(ctx, &model.vertices)?);
        binds.add_index_buffer(IndexBuffer::new(ctx, &model.indices)?)?;
        binds.add_bind(vertex_shader);
        binds.add_bind(PixelShader::new(ctx, TINT_PS, &[])?);
        binds.add_bind(layout);
        binds.add_bind(Topology::TRIANGLE_LIST);
        binds.add_bind(tint.binding());
        binds.add_bind(TransformConstantBuffer::new(ctx)?);

        Ok(Self {
            desc,
            angle: 0.0,
            tint,
            binds,
        })
    }

    pub fn set_color(&mut self, ctx: &mut dyn RenderContext, color: Vec4) -> Result<(), GraphicsError> {
        self.tint.update(ctx, &Tint { color })?;
        self.desc.color = color;
        Ok(())
    }

    pub fn color(&self) -> Vec4 {
        self.desc.color
    }
}

impl Drawable for Sheet {
    fn update(&mut self, dt: f32) {
        self.angle += self.desc.spin_rate * dt;
    }

    fn transform(&self) -> Mat4 {
        // Lie flat, facing up, then spin about Y.
        Mat4::from_scale_rotation_translation(
            Vec3::splat(self.desc.size),
            Quat::from_rotation_y(self.angle) * Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
            self.desc.position,
        )
    }

    fn binds(&self) -> &DrawBinds {
        &self.binds
    }
}
