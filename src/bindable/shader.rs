use std::path::Path;

use crate::{
    bindable::Bindable,
    rendering::{
        context::GpuShader,
        shader_loader::{self, CompiledShader, ShaderDefines},
        GraphicsError, RenderContext, ShaderStage,
    },
};

pub struct VertexShader {
    shader: GpuShader,
    bytecode: CompiledShader,
}

impl VertexShader {
    /// Compiles `path` (relative to the shader folder) and creates the shader.
    pub fn new(
        ctx: &mut dyn RenderContext,
        path: impl AsRef<Path>,
        defines: ShaderDefines,
    ) -> Result<Self, GraphicsError> {
        let bytecode = shader_loader::compile_file(path, ShaderStage::Vertex, defines)?;
        let shader = ctx.create_shader(ShaderStage::Vertex, &bytecode)?;

        Ok(Self { shader, bytecode })
    }

    /// Needed to validate an [`InputLayout`](crate::bindable::InputLayout).
    pub fn bytecode(&self) -> &CompiledShader {
        &self.bytecode
    }
}

impl Bindable for VertexShader {
    fn bind(&self, ctx: &mut dyn RenderContext) {
        ctx.set_shader(ShaderStage::Vertex, &self.shader);
    }
}

pub struct PixelShader {
    shader: GpuShader,
}

impl PixelShader {
    pub fn new(
        ctx: &mut dyn RenderContext,
        path: impl AsRef<Path>,
        defines: ShaderDefines,
    ) -> Result<Self, GraphicsError> {
        let bytecode = shader_loader::compile_file(path, ShaderStage::Pixel, defines)?;
        let shader = ctx.create_shader(ShaderStage::Pixel, &bytecode)?;

        Ok(Self { shader })
    }
}

impl Bindable for PixelShader {
    fn bind(&self, ctx: &mut dyn RenderContext) {
        ctx.set_shader(ShaderStage::Pixel, &self.shader);
    }
}
