use glam::Mat4;

use crate::rendering::{
    error::GraphicsError,
    headless::{HeadlessBufferId, HeadlessInputLayoutId, HeadlessShaderId},
    shader_loader::CompiledShader,
    wgpu_context::{WgpuBuffer, WgpuInputLayout, WgpuShader},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl ShaderStage {
    /// Entry point every shader source must expose for this stage.
    pub fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_main",
            ShaderStage::Pixel => "fs_main",
        }
    }

    pub(crate) fn naga_stage(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Pixel => naga::ShaderStage::Fragment,
        }
    }

    /// Bind group index the stage's constant buffer occupies.
    pub(crate) fn group(self) -> u32 {
        match self {
            ShaderStage::Vertex => 0,
            ShaderStage::Pixel => 1,
        }
    }
}

/// One per-vertex attribute of an input layout. Offsets are append-aligned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputElement {
    pub name: &'static str,
    pub location: u32,
    pub format: wgpu::VertexFormat,
}

impl InputElement {
    pub const fn new(name: &'static str, location: u32, format: wgpu::VertexFormat) -> Self {
        Self {
            name,
            location,
            format,
        }
    }
}

#[derive(Debug, Clone)]
pub enum GpuBuffer {
    Headless(HeadlessBufferId),
    Wgpu(WgpuBuffer),
}

#[derive(Debug, Clone)]
pub enum GpuShader {
    Headless(HeadlessShaderId),
    Wgpu(WgpuShader),
}

#[derive(Debug, Clone)]
pub enum GpuInputLayout {
    Headless(HeadlessInputLayoutId),
    Wgpu(WgpuInputLayout),
}

/// The active connection to a graphics device.
///
/// Resource creation is fallible and reported as [`GraphicsError`]. Pipeline
/// state setters address disjoint slots and cannot fail; problems with the
/// bound state surface at [`RenderContext::draw_indexed`].
pub trait RenderContext {
    fn create_vertex_buffer(
        &mut self,
        contents: &[u8],
        stride: u32,
    ) -> Result<GpuBuffer, GraphicsError>;

    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<GpuBuffer, GraphicsError>;

    fn create_constant_buffer(
        &mut self,
        stage: ShaderStage,
        contents: &[u8],
    ) -> Result<GpuBuffer, GraphicsError>;

    /// Replaces the whole contents of a constant buffer. Draws issued before
    /// the update keep reading the contents they were issued with.
    fn update_constant_buffer(
        &mut self,
        buffer: &GpuBuffer,
        contents: &[u8],
    ) -> Result<(), GraphicsError>;

    fn create_shader(
        &mut self,
        stage: ShaderStage,
        shader: &CompiledShader,
    ) -> Result<GpuShader, GraphicsError>;

    fn create_input_layout(
        &mut self,
        attributes: &[wgpu::VertexAttribute],
        stride: u64,
    ) -> Result<GpuInputLayout, GraphicsError>;

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &GpuBuffer, stride: u32);
    fn set_index_buffer(&mut self, buffer: &GpuBuffer);
    fn set_constant_buffer(&mut self, stage: ShaderStage, buffer: &GpuBuffer);
    fn set_shader(&mut self, stage: ShaderStage, shader: &GpuShader);
    fn set_input_layout(&mut self, layout: &GpuInputLayout);
    fn set_topology(&mut self, topology: wgpu::PrimitiveTopology);

    fn draw_indexed(&mut self, count: u32) -> Result<(), GraphicsError>;

    fn clear_buffer(&mut self, red: f32, green: f32, blue: f32);

    /// Presents the frame, blocking per the configured sync interval.
    fn swap_buffer(&mut self) -> Result<(), GraphicsError>;

    fn set_projection(&mut self, projection: Mat4);
    fn projection(&self) -> Mat4;
}
