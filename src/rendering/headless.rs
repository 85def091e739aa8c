//! Recording backend that needs no GPU.
//!
//! Every resource lives in CPU memory and every bind, draw and present is
//! appended to a command log, so callers can inspect exactly what reached the
//! device. Device faults can be injected to exercise error paths.

use glam::Mat4;
use id_arena::{Arena, Id};

use crate::rendering::{
    context::{GpuBuffer, GpuInputLayout, GpuShader, RenderContext, ShaderStage},
    error::{DiagnosticLog, ErrorCode, GraphicsError, RemovalReason},
    shader_loader::CompiledShader,
};

pub type HeadlessBufferId = Id<HeadlessBuffer>;
pub type HeadlessShaderId = Id<HeadlessShader>;
pub type HeadlessInputLayoutId = Id<HeadlessInputLayout>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Vertex { stride: u32 },
    Index,
    Constant(ShaderStage),
}

#[derive(Debug)]
pub struct HeadlessBuffer {
    pub kind: BufferKind,
    pub contents: Vec<u8>,
}

#[derive(Debug)]
pub struct HeadlessShader {
    pub stage: ShaderStage,
    pub name: String,
}

#[derive(Debug)]
pub struct HeadlessInputLayout {
    pub attributes: Vec<wgpu::VertexAttribute>,
    pub stride: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Clear([f32; 3]),
    SetVertexBuffer {
        slot: u32,
        buffer: HeadlessBufferId,
        stride: u32,
    },
    SetIndexBuffer(HeadlessBufferId),
    SetConstantBuffer {
        stage: ShaderStage,
        buffer: HeadlessBufferId,
    },
    SetShader {
        stage: ShaderStage,
        shader: HeadlessShaderId,
    },
    SetInputLayout(HeadlessInputLayoutId),
    SetTopology(wgpu::PrimitiveTopology),
    DrawIndexed(u32),
    Present,
}

/// Number of device uploads per resource kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CreationStats {
    pub vertex_buffers: usize,
    pub index_buffers: usize,
    pub constant_buffers: usize,
    pub constant_updates: usize,
    pub vertex_shaders: usize,
    pub pixel_shaders: usize,
    pub input_layouts: usize,
}

#[derive(Debug, Default)]
struct BoundState {
    vertex_buffer: Option<HeadlessBufferId>,
    index_buffer: Option<HeadlessBufferId>,
    constants: [Option<HeadlessBufferId>; 2],
    vertex_shader: Option<HeadlessShaderId>,
    pixel_shader: Option<HeadlessShaderId>,
    input_layout: Option<HeadlessInputLayoutId>,
    topology: Option<wgpu::PrimitiveTopology>,
}

pub struct HeadlessContext {
    buffers: Arena<HeadlessBuffer>,
    shaders: Arena<HeadlessShader>,
    layouts: Arena<HeadlessInputLayout>,
    commands: Vec<Command>,
    draw_constants: Vec<[Option<Vec<u8>>; 2]>,
    stats: CreationStats,
    state: BoundState,
    projection: Mat4,
    frames_presented: u64,
    diagnostics: DiagnosticLog,
    pending_failure: Option<ErrorCode>,
    removed: Option<RemovalReason>,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self {
            buffers: Arena::new(),
            shaders: Arena::new(),
            layouts: Arena::new(),
            commands: Vec::new(),
            draw_constants: Vec::new(),
            stats: CreationStats::default(),
            state: BoundState::default(),
            projection: Mat4::IDENTITY,
            frames_presented: 0,
            diagnostics: DiagnosticLog::new(),
            pending_failure: None,
            removed: None,
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Index counts of every recorded draw, in submission order.
    pub fn draw_counts(&self) -> Vec<u32> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                Command::DrawIndexed(count) => Some(*count),
                _ => None,
            })
            .collect()
    }

    /// Contents of the `stage` constant buffer as each recorded draw saw it.
    pub fn draw_constants(&self, stage: ShaderStage) -> Vec<Option<&[u8]>> {
        self.draw_constants
            .iter()
            .map(|constants| constants[stage.group() as usize].as_deref())
            .collect()
    }

    pub fn stats(&self) -> CreationStats {
        self.stats
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Current device-side contents of a buffer.
    pub fn read_buffer(&self, buffer: &GpuBuffer) -> &[u8] {
        &self.buffers[buffer_id(buffer)].contents
    }

    pub fn buffer_kind(&self, buffer: HeadlessBufferId) -> BufferKind {
        self.buffers[buffer].kind
    }

    pub fn shader(&self, shader: HeadlessShaderId) -> &HeadlessShader {
        &self.shaders[shader]
    }

    pub fn input_layout(&self, layout: HeadlessInputLayoutId) -> &HeadlessInputLayout {
        &self.layouts[layout]
    }

    /// Queues a message as if the driver debug layer had emitted it.
    pub fn push_diagnostic(&self, message: impl Into<String>) {
        self.diagnostics.push(message);
    }

    /// Makes the next resource creation call fail with `code`.
    pub fn fail_next_creation(&mut self, code: ErrorCode) {
        self.pending_failure = Some(code);
    }

    /// Simulates losing the adapter. Every later creation, update and present
    /// reports `reason`.
    pub fn remove_device(&mut self, reason: RemovalReason) {
        log::warn!("Headless device removed: {}", reason);
        self.removed = Some(reason);
    }

    #[track_caller]
    fn check_creation(&mut self) -> Result<(), GraphicsError> {
        self.diagnostics.set();

        if let Some(reason) = self.removed {
            return Err(GraphicsError::device_removed(
                reason,
                self.diagnostics.messages(),
            ));
        }

        match self.pending_failure.take() {
            Some(code) => Err(GraphicsError::device(code, self.diagnostics.messages())),
            None => Ok(()),
        }
    }

    fn alloc_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> GpuBuffer {
        let id = self.buffers.alloc(HeadlessBuffer {
            kind,
            contents: contents.to_vec(),
        });
        log::trace!("Headless: created {:?} buffer ({} bytes)", kind, contents.len());
        GpuBuffer::Headless(id)
    }

    #[track_caller]
    fn incomplete(&mut self, message: String) -> Result<(), GraphicsError> {
        if cfg!(debug_assertions) {
            self.diagnostics.push(message);
            Err(GraphicsError::diagnostic(self.diagnostics.messages()))
        } else {
            log::warn!("Skipping draw: {}", message);
            Ok(())
        }
    }
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new()
    }
}

fn buffer_id(buffer: &GpuBuffer) -> HeadlessBufferId {
    match buffer {
        GpuBuffer::Headless(id) => *id,
        GpuBuffer::Wgpu(_) => unreachable!("wgpu buffer bound to a headless context"),
    }
}

fn shader_id(shader: &GpuShader) -> HeadlessShaderId {
    match shader {
        GpuShader::Headless(id) => *id,
        GpuShader::Wgpu(_) => unreachable!("wgpu shader bound to a headless context"),
    }
}

impl RenderContext for HeadlessContext {
    fn create_vertex_buffer(
        &mut self,
        contents: &[u8],
        stride: u32,
    ) -> Result<GpuBuffer, GraphicsError> {
        self.check_creation()?;
        self.stats.vertex_buffers += 1;
        Ok(self.alloc_buffer(BufferKind::Vertex { stride }, contents))
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<GpuBuffer, GraphicsError> {
        self.check_creation()?;
        self.stats.index_buffers += 1;
        Ok(self.alloc_buffer(BufferKind::Index, bytemuck::cast_slice(indices)))
    }

    fn create_constant_buffer(
        &mut self,
        stage: ShaderStage,
        contents: &[u8],
    ) -> Result<GpuBuffer, GraphicsError> {
        self.check_creation()?;
        self.stats.constant_buffers += 1;
        Ok(self.alloc_buffer(BufferKind::Constant(stage), contents))
    }

    fn update_constant_buffer(
        &mut self,
        buffer: &GpuBuffer,
        contents: &[u8],
    ) -> Result<(), GraphicsError> {
        self.check_creation()?;

        let target = &mut self.buffers[buffer_id(buffer)];
        if target.contents.len() != contents.len() {
            return Err(GraphicsError::device(
                ErrorCode::VALIDATION,
                self.diagnostics.messages_with(format!(
                    "constant buffer update of {} bytes into a {} byte buffer",
                    contents.len(),
                    target.contents.len()
                )),
            ));
        }

        // Discard semantics: the previous contents are gone entirely.
        target.contents = contents.to_vec();
        self.stats.constant_updates += 1;
        Ok(())
    }

    fn create_shader(
        &mut self,
        stage: ShaderStage,
        shader: &CompiledShader,
    ) -> Result<GpuShader, GraphicsError> {
        self.check_creation()?;

        match stage {
            ShaderStage::Vertex => self.stats.vertex_shaders += 1,
            ShaderStage::Pixel => self.stats.pixel_shaders += 1,
        }

        let id = self.shaders.alloc(HeadlessShader {
            stage,
            name: shader.name.clone(),
        });
        Ok(GpuShader::Headless(id))
    }

    fn create_input_layout(
        &mut self,
        attributes: &[wgpu::VertexAttribute],
        stride: u64,
    ) -> Result<GpuInputLayout, GraphicsError> {
        self.check_creation()?;
        self.stats.input_layouts += 1;

        let id = self.layouts.alloc(HeadlessInputLayout {
            attributes: attributes.to_vec(),
            stride,
        });
        Ok(GpuInputLayout::Headless(id))
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &GpuBuffer, stride: u32) {
        let buffer = buffer_id(buffer);
        self.state.vertex_buffer = Some(buffer);
        self.commands.push(Command::SetVertexBuffer {
            slot,
            buffer,
            stride,
        });
    }

    fn set_index_buffer(&mut self, buffer: &GpuBuffer) {
        let buffer = buffer_id(buffer);
        self.state.index_buffer = Some(buffer);
        self.commands.push(Command::SetIndexBuffer(buffer));
    }

    fn set_constant_buffer(&mut self, stage: ShaderStage, buffer: &GpuBuffer) {
        let buffer = buffer_id(buffer);
        self.state.constants[stage.group() as usize] = Some(buffer);
        self.commands.push(Command::SetConstantBuffer { stage, buffer });
    }

    fn set_shader(&mut self, stage: ShaderStage, shader: &GpuShader) {
        let shader = shader_id(shader);
        match stage {
            ShaderStage::Vertex => self.state.vertex_shader = Some(shader),
            ShaderStage::Pixel => self.state.pixel_shader = Some(shader),
        }
        self.commands.push(Command::SetShader { stage, shader });
    }

    fn set_input_layout(&mut self, layout: &GpuInputLayout) {
        let layout = match layout {
            GpuInputLayout::Headless(id) => *id,
            GpuInputLayout::Wgpu(_) => unreachable!("wgpu input layout bound to a headless context"),
        };
        self.state.input_layout = Some(layout);
        self.commands.push(Command::SetInputLayout(layout));
    }

    fn set_topology(&mut self, topology: wgpu::PrimitiveTopology) {
        self.state.topology = Some(topology);
        self.commands.push(Command::SetTopology(topology));
    }

    fn draw_indexed(&mut self, count: u32) -> Result<(), GraphicsError> {
        self.diagnostics.set();

        let state = &self.state;
        let missing = [
            ("vertex buffer", state.vertex_buffer.is_none()),
            ("index buffer", state.index_buffer.is_none()),
            ("vertex shader", state.vertex_shader.is_none()),
            ("pixel shader", state.pixel_shader.is_none()),
            ("input layout", state.input_layout.is_none()),
            ("primitive topology", state.topology.is_none()),
        ]
        .into_iter()
        .find_map(|(name, missing)| missing.then_some(name));

        if let Some(name) = missing {
            return self.incomplete(format!("DrawIndexed: no {} bound", name));
        }

        if let Some(index_buffer) = self.state.index_buffer {
            let available = self.buffers[index_buffer].contents.len() / std::mem::size_of::<u16>();
            if count as usize > available {
                return self.incomplete(format!(
                    "DrawIndexed: {} indices requested but the bound index buffer holds {}",
                    count, available
                ));
            }
        }

        let constants = self
            .state
            .constants
            .map(|buffer| buffer.map(|id| self.buffers[id].contents.clone()));
        self.draw_constants.push(constants);
        self.commands.push(Command::DrawIndexed(count));
        Ok(())
    }

    fn clear_buffer(&mut self, red: f32, green: f32, blue: f32) {
        self.commands.push(Command::Clear([red, green, blue]));
    }

    fn swap_buffer(&mut self) -> Result<(), GraphicsError> {
        self.diagnostics.set();

        if let Some(reason) = self.removed {
            return Err(GraphicsError::device_removed(
                reason,
                self.diagnostics.messages(),
            ));
        }

        self.commands.push(Command::Present);
        self.frames_presented += 1;
        Ok(())
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    fn projection(&self) -> Mat4 {
        self.projection
    }
}
