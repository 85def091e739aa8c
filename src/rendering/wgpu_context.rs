//! On-screen backend.
//!
//! wgpu has no immediate context, so bind calls only update the current
//! pipeline state. Each `draw_indexed` snapshots that state into a
//! [`DrawCommand`], and `swap_buffer` replays the recorded commands before
//! presenting. Updating a constant buffer that a recorded draw reads flushes
//! the recorded draws first, so each draw sees the contents it was issued with.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use anyhow::Context;
use glam::Mat4;
use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalSize, window::Window};

use crate::rendering::{
    context::{GpuBuffer, GpuInputLayout, GpuShader, RenderContext, ShaderStage},
    error::{DiagnosticLog, ErrorCode, GraphicsError, RemovalReason},
    shader_loader::CompiledShader,
    texture::DepthTexture,
};

#[derive(Debug, Clone)]
pub struct WgpuBuffer {
    id: u64,
    buffer: wgpu::Buffer,
    /// Present for constant buffers only.
    bind_group: Option<wgpu::BindGroup>,
}

#[derive(Debug, Clone)]
pub struct WgpuShader {
    id: u64,
    stage: ShaderStage,
    module: wgpu::ShaderModule,
}

#[derive(Debug, Clone)]
pub struct WgpuInputLayout {
    id: u64,
    attributes: Vec<wgpu::VertexAttribute>,
    stride: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    vertex_shader: u64,
    pixel_shader: u64,
    input_layout: u64,
    topology: wgpu::PrimitiveTopology,
    stride: u32,
}

#[derive(Default)]
struct BoundState {
    vertex_buffer: Option<(WgpuBuffer, u32)>,
    index_buffer: Option<WgpuBuffer>,
    constants: [Option<(u64, wgpu::BindGroup)>; 2],
    vertex_shader: Option<WgpuShader>,
    pixel_shader: Option<WgpuShader>,
    input_layout: Option<WgpuInputLayout>,
    topology: Option<wgpu::PrimitiveTopology>,
}

struct DrawCommand {
    pipeline: PipelineKey,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    bind_groups: [wgpu::BindGroup; 2],
    constants: [Option<u64>; 2],
    count: u32,
}

pub struct WgpuContext {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_texture: DepthTexture,

    constants_layout: wgpu::BindGroupLayout,
    null_constants: wgpu::BindGroup,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    state: BoundState,
    draws: Vec<DrawCommand>,
    clear_color: Option<wgpu::Color>,
    projection: Mat4,

    frame: Option<(wgpu::SurfaceTexture, wgpu::TextureView)>,
    depth_cleared: bool,
    skip_frame: bool,

    diagnostics: DiagnosticLog,
    removed: Arc<Mutex<Option<RemovalReason>>>,
    next_id: u64,
}

impl WgpuContext {
    pub async fn new(window: Arc<Window>, vsync: bool) -> anyhow::Result<WgpuContext> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No compatible graphics adapter")?;

        log::info!("Using adapter {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let diagnostics = DiagnosticLog::new();
        {
            let diagnostics = diagnostics.clone();
            device.on_uncaptured_error(Box::new(move |error: wgpu::Error| {
                log::error!("Uncaptured device error: {}", error);
                diagnostics.push(error.to_string());
            }));
        }

        let removed = Arc::new(Mutex::new(None));
        {
            let removed = removed.clone();
            device.set_device_lost_callback(move |reason: wgpu::DeviceLostReason, message: String| {
                log::error!("Device lost ({:?}): {}", reason, message);
                let reason = match reason {
                    wgpu::DeviceLostReason::Destroyed => RemovalReason::Destroyed,
                    _ => RemovalReason::Unknown,
                };
                *removed.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason);
            });
        }

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(&device, &config);

        let depth_texture = DepthTexture::new(&device, &config, "Depth Texture");

        // Both stages use the same layout; the vertex stage reads group 0 and
        // the pixel stage reads group 1.
        let constants_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Constant buffer bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let null_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Null constant buffer"),
            contents: &[0; 256],
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let null_constants = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Null constant buffer bind group"),
            layout: &constants_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: null_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Drawable pipeline layout"),
            bind_group_layouts: &[&constants_layout, &constants_layout],
            push_constant_ranges: &[],
        });

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_texture,
            constants_layout,
            null_constants,
            pipeline_layout,
            pipelines: HashMap::new(),
            state: BoundState::default(),
            draws: Vec::new(),
            clear_color: None,
            projection: Mat4::IDENTITY,
            frame: None,
            depth_cleared: false,
            skip_frame: false,
            diagnostics,
            removed,
            next_id: 0,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.config.width, self.config.height)
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture.resize(&self.device, &self.config);
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn removal_reason(&self) -> Option<RemovalReason> {
        *self.removed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` inside device error scopes and turns any captured error into
    /// a [`GraphicsError`] carrying the diagnostics emitted meanwhile.
    #[track_caller]
    fn checked<T>(&mut self, f: impl FnOnce(&wgpu::Device) -> T) -> Result<T, GraphicsError> {
        if let Some(reason) = self.removal_reason() {
            return Err(GraphicsError::device_removed(
                reason,
                self.diagnostics.messages(),
            ));
        }

        self.diagnostics.set();

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(&self.device);
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        match validation.or(out_of_memory) {
            None => Ok(value),
            Some(error) => {
                let code = match &error {
                    wgpu::Error::OutOfMemory { .. } => ErrorCode::OUT_OF_MEMORY,
                    wgpu::Error::Validation { .. } => ErrorCode::VALIDATION,
                    _ => ErrorCode::INTERNAL,
                };
                Err(GraphicsError::device(
                    code,
                    self.diagnostics.messages_with(error.to_string()),
                ))
            }
        }
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

    fn create_pipeline(&self, key: PipelineKey) -> wgpu::RenderPipeline {
        let state = &self.state;
        // Only called once every slot has been checked.
        let (Some(vs), Some(ps), Some(layout)) = (
            &state.vertex_shader,
            &state.pixel_shader,
            &state.input_layout,
        ) else {
            unreachable!("pipeline created from incomplete state");
        };

        log::debug!(
            "Creating pipeline for shaders {}/{} with {:?}",
            vs.id,
            ps.id,
            key.topology
        );

        let strip_index_format = match key.topology {
            wgpu::PrimitiveTopology::LineStrip | wgpu::PrimitiveTopology::TriangleStrip => {
                Some(wgpu::IndexFormat::Uint16)
            }
            _ => None,
        };

        self.device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Drawable pipeline"),
                layout: Some(&self.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vs.module,
                    entry_point: Some(ShaderStage::Vertex.entry_point()),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: key.stride as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &layout.attributes,
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &ps.module,
                    entry_point: Some(ShaderStage::Pixel.entry_point()),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: key.topology,
                    strip_index_format,
                    front_face: wgpu::FrontFace::Cw,
                    cull_mode: Some(wgpu::Face::Back),
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DepthTexture::DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
    }

    fn replay(&mut self, target: &wgpu::TextureView) -> wgpu::CommandBuffer {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: match self.clear_color.take() {
                            Some(color) => wgpu::LoadOp::Clear(color),
                            None => wgpu::LoadOp::Load,
                        },
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.depth_texture.view(),
                    depth_ops: Some(wgpu::Operations {
                        load: if std::mem::replace(&mut self.depth_cleared, true) {
                            wgpu::LoadOp::Load
                        } else {
                            wgpu::LoadOp::Clear(1.0)
                        },
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for draw in &self.draws {
                let Some(pipeline) = self.pipelines.get(&draw.pipeline) else {
                    continue;
                };

                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, &draw.bind_groups[0], &[]);
                render_pass.set_bind_group(1, &draw.bind_groups[1], &[]);
                render_pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
                render_pass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..draw.count, 0, 0..1);
            }
        }

        self.draws.clear();
        encoder.finish()
    }
}

impl WgpuContext {
    /// Acquires the surface texture of the current frame on first use.
    /// Returns `false` when the frame has to be skipped.
    fn acquire_frame(&mut self) -> Result<bool, GraphicsError> {
        if self.skip_frame {
            return Ok(false);
        }
        if self.frame.is_some() {
            return Ok(true);
        }

        match self.surface.get_current_texture() {
            Ok(output) => {
                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.frame = Some((output, view));
                Ok(true)
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.resize(self.size());
                self.skip_frame = true;
                Ok(false)
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring the next frame");
                self.skip_frame = true;
                Ok(false)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(GraphicsError::device(
                ErrorCode::OUT_OF_MEMORY,
                self.diagnostics.messages(),
            )),
            Err(other) => Err(GraphicsError::device(
                ErrorCode::SURFACE_LOST,
                self.diagnostics.messages_with(other.to_string()),
            )),
        }
    }

    /// Submits the draws recorded so far into the current frame.
    fn flush(&mut self) -> Result<(), GraphicsError> {
        if !self.acquire_frame()? {
            self.draws.clear();
            return Ok(());
        }

        let Some((_, view)) = &self.frame else {
            return Ok(());
        };
        let view = view.clone();

        let command_buffer = self.replay(&view);
        let queue = self.queue.clone();
        self.checked(|_| {
            queue.submit([command_buffer]);
        })
    }
}

fn wgpu_buffer(buffer: &GpuBuffer) -> &WgpuBuffer {
    match buffer {
        GpuBuffer::Wgpu(buffer) => buffer,
        GpuBuffer::Headless(_) => unreachable!("headless buffer bound to a wgpu context"),
    }
}

impl RenderContext for WgpuContext {
    fn create_vertex_buffer(
        &mut self,
        contents: &[u8],
        _stride: u32,
    ) -> Result<GpuBuffer, GraphicsError> {
        let id = self.next_id();
        let buffer = self.checked(|device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            })
        })?;

        Ok(GpuBuffer::Wgpu(WgpuBuffer {
            id,
            buffer,
            bind_group: None,
        }))
    }

    fn create_index_buffer(&mut self, indices: &[u16]) -> Result<GpuBuffer, GraphicsError> {
        let id = self.next_id();

        // Buffer writes must be a multiple of four bytes.
        let mut contents: Vec<u8> = bytemuck::cast_slice(indices).to_vec();
        contents.resize(contents.len().next_multiple_of(4), 0);

        let buffer = self.checked(|device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Index Buffer"),
                contents: &contents,
                usage: wgpu::BufferUsages::INDEX,
            })
        })?;

        Ok(GpuBuffer::Wgpu(WgpuBuffer {
            id,
            buffer,
            bind_group: None,
        }))
    }

    fn create_constant_buffer(
        &mut self,
        stage: ShaderStage,
        contents: &[u8],
    ) -> Result<GpuBuffer, GraphicsError> {
        let id = self.next_id();
        let layout = self.constants_layout.clone();

        let (buffer, bind_group) = self.checked(|device| {
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(match stage {
                    ShaderStage::Vertex => "Vertex Constant Buffer",
                    ShaderStage::Pixel => "Pixel Constant Buffer",
                }),
                contents,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Constant Buffer Bind Group"),
                layout: &layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            });

            (buffer, bind_group)
        })?;

        Ok(GpuBuffer::Wgpu(WgpuBuffer {
            id,
            buffer,
            bind_group: Some(bind_group),
        }))
    }

    fn update_constant_buffer(
        &mut self,
        buffer: &GpuBuffer,
        contents: &[u8],
    ) -> Result<(), GraphicsError> {
        let target = wgpu_buffer(buffer);
        let (id, buffer) = (target.id, target.buffer.clone());

        // Writes land before the next submit, so pending readers go first.
        if self.draws.iter().any(|draw| draw.constants.contains(&Some(id))) {
            log::trace!("Constant buffer {} rewritten mid-frame, flushing", id);
            self.flush()?;
        }

        let queue = self.queue.clone();
        self.checked(|_| queue.write_buffer(&buffer, 0, contents))
    }

    fn create_shader(
        &mut self,
        stage: ShaderStage,
        shader: &CompiledShader,
    ) -> Result<GpuShader, GraphicsError> {
        let id = self.next_id();
        let module = self.checked(|device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(shader.name.as_str()),
                source: wgpu::ShaderSource::Wgsl(shader.source.as_str().into()),
            })
        })?;

        Ok(GpuShader::Wgpu(WgpuShader { id, stage, module }))
    }

    fn create_input_layout(
        &mut self,
        attributes: &[wgpu::VertexAttribute],
        stride: u64,
    ) -> Result<GpuInputLayout, GraphicsError> {
        Ok(GpuInputLayout::Wgpu(WgpuInputLayout {
            id: self.next_id(),
            attributes: attributes.to_vec(),
            stride,
        }))
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: &GpuBuffer, stride: u32) {
        if slot != 0 {
            log::warn!("Only vertex buffer slot 0 is supported, got {}", slot);
            return;
        }
        self.state.vertex_buffer = Some((wgpu_buffer(buffer).clone(), stride));
    }

    fn set_index_buffer(&mut self, buffer: &GpuBuffer) {
        self.state.index_buffer = Some(wgpu_buffer(buffer).clone());
    }

    fn set_constant_buffer(&mut self, stage: ShaderStage, buffer: &GpuBuffer) {
        let buffer = wgpu_buffer(buffer);
        if buffer.bind_group.is_none() {
            self.diagnostics
                .push(format!("Buffer {} bound as a constant buffer", buffer.id));
        }
        self.state.constants[stage.group() as usize] = buffer
            .bind_group
            .clone()
            .map(|bind_group| (buffer.id, bind_group));
    }

    fn set_shader(&mut self, stage: ShaderStage, shader: &GpuShader) {
        let GpuShader::Wgpu(shader) = shader else {
            unreachable!("headless shader bound to a wgpu context");
        };

        if shader.stage != stage {
            self.diagnostics.push(format!(
                "{:?} shader {} bound to the {:?} stage",
                shader.stage, shader.id, stage
            ));
        }

        match stage {
            ShaderStage::Vertex => self.state.vertex_shader = Some(shader.clone()),
            ShaderStage::Pixel => self.state.pixel_shader = Some(shader.clone()),
        }
    }

    fn set_input_layout(&mut self, layout: &GpuInputLayout) {
        let GpuInputLayout::Wgpu(layout) = layout else {
            unreachable!("headless input layout bound to a wgpu context");
        };
        self.state.input_layout = Some(layout.clone());
    }

    fn set_topology(&mut self, topology: wgpu::PrimitiveTopology) {
        self.state.topology = Some(topology);
    }

    fn draw_indexed(&mut self, count: u32) -> Result<(), GraphicsError> {
        self.diagnostics.set();

        let state = &self.state;
        let (
            Some((vertex_buffer, stride)),
            Some(index_buffer),
            Some(vertex_shader),
            Some(pixel_shader),
            Some(input_layout),
            Some(topology),
        ) = (
            &state.vertex_buffer,
            &state.index_buffer,
            &state.vertex_shader,
            &state.pixel_shader,
            &state.input_layout,
            state.topology,
        )
        else {
            return self.incomplete("DrawIndexed with incomplete pipeline state".to_string());
        };

        if (*stride as u64) < input_layout.stride {
            let message = format!(
                "Vertex stride {} is smaller than the input layout's {}",
                stride, input_layout.stride
            );
            return self.incomplete(message);
        }

        let key = PipelineKey {
            vertex_shader: vertex_shader.id,
            pixel_shader: pixel_shader.id,
            input_layout: input_layout.id,
            topology,
            stride: *stride,
        };

        let draw = DrawCommand {
            pipeline: key,
            vertex_buffer: vertex_buffer.buffer.clone(),
            index_buffer: index_buffer.buffer.clone(),
            bind_groups: [0, 1].map(|group| match &state.constants[group] {
                Some((_, bind_group)) => bind_group.clone(),
                None => self.null_constants.clone(),
            }),
            constants: [0, 1].map(|group| state.constants[group].as_ref().map(|(id, _)| *id)),
            count,
        };

        if !self.pipelines.contains_key(&key) {
            self.device.push_error_scope(wgpu::ErrorFilter::Validation);
            let created = self.create_pipeline(key);
            if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
                return Err(GraphicsError::device(
                    ErrorCode::VALIDATION,
                    self.diagnostics.messages_with(error.to_string()),
                ));
            }
            self.pipelines.insert(key, created);
        }

        self.draws.push(draw);
        Ok(())
    }

    fn clear_buffer(&mut self, red: f32, green: f32, blue: f32) {
        self.clear_color = Some(wgpu::Color {
            r: red as f64,
            g: green as f64,
            b: blue as f64,
            a: 1.0,
        });
    }

    fn swap_buffer(&mut self) -> Result<(), GraphicsError> {
        self.diagnostics.set();

        if let Some(reason) = self.removal_reason() {
            return Err(GraphicsError::device_removed(
                reason,
                self.diagnostics.messages(),
            ));
        }

        let flushed = self.flush();
        let frame = self.frame.take();
        self.depth_cleared = false;
        self.skip_frame = false;
        flushed?;

        if let Some((output, _view)) = frame {
            self.window.pre_present_notify();
            output.present();
        }

        // Device loss is reported asynchronously; surface it on the frame it
        // was detected.
        if let Some(reason) = self.removal_reason() {
            return Err(GraphicsError::device_removed(
                reason,
                self.diagnostics.messages(),
            ));
        }

        Ok(())
    }

    fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    fn projection(&self) -> Mat4 {
        self.projection
    }
}
