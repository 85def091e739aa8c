use itertools::Itertools;

use crate::{
    bindable::Bindable,
    rendering::{
        context::GpuInputLayout,
        error::{DiagnosticInfo, ErrorCode},
        shader_loader::CompiledShader,
        GraphicsError, InputElement, RenderContext,
    },
};

pub struct InputLayout {
    layout: GpuInputLayout,
    stride: u64,
}

impl InputLayout {
    /// Builds a single-buffer layout with append-aligned offsets, checked
    /// against the inputs the vertex shader actually consumes.
    pub fn new(
        ctx: &mut dyn RenderContext,
        elements: &[InputElement],
        vertex_shader: &CompiledShader,
    ) -> Result<Self, GraphicsError> {
        validate(elements, vertex_shader)?;

        let mut offset = 0;
        let attributes = elements
            .iter()
            .map(|element| {
                let attribute = wgpu::VertexAttribute {
                    format: element.format,
                    offset,
                    shader_location: element.location,
                };
                offset += element.format.size();
                attribute
            })
            .collect_vec();

        let layout = ctx.create_input_layout(&attributes, offset)?;
        Ok(Self {
            layout,
            stride: offset,
        })
    }

    /// Total size of one vertex as described by the elements.
    pub fn stride(&self) -> u64 {
        self.stride
    }
}

impl Bindable for InputLayout {
    fn bind(&self, ctx: &mut dyn RenderContext) {
        ctx.set_input_layout(&self.layout);
    }
}

#[track_caller]
fn mismatch(message: String) -> GraphicsError {
    GraphicsError::device(
        ErrorCode::INPUT_LAYOUT_MISMATCH,
        DiagnosticInfo::single(message),
    )
}

fn validate(elements: &[InputElement], shader: &CompiledShader) -> Result<(), GraphicsError> {
    if let Some(duplicate) = elements.iter().map(|e| e.location).duplicates().next() {
        return Err(mismatch(format!(
            "location {} is described more than once",
            duplicate
        )));
    }

    for input in shader.vertex_inputs() {
        let Some(element) = elements.iter().find(|e| e.location == input.location) else {
            return Err(mismatch(format!(
                "{} consumes location {} but the layout does not describe it",
                shader.name, input.location
            )));
        };

        if component_count(element.format) != Some(input.components) {
            return Err(mismatch(format!(
                "{} ({:?}) does not match the {} components {} reads at location {}",
                element.name, element.format, input.components, shader.name, input.location
            )));
        }
    }

    Ok(())
}

fn component_count(format: wgpu::VertexFormat) -> Option<u32> {
    use wgpu::VertexFormat::*;

    match format {
        Float32 | Uint32 | Sint32 => Some(1),
        Float32x2 | Uint32x2 | Sint32x2 | Float16x2 | Uint16x2 | Sint16x2 | Unorm16x2
        | Snorm16x2 | Uint8x2 | Sint8x2 | Unorm8x2 | Snorm8x2 => Some(2),
        Float32x3 | Uint32x3 | Sint32x3 => Some(3),
        Float32x4 | Uint32x4 | Sint32x4 | Float16x4 | Uint16x4 | Sint16x4 | Unorm16x4
        | Snorm16x4 | Uint8x4 | Sint8x4 | Unorm8x4 | Snorm8x4 => Some(4),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use wgpu::VertexFormat;

    use super::*;
    use crate::rendering::{headless::HeadlessContext, shader_loader, ShaderStage};

    const SOURCE: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> @builtin(position) vec4<f32> {
    return vec4<f32>(input.position, input.color.a);
}
"#;

    fn shader() -> CompiledShader {
        shader_loader::compile_source("layout.wgsl", SOURCE, ShaderStage::Vertex, &[]).unwrap()
    }

    #[test]
    fn offsets_are_append_aligned() {
        let mut ctx = HeadlessContext::new();
        let layout = InputLayout::new(
            &mut ctx,
            &[
                InputElement::new("Position", 0, VertexFormat::Float32x3),
                InputElement::new("Color", 1, VertexFormat::Float32x4),
            ],
            &shader(),
        )
        .unwrap();

        assert_eq!(layout.stride(), 28);

        let GpuInputLayout::Headless(id) = layout.layout else {
            panic!("expected a headless layout");
        };
        let offsets = ctx
            .input_layout(id)
            .attributes
            .iter()
            .map(|a| a.offset)
            .collect_vec();
        assert_eq!(offsets, [0, 12]);
    }

    #[test]
    fn undescribed_location_is_rejected() {
        let mut ctx = HeadlessContext::new();
        let err = InputLayout::new(
            &mut ctx,
            &[InputElement::new("Position", 0, VertexFormat::Float32x3)],
            &shader(),
        )
        .err()
        .unwrap();

        assert_eq!(err.code(), Some(ErrorCode::INPUT_LAYOUT_MISMATCH));
        assert_eq!(ctx.stats().input_layouts, 0);
    }

    #[test]
    fn component_mismatch_is_rejected() {
        let mut ctx = HeadlessContext::new();
        let err = InputLayout::new(
            &mut ctx,
            &[
                InputElement::new("Position", 0, VertexFormat::Float32x2),
                InputElement::new("Color", 1, VertexFormat::Float32x4),
            ],
            &shader(),
        )
        .err()
        .unwrap();

        assert_eq!(err.code(), Some(ErrorCode::INPUT_LAYOUT_MISMATCH));
        assert!(err.to_string().contains("Position"));
    }

    #[test]
    fn duplicate_locations_are_rejected() {
        let mut ctx = HeadlessContext::new();
        let result = InputLayout::new(
            &mut ctx,
            &[
                InputElement::new("Position", 0, VertexFormat::Float32x3),
                InputElement::new("Color", 1, VertexFormat::Float32x4),
                InputElement::new("Other", 1, VertexFormat::Float32x4),
            ],
            &shader(),
        );

        assert!(result.is_err());
    }
}
